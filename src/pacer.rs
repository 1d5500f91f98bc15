/*
 *  pacer.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame pacing, fixed and flush time adaptive
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */
use std::time::Duration;

use log::debug;
use tokio::time::{sleep_until, Instant};

fn frame_for(fps: u32) -> Duration {
    Duration::from_micros(1_000_000 / fps.max(1) as u64)
}

pub struct Pacer {
    next_deadline: Instant,
    frame: Duration,
}

// fbdev panels manage 30fps comfortably, slow SPI panels far less
impl Pacer {
    pub fn new(target_fps: u32) -> Self {
        Self { next_deadline: Instant::now(), frame: frame_for(target_fps) }
    }

    #[inline]
    pub fn set_fps(&mut self, fps: u32) {
        self.frame = frame_for(fps);
    }

    #[inline]
    pub fn frame(&self) -> Duration {
        self.frame
    }

    pub fn fps(&self) -> u32 {
        (1_000_000 / self.frame.as_micros().max(1)) as u32
    }

    /// Sleep to the next frame deadline. A late frame starts the next one now
    /// rather than bursting to catch up.
    pub async fn wait(&mut self) {
        sleep_until(self.next_deadline).await;
        let now = Instant::now();
        self.next_deadline = (self.next_deadline + self.frame).max(now);
    }
}

pub struct AutoPacer {
    pacer: Pacer,
    ema_ms: f32,   // moving avg of flush time
    alpha: f32,    // smoothing (0.1 ~ 0.3)
    headroom: f32, // >1.0 to avoid saturation (e.g. 1.25)
    max_fps: u32,
    min_fps: u32,
}

impl AutoPacer {
    pub fn new(initial_fps: u32, max_fps: u32, min_fps: u32) -> Self {
        let min_fps = min_fps.max(1);
        let max_fps = max_fps.max(min_fps);
        Self {
            pacer: Pacer::new(initial_fps.clamp(min_fps, max_fps)),
            ema_ms: 0.0,
            alpha: 0.2,
            headroom: 1.25,
            max_fps,
            min_fps,
        }
    }

    pub async fn wait(&mut self) {
        self.pacer.wait().await
    }

    pub fn fps(&self) -> u32 {
        self.pacer.fps()
    }

    /// Call after every flush; the rate follows the smoothed flush cost.
    pub fn record_flush_ms(&mut self, flush_ms: f32) {
        self.ema_ms = if self.ema_ms == 0.0 {
            flush_ms
        } else {
            self.alpha * flush_ms + (1.0 - self.alpha) * self.ema_ms
        };
        let safe_fps = if self.ema_ms > 0.0 {
            (1000.0 / (self.ema_ms * self.headroom)).clamp(self.min_fps as f32, self.max_fps as f32) as u32
        } else {
            self.max_fps
        };
        if safe_fps != self.pacer.fps() {
            debug!("pacer: {} fps (flush ~{:.1} ms)", safe_fps, self.ema_ms);
            self.pacer.set_fps(safe_fps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_pacer_backs_off_and_recovers() {
        let mut p = AutoPacer::new(30, 30, 1);
        assert_eq!(p.fps(), 30);
        for _ in 0..50 {
            p.record_flush_ms(200.0);
        }
        assert_eq!(p.fps(), 4);
        for _ in 0..50 {
            p.record_flush_ms(5000.0);
        }
        assert_eq!(p.fps(), 1);
        for _ in 0..100 {
            p.record_flush_ms(1.0);
        }
        assert_eq!(p.fps(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_cadence() {
        let mut p = Pacer::new(10);
        let t0 = Instant::now();
        for _ in 0..5 {
            p.wait().await;
        }
        assert_eq!(Instant::now() - t0, Duration::from_millis(400));
    }
}
