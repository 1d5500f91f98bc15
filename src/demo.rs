/*
 *  demo.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Offline demo playlist, stands in for the now playing service
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

use std::time::{Duration, Instant};

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::nowplaying::{NowPlayingState, StatePublisher};
use crate::poller::{Command, PollerEvent};

struct DemoTrack {
    title: &'static str,
    artist: &'static str,
    album: &'static str,
    duration: f64,
}

const PLAYLIST: [DemoTrack; 4] = [
    DemoTrack {
        title: "Never Gonna Give You Up",
        artist: "Rick Astley",
        album: "Whenever You Need Somebody",
        duration: 213.0,
    },
    DemoTrack { title: "Signal Path", artist: "The Test Patterns", album: "Calibration", duration: 184.0 },
    DemoTrack { title: "Lantern Light", artist: "Quiet Harbor", album: "Low Tide", duration: 241.0 },
    DemoTrack { title: "Paper Satellites", artist: "Mira Vale", album: "Orbitals", duration: 167.0 },
];

/// Deterministic playlist walker; same ticks from `new` or `reset` give the same states.
#[derive(Debug, Clone)]
pub struct DemoGenerator {
    step: f64,
    index: usize,
    position: f64,
    playing: bool,
    liked: [bool; PLAYLIST.len()],
    volume: u8,
}

impl DemoGenerator {
    /// `step` is how far playback moves on each tick
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.as_secs_f64(),
            index: 0,
            position: 0.0,
            playing: true,
            liked: [false; PLAYLIST.len()],
            volume: 50,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(Duration::from_secs_f64(self.step));
    }

    pub fn track_count() -> usize {
        PLAYLIST.len()
    }

    pub fn snapshot(&self, now: Instant) -> NowPlayingState {
        let track = &PLAYLIST[self.index];
        NowPlayingState {
            title: track.title.to_string(),
            artist: track.artist.to_string(),
            album: track.album.to_string(),
            artwork_ref: Some(format!("demo:{}", self.index)),
            position_seconds: self.position,
            duration_seconds: track.duration,
            is_playing: self.playing,
            is_liked: self.liked[self.index],
            volume_percent: Some(self.volume),
            source_timestamp: now,
        }
    }

    /// Current state, then move playback one step on.
    pub fn tick(&mut self, now: Instant) -> NowPlayingState {
        let state = self.snapshot(now);
        if self.playing {
            self.position += self.step;
            if self.position >= PLAYLIST[self.index].duration {
                self.skip(1);
            }
        }
        state
    }

    fn skip(&mut self, by: isize) {
        let n = PLAYLIST.len() as isize;
        self.index = (self.index as isize + by).rem_euclid(n) as usize;
        self.position = 0.0;
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::PlayPause => self.playing = !self.playing,
            Command::Next => self.skip(1),
            Command::Previous => self.skip(-1),
            Command::ToggleLike => self.liked[self.index] = !self.liked[self.index],
            Command::SetVolume(v) => self.volume = v.min(100),
            Command::StepVolume(d) => self.volume = (self.volume as i16 + d as i16).clamp(0, 100) as u8,
        }
    }
}

/// Demo task, replaces the poller: publishes one snapshot per tick, applies
/// commands locally and reports them like the live path does.
pub async fn run_demo(
    mut generator: DemoGenerator,
    tick: Duration,
    publisher: StatePublisher,
    events: mpsc::Sender<PollerEvent>,
    mut commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
) {
    info!("demo: {} synthetic tracks, tick {:?}", DemoGenerator::track_count(), tick);
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut commands_open = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let state = publisher.publish(generator.tick(Instant::now()));
                let _ = events.send(PollerEvent::Updated { is_playing: state.is_playing }).await;
            }
            cmd = commands.recv(), if commands_open => match cmd {
                Some(cmd) => {
                    generator.apply(cmd);
                    let state = publisher.publish(generator.snapshot(Instant::now()));
                    let _ = events.send(PollerEvent::CommandResult { command: cmd, ok: true }).await;
                    let _ = events.send(PollerEvent::Updated { is_playing: state.is_playing }).await;
                }
                None => commands_open = false,
            },
        }
    }
    debug!("demo: stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_and_restartable() {
        let now = Instant::now();
        let run = |g: &mut DemoGenerator| (0..600).map(|_| g.tick(now)).collect::<Vec<_>>();
        let mut a = DemoGenerator::new(Duration::from_secs(1));
        let mut b = DemoGenerator::new(Duration::from_secs(1));
        let first = run(&mut a);
        assert_eq!(first, run(&mut b));
        a.reset();
        assert_eq!(first, run(&mut a));
    }

    #[test]
    fn test_wraps_to_next_track_and_loops() {
        let now = Instant::now();
        let mut g = DemoGenerator::new(Duration::from_secs(10));
        let titles: Vec<String> = (0..200).map(|_| g.tick(now).title).collect();
        assert_eq!(titles[0], "Never Gonna Give You Up");
        // 213 s at 10 s per tick: 22 ticks on the first track
        assert_eq!(titles[21], "Never Gonna Give You Up");
        assert_eq!(titles[22], "Signal Path");
        let total: usize = [213.0f64, 184.0, 241.0, 167.0].iter().map(|d| (d / 10.0).ceil() as usize).sum();
        assert_eq!(titles[total], "Never Gonna Give You Up");
    }

    #[test]
    fn test_position_never_exceeds_duration() {
        let now = Instant::now();
        let mut g = DemoGenerator::new(Duration::from_secs(7));
        for _ in 0..500 {
            let s = g.tick(now);
            assert!(s.position_seconds < s.duration_seconds);
            assert_eq!(s.artwork_ref.as_deref().map(|r| r.starts_with("demo:")), Some(true));
        }
    }

    #[test]
    fn test_commands_apply_locally() {
        let now = Instant::now();
        let mut g = DemoGenerator::new(Duration::from_secs(1));
        g.apply(Command::PlayPause);
        let paused = g.tick(now);
        assert!(!paused.is_playing);
        assert_eq!(g.tick(now).position_seconds, paused.position_seconds);
        g.apply(Command::Previous);
        assert_eq!(g.snapshot(now).title, "Paper Satellites");
        g.apply(Command::ToggleLike);
        assert!(g.snapshot(now).is_liked);
        g.apply(Command::StepVolume(-60));
        assert_eq!(g.snapshot(now).volume_percent, Some(0));
        g.apply(Command::SetVolume(80));
        assert_eq!(g.snapshot(now).volume_percent, Some(80));
    }
}
