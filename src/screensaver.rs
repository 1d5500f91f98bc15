/*
 *  screensaver.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Idle backlight policy, dim then off
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

use log::debug;

use crate::constants::{
    BRIGHTNESS_DIMMED, BRIGHTNESS_OFF, BRIGHTNESS_ON, DEFAULT_DIM_AFTER, DEFAULT_OFF_AFTER,
    SCREENSAVER_SETTLE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreensaverConfig {
    pub enabled: bool,
    pub dim_after: Duration,
    pub off_after: Duration,
}

impl Default for ScreensaverConfig {
    fn default() -> Self {
        Self { enabled: true, dim_after: DEFAULT_DIM_AFTER, off_after: DEFAULT_OFF_AFTER }
    }
}

#[derive(Debug)]
pub struct Screensaver {
    config: ScreensaverConfig,
    started: Instant,
    last_activity: Instant,
    level: u8,
}

impl Screensaver {
    pub fn new(config: ScreensaverConfig, now: Instant) -> Self {
        Self { config, started: now, last_activity: now, level: BRIGHTNESS_ON }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_awake(&self) -> bool {
        self.level == BRIGHTNESS_ON
    }

    /// Register a touch. True when it woke the screen; that touch is not dispatched.
    pub fn touch(&mut self, now: Instant) -> bool {
        self.last_activity = now;
        if self.is_awake() {
            return false;
        }
        debug!("screensaver: wake");
        self.level = BRIGHTNESS_ON;
        true
    }

    /// New backlight level when it changes.
    pub fn update(&mut self, now: Instant, is_playing: bool) -> Option<u8> {
        if is_playing {
            self.last_activity = now;
        }
        if !self.config.enabled || now.saturating_duration_since(self.started) < SCREENSAVER_SETTLE {
            return None;
        }

        let idle = now.saturating_duration_since(self.last_activity);
        let target = if !is_playing && idle >= self.config.off_after {
            BRIGHTNESS_OFF
        } else if idle >= self.config.dim_after {
            BRIGHTNESS_DIMMED
        } else {
            BRIGHTNESS_ON
        };
        if target == self.level {
            return None;
        }
        debug!("screensaver: brightness {} -> {} after {:?} idle", self.level, target, idle);
        self.level = target;
        Some(target)
    }
}
