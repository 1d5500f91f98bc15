/*
 *  nowplaying.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Now playing snapshot and the single slot handoff to the render loop
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

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

/// Immutable snapshot of what the player reports.
///
/// `position_seconds <= duration_seconds`, both zero when the length is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingState {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork_ref: Option<String>,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub is_playing: bool,
    pub is_liked: bool,
    pub volume_percent: Option<u8>,
    /// when the snapshot was fetched
    pub source_timestamp: Instant,
}

impl NowPlayingState {
    pub fn empty(at: Instant) -> Self {
        Self {
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            artwork_ref: None,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            is_playing: false,
            is_liked: false,
            volume_percent: None,
            source_timestamp: at,
        }
    }

    /// Enforce the position/duration invariant and drop empty artwork refs.
    pub fn normalized(mut self) -> Self {
        let sane = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        self.duration_seconds = sane(self.duration_seconds);
        self.position_seconds = if self.duration_seconds > 0.0 {
            sane(self.position_seconds).min(self.duration_seconds)
        } else {
            0.0
        };
        if self.artwork_ref.as_deref().is_some_and(|r| r.trim().is_empty()) {
            self.artwork_ref = None;
        }
        self
    }

    /// Position as reported, between zero and one; zero for unknown length.
    pub fn progress_fraction(&self) -> f32 {
        if self.duration_seconds <= 0.0 {
            return 0.0;
        }
        (self.position_seconds / self.duration_seconds).clamp(0.0, 1.0) as f32
    }

    /// Position extrapolated to `now` while playing, capped at the duration.
    pub fn position_at(&self, now: Instant) -> f64 {
        if !self.is_playing || self.duration_seconds <= 0.0 {
            return self.position_seconds;
        }
        let elapsed = now.saturating_duration_since(self.source_timestamp).as_secs_f64();
        (self.position_seconds + elapsed).min(self.duration_seconds)
    }

    pub fn progress_at(&self, now: Instant) -> f32 {
        if self.duration_seconds <= 0.0 {
            return 0.0;
        }
        (self.position_at(now) / self.duration_seconds).clamp(0.0, 1.0) as f32
    }

    pub fn has_track(&self) -> bool {
        !self.title.is_empty() || !self.artist.is_empty()
    }
}

type Slot = Option<Arc<NowPlayingState>>;

/// Writer side of the latest-value handoff, owned by the poller or demo task.
#[derive(Debug, Clone)]
pub struct StatePublisher {
    tx: watch::Sender<Slot>,
}

/// Reader side; always sees a whole snapshot, older ones are never queued.
#[derive(Debug, Clone)]
pub struct StateReader {
    rx: watch::Receiver<Slot>,
}

pub fn handoff() -> (StatePublisher, StateReader) {
    let (tx, rx) = watch::channel(None);
    (StatePublisher { tx }, StateReader { rx })
}

impl StatePublisher {
    /// Replace the current snapshot, last write wins
    pub fn publish(&self, state: NowPlayingState) -> Arc<NowPlayingState> {
        let state = Arc::new(state);
        self.tx.send_replace(Some(Arc::clone(&state)));
        state
    }

    pub fn latest(&self) -> Option<Arc<NowPlayingState>> {
        self.tx.borrow().clone()
    }
}

impl StateReader {
    pub fn latest(&self) -> Option<Arc<NowPlayingState>> {
        self.rx.borrow().clone()
    }
}
