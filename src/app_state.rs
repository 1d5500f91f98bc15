/*
 *  app_state.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Application state machine driven by poller notifications
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

use std::fmt;

use log::{debug, info};

use crate::poller::PollerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
    Demo,
    Shutdown,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl AppState {
    /// Line shown in place of the album when there is no track to show
    pub fn status_line(&self) -> Option<&'static str> {
        match self {
            AppState::Idle | AppState::Loading => Some("Connecting..."),
            AppState::Error => Some("Player unreachable"),
            _ => None,
        }
    }
}

/// Only poller events and the startup bootstrap move this; touches never do.
#[derive(Debug)]
pub struct AppStateMachine {
    state: AppState,
    demo: bool,
}

impl AppStateMachine {
    pub fn new(demo: bool) -> Self {
        Self { state: AppState::Idle, demo }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Idle to Loading, or straight into Demo
    pub fn bootstrap(&mut self) -> Option<(AppState, AppState)> {
        if self.state != AppState::Idle {
            return None;
        }
        let to = if self.demo { AppState::Demo } else { AppState::Loading };
        self.transition(to)
    }

    pub fn on_poller_event(&mut self, event: &PollerEvent) -> Option<(AppState, AppState)> {
        use AppState::*;
        match (self.state, event) {
            (Shutdown, _) => None,
            // demo owns the process for its lifetime
            (Demo, _) => None,
            (Idle | Loading | Playing | Paused | Error, PollerEvent::Updated { is_playing }) => {
                self.transition(if *is_playing { Playing } else { Paused })
            }
            (Loading | Playing | Paused, PollerEvent::FailureThreshold { consecutive }) => {
                debug!("{} consecutive fetch failures", consecutive);
                self.transition(Error)
            }
            (_, PollerEvent::CommandResult { command, ok }) => {
                debug!("command {:?} result: {}", command, if *ok { "ok" } else { "failed" });
                None
            }
            _ => None,
        }
    }

    /// Terminal, reachable from anywhere
    pub fn shutdown(&mut self) -> Option<(AppState, AppState)> {
        self.transition(AppState::Shutdown)
    }

    fn transition(&mut self, to: AppState) -> Option<(AppState, AppState)> {
        let from = self.state;
        if from == to {
            return None;
        }
        self.state = to;
        info!("App state: {} -> {}", from, to);
        Some((from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::Command;
    use std::time::Duration;

    fn updated(is_playing: bool) -> PollerEvent {
        PollerEvent::Updated { is_playing }
    }

    #[test]
    fn test_live_lifecycle() {
        let mut m = AppStateMachine::new(false);
        assert_eq!(m.bootstrap(), Some((AppState::Idle, AppState::Loading)));
        assert_eq!(m.bootstrap(), None);
        m.on_poller_event(&updated(true));
        assert_eq!(m.state(), AppState::Playing);
        m.on_poller_event(&updated(false));
        assert_eq!(m.state(), AppState::Paused);
        assert_eq!(m.on_poller_event(&updated(false)), None);
    }

    #[test]
    fn test_error_entered_and_recovered() {
        let mut m = AppStateMachine::new(false);
        m.bootstrap();
        for n in 1..5 {
            let e = PollerEvent::FetchFailed { consecutive: n, retry_in: Duration::from_secs(2) };
            assert_eq!(m.on_poller_event(&e), None);
        }
        m.on_poller_event(&PollerEvent::FailureThreshold { consecutive: 5 });
        assert_eq!(m.state(), AppState::Error);
        m.on_poller_event(&updated(true));
        assert_eq!(m.state(), AppState::Playing);
    }

    #[test]
    fn test_demo_is_sticky() {
        let mut m = AppStateMachine::new(true);
        assert_eq!(m.bootstrap(), Some((AppState::Idle, AppState::Demo)));
        m.on_poller_event(&updated(true));
        m.on_poller_event(&PollerEvent::FailureThreshold { consecutive: 9 });
        assert_eq!(m.state(), AppState::Demo);
    }

    #[test]
    fn test_commands_never_transition() {
        let mut m = AppStateMachine::new(false);
        m.bootstrap();
        m.on_poller_event(&updated(false));
        let e = PollerEvent::CommandResult { command: Command::PlayPause, ok: true };
        assert_eq!(m.on_poller_event(&e), None);
        assert_eq!(m.state(), AppState::Paused);
    }

    #[test]
    fn test_shutdown_is_terminal() {
        let mut m = AppStateMachine::new(false);
        m.bootstrap();
        assert_eq!(m.shutdown(), Some((AppState::Loading, AppState::Shutdown)));
        assert_eq!(m.on_poller_event(&updated(true)), None);
        assert_eq!(m.bootstrap(), None);
        assert_eq!(m.shutdown(), None);
    }
}
