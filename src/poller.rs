/*
 *  poller.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Now playing fetch cycle with backoff, control command fan-out and
 *  state machine notifications
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

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant as TokioInstant};
use tokio_util::sync::CancellationToken;

use crate::constants::{
    DEFAULT_BACKOFF_CEILING, DEFAULT_FAILURE_THRESHOLD, DEFAULT_POLL_INTERVAL, VOLUME_STEP,
};
use crate::input::Action;
use crate::nowplaying::{NowPlayingState, StatePublisher};

/// Transient fetch failures; both take the backoff path
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Outbound control request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PlayPause,
    Next,
    Previous,
    ToggleLike,
    /// absolute, 0 ..= 100
    SetVolume(u8),
    /// relative percent
    StepVolume(i8),
}

impl From<Action> for Command {
    fn from(action: Action) -> Self {
        match action {
            Action::PlayPause => Command::PlayPause,
            Action::Next => Command::Next,
            Action::Previous => Command::Previous,
            Action::ToggleLike => Command::ToggleLike,
            Action::VolumeUp => Command::StepVolume(VOLUME_STEP),
            Action::VolumeDown => Command::StepVolume(-VOLUME_STEP),
            Action::SetVolume(v) => Command::SetVolume((v.clamp(0.0, 1.0) * 100.0).round() as u8),
        }
    }
}

/// What the poller tells the app state machine
#[derive(Debug, Clone, PartialEq)]
pub enum PollerEvent {
    /// a fresh snapshot was published
    Updated { is_playing: bool },
    FetchFailed { consecutive: u32, retry_in: Duration },
    /// raised once, when the consecutive failure count reaches the threshold
    FailureThreshold { consecutive: u32 },
    CommandResult { command: Command, ok: bool },
}

/// Remote player the poller talks to
pub trait NowPlayingSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<NowPlayingState, FetchError>> + Send;

    /// `current` is the last good snapshot, needed to resolve toggles
    fn send(
        &self,
        command: Command,
        current: Option<Arc<NowPlayingState>>,
    ) -> impl Future<Output = Result<(), FetchError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub backoff_ceiling: Duration,
    pub failure_threshold: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            backoff_ceiling: DEFAULT_BACKOFF_CEILING,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// Doubling retry interval, capped; a success snaps back to the base.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    ceiling: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(base);
        Self { base, ceiling, current: base }
    }

    pub fn on_failure(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        self.current
    }

    pub fn on_success(&mut self) -> Duration {
        self.current = self.base;
        self.current
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}

/// Owns the fetch cycle; publishes snapshots and reports to the state machine.
pub struct DataPoller<S: NowPlayingSource> {
    source: Arc<S>,
    config: PollerConfig,
    publisher: StatePublisher,
    events: mpsc::Sender<PollerEvent>,
    commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
}

impl<S: NowPlayingSource> DataPoller<S> {
    pub fn new(
        source: S,
        config: PollerConfig,
        publisher: StatePublisher,
        events: mpsc::Sender<PollerEvent>,
        commands: mpsc::Receiver<Command>,
        cancel: CancellationToken,
    ) -> Self {
        Self { source: Arc::new(source), config, publisher, events, commands, cancel }
    }

    /// Run until cancelled. The first fetch goes out immediately.
    pub async fn run(mut self) {
        let mut backoff = Backoff::new(self.config.interval, self.config.backoff_ceiling);
        let mut failures: u32 = 0;
        let mut next_poll = TokioInstant::now();
        let mut in_flight: JoinSet<()> = JoinSet::new();
        let mut commands_open = true;

        info!("poller: every {:?}, backoff ceiling {:?}", self.config.interval, backoff.ceiling);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                cmd = self.commands.recv(), if commands_open => match cmd {
                    Some(cmd) => self.spawn_command(cmd, &mut in_flight),
                    None => commands_open = false,
                },

                // reap finished command tasks
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}

                _ = sleep_until(next_poll) => {
                    // taps keep flowing while a slow fetch is outstanding
                    let fetch = self.source.fetch();
                    tokio::pin!(fetch);
                    let result = loop {
                        tokio::select! {
                            _ = self.cancel.cancelled() => break None,
                            cmd = self.commands.recv(), if commands_open => match cmd {
                                Some(cmd) => self.spawn_command(cmd, &mut in_flight),
                                None => commands_open = false,
                            },
                            r = &mut fetch => break Some(r),
                        }
                    };
                    let Some(result) = result else { break };
                    let delay = match result {
                        Ok(state) => {
                            if failures > 0 {
                                info!("poller: recovered after {} failed fetches", failures);
                            }
                            failures = 0;
                            let is_playing = state.is_playing;
                            self.publisher.publish(state.normalized());
                            self.notify(PollerEvent::Updated { is_playing }).await;
                            backoff.on_success()
                        }
                        Err(e) => {
                            failures = failures.saturating_add(1);
                            let delay = backoff.on_failure();
                            warn!("poller: fetch failed ({} in a row), retry in {:?}: {}", failures, delay, e);
                            self.notify(PollerEvent::FetchFailed { consecutive: failures, retry_in: delay }).await;
                            if failures == self.config.failure_threshold {
                                self.notify(PollerEvent::FailureThreshold { consecutive: failures }).await;
                            }
                            delay
                        }
                    };
                    next_poll = TokioInstant::now() + delay;
                }
            }
        }

        // pending retry timer dies with the loop, command results are dropped
        in_flight.abort_all();
        debug!("poller: stopped");
    }

    /// Commands run beside the poll cycle and never move `next_poll`.
    fn spawn_command(&self, command: Command, in_flight: &mut JoinSet<()>) {
        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        let current = self.publisher.latest();
        in_flight.spawn(async move {
            let ok = match source.send(command, current).await {
                Ok(()) => {
                    debug!("command {:?} sent", command);
                    true
                }
                Err(e) => {
                    warn!("command {:?} failed: {}", command, e);
                    false
                }
            };
            let _ = events.send(PollerEvent::CommandResult { command, ok }).await;
        });
    }

    async fn notify(&self, event: PollerEvent) {
        if self.events.send(event).await.is_err() {
            debug!("poller: no listener for events");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::{AppState, AppStateMachine};
    use crate::nowplaying::{handoff, StateReader};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Scripted source: pops one result per fetch, repeats the last one after.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<bool, String>>>,
        fetches: Mutex<Vec<TokioInstant>>,
        sent: Mutex<Vec<Command>>,
        latency: Duration,
        rejects: Option<Command>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<bool, String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fetches: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                latency: Duration::ZERO,
                rejects: None,
            }
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        fn rejecting(mut self, command: Command) -> Self {
            self.rejects = Some(command);
            self
        }
    }

    fn spawn_poller(source: &Arc<ScriptedSource>) -> (
        StateReader,
        mpsc::Receiver<PollerEvent>,
        mpsc::Sender<Command>,
        CancellationToken,
        tokio::task::JoinHandle<()>,
    ) {
        let (publisher, reader) = handoff();
        let (ev_tx, ev_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let poller = DataPoller {
            source: Arc::clone(source),
            config: PollerConfig::default(),
            publisher,
            events: ev_tx,
            commands: cmd_rx,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(poller.run());
        (reader, ev_rx, cmd_tx, cancel, handle)
    }

    impl NowPlayingSource for ScriptedSource {
        fn fetch(&self) -> impl Future<Output = Result<NowPlayingState, FetchError>> + Send {
            self.fetches.lock().unwrap().push(TokioInstant::now());
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.len() > 1 { script.pop_front() } else { script.front().cloned() }
            };
            let latency = self.latency;
            async move {
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                match next {
                    Some(Ok(is_playing)) => Ok(NowPlayingState {
                        title: "Track".into(),
                        duration_seconds: 200.0,
                        position_seconds: 50.0,
                        is_playing,
                        ..NowPlayingState::empty(Instant::now())
                    }),
                    Some(Err(msg)) => Err(FetchError::Protocol(msg)),
                    None => Err(FetchError::Protocol("empty script".into())),
                }
            }
        }

        fn send(
            &self,
            command: Command,
            _current: Option<Arc<NowPlayingState>>,
        ) -> impl Future<Output = Result<(), FetchError>> + Send {
            self.sent.lock().unwrap().push(command);
            let rejected = self.rejects == Some(command);
            async move {
                if rejected {
                    Err(FetchError::Protocol("player refused".into()))
                } else {
                    Ok(())
                }
            }
        }
    }

    #[test]
    fn test_backoff_monotonic_and_capped() {
        let mut b = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));
        let mut last = b.current();
        for _ in 0..10 {
            let next = b.on_failure();
            assert!(next >= last);
            assert!(next <= Duration::from_secs(30));
            last = next;
        }
        assert_eq!(last, Duration::from_secs(30));
        assert_eq!(b.on_success(), Duration::from_secs(1));
    }

    #[test]
    fn test_action_to_command() {
        assert_eq!(Command::from(Action::SetVolume(0.254)), Command::SetVolume(25));
        assert_eq!(Command::from(Action::SetVolume(3.0)), Command::SetVolume(100));
        assert_eq!(Command::from(Action::VolumeDown), Command::StepVolume(-VOLUME_STEP));
        assert_eq!(Command::from(Action::ToggleLike), Command::ToggleLike);
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_raised_once_then_recovers() {
        let mut script: Vec<Result<bool, String>> = (0..6).map(|_| Err("garbage".to_string())).collect();
        script.push(Ok(true));
        let (publisher, reader) = handoff();
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let poller = DataPoller::new(ScriptedSource::new(script), PollerConfig::default(), publisher, ev_tx, cmd_rx, cancel.clone());
        let handle = tokio::spawn(poller.run());

        let mut thresholds = 0;
        loop {
            match ev_rx.recv().await.unwrap() {
                PollerEvent::FailureThreshold { consecutive } => {
                    assert_eq!(consecutive, 5);
                    thresholds += 1;
                }
                PollerEvent::Updated { is_playing } => {
                    assert!(is_playing);
                    break;
                }
                _ => {}
            }
        }
        assert_eq!(thresholds, 1);
        assert_eq!(reader.latest().unwrap().title, "Track");
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_intervals_grow() {
        let script: Vec<Result<bool, String>> = vec![Err("down".into())];
        let source = Arc::new(ScriptedSource::new(script));
        let (publisher, _reader) = handoff();
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let poller = DataPoller {
            source: Arc::clone(&source),
            config: PollerConfig::default(),
            publisher,
            events: ev_tx,
            commands: cmd_rx,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(poller.run());

        let mut delays = Vec::new();
        while delays.len() < 7 {
            if let Some(PollerEvent::FetchFailed { retry_in, .. }) = ev_rx.recv().await {
                delays.push(retry_in);
            }
        }
        cancel.cancel();
        handle.await.unwrap();

        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*delays.last().unwrap(), Duration::from_secs(30));
        let fetches = source.fetches.lock().unwrap().clone();
        for (gap, expected) in fetches.windows(2).map(|w| w[1] - w[0]).zip(&delays) {
            assert_eq!(gap, *expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_does_not_shift_cadence() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(false)]));
        let (publisher, _reader) = handoff();
        let (ev_tx, mut ev_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let poller = DataPoller {
            source: Arc::clone(&source),
            config: PollerConfig::default(),
            publisher,
            events: ev_tx,
            commands: cmd_rx,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(poller.run());

        // first fetch, then a command half way to the second
        assert!(matches!(ev_rx.recv().await, Some(PollerEvent::Updated { .. })));
        tokio::time::sleep(Duration::from_millis(500)).await;
        cmd_tx.send(Command::Next).await.unwrap();

        let mut saw_result = false;
        let mut updates = 0;
        while updates < 2 {
            match ev_rx.recv().await.unwrap() {
                PollerEvent::CommandResult { command, ok } => {
                    assert_eq!(command, Command::Next);
                    assert!(ok);
                    saw_result = true;
                }
                PollerEvent::Updated { .. } => updates += 1,
                _ => {}
            }
        }
        cancel.cancel();
        handle.await.unwrap();

        assert!(saw_result);
        assert_eq!(*source.sent.lock().unwrap(), vec![Command::Next]);
        let fetches = source.fetches.lock().unwrap().clone();
        assert_eq!(fetches[1] - fetches[0], Duration::from_secs(1));
        assert_eq!(fetches[2] - fetches[1], Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_good_state_survives_failures() {
        let mut script: Vec<Result<bool, String>> = vec![Ok(true)];
        script.extend((0..6).map(|_| Err("timeout".to_string())));
        let source = Arc::new(ScriptedSource::new(script));
        let (reader, mut ev_rx, _cmd_tx, cancel, handle) = spawn_poller(&source);

        assert_eq!(ev_rx.recv().await, Some(PollerEvent::Updated { is_playing: true }));
        let good = reader.latest().unwrap();

        let mut failed = 0;
        loop {
            match ev_rx.recv().await.unwrap() {
                PollerEvent::FetchFailed { .. } => {
                    failed += 1;
                    // still showing the track after every single failure
                    assert!(Arc::ptr_eq(&reader.latest().unwrap(), &good));
                }
                PollerEvent::FailureThreshold { consecutive } => {
                    assert_eq!(consecutive, 5);
                    break;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(failed, 5);

        let latest = reader.latest().unwrap();
        assert!(Arc::ptr_eq(&latest, &good));
        assert_eq!(latest.title, "Track");
        assert!(latest.is_playing);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_command_reported_without_transition() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(false)]).rejecting(Command::Next));
        let (_reader, mut ev_rx, cmd_tx, cancel, handle) = spawn_poller(&source);

        let mut machine = AppStateMachine::new(false);
        machine.bootstrap();
        let first = ev_rx.recv().await.unwrap();
        assert_eq!(machine.on_poller_event(&first), Some((AppState::Loading, AppState::Paused)));

        tokio::time::sleep(Duration::from_millis(500)).await;
        cmd_tx.send(Command::Next).await.unwrap();

        let mut saw_failure = false;
        let mut updates = 0;
        while updates < 2 {
            let event = ev_rx.recv().await.unwrap();
            match &event {
                PollerEvent::CommandResult { command, ok } => {
                    assert_eq!(*command, Command::Next);
                    assert!(!ok);
                    saw_failure = true;
                }
                PollerEvent::Updated { .. } => updates += 1,
                _ => {}
            }
            assert_eq!(machine.on_poller_event(&event), None);
            assert_eq!(machine.state(), AppState::Paused);
        }
        cancel.cancel();
        handle.await.unwrap();

        assert!(saw_failure);
        let fetches = source.fetches.lock().unwrap().clone();
        assert_eq!(fetches[1] - fetches[0], Duration::from_secs(1));
        assert_eq!(fetches[2] - fetches[1], Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_served_during_slow_fetch() {
        let source = Arc::new(ScriptedSource::new(vec![Ok(true)]).with_latency(Duration::from_secs(3)));
        let start = TokioInstant::now();
        let (_reader, mut ev_rx, cmd_tx, cancel, handle) = spawn_poller(&source);

        // first fetch is still outstanding at one second
        tokio::time::sleep(Duration::from_secs(1)).await;
        cmd_tx.send(Command::PlayPause).await.unwrap();

        let event = ev_rx.recv().await.unwrap();
        assert_eq!(event, PollerEvent::CommandResult { command: Command::PlayPause, ok: true });
        assert!(TokioInstant::now() - start < Duration::from_secs(3));

        assert_eq!(ev_rx.recv().await, Some(PollerEvent::Updated { is_playing: true }));
        assert!(TokioInstant::now() - start >= Duration::from_secs(3));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[test]
    fn test_backoff_saturates_near_max() {
        let mut b = Backoff::new(Duration::MAX / 2 + Duration::from_secs(1), Duration::MAX);
        assert_eq!(b.on_failure(), Duration::MAX);
        assert_eq!(b.on_failure(), Duration::MAX);
    }
}
