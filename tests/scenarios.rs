/*
 *  tests/scenarios.rs
 *
 *  End to end: layout, art, poller, state machine and touch working together
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 */

use std::f32::consts::FRAC_1_SQRT_2;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use nowpanel::app::{App, AppLinks, AppOptions};
use nowpanel::app_state::{AppState, AppStateMachine};
use nowpanel::artcache::{ArtHandle, DefaultArtSource};
use nowpanel::display::drivers::mock::MockDriver;
use nowpanel::display::layout::{compute, ButtonId, ButtonStyle, DisplayConfig, LayoutMode, RegionId, Template};
use nowpanel::geometry::rect_within;
use nowpanel::input::{TouchEvent, TouchPhase};
use nowpanel::nowplaying::{handoff, NowPlayingState, StatePublisher};
use nowpanel::poller::{Command, DataPoller, FetchError, NowPlayingSource, PollerConfig, PollerEvent};

struct Harness {
    app: App<MockDriver, DefaultArtSource>,
    publisher: StatePublisher,
    commands: mpsc::Receiver<Command>,
    touches: mpsc::UnboundedSender<TouchEvent>,
    _events: mpsc::Sender<PollerEvent>,
}

fn harness(config: DisplayConfig) -> Harness {
    let (publisher, state) = handoff();
    let (events_tx, events) = mpsc::channel(16);
    let (commands_tx, commands) = mpsc::channel(16);
    let (touches, touches_rx) = mpsc::unbounded_channel();
    let driver = MockDriver::new(config.screen_width, config.screen_height);
    let links = AppLinks { state, events, commands: commands_tx, touches: touches_rx };
    let mut app = App::new(driver, config, AppOptions::default(), DefaultArtSource::new().unwrap(), links);
    app.start().unwrap();
    Harness { app, publisher, commands, touches, _events: events_tx }
}

#[tokio::test]
async fn test_portrait_track_with_art() {
    let config = DisplayConfig { mode: LayoutMode::Portrait, ..DisplayConfig::new(480, 800) };
    let mut h = harness(config);

    let now = Instant::now();
    let state = h.publisher.publish(NowPlayingState {
        title: "Never Gonna Give You Up".into(),
        artist: "Rick Astley".into(),
        album: "Whenever You Need Somebody".into(),
        artwork_ref: Some("demo:0".into()),
        duration_seconds: 200.0,
        position_seconds: 50.0,
        is_playing: false,
        ..NowPlayingState::empty(now)
    });
    assert_eq!(state.progress_fraction(), 0.25);

    // first frame has the fetch in flight, the next one picks up the cover
    h.app.tick(now).unwrap();
    h.app.art_mut().wait_idle().await;
    h.app.tick(now).unwrap();
    assert!(h.app.art_mut().contains("demo:0"));
    assert!(matches!(h.app.art_mut().get_or_fetch(Some("demo:0")), ArtHandle::Ready(_)));

    let geometry = h.app.geometry();
    assert_eq!(geometry.template, Template::Portrait);
    let art = geometry.region(RegionId::Art).unwrap().screen;
    let title = geometry.region(RegionId::Title).unwrap().screen;
    assert!(art.top_left.y < title.top_left.y);

    let frames = h.app.driver().state();
    assert_eq!(frames.lock().unwrap().flush_count, 2);
}

#[test]
fn test_circle_without_buttons() {
    let config = DisplayConfig {
        mode: LayoutMode::Circle,
        button_style: ButtonStyle::None,
        ..DisplayConfig::new(720, 720)
    };
    let g = compute(&config, true);
    assert_eq!(g.template, Template::Circle);
    assert_eq!(g.buttons().count(), 0);
    assert!(g.bezel.is_some());

    let inscribed = (720.0 * FRAC_1_SQRT_2).floor() as u32;
    let square = Rectangle::with_center(Point::new(360, 360), Size::new(inscribed, inscribed));
    for id in [RegionId::Art, RegionId::Title, RegionId::Artist, RegionId::Album, RegionId::Progress] {
        let r = g.region(id).unwrap().logical;
        assert!(rect_within(&r, &square), "{:?} {:?} outside {:?}", id, r, square);
    }

    // the content column spans the square
    let title = g.region(RegionId::Title).unwrap().logical;
    assert!(title.size.width + 4 >= inscribed);
    let progress = g.region(RegionId::Progress).unwrap().logical;
    let art = g.region(RegionId::Art).unwrap().logical;
    let span = (progress.top_left.y + progress.size.height as i32) - art.top_left.y;
    assert!(span as u32 + 4 >= inscribed);
}

/// Fails the first `failures` fetches with a protocol error, then plays.
struct FlakySource {
    failures: u32,
    calls: AtomicU32,
}

impl NowPlayingSource for FlakySource {
    fn fetch(&self) -> impl Future<Output = Result<NowPlayingState, FetchError>> + Send {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = call < self.failures;
        async move {
            if fail {
                Err(FetchError::Protocol("missing song object".into()))
            } else {
                Ok(NowPlayingState {
                    title: "Back Online".into(),
                    duration_seconds: 180.0,
                    is_playing: true,
                    ..NowPlayingState::empty(Instant::now())
                })
            }
        }
    }

    fn send(
        &self,
        _command: Command,
        _current: Option<Arc<NowPlayingState>>,
    ) -> impl Future<Output = Result<(), FetchError>> + Send {
        async { Ok(()) }
    }
}

#[tokio::test(start_paused = true)]
async fn test_error_after_threshold_then_recovery() {
    let (publisher, reader) = handoff();
    let (events_tx, mut events) = mpsc::channel(64);
    let (_commands_tx, commands) = mpsc::channel(4);
    let cancel = CancellationToken::new();

    let source = FlakySource { failures: 5, calls: AtomicU32::new(0) };
    let config = PollerConfig::default();
    assert_eq!(config.failure_threshold, 5);
    let poller = DataPoller::new(source, config, publisher, events_tx, commands, cancel.clone());
    let task = tokio::spawn(poller.run());

    let mut machine = AppStateMachine::new(false);
    machine.bootstrap();
    assert_eq!(machine.state(), AppState::Loading);

    let mut seen = Vec::new();
    let mut failed_fetches = 0;
    while let Some(event) = events.recv().await {
        if matches!(event, PollerEvent::FetchFailed { .. }) {
            failed_fetches += 1;
        }
        if let Some((_, to)) = machine.on_poller_event(&event) {
            seen.push(to);
        }
        if matches!(event, PollerEvent::Updated { .. }) {
            break;
        }
    }

    assert_eq!(failed_fetches, 5);
    assert_eq!(seen, vec![AppState::Error, AppState::Playing]);
    assert_eq!(reader.latest().unwrap().title, "Back Online");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_double_tap_inside_debounce_is_one_action() {
    let config = DisplayConfig { mode: LayoutMode::Portrait, ..DisplayConfig::new(480, 800) };
    let mut h = harness(config);
    let geometry = h.app.geometry();
    let (_, next) = geometry.buttons().find(|(id, _)| *id == ButtonId::Next).unwrap();
    let c = next.screen.center();

    let t0 = Instant::now();
    let tap = |at: Instant| {
        h.touches.send(TouchEvent::new(c.x, c.y, TouchPhase::Down, at)).unwrap();
        h.touches.send(TouchEvent::new(c.x, c.y, TouchPhase::Up, at + Duration::from_millis(40))).unwrap();
    };
    tap(t0);
    tap(t0 + Duration::from_millis(120));
    h.app.tick(t0 + Duration::from_millis(200)).unwrap();

    assert_eq!(h.commands.try_recv().unwrap(), Command::Next);
    assert!(h.commands.try_recv().is_err());

    // outside the window it fires again
    tap(t0 + Duration::from_millis(700));
    h.app.tick(t0 + Duration::from_millis(800)).unwrap();
    assert_eq!(h.commands.try_recv().unwrap(), Command::Next);
}
