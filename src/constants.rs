//! This module contains defaults and tuning constants shared across the panel.

use std::time::Duration;

/// AudioControl REST root when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:1080/api";

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("NowPanel/", env!("CARGO_PKG_VERSION"));

// Poller
/// Base poll cadence; keeps the position roughly live.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Retry interval growth stops here.
pub const DEFAULT_BACKOFF_CEILING: Duration = Duration::from_secs(30);
/// Consecutive failures before the panel shows the error presentation.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
/// upper bound for configured poll and backoff intervals
pub const MAX_INTERVAL: Duration = Duration::from_secs(86_400);
/// Now-playing request timeout.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Artwork download timeout.
pub const ART_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

// Channels
pub const COMMAND_QUEUE_DEPTH: usize = 16;
pub const EVENT_QUEUE_DEPTH: usize = 64;

// Art cache
/// Decoded covers kept resident, the current one included.
pub const DEFAULT_ART_CACHE_CAPACITY: usize = 3;

// Render loop
pub const DEFAULT_FPS: u32 = 30;
/// Floor for the adaptive pacer on slow panels.
pub const MIN_FPS: u32 = 1;

// Input
/// Repeated touch-down on the same region inside this window is ignored.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);
/// Volume buttons step by this many percent.
pub const VOLUME_STEP: i8 = 5;

// Screensaver, raw backlight levels
pub const BRIGHTNESS_ON: u8 = 16;
pub const BRIGHTNESS_DIMMED: u8 = 5;
pub const BRIGHTNESS_OFF: u8 = 0;
pub const DEFAULT_DIM_AFTER: Duration = Duration::from_secs(60);
pub const DEFAULT_OFF_AFTER: Duration = Duration::from_secs(600);
/// Shortest accepted dim timeout, off must trail dim by at least this much too.
pub const MIN_SCREENSAVER_STEP: Duration = Duration::from_secs(5);
/// Nothing dims this soon after startup.
pub const SCREENSAVER_SETTLE: Duration = Duration::from_secs(1);

// Lifecycle
/// Background tasks get this long to wind down before they are abandoned.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

// Panels without a size of their own (mock, emulator)
pub const DEFAULT_PANEL_SIZE: (u32, u32) = (800, 480);
/// Demo playlist advances this far, once per tick.
pub const DEMO_TICK: Duration = Duration::from_secs(1);
