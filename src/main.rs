/*
 *  main.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Startup, task wiring and graceful shutdown
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

use anyhow::Context;
use env_logger::Env;
use log::{error, info, warn};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use nowpanel::app::{App, AppLinks, AppOptions};
use nowpanel::artcache::DefaultArtSource;
use nowpanel::config::{self, DriverKind, Settings};
use nowpanel::constants::{COMMAND_QUEUE_DEPTH, DEFAULT_PANEL_SIZE, DEMO_TICK, EVENT_QUEUE_DEPTH, SHUTDOWN_GRACE};
use nowpanel::demo::{run_demo, DemoGenerator};
use nowpanel::display::drivers::mock::MockDriver;
use nowpanel::display::traits::DisplayDriver;
use nowpanel::httprpc::AudioControlClient;
use nowpanel::input::TouchEvent;
use nowpanel::nowplaying::handoff;
use nowpanel::poller::DataPoller;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP and logs which one arrived.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

fn app_options(settings: &Settings) -> AppOptions {
    AppOptions {
        demo: settings.demo,
        debounce: settings.debounce,
        art_cache_capacity: settings.art_cache_capacity,
        screensaver: settings.screensaver,
        ..AppOptions::default()
    }
}

/// Evdev touch reader, when a device is configured
#[cfg(target_os = "linux")]
fn spawn_touch(
    settings: &Settings,
    panel: (u32, u32),
    touches: mpsc::UnboundedSender<TouchEvent>,
    cancel: &CancellationToken,
    tasks: &mut JoinSet<()>,
) {
    use nowpanel::input::evdev::{spawn_reader, TouchCalibration};

    let Some(device) = settings.touch_device.clone() else {
        warn!("no touch device configured, display only");
        return;
    };
    let calibration = settings.touch_calibration.map(|c| TouchCalibration {
        x_min: c.x_min,
        x_max: c.x_max,
        y_min: c.y_min,
        y_max: c.y_max,
        width: panel.0,
        height: panel.1,
    });
    let reader = spawn_reader(device, calibration, touches, cancel.clone());
    tasks.spawn(async move {
        match reader.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("touch reader: {}", e),
            Err(e) if e.is_cancelled() => {}
            Err(e) => error!("touch reader panicked: {}", e),
        }
    });
}

#[cfg(not(target_os = "linux"))]
fn spawn_touch(
    settings: &Settings,
    _panel: (u32, u32),
    _touches: mpsc::UnboundedSender<TouchEvent>,
    _cancel: &CancellationToken,
    _tasks: &mut JoinSet<()>,
) {
    if settings.touch_device.is_some() {
        warn!("evdev touch input is only available on Linux");
    }
}

/// Render on `driver` until cancelled
async fn drive<D: DisplayDriver>(
    driver: D,
    settings: &Settings,
    links: AppLinks,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let (width, height) = driver.dimensions();
    let app = App::new(
        driver,
        settings.layout_config(width, height),
        app_options(settings),
        DefaultArtSource::new()?,
        links,
    );
    app.run(settings.fps, cancel).await.context("display")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = config::load()?;

    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str()))
        .format_timestamp_secs()
        .init();

    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match signal_handler().await {
                Ok(()) => cancel.cancel(),
                Err(e) => error!("signal handler: {}", e),
            }
        });
    }

    let (publisher, state) = handoff();
    let (events_tx, events) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let (commands, commands_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let (touches_tx, touches) = mpsc::unbounded_channel();
    let links = AppLinks { state, events, commands, touches };

    let mut tasks = JoinSet::new();
    if settings.demo {
        info!("demo mode, no player is contacted");
        tasks.spawn(run_demo(DemoGenerator::new(DEMO_TICK), DEMO_TICK, publisher, events_tx, commands_rx, cancel.clone()));
    } else {
        let client = AudioControlClient::new(&settings.api_url)?;
        info!("now playing from {}", client.base());
        let poller = DataPoller::new(client, settings.poller, publisher, events_tx, commands_rx, cancel.clone());
        tasks.spawn(poller.run());
    }

    let result = match settings.driver {
        #[cfg(target_os = "linux")]
        DriverKind::Fbdev => {
            let driver = nowpanel::display::drivers::fbdev::FbdevDriver::open(settings.display_index)
                .with_context(|| format!("opening /dev/fb{}", settings.display_index))?;
            if let Some((w, h)) = settings.size {
                if (w, h) != driver.dimensions() {
                    warn!("configured size {}x{} ignored, the framebuffer reports its own", w, h);
                }
            }
            spawn_touch(&settings, driver.dimensions(), touches_tx, &cancel, &mut tasks);
            drive(driver, &settings, links, cancel.clone()).await
        }
        #[cfg(not(target_os = "linux"))]
        DriverKind::Fbdev => Err(anyhow::anyhow!("the fbdev driver is only available on Linux")),

        DriverKind::Mock => {
            let (w, h) = settings.size.unwrap_or(DEFAULT_PANEL_SIZE);
            info!("mock display {}x{}, nothing will be shown", w, h);
            spawn_touch(&settings, (w, h), touches_tx, &cancel, &mut tasks);
            drive(MockDriver::new(w, h), &settings, links, cancel.clone()).await
        }

        #[cfg(feature = "emulator")]
        DriverKind::Emulator => run_emulator(&settings, links, touches_tx, cancel.clone()),
        #[cfg(not(feature = "emulator"))]
        DriverKind::Emulator => Err(anyhow::anyhow!("build with --features emulator to use the emulator")),
    };

    // stop the poller or demo task, then give everything a bounded grace period
    cancel.cancel();
    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("background tasks still running after {:?}, abandoning them", SHUTDOWN_GRACE);
        tasks.abort_all();
    }

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    info!("{} stopped", env!("CARGO_PKG_NAME"));
    result
}

/// Window on the main thread (winit requires it), render loop on the runtime.
#[cfg(feature = "emulator")]
fn run_emulator(
    settings: &Settings,
    links: AppLinks,
    touches: mpsc::UnboundedSender<TouchEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    use nowpanel::display::drivers::emulator::EmulatorDriver;
    use nowpanel::display::emulator_window::{EmulatorWindow, EmulatorWindowConfig};

    let (w, h) = settings.size.unwrap_or(DEFAULT_PANEL_SIZE);
    let driver = EmulatorDriver::new(w, h, settings.rotation);
    let state = driver.state();
    let finished = driver.state();

    let settings_for_app = settings.clone();
    let app_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = drive(driver, &settings_for_app, links, app_cancel).await {
            error!("emulator render loop: {:#}", e);
        }
        // the window closes once the render loop has wound down
        finished.lock().unwrap_or_else(|p| p.into_inner()).finished = true;
    });

    info!("emulator {}x{}, close the window or press Ctrl+C to exit", w, h);
    EmulatorWindow::new(state, EmulatorWindowConfig::default(), touches, cancel)
        .run()
        .map_err(|e| anyhow::anyhow!("emulator window: {}", e))
}
