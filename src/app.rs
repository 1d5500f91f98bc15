/*
 *  app.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Render and input loop: touches in, commands out, one frame per tick
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
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::app_state::{AppState, AppStateMachine};
use crate::artcache::{ArtCache, ArtSource};
use crate::constants::{BRIGHTNESS_OFF, BRIGHTNESS_ON, DEBOUNCE_WINDOW, DEFAULT_ART_CACHE_CAPACITY, MIN_FPS};
use crate::display::color::Palette;
use crate::display::error::DisplayError;
use crate::display::layout::{compute, DisplayConfig, LayoutEngine, LayoutGeometry, RegionId};
use crate::display::renderer::{Renderer, Scene};
use crate::display::rotated::RotatedTarget;
use crate::display::traits::DisplayDriver;
use crate::geometry::Rotation;
use crate::input::{InputDispatcher, TouchEvent};
use crate::nowplaying::StateReader;
use crate::pacer::AutoPacer;
use crate::poller::{Command, PollerEvent};
use crate::screensaver::{Screensaver, ScreensaverConfig};

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub demo: bool,
    pub debounce: Duration,
    pub art_cache_capacity: usize,
    pub screensaver: ScreensaverConfig,
    pub palette: Palette,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            demo: false,
            debounce: DEBOUNCE_WINDOW,
            art_cache_capacity: DEFAULT_ART_CACHE_CAPACITY,
            screensaver: ScreensaverConfig::default(),
            palette: Palette::default(),
        }
    }
}

/// Channel ends the render loop owns
pub struct AppLinks {
    /// latest snapshot from the poller or the demo generator
    pub state: StateReader,
    pub events: mpsc::Receiver<PollerEvent>,
    pub commands: mpsc::Sender<Command>,
    pub touches: mpsc::UnboundedReceiver<TouchEvent>,
}

pub struct App<D: DisplayDriver, S: ArtSource> {
    driver: D,
    config: DisplayConfig,
    layout: LayoutEngine,
    dispatcher: InputDispatcher,
    machine: AppStateMachine,
    screensaver: Screensaver,
    renderer: Renderer,
    art: ArtCache<S>,
    links: AppLinks,
    blanked: bool,
    brightness_warned: bool,
}

/// Longest art edge over every rotation, covers are decoded to this once.
pub fn largest_art_edge(config: &DisplayConfig) -> u32 {
    Rotation::ALL
        .iter()
        .filter_map(|&rotation| {
            let geometry = compute(&DisplayConfig { rotation, ..*config }, true);
            geometry.region(RegionId::Art).map(|r| r.logical.size.width.max(r.logical.size.height))
        })
        .max()
        .unwrap_or(0)
}

impl<D: DisplayDriver, S: ArtSource> App<D, S> {
    pub fn new(driver: D, config: DisplayConfig, options: AppOptions, art_source: S, links: AppLinks) -> Self {
        let art = ArtCache::new(art_source, options.art_cache_capacity, largest_art_edge(&config));
        Self {
            driver,
            config,
            layout: LayoutEngine::new(),
            dispatcher: InputDispatcher::new(options.debounce),
            machine: AppStateMachine::new(options.demo),
            screensaver: Screensaver::new(options.screensaver, Instant::now()),
            renderer: Renderer::new(options.palette),
            art,
            links,
            blanked: false,
            brightness_warned: false,
        }
    }

    pub fn state(&self) -> AppState {
        self.machine.state()
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn art_mut(&mut self) -> &mut ArtCache<S> {
        &mut self.art
    }

    /// Geometry the next frame will use
    pub fn geometry(&mut self) -> Arc<LayoutGeometry> {
        self.layout.geometry(&self.config)
    }

    /// Bring the panel up. A failure here is fatal to the process.
    pub fn start(&mut self) -> Result<(), DisplayError> {
        self.driver.init()?;
        self.set_brightness(BRIGHTNESS_ON);
        self.machine.bootstrap();
        let caps = self.driver.capabilities();
        info!(
            "panel {}x{} {:?}, layout {:?} rotation {}",
            caps.width,
            caps.height,
            caps.color_depth,
            self.config.template(),
            self.config.rotation.degrees()
        );
        Ok(())
    }

    /// One frame: touches, poller events, art, backlight, draw, flush.
    /// Returns how long the flush took.
    pub fn tick(&mut self, now: Instant) -> Result<Duration, DisplayError> {
        // a rotation change draws this frame on the old geometry, the next one recomputes
        let stale = self.layout.current();
        let mut rotated = false;
        if let Some(rotation) = self.driver.poll_rotation() {
            if rotation != self.config.rotation {
                info!("rotation {} -> {}", self.config.rotation.degrees(), rotation.degrees());
                self.config.rotation = rotation;
                rotated = true;
            }
        }
        let geometry = match stale {
            Some(geometry) if rotated => geometry,
            _ => self.layout.geometry(&self.config),
        };
        let frame_config = DisplayConfig { rotation: geometry.rotation, ..self.config };

        while let Ok(touch) = self.links.touches.try_recv() {
            if self.screensaver.touch(touch.at) {
                self.set_brightness(BRIGHTNESS_ON);
                continue;
            }
            if let Some(action) = self.dispatcher.dispatch(&touch, &geometry, &frame_config) {
                debug!("touch {:?} -> {:?}", touch.position, action);
                self.send(Command::from(action));
            }
        }

        while let Ok(event) = self.links.events.try_recv() {
            self.machine.on_poller_event(&event);
        }

        let latest = self.links.state.latest();
        let art = self.art.get_or_fetch(latest.as_ref().and_then(|s| s.artwork_ref.as_deref()));

        let is_playing = latest.as_ref().is_some_and(|s| s.is_playing);
        if let Some(level) = self.screensaver.update(now, is_playing) {
            self.set_brightness(level);
        }

        let framebuffer = self.driver.framebuffer_mut();
        if self.screensaver.level() == BRIGHTNESS_OFF {
            // panels without a backlight control still go dark
            if self.blanked {
                return Ok(Duration::ZERO);
            }
            framebuffer.clear(Rgb888::BLACK).map_err(|never| -> DisplayError { match never {} })?;
            self.blanked = true;
        } else {
            self.blanked = false;
            let scene = Scene {
                state: latest.as_deref(),
                art: &art,
                status: self.machine.state().status_line(),
                now,
            };
            let mut target = RotatedTarget::new(framebuffer, geometry.rotation);
            self.renderer
                .render(&mut target, &scene, &geometry, &frame_config)
                .map_err(|never| -> DisplayError { match never {} })?;
        }

        let started = Instant::now();
        self.driver.flush()?;
        Ok(started.elapsed())
    }

    /// Render until `cancel` fires, then shut down.
    pub async fn run(mut self, fps: u32, cancel: CancellationToken) -> Result<D, DisplayError> {
        self.start()?;

        let max_fps = fps.min(self.driver.capabilities().max_fps).max(MIN_FPS);
        let mut pacer = AutoPacer::new(max_fps, max_fps, MIN_FPS);
        let mut failing = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = pacer.wait() => {}
            }
            match self.tick(Instant::now()) {
                Ok(flush) => {
                    if failing {
                        info!("display flush recovered");
                        failing = false;
                    }
                    pacer.record_flush_ms(flush.as_secs_f32() * 1000.0);
                }
                Err(e) => {
                    if !failing {
                        error!("frame failed: {}", e);
                        failing = true;
                    }
                }
            }
        }

        self.stop();
        Ok(self.driver)
    }

    /// Terminal state, abandon art fetches, blank the panel.
    pub fn stop(&mut self) {
        self.machine.shutdown();
        self.art.shutdown();
        if let Err(e) = self.driver.clear() {
            warn!("clearing display on shutdown: {}", e);
        }
    }

    fn send(&mut self, command: Command) {
        match self.links.commands.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => warn!("command queue full, dropped {:?}", command),
            Err(TrySendError::Closed(command)) => debug!("no one to send {:?} to", command),
        }
    }

    fn set_brightness(&mut self, level: u8) {
        if let Err(e) = self.driver.set_brightness(level) {
            if !self.brightness_warned {
                warn!("backlight: {}", e);
                self.brightness_warned = true;
            }
        }
    }
}
