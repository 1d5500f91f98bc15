/*
 *  display/drivers/mock.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Headless display driver, for tests and running without a panel
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

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::display::error::DisplayError;
use crate::display::traits::{ColorDepth, DisplayCapabilities, DisplayDriver};
use crate::display::vframebuf::VarFrameBuf;
use crate::geometry::Rotation;

/// Display driver with no hardware behind it.
///
/// Every operation is recorded in a shared [`MockDriverState`] so a test can
/// keep a handle after the driver has been moved into the render loop.
#[derive(Debug)]
pub struct MockDriver {
    framebuffer: VarFrameBuf<Rgb888>,
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockDriverState>>,
}

/// Shared, inspectable record of what the driver was asked to do
#[derive(Debug, Default)]
pub struct MockDriverState {
    pub init_count: usize,
    pub flush_count: usize,
    pub clear_count: usize,
    pub is_initialized: bool,

    /// Every backlight level set, in order
    pub brightness: Vec<u8>,

    /// Framebuffer contents at the last flush
    pub last_frame: Vec<Rgb888>,

    /// Delivered on the next `poll_rotation`
    pub pending_rotation: Option<Rotation>,

    /// Simulate failures (for error testing)
    pub simulate_flush_failure: bool,
    pub simulate_init_failure: bool,
}

impl MockDriverState {
    pub fn last_brightness(&self) -> Option<u8> {
        self.brightness.last().copied()
    }
}

impl MockDriver {
    pub fn new(width: u32, height: u32) -> Self {
        let capabilities = DisplayCapabilities {
            width,
            height,
            color_depth: ColorDepth::Xrgb8888,
            max_fps: 60,
            supports_brightness: true,
            reports_rotation: true,
        };
        Self {
            framebuffer: VarFrameBuf::new(width, height, Rgb888::BLACK),
            capabilities,
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Handle for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        self.framebuffer.pixel(x, y)
    }

    fn lock(&self) -> MutexGuard<'_, MockDriverState> {
        // a panicking test thread must not wedge the driver
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplayDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let mut state = self.lock();
        if state.simulate_init_failure {
            return Err(DisplayError::InitializationFailed("Simulated init failure".to_string()));
        }
        state.init_count += 1;
        state.is_initialized = true;
        Ok(())
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.lock().brightness.push(value);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let frame = self.framebuffer.as_slice().to_vec();
        let mut state = self.lock();
        if state.simulate_flush_failure {
            return Err(DisplayError::Other("Simulated flush failure".to_string()));
        }
        state.flush_count += 1;
        state.last_frame = frame;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.lock().clear_count += 1;
        self.framebuffer.clear(Rgb888::BLACK).map_err(|never| -> DisplayError { match never {} })?;
        self.flush()
    }

    fn framebuffer_mut(&mut self) -> &mut VarFrameBuf<Rgb888> {
        &mut self.framebuffer
    }

    fn poll_rotation(&mut self) -> Option<Rotation> {
        self.lock().pending_rotation.take()
    }
}
