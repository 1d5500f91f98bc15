/*
 *  display/drivers/emulator.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Desktop emulator driver, frames are handed to the emulator window
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

use crate::constants::BRIGHTNESS_ON;
use crate::display::error::DisplayError;
use crate::display::traits::{ColorDepth, DisplayCapabilities, DisplayDriver};
use crate::display::vframebuf::VarFrameBuf;
use crate::geometry::Rotation;

/// Shared between the driver (render loop) and the window (main thread)
#[derive(Debug)]
pub struct EmulatorState {
    /// Last flushed frame as RGBA
    pub buffer: Vec<[u8; 4]>,

    pub width: u32,
    pub height: u32,

    /// Raw backlight level, same units as the panel
    pub brightness: u8,

    /// Layout rotation as last cycled from the keyboard
    pub rotation: Rotation,

    /// Handed to the render loop on its next poll
    pub pending_rotation: Option<Rotation>,

    pub frame_count: u64,

    /// Set once the render loop has shut down; the window closes after it
    pub finished: bool,
}

pub struct EmulatorDriver {
    framebuffer: VarFrameBuf<Rgb888>,
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<EmulatorState>>,
}

impl EmulatorDriver {
    pub fn new(width: u32, height: u32, rotation: Rotation) -> Self {
        let capabilities = DisplayCapabilities {
            width,
            height,
            color_depth: ColorDepth::Xrgb8888,
            max_fps: 60,
            supports_brightness: true,
            reports_rotation: true,
        };
        let state = Arc::new(Mutex::new(EmulatorState {
            buffer: vec![[0, 0, 0, 255]; (width * height) as usize],
            width,
            height,
            brightness: BRIGHTNESS_ON,
            rotation,
            pending_rotation: None,
            frame_count: 0,
            finished: false,
        }));
        Self { framebuffer: VarFrameBuf::new(width, height, Rgb888::BLACK), capabilities, state }
    }

    /// Handle for the window
    pub fn state(&self) -> Arc<Mutex<EmulatorState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, EmulatorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplayDriver for EmulatorDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.framebuffer.clear(Rgb888::BLACK).map_err(|never| -> DisplayError { match never {} })?;
        self.flush()
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        self.lock().brightness = value;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let expected = (self.capabilities.width * self.capabilities.height) as usize;
        let pixels = self.framebuffer.as_slice();
        if pixels.len() != expected {
            return Err(DisplayError::BufferSizeMismatch { expected, actual: pixels.len() });
        }
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for (out, px) in state.buffer.iter_mut().zip(pixels) {
            *out = [px.r(), px.g(), px.b(), 255];
        }
        state.frame_count += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_publishes_rgba() {
        let mut driver = EmulatorDriver::new(4, 2, Rotation::Deg0);
        driver.framebuffer_mut().clear(Rgb888::new(10, 20, 30)).unwrap();
        driver.flush().unwrap();
        let state = driver.state();
        let s = state.lock().unwrap();
        assert_eq!(s.buffer[7], [10, 20, 30, 255]);
        assert_eq!(s.frame_count, 1);
    }

    #[test]
    fn test_rotation_handoff() {
        let mut driver = EmulatorDriver::new(4, 2, Rotation::Deg0);
        driver.state().lock().unwrap().pending_rotation = Some(Rotation::Deg270);
        assert_eq!(driver.poll_rotation(), Some(Rotation::Deg270));
        assert_eq!(driver.poll_rotation(), None);
    }
}
