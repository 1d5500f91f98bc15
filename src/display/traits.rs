/*
 *  display/traits.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use embedded_graphics::pixelcolor::Rgb888;

use crate::display::error::DisplayError;
use crate::display::vframebuf::VarFrameBuf;
use crate::geometry::Rotation;

/// Pixel layout the panel expects on flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    /// 16 bit RGB565, typical for SPI TFT framebuffers
    Rgb565,

    /// 32 bit XRGB8888, HDMI/DSI panels and the emulator
    Xrgb8888,
}

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Physical width in pixels
    pub width: u32,

    /// Physical height in pixels
    pub height: u32,

    pub color_depth: ColorDepth,

    /// Maximum recommended frame rate
    pub max_fps: u32,

    /// Whether set_brightness reaches a real backlight
    pub supports_brightness: bool,

    /// Whether the backend can report runtime rotation changes
    pub reports_rotation: bool,
}

/// Minimal hardware abstraction every backend implements.
///
/// Drawing always happens into the driver's RGB framebuffer in physical
/// orientation; `flush` converts and pushes it to the panel.
pub trait DisplayDriver: Send {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Prepare the device for rendering
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Set backlight level (raw device units)
    ///
    /// Returns an error if the display doesn't support brightness control.
    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError>;

    /// Push the framebuffer to the panel
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// Clear the display to black and flush
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Physical-orientation drawing surface
    fn framebuffer_mut(&mut self) -> &mut VarFrameBuf<Rgb888>;

    /// Rotation change reported by the backend since the last call
    fn poll_rotation(&mut self) -> Option<Rotation> {
        None
    }
}
