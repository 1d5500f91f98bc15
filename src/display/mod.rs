/*
 *  display/mod.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem: layout, compositor and panel drivers
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod vframebuf;
pub mod rotated;
pub mod color;

// Drawing
pub mod text;
pub mod icons;
pub mod layout;
pub mod renderer;

// Panel drivers
pub mod drivers;

// Emulator window (only with emulator feature)
#[cfg(feature = "emulator")]
pub mod emulator_window;

// Re-exports for convenience
pub use traits::{ColorDepth, DisplayCapabilities, DisplayDriver};
pub use error::DisplayError;
pub use vframebuf::VarFrameBuf;
pub use rotated::RotatedTarget;
pub use color::Palette;
pub use layout::{
    ButtonId, ButtonStyle, ControlSet, DisplayConfig, LayoutEngine, LayoutGeometry, LayoutMode, Region, RegionId,
    Template,
};
pub use renderer::{Renderer, Scene};
