/*
 *  display/color.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Palette and per-style button colors
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

use embedded_graphics::pixelcolor::{IntoStorage, Rgb565, Rgb888};
use embedded_graphics::prelude::*;

use crate::display::layout::{ButtonId, ButtonStyle};

/// Colors for one button: `background` is None when only the glyph is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonColors {
    pub background: Option<Rgb888>,
    pub icon: Rgb888,
}

/// Every color the compositor uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgb888,
    pub title: Rgb888,
    pub artist: Rgb888,
    pub album: Rgb888,
    pub status: Rgb888,
    pub art_frame: Rgb888,
    pub art_glyph: Rgb888,
    pub track: Rgb888,
    pub fill: Rgb888,
    pub knob: Rgb888,
    pub bezel: Rgb888,
    pub transport: Rgb888,
    pub play: Rgb888,
    pub like: Rgb888,
    pub mono: Rgb888,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgb888::new(240, 240, 240),
            title: Rgb888::new(30, 30, 30),
            artist: Rgb888::new(100, 100, 100),
            album: Rgb888::new(100, 100, 100),
            status: Rgb888::new(170, 40, 40),
            art_frame: Rgb888::new(100, 100, 100),
            art_glyph: Rgb888::new(200, 200, 200),
            track: Rgb888::new(200, 200, 200),
            fill: Rgb888::new(30, 150, 30),
            knob: Rgb888::new(60, 60, 60),
            bezel: Rgb888::new(180, 180, 180),
            transport: Rgb888::new(60, 60, 60),
            play: Rgb888::new(30, 150, 30),
            like: Rgb888::new(200, 50, 50),
            mono: Rgb888::new(80, 80, 80),
        }
    }
}

impl Palette {
    fn accent(&self, id: ButtonId) -> Rgb888 {
        match id {
            ButtonId::PlayPause => self.play,
            ButtonId::Like => self.like,
            ButtonId::Previous | ButtonId::Next | ButtonId::VolumeDown | ButtonId::VolumeUp => self.transport,
        }
    }

    /// Colors for `id` in `style`; None when buttons are not drawn at all
    pub fn button(&self, style: ButtonStyle, id: ButtonId) -> Option<ButtonColors> {
        match style {
            ButtonStyle::Normal => Some(ButtonColors { background: Some(self.accent(id)), icon: Rgb888::WHITE }),
            ButtonStyle::BlackAndWhite => Some(ButtonColors { background: Some(self.mono), icon: Rgb888::WHITE }),
            ButtonStyle::Minimal => Some(ButtonColors { background: None, icon: self.accent(id) }),
            ButtonStyle::None => None,
        }
    }
}

/// Pack for 16 bit panels
#[inline]
pub fn to_rgb565_bytes(c: Rgb888) -> [u8; 2] {
    let packed: Rgb565 = c.into();
    packed.into_storage().to_le_bytes()
}

/// Pack for 32 bit XRGB panels (little endian B, G, R, X)
#[inline]
pub fn to_xrgb8888_bytes(c: Rgb888) -> [u8; 4] {
    [c.b(), c.g(), c.r(), 0xff]
}
