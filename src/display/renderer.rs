/*
 *  display/renderer.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Frame compositor: background, art, text, progress, buttons, slider
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

use std::time::Instant;

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Circle, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle, StrokeAlignment,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use embedded_graphics::text::renderer::TextRenderer;

use crate::artcache::{ArtHandle, ArtImage};
use crate::deutils::seconds_to_hms;
use crate::display::color::Palette;
use crate::display::icons::{draw_album_placeholder, draw_button_glyph, GlyphState};
use crate::display::layout::{DisplayConfig, LayoutGeometry, RegionId, Template};
use crate::display::text::{ellipsize, printable, style_for_height, wrap_two_lines};
use crate::nowplaying::NowPlayingState;

/// progress bars shorter than this get no time labels
const MIN_LABEL_BAND: u32 = 20;

/// Everything that changes frame to frame
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    /// None until the first snapshot arrives
    pub state: Option<&'a NowPlayingState>,
    pub art: &'a ArtHandle,
    /// replaces the album line, e.g. while unreachable
    pub status: Option<&'a str>,
    pub now: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    palette: Palette,
}

impl Renderer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Draw one whole frame in logical coordinates.
    ///
    /// Pure with respect to its inputs, drawing the same scene twice gives
    /// the same pixels.
    pub fn render<D>(&self, target: &mut D, scene: &Scene<'_>, geometry: &LayoutGeometry, config: &DisplayConfig) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let p = &self.palette;
        target.clear(p.background)?;

        let centered = geometry.template != Template::Landscape;

        if let Some(art) = geometry.region(RegionId::Art) {
            match scene.art.image() {
                Some(img) => self.draw_art(target, img, &art.logical)?,
                None => draw_album_placeholder(target, &art.logical, p.art_frame, p.art_glyph)?,
            }
        }

        let (title, artist, album) = match scene.state {
            Some(s) => (printable(&s.title), printable(&s.artist), printable(&s.album)),
            None => Default::default(),
        };

        if let Some(r) = geometry.region(RegionId::Title) {
            let style = style_for_height(r.logical.size.height / 2, true, p.title);
            let lines = wrap_two_lines(&style, &title, r.logical.size.width);
            let line_h = style.line_height() as i32;
            for (i, line) in lines.iter().enumerate() {
                let y = r.logical.top_left.y + i as i32 * line_h;
                draw_line(target, line, &r.logical, y, centered, style.clone())?;
            }
        }
        if let Some(r) = geometry.region(RegionId::Artist) {
            let style = style_for_height(r.logical.size.height, false, p.artist);
            let line = ellipsize(&style, &artist, r.logical.size.width);
            draw_line(target, &line, &r.logical, r.logical.top_left.y, centered, style)?;
        }
        if let Some(r) = geometry.region(RegionId::Album) {
            let (text, color) = match scene.status {
                Some(status) => (status.to_string(), p.status),
                None => (album, p.album),
            };
            let style = style_for_height(r.logical.size.height, false, color);
            let line = ellipsize(&style, &text, r.logical.size.width);
            draw_line(target, &line, &r.logical, r.logical.top_left.y, centered, style)?;
        }

        if let Some(r) = geometry.region(RegionId::Progress) {
            self.draw_progress(target, scene, &r.logical)?;
        }

        let glyphs = scene
            .state
            .map(|s| GlyphState { playing: s.is_playing, liked: s.is_liked })
            .unwrap_or_default();
        for (id, region) in geometry.buttons() {
            let Some(colors) = p.button(config.button_style, id) else { break };
            let area = region.logical;
            let hollow = match colors.background {
                Some(bg) => {
                    let corner = if geometry.template == Template::Circle {
                        area.size.width.min(area.size.height) / 2
                    } else {
                        area.size.width.min(area.size.height) / 5
                    };
                    RoundedRectangle::with_equal_corners(area, Size::new(corner, corner))
                        .into_styled(PrimitiveStyle::with_fill(bg))
                        .draw(target)?;
                    bg
                }
                None => p.background,
            };
            draw_button_glyph(target, id, &area, colors.icon, hollow, glyphs)?;
        }

        if config.show_volume_slider {
            if let Some(r) = geometry.region(RegionId::VolumeSlider) {
                let volume = scene.state.and_then(|s| s.volume_percent).unwrap_or(0);
                self.draw_slider(target, &r.logical, volume)?;
            }
        }

        if let Some(bezel) = geometry.bezel {
            let outline = PrimitiveStyleBuilder::new()
                .stroke_color(p.bezel)
                .stroke_width(2)
                .stroke_alignment(StrokeAlignment::Inside)
                .build();
            bezel.into_styled(outline).draw(target)?;
        }
        Ok(())
    }

    /// Nearest neighbour fit, centred, letterboxed in the frame color.
    fn draw_art<D>(&self, target: &mut D, img: &ArtImage, area: &Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let (rw, rh) = (area.size.width, area.size.height);
        if img.width == 0 || img.height == 0 || rw == 0 || rh == 0 {
            return draw_album_placeholder(target, area, self.palette.art_frame, self.palette.art_glyph);
        }
        let scale = (rw as f32 / img.width as f32).min(rh as f32 / img.height as f32);
        let dw = ((img.width as f32 * scale).round() as u32).clamp(1, rw);
        let dh = ((img.height as f32 * scale).round() as u32).clamp(1, rh);
        if dw < rw || dh < rh {
            area.into_styled(PrimitiveStyle::with_fill(self.palette.art_frame)).draw(target)?;
        }
        let offset = Point::new(((rw - dw) / 2) as i32, ((rh - dh) / 2) as i32);
        let fit = Rectangle::new(area.top_left + offset, Size::new(dw, dh));
        let fallback = self.palette.art_frame;
        let (iw, ih) = (img.width, img.height);
        let pixels = (0..dh).flat_map(move |y| {
            (0..dw).map(move |x| img.pixel(x * iw / dw, y * ih / dh).unwrap_or(fallback))
        });
        target.fill_contiguous(&fit, pixels)
    }

    /// Bar on top; elapsed and total under it when the band is tall enough.
    fn draw_progress<D>(&self, target: &mut D, scene: &Scene<'_>, area: &Rectangle) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let p = &self.palette;
        let labels = scene.state.filter(|s| s.duration_seconds > 0.0 && area.size.height >= MIN_LABEL_BAND);
        let bar_h = if labels.is_some() { (area.size.height / 3).max(4) } else { area.size.height };
        let bar = Rectangle::new(area.top_left, Size::new(area.size.width, bar_h));
        let corner = Size::new(bar_h / 2, bar_h / 2);

        RoundedRectangle::with_equal_corners(bar, corner)
            .into_styled(PrimitiveStyle::with_fill(p.track))
            .draw(target)?;

        let fraction = scene.state.map(|s| s.progress_at(scene.now)).unwrap_or(0.0);
        let filled = (bar.size.width as f32 * fraction).round() as u32;
        if filled > 0 {
            RoundedRectangle::with_equal_corners(Rectangle::new(bar.top_left, Size::new(filled, bar_h)), corner)
                .into_styled(PrimitiveStyle::with_fill(p.fill))
                .draw(target)?;
        }

        if let Some(state) = labels {
            let band = area.size.height - bar_h;
            let style = style_for_height(band, false, p.artist);
            let y = area.top_left.y + bar_h as i32 + 1;
            let left = Point::new(area.top_left.x, y);
            let right = Point::new(area.top_left.x + area.size.width as i32 - 1, y);
            let elapsed = seconds_to_hms(state.position_at(scene.now) as f32);
            let total = seconds_to_hms(state.duration_seconds as f32);
            Text::with_text_style(&elapsed, left, style.clone(), text_style(Alignment::Left)).draw(target)?;
            Text::with_text_style(&total, right, style, text_style(Alignment::Right)).draw(target)?;
        }
        Ok(())
    }

    /// Track along the long axis, filled up to `volume`, with a knob.
    fn draw_slider<D>(&self, target: &mut D, area: &Rectangle, volume: u8) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let p = &self.palette;
        let fraction = volume.min(100) as f32 / 100.0;
        let horizontal = area.size.width >= area.size.height;
        let (long, short) = if horizontal {
            (area.size.width, area.size.height)
        } else {
            (area.size.height, area.size.width)
        };
        let thick = (short / 3).max(2);
        let c = area.center();
        let corner = Size::new(thick / 2, thick / 2);

        let (track, fill, knob_at) = if horizontal {
            let track = Rectangle::with_center(c, Size::new(long, thick));
            let len = (long as f32 * fraction).round() as u32;
            let fill = Rectangle::new(track.top_left, Size::new(len, thick));
            (track, fill, Point::new(area.top_left.x + len.min(long.saturating_sub(1)) as i32, c.y))
        } else {
            let track = Rectangle::with_center(c, Size::new(thick, long));
            let len = (long as f32 * fraction).round() as u32;
            let bottom = area.top_left.y + long as i32;
            let fill = Rectangle::new(Point::new(track.top_left.x, bottom - len as i32), Size::new(thick, len));
            (track, fill, Point::new(c.x, (bottom - 1 - len as i32).max(area.top_left.y)))
        };

        RoundedRectangle::with_equal_corners(track, corner)
            .into_styled(PrimitiveStyle::with_fill(p.track))
            .draw(target)?;
        if fill.size.width > 0 && fill.size.height > 0 {
            RoundedRectangle::with_equal_corners(fill, corner)
                .into_styled(PrimitiveStyle::with_fill(p.fill))
                .draw(target)?;
        }
        Circle::with_center(knob_at, short.max(3))
            .into_styled(PrimitiveStyle::with_fill(p.knob))
            .draw(target)?;
        Ok(())
    }
}

fn text_style(alignment: Alignment) -> embedded_graphics::text::TextStyle {
    TextStyleBuilder::new().alignment(alignment).baseline(Baseline::Top).build()
}

fn draw_line<D, S>(target: &mut D, line: &str, area: &Rectangle, y: i32, centered: bool, style: S) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
    S: TextRenderer<Color = Rgb888>,
{
    if line.is_empty() {
        return Ok(());
    }
    let (x, alignment) = if centered {
        (area.center().x, Alignment::Center)
    } else {
        (area.top_left.x, Alignment::Left)
    };
    Text::with_text_style(line, Point::new(x, y), style, text_style(alignment)).draw(target)?;
    Ok(())
}
