/*
 *  display/icons.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Button glyphs and the album placeholder, drawn from primitives so they
 *  scale with the region
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
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle, Rectangle, Triangle};

use crate::display::layout::ButtonId;

/// Glyph state that depends on playback
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphState {
    pub playing: bool,
    pub liked: bool,
}

/// Draw the glyph for `id` centred in `area`.
///
/// `hollow` is the color behind the glyph, used to cut out the unliked heart.
pub fn draw_button_glyph<D>(
    target: &mut D,
    id: ButtonId,
    area: &Rectangle,
    color: Rgb888,
    hollow: Rgb888,
    state: GlyphState,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let c = area.center();
    // glyph box is half the button
    let s = (area.size.width.min(area.size.height) / 2).max(4) as i32;
    let half = s / 2;
    let fill = PrimitiveStyle::with_fill(color);

    match id {
        ButtonId::PlayPause if state.playing => {
            let bar = (s / 3).max(1) as u32;
            let gap = (s / 6).max(1);
            Rectangle::new(Point::new(c.x - gap / 2 - bar as i32, c.y - half), Size::new(bar, s as u32))
                .into_styled(fill)
                .draw(target)?;
            Rectangle::new(Point::new(c.x + (gap + 1) / 2, c.y - half), Size::new(bar, s as u32))
                .into_styled(fill)
                .draw(target)?;
        }
        ButtonId::PlayPause => {
            Triangle::new(
                Point::new(c.x - half + s / 8, c.y - half),
                Point::new(c.x - half + s / 8, c.y + half),
                Point::new(c.x + half, c.y),
            )
            .into_styled(fill)
            .draw(target)?;
        }
        ButtonId::Next | ButtonId::Previous => {
            let bar = (s / 6).max(1) as u32;
            let (tip, base, bar_x) = if id == ButtonId::Next {
                (c.x + half - bar as i32, c.x - half, c.x + half - bar as i32)
            } else {
                (c.x - half + bar as i32, c.x + half, c.x - half)
            };
            Triangle::new(Point::new(base, c.y - half), Point::new(base, c.y + half), Point::new(tip, c.y))
                .into_styled(fill)
                .draw(target)?;
            Rectangle::new(Point::new(bar_x, c.y - half), Size::new(bar, s as u32))
                .into_styled(fill)
                .draw(target)?;
        }
        ButtonId::Like => {
            draw_heart(target, c, s, color)?;
            if !state.liked {
                draw_heart(target, c, s * 3 / 5, hollow)?;
            }
        }
        ButtonId::VolumeDown | ButtonId::VolumeUp => {
            let thick = (s / 5).max(2) as u32;
            Rectangle::with_center(c, Size::new(s as u32, thick))
                .into_styled(fill)
                .draw(target)?;
            if id == ButtonId::VolumeUp {
                Rectangle::with_center(c, Size::new(thick, s as u32))
                    .into_styled(fill)
                    .draw(target)?;
            }
        }
    }
    Ok(())
}

/// Two lobes over a downward triangle
fn draw_heart<D>(target: &mut D, c: Point, s: i32, color: Rgb888) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let fill = PrimitiveStyle::with_fill(color);
    let r = (s / 4).max(1);
    let top = c.y - s / 4;
    Circle::with_center(Point::new(c.x - r, top), (2 * r + 1) as u32)
        .into_styled(fill)
        .draw(target)?;
    Circle::with_center(Point::new(c.x + r, top), (2 * r + 1) as u32)
        .into_styled(fill)
        .draw(target)?;
    Triangle::new(
        Point::new(c.x - 2 * r, top + r / 3),
        Point::new(c.x + 2 * r, top + r / 3),
        Point::new(c.x, c.y + s / 2),
    )
    .into_styled(fill)
    .draw(target)?;
    Ok(())
}

/// Record glyph shown while art is pending, failed or absent
pub fn draw_album_placeholder<D>(target: &mut D, area: &Rectangle, frame: Rgb888, glyph: Rgb888) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    area.into_styled(PrimitiveStyle::with_fill(frame)).draw(target)?;
    let d = area.size.width.min(area.size.height);
    if d < 8 {
        return Ok(());
    }
    let c = area.center();
    let ring = (d / 40).max(1);
    Circle::with_center(c, d / 2)
        .into_styled(PrimitiveStyle::with_stroke(glyph, ring))
        .draw(target)?;
    Circle::with_center(c, d / 3)
        .into_styled(PrimitiveStyle::with_stroke(glyph, ring))
        .draw(target)?;
    Circle::with_center(c, (d / 10).max(2))
        .into_styled(PrimitiveStyle::with_fill(glyph))
        .draw(target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::vframebuf::VarFrameBuf;

    fn count(fb: &VarFrameBuf<Rgb888>, color: Rgb888) -> usize {
        fb.as_slice().iter().filter(|c| **c == color).count()
    }

    #[test]
    fn test_glyph_stays_inside_button() {
        let area = Rectangle::new(Point::new(20, 20), Size::new(40, 40));
        for id in [
            ButtonId::Previous,
            ButtonId::PlayPause,
            ButtonId::Next,
            ButtonId::Like,
            ButtonId::VolumeDown,
            ButtonId::VolumeUp,
        ] {
            let mut fb = VarFrameBuf::new(80, 80, Rgb888::BLACK);
            draw_button_glyph(&mut fb, id, &area, Rgb888::WHITE, Rgb888::BLACK, GlyphState::default()).unwrap();
            let inked = count(&fb, Rgb888::WHITE);
            assert!(inked > 0, "{:?} drew nothing", id);
            for y in 0..80u32 {
                for x in 0..80u32 {
                    if fb.pixel(x, y) == Some(Rgb888::WHITE) {
                        assert!(area.contains(Point::new(x as i32, y as i32)), "{:?} leaked at {},{}", id, x, y);
                    }
                }
            }
        }
    }

    #[test]
    fn test_liked_heart_is_solid() {
        let area = Rectangle::new(Point::zero(), Size::new(60, 60));
        let mut liked = VarFrameBuf::new(60, 60, Rgb888::BLACK);
        let mut unliked = VarFrameBuf::new(60, 60, Rgb888::BLACK);
        draw_button_glyph(&mut liked, ButtonId::Like, &area, Rgb888::RED, Rgb888::BLACK, GlyphState { playing: false, liked: true }).unwrap();
        draw_button_glyph(&mut unliked, ButtonId::Like, &area, Rgb888::RED, Rgb888::BLACK, GlyphState::default()).unwrap();
        assert!(count(&liked, Rgb888::RED) > count(&unliked, Rgb888::RED));
    }

    #[test]
    fn test_play_and_pause_differ() {
        let area = Rectangle::new(Point::zero(), Size::new(60, 60));
        let mut play = VarFrameBuf::new(60, 60, Rgb888::BLACK);
        let mut pause = VarFrameBuf::new(60, 60, Rgb888::BLACK);
        draw_button_glyph(&mut play, ButtonId::PlayPause, &area, Rgb888::WHITE, Rgb888::BLACK, GlyphState::default()).unwrap();
        draw_button_glyph(&mut pause, ButtonId::PlayPause, &area, Rgb888::WHITE, Rgb888::BLACK, GlyphState { playing: true, liked: false }).unwrap();
        assert_ne!(play.as_slice(), pause.as_slice());
    }
}
