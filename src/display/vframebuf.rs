/*
 *  display/vframebuf.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime sized framebuffer, panel size is only known after probing
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::PixelColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    /// Row-major pixels, used by the drivers to convert on flush
    pub fn as_slice(&self) -> &[C] { &self.buf }

    pub fn pixel(&self, x: u32, y: u32) -> Option<C> {
        self.idx(Point::new(x as i32, y as i32)).map(|i| self.buf[i])
    }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }

    fn bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), Size::new(self.w as u32, self.h as u32))
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        // the iterator walks the whole area, clipped pixels still consume a color
        let clipped = area.intersection(&self.bounds());
        if clipped.is_zero_sized() {
            return Ok(());
        }
        if clipped == *area {
            let x0 = area.top_left.x as usize;
            let mut it = colors.into_iter();
            for row in 0..area.size.height as usize {
                let base = (area.top_left.y as usize + row) * self.w + x0;
                for slot in &mut self.buf[base..base + area.size.width as usize] {
                    match it.next() {
                        Some(c) => *slot = c,
                        None => return Ok(()),
                    }
                }
            }
            return Ok(());
        }
        self.draw_iter(area.points().zip(colors).map(|(p, c)| Pixel(p, c)))
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounds());
        if clipped.is_zero_sized() {
            return Ok(());
        }
        let x0 = clipped.top_left.x as usize;
        let w = clipped.size.width as usize;
        for row in 0..clipped.size.height as usize {
            let base = (clipped.top_left.y as usize + row) * self.w + x0;
            self.buf[base..base + w].fill(color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::Rgb888;

    #[test]
    fn test_fill_solid_clips() {
        let mut fb = VarFrameBuf::new(10, 10, Rgb888::BLACK);
        fb.fill_solid(&Rectangle::new(Point::new(-5, 8), Size::new(20, 20)), Rgb888::RED).unwrap();
        assert_eq!(fb.pixel(0, 8), Some(Rgb888::RED));
        assert_eq!(fb.pixel(9, 9), Some(Rgb888::RED));
        assert_eq!(fb.pixel(0, 7), Some(Rgb888::BLACK));
    }

    #[test]
    fn test_fill_contiguous_partial_keeps_alignment() {
        let mut fb = VarFrameBuf::new(4, 4, Rgb888::BLACK);
        let area = Rectangle::new(Point::new(-1, 0), Size::new(2, 1));
        fb.fill_contiguous(&area, [Rgb888::RED, Rgb888::GREEN]).unwrap();
        assert_eq!(fb.pixel(0, 0), Some(Rgb888::GREEN));
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let fb = VarFrameBuf::new(4, 4, Rgb888::BLACK);
        assert_eq!(fb.pixel(4, 0), None);
    }
}
