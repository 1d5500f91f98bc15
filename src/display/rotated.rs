/*
 *  display/rotated.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  DrawTarget adapter: draw in logical space, land on the physical panel
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

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::geometry::{rect_for_rotation, rotate_point, Rotation};

/// Wraps a physical target; everything drawn through it is rotated.
pub struct RotatedTarget<'a, T: DrawTarget> {
    target: &'a mut T,
    rotation: Rotation,
    screen: Size,
}

impl<'a, T> RotatedTarget<'a, T>
where
    T: DrawTarget + OriginDimensions,
{
    pub fn new(target: &'a mut T, rotation: Rotation) -> Self {
        let screen = target.size();
        Self { target, rotation, screen }
    }
}

impl<T: DrawTarget> OriginDimensions for RotatedTarget<'_, T> {
    fn size(&self) -> Size {
        self.rotation.logical_size(self.screen)
    }
}

impl<T: DrawTarget> DrawTarget for RotatedTarget<'_, T> {
    type Color = T::Color;
    type Error = T::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (rotation, screen) = (self.rotation, self.screen);
        self.target.draw_iter(
            pixels
                .into_iter()
                .map(move |Pixel(p, c)| Pixel(rotate_point(p, rotation, screen), c)),
        )
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        if self.rotation == Rotation::Deg0 {
            return self.target.fill_contiguous(area, colors);
        }
        // row order differs once rotated, go pixel by pixel
        let (rotation, screen) = (self.rotation, self.screen);
        self.target.draw_iter(
            area.points()
                .zip(colors)
                .map(move |(p, c)| Pixel(rotate_point(p, rotation, screen), c)),
        )
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let physical = rect_for_rotation(area, self.rotation, self.screen);
        self.target.fill_solid(&physical, color)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.target.clear(color)
    }
}
