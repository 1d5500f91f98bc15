/*
 *  geometry.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Rotation transforms between logical layout space and physical panel space
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
use serde::{Deserialize, Serialize};

/// Clockwise rotation of the logical content on the physical panel.
///
/// Layout happens in logical space (width and height swapped for 90/270),
/// the panel and the touch controller speak physical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270];

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Next rotation clockwise (emulator `R` key)
    pub fn next(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    #[inline]
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Logical canvas size for a physical panel of `screen` pixels.
    pub fn logical_size(self, screen: Size) -> Size {
        if self.swaps_axes() {
            Size::new(screen.height, screen.width)
        } else {
            screen
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
            .ok_or_else(|| format!("rotation must be 0, 90, 180 or 270 (got {})", degrees))
    }
}

impl From<Rotation> for u16 {
    fn from(r: Rotation) -> u16 {
        r.degrees()
    }
}

/// Map a logical point onto the physical panel.
///
/// `screen` is the physical panel size. The mapping is defined for every
/// integer point, so the round trip holds even outside the panel.
pub fn rotate_point(p: Point, rotation: Rotation, screen: Size) -> Point {
    let w = screen.width as i32;
    let h = screen.height as i32;
    match rotation {
        Rotation::Deg0 => p,
        Rotation::Deg90 => Point::new(w - 1 - p.y, p.x),
        Rotation::Deg180 => Point::new(w - 1 - p.x, h - 1 - p.y),
        Rotation::Deg270 => Point::new(p.y, h - 1 - p.x),
    }
}

/// Exact inverse of [`rotate_point`]: physical (touch) space back to logical.
pub fn inverse_rotate_point(p: Point, rotation: Rotation, screen: Size) -> Point {
    let w = screen.width as i32;
    let h = screen.height as i32;
    match rotation {
        Rotation::Deg0 => p,
        Rotation::Deg90 => Point::new(p.y, w - 1 - p.x),
        Rotation::Deg180 => Point::new(w - 1 - p.x, h - 1 - p.y),
        Rotation::Deg270 => Point::new(h - 1 - p.y, p.x),
    }
}

/// Map a logical rectangle onto the panel; width/height swap for 90 and 270.
pub fn rect_for_rotation(rect: &Rectangle, rotation: Rotation, screen: Size) -> Rectangle {
    let size = if rotation.swaps_axes() {
        Size::new(rect.size.height, rect.size.width)
    } else {
        rect.size
    };

    if rect.size.width == 0 || rect.size.height == 0 {
        return Rectangle::new(rotate_point(rect.top_left, rotation, screen), size);
    }

    // inclusive corners, so the mapped rect covers exactly the same pixels
    let a = rotate_point(rect.top_left, rotation, screen);
    let b = rotate_point(
        rect.top_left + Point::new(rect.size.width as i32 - 1, rect.size.height as i32 - 1),
        rotation,
        screen,
    );
    Rectangle::new(Point::new(a.x.min(b.x), a.y.min(b.y)), size)
}

/// True when two rectangles share at least one pixel. Empty rectangles never overlap.
pub fn rects_overlap(a: &Rectangle, b: &Rectangle) -> bool {
    if a.is_zero_sized() || b.is_zero_sized() {
        return false;
    }
    let (ax1, ay1) = (a.top_left.x + a.size.width as i32, a.top_left.y + a.size.height as i32);
    let (bx1, by1) = (b.top_left.x + b.size.width as i32, b.top_left.y + b.size.height as i32);
    a.top_left.x < bx1 && b.top_left.x < ax1 && a.top_left.y < by1 && b.top_left.y < ay1
}

/// True when `inner` lies fully inside `outer`.
pub fn rect_within(inner: &Rectangle, outer: &Rectangle) -> bool {
    inner.top_left.x >= outer.top_left.x
        && inner.top_left.y >= outer.top_left.y
        && inner.top_left.x + inner.size.width as i32 <= outer.top_left.x + outer.size.width as i32
        && inner.top_left.y + inner.size.height as i32 <= outer.top_left.y + outer.size.height as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: Size = Size::new(480, 800);

    #[test]
    fn test_round_trip_every_rotation() {
        for rotation in Rotation::ALL {
            let logical = rotation.logical_size(PANEL);
            for y in (0..logical.height as i32).step_by(7) {
                for x in (0..logical.width as i32).step_by(7) {
                    let p = Point::new(x, y);
                    let q = rotate_point(p, rotation, PANEL);
                    assert_eq!(inverse_rotate_point(q, rotation, PANEL), p, "{:?} {:?}", rotation, p);
                }
            }
        }
    }

    #[test]
    fn test_rotated_points_stay_on_panel() {
        let panel = Rectangle::new(Point::zero(), PANEL);
        for rotation in Rotation::ALL {
            let logical = rotation.logical_size(PANEL);
            let corners = [
                Point::zero(),
                Point::new(logical.width as i32 - 1, 0),
                Point::new(0, logical.height as i32 - 1),
                Point::new(logical.width as i32 - 1, logical.height as i32 - 1),
            ];
            for c in corners {
                assert!(panel.contains(rotate_point(c, rotation, PANEL)), "{:?} {:?}", rotation, c);
            }
        }
    }

    #[test]
    fn test_rotate_90_corner() {
        // logical top-left lands on the physical top-right
        let p = rotate_point(Point::zero(), Rotation::Deg90, PANEL);
        assert_eq!(p, Point::new(479, 0));
    }

    #[test]
    fn test_rect_for_rotation_swaps_size() {
        let r = Rectangle::new(Point::new(10, 20), Size::new(100, 50));
        let r90 = rect_for_rotation(&r, Rotation::Deg90, PANEL);
        assert_eq!(r90.size, Size::new(50, 100));
        // covers the rotated image of every corner
        for corner in [r.top_left, r.bottom_right().unwrap()] {
            assert!(r90.contains(rotate_point(corner, Rotation::Deg90, PANEL)));
        }
        let r180 = rect_for_rotation(&r, Rotation::Deg180, PANEL);
        assert_eq!(r180, Rectangle::new(Point::new(480 - 110, 800 - 70), Size::new(100, 50)));
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::from_degrees(270), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_degrees(45), None);
        assert!(Rotation::try_from(100u16).is_err());
        assert_eq!(Rotation::Deg270.next(), Rotation::Deg0);
    }

    #[test]
    fn test_overlap_edges() {
        let a = Rectangle::new(Point::new(0, 0), Size::new(10, 10));
        let b = Rectangle::new(Point::new(10, 0), Size::new(10, 10));
        let c = Rectangle::new(Point::new(9, 9), Size::new(2, 2));
        let empty = Rectangle::new(Point::new(5, 5), Size::zero());
        assert!(!rects_overlap(&a, &b));
        assert!(rects_overlap(&a, &c));
        assert!(!rects_overlap(&a, &empty));
        assert!(rect_within(&c, &Rectangle::new(Point::zero(), Size::new(20, 20))));
        assert!(!rect_within(&b, &a));
    }
}
