/*
 *  display/layout.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Orientation aware layout: portrait, landscape and circular templates
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

use std::f32::consts::FRAC_1_SQRT_2;
use std::sync::Arc;

use clap::ValueEnum;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Rectangle};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::geometry::{rect_for_rotation, rect_within, rects_overlap, Rotation};

/// Layout template selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Portrait,
    Landscape,
    Circle,
    #[default]
    Auto,
}

/// How buttons are drawn. Only `None` changes geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    #[default]
    Normal,
    Minimal,
    #[serde(rename = "bw", alias = "blackandwhite")]
    #[value(name = "bw", alias = "blackandwhite")]
    BlackAndWhite,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Previous,
    PlayPause,
    Next,
    Like,
    VolumeDown,
    VolumeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionId {
    Art,
    Title,
    Artist,
    Album,
    Progress,
    Button(ButtonId),
    VolumeSlider,
}

impl RegionId {
    pub fn is_button(&self) -> bool {
        matches!(self, RegionId::Button(_))
    }
}

/// Which buttons the panel offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlSet {
    /// previous / play-pause / next
    pub transport: bool,
    pub like: bool,
    pub volume_buttons: bool,
}

impl Default for ControlSet {
    fn default() -> Self {
        Self { transport: true, like: true, volume_buttons: false }
    }
}

/// Everything the layout depends on. Only `rotation` may change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayConfig {
    pub mode: LayoutMode,
    pub rotation: Rotation,
    pub button_style: ButtonStyle,
    pub show_volume_slider: bool,
    pub controls: ControlSet,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl DisplayConfig {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            mode: LayoutMode::Auto,
            rotation: Rotation::Deg0,
            button_style: ButtonStyle::Normal,
            show_volume_slider: false,
            controls: ControlSet::default(),
            screen_width,
            screen_height,
        }
    }

    pub fn screen_size(&self) -> Size {
        Size::new(self.screen_width, self.screen_height)
    }

    pub fn logical_size(&self) -> Size {
        self.rotation.logical_size(self.screen_size())
    }

    /// Concrete template, Auto resolved from the post-rotation aspect ratio.
    pub fn template(&self) -> Template {
        match self.mode {
            LayoutMode::Portrait => Template::Portrait,
            LayoutMode::Landscape => Template::Landscape,
            LayoutMode::Circle => Template::Circle,
            LayoutMode::Auto => {
                let logical = self.logical_size();
                if logical.height > logical.width { Template::Portrait } else { Template::Landscape }
            }
        }
    }

    /// Enabled buttons in left to right order
    pub fn buttons(&self) -> Vec<ButtonId> {
        if self.button_style == ButtonStyle::None {
            return Vec::new();
        }
        let c = self.controls;
        let mut out = Vec::with_capacity(6);
        if c.volume_buttons { out.push(ButtonId::VolumeDown); }
        if c.transport {
            out.extend([ButtonId::Previous, ButtonId::PlayPause, ButtonId::Next]);
        }
        if c.volume_buttons { out.push(ButtonId::VolumeUp); }
        if c.like { out.push(ButtonId::Like); }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    Portrait,
    Landscape,
    Circle,
}

/// One drawable area, in both logical and physical space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub id: RegionId,
    pub logical: Rectangle,
    pub screen: Rectangle,
    pub rotation: Rotation,
}

/// Immutable result of a layout pass
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutGeometry {
    pub template: Template,
    pub rotation: Rotation,
    pub screen: Size,
    pub logical: Size,
    /// round bezel in logical space, circle template only
    pub bezel: Option<Circle>,
    regions: Vec<Region>,
}

impl LayoutGeometry {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn buttons(&self) -> impl Iterator<Item = (ButtonId, &Region)> {
        self.regions.iter().filter_map(|r| match r.id {
            RegionId::Button(b) => Some((b, r)),
            _ => None,
        })
    }

    pub fn logical_bounds(&self) -> Rectangle {
        Rectangle::new(Point::zero(), self.logical)
    }
}

type Plan = Vec<(RegionId, Rectangle)>;

/// Compute the geometry for `config`.
///
/// Artwork presence never changes geometry: the art frame is reserved either
/// way so a track change does not shuffle the screen.
pub fn compute(config: &DisplayConfig, _has_art: bool) -> LayoutGeometry {
    let logical = config.logical_size();
    let buttons = config.buttons();
    let template = config.template();

    let mut plan: Plan = Vec::with_capacity(12);
    let bezel = match template {
        Template::Portrait => {
            portrait(logical, &buttons, config.show_volume_slider, &mut plan);
            None
        }
        Template::Landscape => {
            landscape(logical, &buttons, config.show_volume_slider, &mut plan);
            None
        }
        Template::Circle => Some(circle(logical, &buttons, config.show_volume_slider, &mut plan)),
    };

    let screen = config.screen_size();
    let regions = plan
        .into_iter()
        .map(|(id, logical_rect)| Region {
            id,
            logical: logical_rect,
            screen: rect_for_rotation(&logical_rect, config.rotation, screen),
            rotation: config.rotation,
        })
        .collect();

    LayoutGeometry { template, rotation: config.rotation, screen, logical, bezel, regions }
}

#[inline]
fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

#[derive(Debug, Clone, Copy)]
enum Band {
    Progress,
    Controls,
    Slider,
}

/// Art in the upper part, then the text/band column
fn portrait(logical: Size, buttons: &[ButtonId], slider: bool, plan: &mut Plan) {
    let (w, h) = (logical.width, logical.height);
    let pad = (w.min(h) / 16).max(4).min(w / 4).min(h / 4);
    let gap = pad / 2;
    let inner = rect(pad as i32, pad as i32, w.saturating_sub(2 * pad), h.saturating_sub(2 * pad));

    let bands = bands_for(buttons, slider, h / 28, h / 9, h / 32);
    let fixed = band_total(&bands, gap);
    let text_min = h / 6;

    let art = inner.size.width.min(
        inner.size.height.saturating_sub(fixed + gap + text_min),
    );
    let art_x = (w.saturating_sub(art) / 2) as i32;
    plan.push((RegionId::Art, rect(art_x, inner.top_left.y, art, art)));

    let consumed = if art > 0 { art + gap } else { 0 };
    let column = rect(
        inner.top_left.x,
        inner.top_left.y + consumed as i32,
        inner.size.width,
        inner.size.height.saturating_sub(consumed),
    );
    stack_column(column, gap, &bands, buttons, plan);
}

/// Art on the left, text and bands on the right
fn landscape(logical: Size, buttons: &[ButtonId], slider: bool, plan: &mut Plan) {
    let (w, h) = (logical.width, logical.height);
    let pad = (w.min(h) / 16).max(4).min(w / 4).min(h / 4);
    let gap = pad / 2;
    let inner = rect(pad as i32, pad as i32, w.saturating_sub(2 * pad), h.saturating_sub(2 * pad));

    let art = inner.size.height.min(inner.size.width * 45 / 100);
    let art_y = inner.top_left.y + (inner.size.height.saturating_sub(art) / 2) as i32;
    plan.push((RegionId::Art, rect(inner.top_left.x, art_y, art, art)));

    let consumed = if art > 0 { art + pad } else { 0 };
    let column = rect(
        inner.top_left.x + consumed as i32,
        inner.top_left.y,
        inner.size.width.saturating_sub(consumed),
        inner.size.height,
    );
    let bands = bands_for(buttons, slider, h / 24, h / 6, h / 20);
    stack_column(column, gap, &bands, buttons, plan);
}

/// Content in the inscribed square, buttons on the lower ring, slider on the upper one
fn circle(logical: Size, buttons: &[ButtonId], slider: bool, plan: &mut Plan) -> Circle {
    let d = logical.width.min(logical.height);
    let center = Point::new(logical.width as i32 / 2, logical.height as i32 / 2);
    let radius = d as f32 / 2.0;
    let bezel = Circle::with_center(center, d);

    let side = ((d as f32 * FRAC_1_SQRT_2).floor() as u32).saturating_sub(2);
    let square = rect(center.x - (side / 2) as i32, center.y - (side / 2) as i32, side, side);
    let gap = (side / 40).max(1);

    let art = side * 48 / 100;
    let art_x = center.x - (art / 2) as i32;
    plan.push((RegionId::Art, rect(art_x, square.top_left.y, art, art)));

    let consumed = if art > 0 { art + gap } else { 0 };
    let column = rect(
        square.top_left.x,
        square.top_left.y + consumed as i32,
        side,
        side.saturating_sub(consumed),
    );
    stack_column(column, gap, &[(Band::Progress, (side / 16).max(10))], &[], plan);

    // segment between the square and the bezel, identical above and below
    let segment = (center.y as f32 + radius) - (square.top_left.y + side as i32) as f32;

    if !buttons.is_empty() {
        let ring = side as f32 / 2.0 + segment / 2.0;
        match ring_buttons(center, radius, ring, segment, buttons.len(), &square, logical) {
            Some(rects) => {
                for (b, r) in buttons.iter().zip(rects) {
                    plan.push((RegionId::Button(*b), r));
                }
            }
            None => warn!("circle layout: {}px panel has no room for {} ring buttons", d, buttons.len()),
        }
    }

    if slider {
        let h = ((segment / 3.0) as u32).max(8);
        let y = square.top_left.y - gap as i32 - h as i32;
        let mut width = side * 3 / 4;
        let mut placed = false;
        while width >= 16 {
            let r = rect(center.x - (width / 2) as i32, y, width, h);
            if inside_circle(&r, center, radius) {
                plan.push((RegionId::VolumeSlider, r));
                placed = true;
                break;
            }
            width -= 8;
        }
        if !placed {
            warn!("circle layout: {}px panel has no room for the volume slider", d);
        }
    }

    bezel
}

/// Place `n` square buttons along the ring, symmetric about straight down.
///
/// Angular spacing is fixed per button count; the size shrinks until every
/// button clears its neighbours, the content square and the bezel.
fn ring_buttons(
    center: Point,
    radius: f32,
    ring: f32,
    segment: f32,
    n: usize,
    square: &Rectangle,
    logical: Size,
) -> Option<Vec<Rectangle>> {
    let step = if n > 1 { (48.0 / (n - 1) as f32).min(16.0) } else { 0.0 };
    let bounds = rect(0, 0, logical.width, logical.height);

    let centers: Vec<Point> = (0..n)
        .map(|i| {
            let theta = ((i as f32 - (n - 1) as f32 / 2.0) * step).to_radians();
            Point::new(
                center.x + (ring * theta.sin()).round() as i32,
                center.y + (ring * theta.cos()).round() as i32,
            )
        })
        .collect();

    let mut size = (segment * 0.8) as u32;
    while size >= 8 {
        let rects: Vec<Rectangle> = centers.iter().map(|c| Rectangle::with_center(*c, Size::new(size, size))).collect();
        let fits = rects.iter().all(|r| {
            rect_within(r, &bounds) && !rects_overlap(r, square) && inside_circle(r, center, radius)
        }) && rects.windows(2).all(|pair| !rects_overlap(&pair[0], &pair[1]));
        if fits {
            return Some(rects);
        }
        size -= 1;
    }
    None
}

fn inside_circle(r: &Rectangle, center: Point, radius: f32) -> bool {
    let x0 = r.top_left.x;
    let y0 = r.top_left.y;
    let x1 = x0 + r.size.width as i32;
    let y1 = y0 + r.size.height as i32;
    [(x0, y0), (x1, y0), (x0, y1), (x1, y1)].iter().all(|&(x, y)| {
        let dx = (x - center.x) as f32;
        let dy = (y - center.y) as f32;
        (dx * dx + dy * dy).sqrt() <= radius
    })
}

fn bands_for(buttons: &[ButtonId], slider: bool, progress: u32, controls: u32, slider_h: u32) -> Vec<(Band, u32)> {
    let mut bands = vec![(Band::Progress, progress.max(12))];
    // no buttons, no control band: the text block takes the room
    if !buttons.is_empty() {
        bands.push((Band::Controls, controls.max(32)));
    }
    if slider {
        bands.push((Band::Slider, slider_h.max(14)));
    }
    bands
}

fn band_total(bands: &[(Band, u32)], gap: u32) -> u32 {
    bands.iter().map(|(_, h)| h + gap).sum()
}

/// Title/artist/album take whatever the fixed bands leave, bands follow in order.
fn stack_column(area: Rectangle, gap: u32, bands: &[(Band, u32)], buttons: &[ButtonId], plan: &mut Plan) {
    let mut gap = gap;
    let mut bands: Vec<(Band, u32)> = bands.to_vec();
    let mut fixed = band_total(&bands, gap);
    if fixed > area.size.height {
        // tiny panels: drop the gaps and squeeze the bands to fit
        gap = 0;
        let total: u32 = bands.iter().map(|(_, h)| *h).sum::<u32>().max(1);
        for (_, h) in bands.iter_mut() {
            *h = (*h as u64 * area.size.height as u64 / total as u64) as u32;
        }
        fixed = band_total(&bands, gap);
    }

    let text_h = area.size.height.saturating_sub(fixed);
    text_blocks(rect(area.top_left.x, area.top_left.y, area.size.width, text_h), plan);

    let mut y = area.top_left.y + text_h as i32;
    for (band, h) in bands {
        y += gap as i32;
        let r = rect(area.top_left.x, y, area.size.width, h);
        match band {
            Band::Progress => plan.push((RegionId::Progress, r)),
            Band::Controls => button_row(r, buttons, plan),
            Band::Slider => {
                let inset = area.size.width / 10;
                plan.push((
                    RegionId::VolumeSlider,
                    rect(r.top_left.x + inset as i32, r.top_left.y, area.size.width - 2 * inset, h),
                ));
            }
        }
        y += h as i32;
    }
}

fn text_blocks(area: Rectangle, plan: &mut Plan) {
    let h = area.size.height;
    let title = h * 46 / 100;
    let artist = h * 27 / 100;
    let album = h - title - artist;
    let x = area.top_left.x;
    let w = area.size.width;
    let y = area.top_left.y;
    plan.push((RegionId::Title, rect(x, y, w, title)));
    plan.push((RegionId::Artist, rect(x, y + title as i32, w, artist)));
    plan.push((RegionId::Album, rect(x, y + (title + artist) as i32, w, album)));
}

/// Square buttons centred in `area` with a quarter-size gap between them
fn button_row(area: Rectangle, buttons: &[ButtonId], plan: &mut Plan) {
    let n = buttons.len() as u32;
    if n == 0 {
        return;
    }
    let size = area.size.height.min(4 * area.size.width / (5 * n - 1));
    let gap = size / 4;
    let total = n * size + (n - 1) * gap;
    let x0 = area.top_left.x + (area.size.width.saturating_sub(total) / 2) as i32;
    let y0 = area.top_left.y + (area.size.height.saturating_sub(size) / 2) as i32;
    for (i, b) in buttons.iter().enumerate() {
        let x = x0 + (i as u32 * (size + gap)) as i32;
        plan.push((RegionId::Button(*b), rect(x, y0, size, size)));
    }
}

/// Caches the last geometry; recomputes only when the config changes.
#[derive(Debug, Default)]
pub struct LayoutEngine {
    cached: Option<(DisplayConfig, Arc<LayoutGeometry>)>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry for `config`, from cache when nothing changed
    pub fn geometry(&mut self, config: &DisplayConfig) -> Arc<LayoutGeometry> {
        if let Some((cfg, geometry)) = &self.cached {
            if cfg == config {
                return Arc::clone(geometry);
            }
        }
        let geometry = Arc::new(compute(config, true));
        debug!(
            "layout: {:?} {}x{} rot {} -> {} regions",
            geometry.template,
            config.screen_width,
            config.screen_height,
            config.rotation.degrees(),
            geometry.regions().len()
        );
        self.cached = Some((*config, Arc::clone(&geometry)));
        geometry
    }

    /// Last computed geometry, possibly stale
    pub fn current(&self) -> Option<Arc<LayoutGeometry>> {
        self.cached.as_ref().map(|(_, g)| Arc::clone(g))
    }

    pub fn is_current(&self, config: &DisplayConfig) -> bool {
        matches!(&self.cached, Some((cfg, _)) if cfg == config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portrait_cfg() -> DisplayConfig {
        DisplayConfig { mode: LayoutMode::Portrait, ..DisplayConfig::new(480, 800) }
    }

    #[test]
    fn test_portrait_stack_order() {
        let g = compute(&portrait_cfg(), true);
        assert_eq!(g.template, Template::Portrait);
        let art = g.region(RegionId::Art).unwrap().logical;
        let title = g.region(RegionId::Title).unwrap().logical;
        let progress = g.region(RegionId::Progress).unwrap().logical;
        let play = g.region(RegionId::Button(ButtonId::PlayPause)).unwrap().logical;
        assert!(art.top_left.y < title.top_left.y);
        assert!(title.top_left.y < progress.top_left.y);
        assert!(progress.top_left.y < play.top_left.y);
        assert_eq!(art.size.width, art.size.height);
    }

    #[test]
    fn test_landscape_art_left() {
        let cfg = DisplayConfig { mode: LayoutMode::Landscape, ..DisplayConfig::new(800, 480) };
        let g = compute(&cfg, true);
        let art = g.region(RegionId::Art).unwrap().logical;
        let title = g.region(RegionId::Title).unwrap().logical;
        let next = g.region(RegionId::Button(ButtonId::Next)).unwrap().logical;
        assert!(art.top_left.x + (art.size.width as i32) <= title.top_left.x);
        assert!(art.top_left.x + (art.size.width as i32) <= next.top_left.x);
    }

    #[test]
    fn test_auto_uses_rotated_aspect() {
        let mut cfg = DisplayConfig::new(800, 480);
        assert_eq!(cfg.template(), Template::Landscape);
        cfg.rotation = Rotation::Deg90;
        assert_eq!(cfg.template(), Template::Portrait);
        let square = DisplayConfig::new(720, 720);
        assert_eq!(square.template(), Template::Landscape);
    }

    #[test]
    fn test_style_none_reclaims_control_band() {
        let with = compute(&portrait_cfg(), true);
        let without = compute(&DisplayConfig { button_style: ButtonStyle::None, ..portrait_cfg() }, true);
        assert_eq!(without.buttons().count(), 0);
        let h = |g: &LayoutGeometry, id| g.region(id).map(|r| r.logical.size.height).unwrap_or(0);
        let w = |g: &LayoutGeometry, id| g.region(id).map(|r| r.logical.size.width).unwrap_or(0);
        let text = |g: &LayoutGeometry| h(g, RegionId::Title) + h(g, RegionId::Artist) + h(g, RegionId::Album);
        assert!(text(&without) + w(&without, RegionId::Art) > text(&with) + w(&with, RegionId::Art));
    }

    #[test]
    fn test_minimal_and_bw_share_geometry() {
        let normal = compute(&portrait_cfg(), true);
        for style in [ButtonStyle::Minimal, ButtonStyle::BlackAndWhite] {
            let g = compute(&DisplayConfig { button_style: style, ..portrait_cfg() }, true);
            assert_eq!(g.regions(), normal.regions());
        }
    }

    #[test]
    fn test_zero_buttons_collapse() {
        let cfg = DisplayConfig {
            controls: ControlSet { transport: false, like: false, volume_buttons: false },
            ..portrait_cfg()
        };
        let g = compute(&cfg, true);
        assert_eq!(g.buttons().count(), 0);
        let none = compute(&DisplayConfig { button_style: ButtonStyle::None, ..portrait_cfg() }, true);
        assert_eq!(g.regions(), none.regions());
    }

    #[test]
    fn test_art_reserved_without_artwork() {
        let a = compute(&portrait_cfg(), true);
        let b = compute(&portrait_cfg(), false);
        assert_eq!(a, b);
        assert!(b.region(RegionId::Art).is_some());
    }

    #[test]
    fn test_circle_ring_buttons_below_square() {
        let cfg = DisplayConfig { mode: LayoutMode::Circle, ..DisplayConfig::new(480, 480) };
        let g = compute(&cfg, true);
        assert_eq!(g.buttons().count(), 4);
        let progress = g.region(RegionId::Progress).unwrap().logical;
        for (_, r) in g.buttons() {
            assert!(r.logical.top_left.y >= progress.top_left.y + progress.size.height as i32);
        }
        assert!(g.bezel.is_some());
    }

    #[test]
    fn test_circle_places_every_control_on_small_panels() {
        let controls = ControlSet { transport: true, like: true, volume_buttons: true };
        for (w, h) in [(240, 240), (320, 240), (480, 480), (720, 720)] {
            for rotation in Rotation::ALL {
                let cfg = DisplayConfig {
                    mode: LayoutMode::Circle,
                    rotation,
                    controls,
                    show_volume_slider: true,
                    ..DisplayConfig::new(w, h)
                };
                let g = compute(&cfg, true);
                assert_eq!(g.buttons().count(), cfg.buttons().len(), "{}x{} rot {}", w, h, rotation.degrees());
                assert!(g.region(RegionId::VolumeSlider).is_some(), "{}x{} rot {}", w, h, rotation.degrees());
            }
        }
    }

    #[test]
    fn test_slider_region_present() {
        let cfg = DisplayConfig { show_volume_slider: true, ..portrait_cfg() };
        let g = compute(&cfg, true);
        let s = g.region(RegionId::VolumeSlider).unwrap().logical;
        assert!(s.size.width > s.size.height);
    }

    #[test]
    fn test_button_order() {
        let cfg = DisplayConfig {
            controls: ControlSet { transport: true, like: true, volume_buttons: true },
            ..portrait_cfg()
        };
        assert_eq!(
            cfg.buttons(),
            vec![
                ButtonId::VolumeDown,
                ButtonId::Previous,
                ButtonId::PlayPause,
                ButtonId::Next,
                ButtonId::VolumeUp,
                ButtonId::Like
            ]
        );
    }

    #[test]
    fn test_engine_caches_until_config_changes() {
        let mut engine = LayoutEngine::new();
        let cfg = portrait_cfg();
        let a = engine.geometry(&cfg);
        let b = engine.geometry(&cfg);
        assert!(Arc::ptr_eq(&a, &b));

        let rotated = DisplayConfig { rotation: Rotation::Deg180, ..cfg };
        assert!(!engine.is_current(&rotated));
        let c = engine.geometry(&rotated);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.rotation, Rotation::Deg180);
    }
}
