/*
 *  input/mod.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Touch to action dispatch: inverse rotation, hit testing, debounce and
 *  volume slider drags
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

#[cfg(target_os = "linux")]
pub mod evdev;

use std::time::{Duration, Instant};

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::debug;

use crate::constants::DEBOUNCE_WINDOW;
use crate::display::layout::{ButtonId, ButtonStyle, DisplayConfig, LayoutGeometry, Region, RegionId};
use crate::geometry::inverse_rotate_point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

/// Raw touch in physical panel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub position: Point,
    pub phase: TouchPhase,
    pub at: Instant,
}

impl TouchEvent {
    pub fn new(x: i32, y: i32, phase: TouchPhase, at: Instant) -> Self {
        Self { position: Point::new(x, y), phase, at }
    }
}

/// What a touch asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    PlayPause,
    Next,
    Previous,
    ToggleLike,
    VolumeUp,
    VolumeDown,
    /// normalized 0.0 ..= 1.0
    SetVolume(f32),
}

impl Action {
    pub fn for_button(id: ButtonId) -> Self {
        match id {
            ButtonId::PlayPause => Action::PlayPause,
            ButtonId::Next => Action::Next,
            ButtonId::Previous => Action::Previous,
            ButtonId::Like => Action::ToggleLike,
            ButtonId::VolumeUp => Action::VolumeUp,
            ButtonId::VolumeDown => Action::VolumeDown,
        }
    }
}

/// Stateful only for debounce and drag tracking; geometry is passed in.
#[derive(Debug)]
pub struct InputDispatcher {
    debounce: Duration,
    last_press: Option<(RegionId, Instant)>,
    /// logical slider rect while a drag is active
    drag: Option<Rectangle>,
    last_volume: Option<u8>,
}

impl Default for InputDispatcher {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl InputDispatcher {
    pub fn new(debounce: Duration) -> Self {
        Self { debounce, last_press: None, drag: None, last_volume: None }
    }

    pub fn dispatch(&mut self, event: &TouchEvent, geometry: &LayoutGeometry, config: &DisplayConfig) -> Option<Action> {
        let p = inverse_rotate_point(event.position, geometry.rotation, geometry.screen);

        match event.phase {
            TouchPhase::Down => {
                self.drag = None;
                let region = hit_test(p, geometry, config)?;
                match region.id {
                    RegionId::Button(id) => {
                        if self.is_bounce(region.id, event.at) {
                            debug!("touch: debounced {:?}", id);
                            return None;
                        }
                        self.last_press = Some((region.id, event.at));
                        Some(Action::for_button(id))
                    }
                    RegionId::VolumeSlider => {
                        self.drag = Some(region.logical);
                        self.last_volume = None;
                        self.slider_action(region.logical, p)
                    }
                    _ => None,
                }
            }
            TouchPhase::Move => {
                let slider = self.drag?;
                self.slider_action(slider, p)
            }
            TouchPhase::Up => {
                let slider = self.drag.take()?;
                self.slider_action(slider, p)
            }
        }
    }

    fn is_bounce(&self, id: RegionId, at: Instant) -> bool {
        matches!(self.last_press, Some((last, t)) if last == id && at.saturating_duration_since(t) < self.debounce)
    }

    /// Emits only when the whole-percent value changes during a drag
    fn slider_action(&mut self, slider: Rectangle, p: Point) -> Option<Action> {
        let value = slider_value(&slider, p);
        let percent = (value * 100.0).round() as u8;
        if self.last_volume == Some(percent) {
            return None;
        }
        self.last_volume = Some(percent);
        Some(Action::SetVolume(value))
    }
}

/// First region containing `p`: buttons, then the slider, then passive regions.
pub fn hit_test<'a>(p: Point, geometry: &'a LayoutGeometry, config: &DisplayConfig) -> Option<&'a Region> {
    let buttons_live = config.button_style != ButtonStyle::None;
    let button = geometry
        .regions()
        .iter()
        .filter(|r| buttons_live && r.id.is_button())
        .find(|r| r.logical.contains(p));
    if button.is_some() {
        return button;
    }
    if config.show_volume_slider {
        if let Some(slider) = geometry.region(RegionId::VolumeSlider).filter(|r| r.logical.contains(p)) {
            return Some(slider);
        }
    }
    geometry
        .regions()
        .iter()
        .filter(|r| !r.id.is_button() && r.id != RegionId::VolumeSlider)
        .find(|r| r.logical.contains(p))
}

/// Project `p` onto the slider's long axis; left/bottom is zero.
pub fn slider_value(slider: &Rectangle, p: Point) -> f32 {
    let (offset, span) = if slider.size.width >= slider.size.height {
        (p.x - slider.top_left.x, slider.size.width)
    } else {
        (slider.top_left.y + slider.size.height as i32 - 1 - p.y, slider.size.height)
    };
    if span <= 1 {
        return 0.0;
    }
    (offset as f32 / (span - 1) as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::layout::{compute, LayoutMode};
    use crate::geometry::{rotate_point, Rotation};

    fn config() -> DisplayConfig {
        DisplayConfig {
            mode: LayoutMode::Portrait,
            show_volume_slider: true,
            ..DisplayConfig::new(480, 800)
        }
    }

    fn center_of(geometry: &LayoutGeometry, id: RegionId) -> Point {
        geometry.region(id).unwrap().screen.center()
    }

    #[test]
    fn test_button_press_dispatches() {
        let cfg = config();
        let g = compute(&cfg, true);
        let mut d = InputDispatcher::default();
        let p = center_of(&g, RegionId::Button(ButtonId::Next));
        let action = d.dispatch(&TouchEvent::new(p.x, p.y, TouchPhase::Down, Instant::now()), &g, &cfg);
        assert_eq!(action, Some(Action::Next));
    }

    #[test]
    fn test_debounce_same_region() {
        let cfg = config();
        let g = compute(&cfg, true);
        let mut d = InputDispatcher::default();
        let p = center_of(&g, RegionId::Button(ButtonId::PlayPause));
        let t0 = Instant::now();
        let first = d.dispatch(&TouchEvent::new(p.x, p.y, TouchPhase::Down, t0), &g, &cfg);
        let up = d.dispatch(&TouchEvent::new(p.x, p.y, TouchPhase::Up, t0 + Duration::from_millis(40)), &g, &cfg);
        let second = d.dispatch(&TouchEvent::new(p.x, p.y, TouchPhase::Down, t0 + Duration::from_millis(120)), &g, &cfg);
        assert_eq!(first, Some(Action::PlayPause));
        assert_eq!(up, None);
        assert_eq!(second, None);
        let later = d.dispatch(&TouchEvent::new(p.x, p.y, TouchPhase::Down, t0 + Duration::from_millis(900)), &g, &cfg);
        assert_eq!(later, Some(Action::PlayPause));
    }

    #[test]
    fn test_hold_does_not_repeat() {
        let cfg = config();
        let g = compute(&cfg, true);
        let mut d = InputDispatcher::default();
        let p = center_of(&g, RegionId::Button(ButtonId::Like));
        let t0 = Instant::now();
        let mut actions = Vec::new();
        actions.extend(d.dispatch(&TouchEvent::new(p.x, p.y, TouchPhase::Down, t0), &g, &cfg));
        for i in 1..20 {
            let at = t0 + Duration::from_millis(100 * i);
            actions.extend(d.dispatch(&TouchEvent::new(p.x + 1, p.y, TouchPhase::Move, at), &g, &cfg));
        }
        assert_eq!(actions, vec![Action::ToggleLike]);
    }

    #[test]
    fn test_rotated_touch_hits_same_button() {
        for rotation in Rotation::ALL {
            let cfg = DisplayConfig { rotation, ..config() };
            let g = compute(&cfg, true);
            let logical = g.region(RegionId::Button(ButtonId::Previous)).unwrap().logical.center();
            let physical = rotate_point(logical, rotation, g.screen);
            let mut d = InputDispatcher::default();
            let action = d.dispatch(&TouchEvent::new(physical.x, physical.y, TouchPhase::Down, Instant::now()), &g, &cfg);
            assert_eq!(action, Some(Action::Previous), "{:?}", rotation);
        }
    }

    #[test]
    fn test_background_touch_is_ignored() {
        let cfg = config();
        let g = compute(&cfg, true);
        let mut d = InputDispatcher::default();
        let title = center_of(&g, RegionId::Title);
        assert_eq!(d.dispatch(&TouchEvent::new(title.x, title.y, TouchPhase::Down, Instant::now()), &g, &cfg), None);
        assert_eq!(d.dispatch(&TouchEvent::new(0, 0, TouchPhase::Down, Instant::now()), &g, &cfg), None);
    }

    #[test]
    fn test_slider_drag_clamps() {
        let cfg = config();
        let g = compute(&cfg, true);
        let slider = g.region(RegionId::VolumeSlider).unwrap().logical;
        let mut d = InputDispatcher::default();
        let t0 = Instant::now();
        let y = slider.center().y;
        let start = d.dispatch(&TouchEvent::new(slider.top_left.x, y, TouchPhase::Down, t0), &g, &cfg);
        assert_eq!(start, Some(Action::SetVolume(0.0)));
        let far = d.dispatch(&TouchEvent::new(10_000, y, TouchPhase::Move, t0), &g, &cfg);
        assert_eq!(far, Some(Action::SetVolume(1.0)));
        // same percent again is not re-sent
        assert_eq!(d.dispatch(&TouchEvent::new(9_000, y, TouchPhase::Move, t0), &g, &cfg), None);
        let back = d.dispatch(&TouchEvent::new(-50, y, TouchPhase::Up, t0), &g, &cfg);
        assert_eq!(back, Some(Action::SetVolume(0.0)));
        // drag is over
        assert_eq!(d.dispatch(&TouchEvent::new(slider.center().x, y, TouchPhase::Move, t0), &g, &cfg), None);
    }

    #[test]
    fn test_slider_value_vertical() {
        let r = Rectangle::new(Point::new(0, 0), Size::new(10, 101));
        assert_eq!(slider_value(&r, Point::new(5, 100)), 0.0);
        assert_eq!(slider_value(&r, Point::new(5, 0)), 1.0);
        assert_eq!(slider_value(&r, Point::new(5, 50)), 0.5);
    }
}
