/*
 *  display/emulator_window.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Emulator window: shows flushed frames, mouse stands in for touch
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

use std::sync::{Arc, Mutex};
use std::time::Instant;

use log::{error, info};
use pixels::{Pixels, SurfaceTexture};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use winit::{
    dpi::PhysicalSize,
    event::{Event, VirtualKeyCode},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use winit_input_helper::WinitInputHelper;

use crate::constants::BRIGHTNESS_ON;
use crate::display::drivers::emulator::EmulatorState;
use crate::input::{TouchEvent, TouchPhase};

#[derive(Debug, Clone)]
pub struct EmulatorWindowConfig {
    /// Pixel scale factor (panel pixel to screen pixels)
    pub scale: u32,

    /// Background color [R, G, B, A]
    pub bg_color: [u8; 4],
}

impl Default for EmulatorWindowConfig {
    fn default() -> Self {
        Self { scale: 1, bg_color: [20, 20, 20, 255] }
    }
}

pub struct EmulatorWindow {
    state: Arc<Mutex<EmulatorState>>,
    config: EmulatorWindowConfig,
    touches: UnboundedSender<TouchEvent>,
    cancel: CancellationToken,
}

impl EmulatorWindow {
    pub fn new(
        state: Arc<Mutex<EmulatorState>>,
        config: EmulatorWindowConfig,
        touches: UnboundedSender<TouchEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self { state, config, touches, cancel }
    }

    /// Run the window event loop on the calling (main) thread; never returns.
    pub fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height) = {
            let s = self.state.lock().unwrap_or_else(|p| p.into_inner());
            (s.width, s.height)
        };

        let event_loop = EventLoop::new();
        let mut input = WinitInputHelper::new();

        // PhysicalSize sidesteps Wayland DPI scaling
        let window = WindowBuilder::new()
            .with_title(format!("NowPanel Emulator ({}x{})", width, height))
            .with_inner_size(PhysicalSize::new(width * self.config.scale, height * self.config.scale))
            .with_resizable(false)
            .build(&event_loop)?;

        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        let mut pixels = Pixels::new(width, height, surface_texture)?;

        info!("emulator: mouse is touch, R cycles rotation, Esc or Q quits");

        let mut pressed = false;
        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Poll;

            if self.is_finished() {
                *control_flow = ControlFlow::Exit;
                return;
            }

            if let Event::RedrawRequested(_) = event {
                self.render(pixels.frame_mut());
                if let Err(err) = pixels.render() {
                    error!("pixels.render() failed: {}", err);
                    self.cancel.cancel();
                    *control_flow = ControlFlow::Exit;
                    return;
                }
            }

            if input.update(&event) {
                if input.key_pressed(VirtualKeyCode::Escape)
                    || input.key_pressed(VirtualKeyCode::Q)
                    || input.close_requested()
                {
                    // the render loop shuts down and flags `finished`
                    self.cancel.cancel();
                }

                if input.key_pressed(VirtualKeyCode::R) {
                    let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
                    state.rotation = state.rotation.next();
                    state.pending_rotation = Some(state.rotation);
                    info!("emulator: rotation {}°", state.rotation.degrees());
                }

                let at = Instant::now();
                let cursor = input
                    .mouse()
                    .and_then(|pos| pixels.window_pos_to_pixel(pos).ok())
                    .map(|(x, y)| (x as i32, y as i32));

                if let Some((x, y)) = cursor {
                    let phase = if input.mouse_pressed(0) {
                        pressed = true;
                        Some(TouchPhase::Down)
                    } else if input.mouse_released(0) && pressed {
                        pressed = false;
                        Some(TouchPhase::Up)
                    } else if pressed && input.mouse_held(0) && input.mouse_diff() != (0.0, 0.0) {
                        Some(TouchPhase::Move)
                    } else {
                        None
                    };
                    if let Some(phase) = phase {
                        let _ = self.touches.send(TouchEvent::new(x, y, phase, at));
                    }
                } else if pressed && input.mouse_released(0) {
                    pressed = false;
                }

                window.request_redraw();
            }
        });
    }

    fn is_finished(&self) -> bool {
        self.state.lock().map(|s| s.finished).unwrap_or(true)
    }

    /// Copy the last frame, scaled by the backlight level.
    fn render(&self, frame: &mut [u8]) {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let factor = (state.brightness as f32 / BRIGHTNESS_ON as f32).min(1.0);

        for (i, pixel) in frame.chunks_exact_mut(4).enumerate() {
            match state.buffer.get(i) {
                Some(rgba) => {
                    pixel[0] = (rgba[0] as f32 * factor) as u8;
                    pixel[1] = (rgba[1] as f32 * factor) as u8;
                    pixel[2] = (rgba[2] as f32 * factor) as u8;
                    pixel[3] = 255;
                }
                None => pixel.copy_from_slice(&self.config.bg_color),
            }
        }
    }
}
