/*
 *  input/evdev.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux evdev touchscreen reader
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

use std::io;
use std::mem::size_of;
use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info, warn};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{TouchEvent, TouchPhase};

// linux/input-event-codes.h
const EV_SYN: u16 = 0x00;
const EV_KEY: u16 = 0x01;
const EV_ABS: u16 = 0x03;
const SYN_REPORT: u16 = 0x00;
const BTN_TOUCH: u16 = 0x14a;
const ABS_X: u16 = 0x00;
const ABS_Y: u16 = 0x01;
const ABS_MT_POSITION_X: u16 = 0x35;
const ABS_MT_POSITION_Y: u16 = 0x36;

/// Raw axis ranges mapped onto the panel; identity when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchCalibration {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
    pub width: u32,
    pub height: u32,
}

impl TouchCalibration {
    fn scale(raw: i32, min: i32, max: i32, size: u32) -> i32 {
        if max <= min || size == 0 {
            return raw;
        }
        let t = (raw.clamp(min, max) - min) as i64 * (size as i64 - 1) / (max - min) as i64;
        t as i32
    }

    fn x(&self, raw: i32) -> i32 {
        Self::scale(raw, self.x_min, self.x_max, self.width)
    }

    fn y(&self, raw: i32) -> i32 {
        Self::scale(raw, self.y_min, self.y_max, self.height)
    }
}

/// Folds evdev reports into touch down / move / up, one per SYN_REPORT.
#[derive(Debug, Default)]
pub struct EvdevDecoder {
    calibration: Option<TouchCalibration>,
    x: i32,
    y: i32,
    touching: bool,
    pressed: Option<bool>,
    moved: bool,
}

impl EvdevDecoder {
    pub fn new(calibration: Option<TouchCalibration>) -> Self {
        Self { calibration, ..Default::default() }
    }

    pub fn feed(&mut self, kind: u16, code: u16, value: i32, at: Instant) -> Option<TouchEvent> {
        match (kind, code) {
            (EV_ABS, ABS_X | ABS_MT_POSITION_X) => {
                self.x = self.calibration.map_or(value, |c| c.x(value));
                self.moved = true;
            }
            (EV_ABS, ABS_Y | ABS_MT_POSITION_Y) => {
                self.y = self.calibration.map_or(value, |c| c.y(value));
                self.moved = true;
            }
            (EV_KEY, BTN_TOUCH) => self.pressed = Some(value != 0),
            (EV_SYN, SYN_REPORT) => return self.report(at),
            _ => {}
        }
        None
    }

    fn report(&mut self, at: Instant) -> Option<TouchEvent> {
        let moved = std::mem::take(&mut self.moved);
        let phase = match self.pressed.take() {
            Some(true) if !self.touching => {
                self.touching = true;
                TouchPhase::Down
            }
            Some(false) if self.touching => {
                self.touching = false;
                TouchPhase::Up
            }
            _ if self.touching && moved => TouchPhase::Move,
            _ => return None,
        };
        Some(TouchEvent::new(self.x, self.y, phase, at))
    }
}

/// type, code, value out of one raw `struct input_event`
fn parse_event(raw: &[u8]) -> Option<(u16, u16, i32)> {
    // the timeval header varies in size, the payload is always the last 8 bytes
    let tail = raw.len().checked_sub(8).map(|at| &raw[at..])?;
    let kind = u16::from_ne_bytes([tail[0], tail[1]]);
    let code = u16::from_ne_bytes([tail[2], tail[3]]);
    let value = i32::from_ne_bytes([tail[4], tail[5], tail[6], tail[7]]);
    Some((kind, code, value))
}

/// Read `device` until cancelled, forwarding decoded touches.
pub fn spawn_reader(
    device: PathBuf,
    calibration: Option<TouchCalibration>,
    touches: UnboundedSender<TouchEvent>,
    cancel: CancellationToken,
) -> JoinHandle<io::Result<()>> {
    tokio::spawn(async move {
        let mut file = tokio::fs::File::open(&device).await.inspect_err(|e| {
            warn!("touch device {} unavailable: {}", device.display(), e);
        })?;
        info!("touch input from {}", device.display());

        let mut decoder = EvdevDecoder::new(calibration);
        let mut buf = vec![0u8; size_of::<libc::input_event>()];
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                read = file.read_exact(&mut buf) => {
                    read?;
                    let Some((kind, code, value)) = parse_event(&buf) else { continue };
                    if let Some(touch) = decoder.feed(kind, code, value, Instant::now()) {
                        if touches.send(touch).is_err() {
                            break;
                        }
                    }
                }
            }
        }
        debug!("touch reader for {} stopped", device.display());
        Ok(())
    })
}
