/*
 *  display/drivers/fbdev.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux framebuffer driver, /dev/fbN mapped and sysfs backlight
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

use std::fs::{self, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use libc::{c_ulong, ioctl};
use log::{debug, info, warn};
use memmap2::{MmapMut, MmapOptions};

use crate::display::color::{to_rgb565_bytes, to_xrgb8888_bytes};
use crate::display::error::DisplayError;
use crate::display::traits::{ColorDepth, DisplayCapabilities, DisplayDriver};
use crate::display::vframebuf::VarFrameBuf;

const BACKLIGHT_ROOT: &str = "/sys/class/backlight";

const FBIOGET_VSCREENINFO: c_ulong = 0x4600;
const FBIOGET_FSCREENINFO: c_ulong = 0x4602;

#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// linux/fb.h `fb_var_screeninfo`
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbVarScreenInfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// linux/fb.h `fb_fix_screeninfo`
#[repr(C)]
#[allow(dead_code)]
#[derive(Debug, Default, Clone, Copy)]
struct FbFixScreenInfo {
    id: [u8; 16],
    smem_start: c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

/// Visible page of a framebuffer device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageGeometry {
    width: u32,
    height: u32,
    bits_per_pixel: u32,
    stride: usize,
    /// byte offset of the visible page inside the mapping
    offset: usize,
}

impl PageGeometry {
    /// Bytes to map so the whole visible page is covered
    fn map_len(&self) -> usize {
        self.offset + self.stride * self.height as usize
    }
}

/// Visible resolution, not the virtual one: double buffered devices report
/// twice the height in `yres_virtual`.
fn page_geometry(var: &FbVarScreenInfo, fix: &FbFixScreenInfo) -> Result<PageGeometry, DisplayError> {
    if var.xres == 0 || var.yres == 0 {
        return Err(DisplayError::InitializationFailed(format!(
            "framebuffer reports {}x{}",
            var.xres, var.yres
        )));
    }
    let bytes_pp = var.bits_per_pixel as usize / 8;
    let stride = match fix.line_length as usize {
        0 => var.xres_virtual.max(var.xres) as usize * bytes_pp,
        n => n,
    };
    let geometry = PageGeometry {
        width: var.xres,
        height: var.yres,
        bits_per_pixel: var.bits_per_pixel,
        stride,
        offset: var.yoffset as usize * stride + var.xoffset as usize * bytes_pp,
    };
    let smem = fix.smem_len as usize;
    if smem != 0 && geometry.map_len() > smem {
        return Err(DisplayError::BufferSizeMismatch { expected: geometry.map_len(), actual: smem });
    }
    Ok(geometry)
}

pub struct FbdevDriver {
    device: PathBuf,
    mmap: MmapMut,
    stride: usize,
    offset: usize,
    framebuffer: VarFrameBuf<Rgb888>,
    capabilities: DisplayCapabilities,
    backlight: Option<PathBuf>,
}

impl FbdevDriver {
    /// Open `/dev/fb{index}`; geometry and pixel format come from the screeninfo ioctls.
    pub fn open(index: u32) -> Result<Self, DisplayError> {
        let device = PathBuf::from(format!("/dev/fb{}", index));
        if !device.exists() {
            return Err(DisplayError::DeviceNotFound(device.display().to_string()));
        }
        let file = OpenOptions::new().read(true).write(true).open(&device)?;

        let mut var = FbVarScreenInfo::default();
        let mut fix = FbFixScreenInfo::default();
        // SAFETY: both structs mirror linux/fb.h and outlive the calls
        unsafe {
            if ioctl(file.as_raw_fd(), FBIOGET_VSCREENINFO as _, &mut var as *mut FbVarScreenInfo) < 0 {
                return Err(std::io::Error::last_os_error().into());
            }
            if ioctl(file.as_raw_fd(), FBIOGET_FSCREENINFO as _, &mut fix as *mut FbFixScreenInfo) < 0 {
                return Err(std::io::Error::last_os_error().into());
            }
        }

        let page = page_geometry(&var, &fix)?;
        let color_depth = match page.bits_per_pixel {
            16 => ColorDepth::Rgb565,
            32 => ColorDepth::Xrgb8888,
            other => return Err(DisplayError::UnsupportedFormat { bits_per_pixel: other }),
        };
        if var.yres_virtual > var.yres {
            debug!("{}: virtual {}x{}, drawing the visible page", device.display(), var.xres_virtual, var.yres_virtual);
        }

        // SAFETY: the mapping is owned by this driver and only written through `flush`
        let mmap = unsafe { MmapOptions::new().len(page.map_len()).map_mut(&file)? };

        let backlight = find_backlight(Path::new(BACKLIGHT_ROOT));
        match &backlight {
            Some(path) => debug!("backlight control at {}", path.display()),
            None => warn!("no backlight found under {}, screensaver will only blank", BACKLIGHT_ROOT),
        }

        info!(
            "{}: {}x{} {}bpp stride {}",
            device.display(),
            page.width,
            page.height,
            page.bits_per_pixel,
            page.stride
        );
        Ok(Self {
            device,
            mmap,
            stride: page.stride,
            offset: page.offset,
            framebuffer: VarFrameBuf::new(page.width, page.height, Rgb888::BLACK),
            capabilities: DisplayCapabilities {
                width: page.width,
                height: page.height,
                color_depth,
                max_fps: 30,
                supports_brightness: backlight.is_some(),
                reports_rotation: false,
            },
            backlight,
        })
    }
}

impl DisplayDriver for FbdevDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.framebuffer.clear(Rgb888::BLACK).map_err(|never| -> DisplayError { match never {} })?;
        self.flush()
    }

    fn set_brightness(&mut self, value: u8) -> Result<(), DisplayError> {
        let Some(path) = &self.backlight else {
            return Err(DisplayError::UnsupportedOperation);
        };
        fs::write(path, value.to_string())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        let width = self.capabilities.width as usize;
        let expected = self.offset + self.stride * self.capabilities.height as usize;
        if self.mmap.len() < expected {
            return Err(DisplayError::BufferSizeMismatch { expected, actual: self.mmap.len() });
        }
        let page = &mut self.mmap[self.offset..];
        match self.capabilities.color_depth {
            ColorDepth::Rgb565 => blit(self.framebuffer.as_slice(), width, page, self.stride, to_rgb565_bytes),
            ColorDepth::Xrgb8888 => blit(self.framebuffer.as_slice(), width, page, self.stride, to_xrgb8888_bytes),
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        debug!("clearing {}", self.device.display());
        self.framebuffer.clear(Rgb888::BLACK).map_err(|never| -> DisplayError { match never {} })?;
        self.flush()
    }

    fn framebuffer_mut(&mut self) -> &mut VarFrameBuf<Rgb888> {
        &mut self.framebuffer
    }
}

/// First `<root>/*/brightness`, sorted for a stable pick.
fn find_backlight(root: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(root)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path().join("brightness"))
        .filter(|p| p.exists())
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Row by row copy into a possibly padded destination.
fn blit<const N: usize>(src: &[Rgb888], width: usize, dst: &mut [u8], stride: usize, pack: fn(Rgb888) -> [u8; N]) {
    if width == 0 {
        return;
    }
    for (row, line) in src.chunks_exact(width).zip(dst.chunks_mut(stride)) {
        for (px, out) in row.iter().zip(line.chunks_exact_mut(N)) {
            out.copy_from_slice(&pack(*px));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screeninfo(xres: u32, yres: u32, yres_virtual: u32, bpp: u32) -> (FbVarScreenInfo, FbFixScreenInfo) {
        let var = FbVarScreenInfo {
            xres,
            yres,
            xres_virtual: xres,
            yres_virtual,
            bits_per_pixel: bpp,
            ..Default::default()
        };
        let fix = FbFixScreenInfo {
            line_length: xres * bpp / 8,
            smem_len: xres * yres_virtual * bpp / 8,
            ..Default::default()
        };
        (var, fix)
    }

    #[test]
    fn test_struct_layout_matches_kernel() {
        assert_eq!(std::mem::size_of::<FbVarScreenInfo>(), 160);
        assert_eq!(
            std::mem::size_of::<FbFixScreenInfo>(),
            if cfg!(target_pointer_width = "64") { 80 } else { 68 }
        );
    }

    #[test]
    fn test_double_buffered_uses_visible_height() {
        let (var, fix) = screeninfo(800, 480, 960, 32);
        let g = page_geometry(&var, &fix).unwrap();
        assert_eq!((g.width, g.height), (800, 480));
        assert_eq!(g.stride, 3200);
        assert_eq!(g.offset, 0);
        assert_eq!(g.map_len(), 3200 * 480);
    }

    #[test]
    fn test_panned_page_offset() {
        let (mut var, fix) = screeninfo(480, 320, 640, 16);
        var.yoffset = 320;
        let g = page_geometry(&var, &fix).unwrap();
        assert_eq!(g.offset, 320 * 960);
        assert_eq!(g.map_len(), fix.smem_len as usize);
    }

    #[test]
    fn test_missing_line_length_and_bad_sizes() {
        let (var, mut fix) = screeninfo(320, 240, 240, 16);
        fix.line_length = 0;
        assert_eq!(page_geometry(&var, &fix).unwrap().stride, 640);

        let (mut var, fix) = screeninfo(320, 240, 240, 16);
        var.yoffset = 240;
        assert!(matches!(page_geometry(&var, &fix), Err(DisplayError::BufferSizeMismatch { .. })));

        let (mut var, fix) = screeninfo(320, 240, 240, 16);
        var.xres = 0;
        assert!(page_geometry(&var, &fix).is_err());
    }

    #[test]
    fn test_blit_respects_stride() {
        let src = vec![Rgb888::new(1, 2, 3); 4];
        // 2x2 at 32 bpp with 4 bytes of row padding
        let mut dst = vec![0xAAu8; 12 * 2];
        blit(&src, 2, &mut dst, 12, to_xrgb8888_bytes);
        assert_eq!(&dst[0..4], &[3, 2, 1, 0xff]);
        assert_eq!(&dst[8..12], &[0xAA; 4]);
        assert_eq!(&dst[12..16], &[3, 2, 1, 0xff]);
    }

    #[test]
    fn test_blit_rgb565() {
        let src = vec![Rgb888::new(255, 0, 0); 2];
        let mut dst = vec![0u8; 4];
        blit(&src, 2, &mut dst, 4, to_rgb565_bytes);
        assert_eq!(&dst[0..2], &to_rgb565_bytes(Rgb888::new(255, 0, 0)));
    }

    #[test]
    fn test_find_backlight_missing_root() {
        assert_eq!(find_backlight(Path::new("/nonexistent/backlight")), None);
    }
}
