/*
 *  display/error.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error type for the display backends
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

use std::error::Error;
use std::fmt;
use std::io;

/// Backend failures. Fatal during startup, surfaced to the operator.
#[derive(Debug)]
pub enum DisplayError {
    /// Hardware or window initialization failed
    InitializationFailed(String),

    /// Device node or sysfs attribute missing
    DeviceNotFound(String),

    /// Pixel format the driver cannot convert to
    UnsupportedFormat { bits_per_pixel: u32 },

    /// Unsupported operation for this display
    UnsupportedOperation,

    /// Framebuffer size mismatch
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Underlying device I/O
    Io(io::Error),

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::DeviceNotFound(path) =>
                write!(f, "Display device not found: {}", path),
            DisplayError::UnsupportedFormat { bits_per_pixel } =>
                write!(f, "Unsupported framebuffer format: {} bits per pixel (need 16 or 32)", bits_per_pixel),
            DisplayError::UnsupportedOperation =>
                write!(f, "Operation not supported by this display"),
            DisplayError::BufferSizeMismatch { expected, actual } =>
                write!(f, "Buffer size mismatch: expected {} bytes, got {}", expected, actual),
            DisplayError::Io(err) =>
                write!(f, "Display I/O error: {}", err),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DisplayError {
    fn from(err: io::Error) -> Self {
        DisplayError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_source() {
        let e = DisplayError::UnsupportedFormat { bits_per_pixel: 8 };
        assert!(e.to_string().contains("8 bits per pixel"));

        let e: DisplayError = io::Error::new(io::ErrorKind::NotFound, "/dev/fb3").into();
        assert!(matches!(e, DisplayError::Io(_)));
        assert!(e.source().is_some());
        assert!(DisplayError::Other("x".into()).source().is_none());
    }
}
