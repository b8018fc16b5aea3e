// src/display/geometry.rs

//! Buffer geometry and the logical-to-physical coordinate transform.
//!
//! Callers always address a display in logical ("reading order") coordinates.
//! Panels that are mounted rotated or mirrored declare a `Transform` at open
//! time and every pixel lookup goes through `Geometry::to_physical`.

use anyhow::{bail, Result};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Orientation fix-ups applied to logical coordinates.
    ///
    /// Reversal is applied first, in logical space; `INVERT_AXES` then swaps
    /// the two axes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Transform: u8 {
        const REVERSE_X   = 1 << 0;
        const REVERSE_Y   = 1 << 1;
        const INVERT_AXES = 1 << 2;
    }
}

/// Size and memory layout of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Visible width in physical pixels.
    pub width: u32,
    /// Visible height in physical pixels.
    pub height: u32,
    pub bits_per_pixel: u32,
    /// Bytes per buffer row, including any hardware padding.
    pub stride: u32,
    /// Total buffer size in bytes. Framebuffers may be taller than the visible
    /// area (virtual resolution).
    pub size: usize,
    /// Byte offset of the visible area's first pixel inside the buffer.
    pub origin: usize,
    pub transform: Transform,
}

impl Geometry {
    /// Geometry for a tightly packed buffer of exactly `width` x `height`.
    pub fn packed(width: u32, height: u32, bits_per_pixel: u32, transform: Transform) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("display geometry {}x{} is empty", width, height);
        }
        if !matches!(bits_per_pixel, 4 | 16 | 32) {
            bail!("unsupported depth: {} bits per pixel", bits_per_pixel);
        }
        let stride = (width * bits_per_pixel).div_ceil(8);
        Ok(Geometry {
            width,
            height,
            bits_per_pixel,
            stride,
            size: stride as usize * height as usize,
            origin: 0,
            transform,
        })
    }

    /// Width as seen by callers.
    pub fn logical_width(&self) -> u32 {
        if self.transform.contains(Transform::INVERT_AXES) {
            self.height
        } else {
            self.width
        }
    }

    /// Height as seen by callers.
    pub fn logical_height(&self) -> u32 {
        if self.transform.contains(Transform::INVERT_AXES) {
            self.width
        } else {
            self.height
        }
    }

    /// Integer multiplier for the font cell and the logo.
    pub fn scale(&self) -> u32 {
        1 + (self.logical_height() + 120) / 240
    }

    /// Maps a logical point to physical buffer coordinates. The result may lie
    /// outside the buffer; check it with `contains`.
    pub fn to_physical(&self, x: i32, y: i32) -> (i32, i32) {
        let mut x = x;
        let mut y = y;
        if self.transform.contains(Transform::REVERSE_X) {
            x = self.logical_width() as i32 - x - 1;
        }
        if self.transform.contains(Transform::REVERSE_Y) {
            y = self.logical_height() as i32 - y - 1;
        }
        if self.transform.contains(Transform::INVERT_AXES) {
            (y, x)
        } else {
            (x, y)
        }
    }

    /// Whether a physical point lies inside the visible area.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Maps a logical rectangle to physical coordinates, without clipping.
    pub fn rect_to_physical(&self, rect: Rect) -> Rect {
        let mut rect = rect;
        if self.transform.contains(Transform::REVERSE_X) {
            rect.x = self.logical_width() as i32 - rect.x - rect.width;
        }
        if self.transform.contains(Transform::REVERSE_Y) {
            rect.y = self.logical_height() as i32 - rect.y - rect.height;
        }
        if self.transform.contains(Transform::INVERT_AXES) {
            Rect {
                x: rect.y,
                y: rect.x,
                width: rect.height,
                height: rect.width,
            }
        } else {
            rect
        }
    }

    /// Byte offset of a physical pixel relative to the start of the buffer.
    /// At 4 bpp this is the byte holding the pixel's nibble.
    pub fn byte_offset(&self, x: u32, y: u32) -> usize {
        self.origin + self.stride as usize * y as usize + (x * self.bits_per_pixel / 8) as usize
    }

    /// Bytes covered by one visible row.
    pub fn row_bytes(&self) -> usize {
        (self.width * self.bits_per_pixel).div_ceil(8) as usize
    }
}

/// A rectangle in signed pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    /// Clips to `[0, width) x [0, height)`. The negative side is trimmed
    /// first, then the overflowing side. Returns `None` when nothing remains.
    pub fn clip(self, width: u32, height: u32) -> Option<Rect> {
        let (x, w) = clip_span(self.x, self.width, width as i32);
        let (y, h) = clip_span(self.y, self.height, height as i32);
        if w <= 0 || h <= 0 {
            return None;
        }
        Some(Rect::new(x, y, w, h))
    }
}

fn clip_span(start: i32, len: i32, limit: i32) -> (i32, i32) {
    let mut start = start;
    let mut len = len;
    if start < 0 {
        len += start;
        start = 0;
    }
    if start + len > limit {
        len = limit - start;
    }
    (start, len)
}
