// src/rasterizer/mod.rs

//! Pixel-level drawing for the three supported depths.
//!
//! All buffers are plain byte slices; `Depth` knows how a pixel is laid out
//! at each bit depth and provides the typed read/write helpers. Glyphs are
//! drawn through the logical-to-physical transform, one logical column at a
//! time. Logos are expanded into native pixels and handed back as rows, which
//! the caller either streams through linear addressing or places with
//! `draw_rows` when the panel is transformed.

use crate::display::geometry::Geometry;
use crate::glyph::{self, FONT_HEIGHT, FONT_WIDTH};
use crate::logo::{LogoAsset, LogoEncoding};

/// Pixel encoding variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Two grayscale pixels per byte, even X in the high nibble.
    Gray4,
    Rgb16,
    Argb32,
}

impl Depth {
    pub fn from_bpp(bits_per_pixel: u32) -> Option<Depth> {
        match bits_per_pixel {
            4 => Some(Depth::Gray4),
            16 => Some(Depth::Rgb16),
            32 => Some(Depth::Argb32),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Depth::Gray4 => 4,
            Depth::Rgb16 => 16,
            Depth::Argb32 => 32,
        }
    }

    /// Reads the native pixel stored at `offset`. At 4 bpp `x` selects the
    /// nibble.
    pub fn read(self, buffer: &[u8], offset: usize, x: u32) -> u32 {
        match self {
            Depth::Gray4 => {
                let byte = buffer[offset];
                if x & 1 == 0 {
                    (byte >> 4) as u32
                } else {
                    (byte & 0x0f) as u32
                }
            }
            Depth::Rgb16 => u16::from_ne_bytes([buffer[offset], buffer[offset + 1]]) as u32,
            Depth::Argb32 => u32::from_ne_bytes([
                buffer[offset],
                buffer[offset + 1],
                buffer[offset + 2],
                buffer[offset + 3],
            ]),
        }
    }

    /// Stores a native pixel at `offset`.
    pub fn write(self, buffer: &mut [u8], offset: usize, x: u32, pixel: u32) {
        match self {
            Depth::Gray4 => {
                let mask: u8 = if x & 1 == 0 { 0xf0 } else { 0x0f };
                let nibble = (pixel as u8 & 0x0f) * 0x11;
                buffer[offset] = (buffer[offset] & !mask) | (nibble & mask);
            }
            Depth::Rgb16 => {
                buffer[offset..offset + 2].copy_from_slice(&(pixel as u16).to_ne_bytes())
            }
            Depth::Argb32 => buffer[offset..offset + 4].copy_from_slice(&pixel.to_ne_bytes()),
        }
    }

    /// Appends one native pixel to a byte stream.
    fn push(self, out: &mut Vec<u8>, pixel: u32) {
        match self {
            Depth::Gray4 => unreachable!("4 bpp logos are pre-rendered"),
            Depth::Rgb16 => out.extend_from_slice(&(pixel as u16).to_ne_bytes()),
            Depth::Argb32 => out.extend_from_slice(&pixel.to_ne_bytes()),
        }
    }
}

/// The buffers one draw call works on.
pub struct Canvas<'a> {
    pub geometry: &'a Geometry,
    pub pixels: &'a mut [u8],
    /// Source of "unset" pixels at 16 and 32 bpp.
    pub background: &'a [u8],
}

impl Depth {
    /// Draws `c` with its top-left corner at logical (`x`, `y`) and returns the
    /// logical X after the glyph. Positions that fall outside the display are
    /// skipped; the cursor advances by the full cell width regardless.
    pub fn draw_glyph(self, canvas: &mut Canvas<'_>, x: i32, y: i32, c: u8, foreground: u32) -> i32 {
        let geometry = canvas.geometry;
        let scale = geometry.scale();
        let bitmap = glyph::glyph(c);
        let mut x = x;

        for column in 0..FONT_WIDTH * scale {
            for row in 0..FONT_HEIGHT * scale {
                let (px, py) = geometry.to_physical(x, y + row as i32);
                if !geometry.contains(px, py) {
                    continue;
                }
                let (px, py) = (px as u32, py as u32);
                let offset = geometry.byte_offset(px, py);
                let pixel = if !glyph::is_set(bitmap, column, row, scale) {
                    match self {
                        Depth::Gray4 => 0,
                        Depth::Rgb16 | Depth::Argb32 => self.read(canvas.background, offset, px),
                    }
                } else if self == Depth::Gray4 {
                    0xf
                } else {
                    foreground
                };
                self.write(canvas.pixels, offset, px, pixel);
            }
            x += 1;
        }
        x
    }

    /// Copies rows of native pixels, `width` pixels each, to logical
    /// (`x`, `y`) one pixel at a time through the transform. Pixels outside
    /// the display are skipped.
    pub fn draw_rows(self, canvas: &mut Canvas<'_>, x: i32, y: i32, rows: &[Vec<u8>], width: u32) {
        let geometry = canvas.geometry;
        for (dy, line) in rows.iter().enumerate() {
            for column in 0..width {
                let (px, py) = geometry.to_physical(x + column as i32, y + dy as i32);
                if !geometry.contains(px, py) {
                    continue;
                }
                let pixel = self.read(line, (column * self.bits() / 8) as usize, column);
                let (px, py) = (px as u32, py as u32);
                self.write(canvas.pixels, geometry.byte_offset(px, py), px, pixel);
            }
        }
    }

    /// Renders `logo` into rows of native pixels, one `Vec` per output row.
    ///
    /// # Panics
    /// Panics if the asset's encoding can't be drawn at this depth. Assets are
    /// selected per geometry when the display opens, so this is a logic error.
    pub fn render_logo(self, logo: &LogoAsset, data: &[u8], scale: u32, foreground: u32) -> Vec<Vec<u8>> {
        match (self, logo.encoding) {
            (Depth::Gray4, LogoEncoding::Gray4) => {
                data.chunks(logo.row_len()).map(<[u8]>::to_vec).collect()
            }
            (depth, LogoEncoding::Native { bits_per_pixel }) if depth.bits() == bits_per_pixel => {
                data.chunks(logo.row_len()).map(<[u8]>::to_vec).collect()
            }
            (Depth::Rgb16 | Depth::Argb32, LogoEncoding::Mono) => {
                let row_bytes = (logo.width * scale * self.bits() / 8) as usize;
                let mut rows = Vec::with_capacity((logo.height * scale) as usize);
                for y in 0..logo.height {
                    let mut row = Vec::with_capacity(row_bytes);
                    for x in 0..logo.width {
                        let pixel = if logo.is_lit(data, x, y) { foreground } else { 0 };
                        for _ in 0..scale {
                            self.push(&mut row, pixel);
                        }
                    }
                    for _ in 0..scale {
                        rows.push(row.clone());
                    }
                }
                rows
            }
            (depth, encoding) => panic!(
                "logo '{}' ({:?}) can't be drawn at {} bpp",
                logo.name,
                encoding,
                depth.bits()
            ),
        }
    }
}
