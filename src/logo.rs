// src/logo.rs

//! Logo bitmaps and their process-wide decode cache.
//!
//! Assets are immutable statics. Their pixel data is decoded on first use
//! into a per-asset `OnceCell` and shared for the rest of the process: init
//! once, read thereafter, no teardown. The cell makes the first decode safe
//! even if two threads race for it.

use anyhow::{bail, Result};
use log::{debug, error};
use once_cell::sync::OnceCell;

use crate::display::geometry::Geometry;

/// External decompression service for packed assets.
pub trait Decompress {
    /// Inflates `src` into `dst`, which has exactly the decompressed size.
    /// Returns `false` unless the whole output was produced.
    fn decompress(&self, src: &[u8], dst: &mut [u8]) -> bool;
}

/// Pixel layout of decoded logo data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoEncoding {
    /// One bit per pixel, rows padded to whole bytes, most significant bit
    /// leftmost. Expanded to native pixels and scaled at draw time.
    Mono,
    /// Packed 4-bit pixels, high nibble first. Streamed to 4 bpp displays
    /// verbatim.
    Gray4,
    /// Full-size 16 or 32 bpp pixels in native byte order, drawn verbatim
    /// and unscaled on displays of that depth. Art lights pixels white.
    Native { bits_per_pixel: u32 },
}

/// Where an asset's bytes come from.
#[derive(Debug, Clone, Copy)]
pub enum LogoSource {
    /// Text rows where `#` marks a lit pixel.
    Art(&'static [&'static str]),
    /// Compressed bytes inflating to exactly `LogoAsset::data_len` bytes.
    Compressed(&'static [u8]),
}

#[derive(Debug)]
pub struct LogoAsset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub encoding: LogoEncoding,
    /// Logical display size a native asset was rendered for.
    pub display: Option<(u32, u32)>,
    source: LogoSource,
    decoded: OnceCell<Vec<u8>>,
}

impl LogoAsset {
    pub const fn new(
        name: &'static str,
        width: u32,
        height: u32,
        encoding: LogoEncoding,
        source: LogoSource,
    ) -> Self {
        LogoAsset {
            name,
            width,
            height,
            encoding,
            display: None,
            source,
            decoded: OnceCell::new(),
        }
    }

    /// A full-size color asset made for one display size and depth.
    pub const fn native(
        name: &'static str,
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        display: (u32, u32),
        source: LogoSource,
    ) -> Self {
        LogoAsset {
            name,
            width,
            height,
            encoding: LogoEncoding::Native { bits_per_pixel },
            display: Some(display),
            source,
            decoded: OnceCell::new(),
        }
    }

    /// Whether this asset can be rendered on a display of `bits_per_pixel`.
    pub fn drawable_at(&self, bits_per_pixel: u32) -> bool {
        match self.encoding {
            LogoEncoding::Mono => matches!(bits_per_pixel, 16 | 32),
            LogoEncoding::Gray4 => bits_per_pixel == 4,
            LogoEncoding::Native { bits_per_pixel: bpp } => bpp == bits_per_pixel,
        }
    }

    /// Whether this is a native asset rendered for exactly `geometry`.
    fn made_for(&self, geometry: &Geometry) -> bool {
        matches!(self.encoding, LogoEncoding::Native { .. })
            && self.drawable_at(geometry.bits_per_pixel)
            && self.display == Some((geometry.logical_width(), geometry.logical_height()))
    }

    /// Bytes per decoded row.
    pub fn row_len(&self) -> usize {
        match self.encoding {
            LogoEncoding::Mono => self.width.div_ceil(8) as usize,
            LogoEncoding::Gray4 => self.width.div_ceil(2) as usize,
            LogoEncoding::Native { bits_per_pixel } => (self.width * bits_per_pixel).div_ceil(8) as usize,
        }
    }

    /// Exact size of the decoded data.
    pub fn data_len(&self) -> usize {
        self.row_len() * self.height as usize
    }

    /// On-screen size at `scale`. Pre-rendered assets don't scale.
    pub fn scaled_size(&self, scale: u32) -> (u32, u32) {
        match self.encoding {
            LogoEncoding::Mono => (self.width * scale, self.height * scale),
            LogoEncoding::Gray4 | LogoEncoding::Native { .. } => (self.width, self.height),
        }
    }

    /// Decoded pixel data, decoding on first use.
    pub fn data(&self, decompressor: Option<&dyn Decompress>) -> Option<&[u8]> {
        match self.decoded.get_or_try_init(|| self.decode(decompressor)) {
            Ok(data) => Some(data),
            Err(e) => {
                error!("Logo '{}': {:#}", self.name, e);
                None
            }
        }
    }

    /// Whether a mono pixel is lit in decoded data.
    pub fn is_lit(&self, data: &[u8], x: u32, y: u32) -> bool {
        let byte = data[y as usize * self.row_len() + (x / 8) as usize];
        byte & (0x80 >> (x % 8)) != 0
    }

    fn decode(&self, decompressor: Option<&dyn Decompress>) -> Result<Vec<u8>> {
        let mut data = vec![0u8; self.data_len()];
        match self.source {
            LogoSource::Art(rows) => {
                let art_width = rows.first().map_or(0, |row| row.len()) as u32;
                let art_height = rows.len() as u32;
                if art_width == 0
                    || self.width % art_width != 0
                    || self.height % art_height != 0
                    || self.width / art_width != self.height / art_height
                {
                    bail!(
                        "{}x{} art doesn't magnify to {}x{}",
                        art_width,
                        art_height,
                        self.width,
                        self.height
                    );
                }
                if let Some(y) = rows.iter().position(|row| row.len() != art_width as usize) {
                    bail!("art row {} is {} wide, expected {}", y, rows[y].len(), art_width);
                }
                // Each art cell covers zoom x zoom pixels.
                let zoom = self.width / art_width;
                for y in 0..self.height {
                    let art = rows[(y / zoom) as usize].as_bytes();
                    for x in (0..self.width).filter(|x| art[(x / zoom) as usize] == b'#') {
                        self.light(&mut data, x, y);
                    }
                }
            }
            LogoSource::Compressed(packed) => {
                let Some(decompressor) = decompressor else {
                    bail!("compressed asset but no decompressor available");
                };
                if !decompressor.decompress(packed, &mut data) {
                    bail!("decompression failed");
                }
            }
        }
        debug!("Logo '{}': decoded {} bytes", self.name, data.len());
        Ok(data)
    }

    fn light(&self, data: &mut [u8], x: u32, y: u32) {
        let row_len = self.row_len();
        let row = &mut data[y as usize * row_len..][..row_len];
        let x = x as usize;
        match self.encoding {
            LogoEncoding::Mono => row[x / 8] |= 0x80 >> (x % 8),
            LogoEncoding::Gray4 => row[x / 2] |= if x % 2 == 0 { 0xf0 } else { 0x0f },
            LogoEncoding::Native { bits_per_pixel } => {
                let bytes = (bits_per_pixel / 8) as usize;
                row[x * bytes..][..bytes].fill(0xff);
            }
        }
    }
}

#[rustfmt::skip]
const RESCUE_ART: &[&str] = &[
    "############################################",
    "#..........................................#",
    "#.####...#####...####...###...#...#..#####.#",
    "#.#...#..#......#......#...#..#...#..#.....#",
    "#.#...#..#......#......#......#...#..#.....#",
    "#.####...####....###...#......#...#..####..#",
    "#.#.#....#..........#..#......#...#..#.....#",
    "#.#..#...#..........#..#...#..#...#..#.....#",
    "#.#...#..#####..####....###....###...#####.#",
    "#..........................................#",
    "############################################",
];

/// Monochrome logo, scaled for color displays.
pub static MONO_LOGO: LogoAsset =
    LogoAsset::new("rescue-mono", 44, 11, LogoEncoding::Mono, LogoSource::Art(RESCUE_ART));

/// The same artwork pre-rendered for 4 bpp character displays.
pub static GRAY4_LOGO: LogoAsset =
    LogoAsset::new("rescue-gray4", 44, 11, LogoEncoding::Gray4, LogoSource::Art(RESCUE_ART));

/// The artwork magnified four times in 32 bpp color for 1280x720 panels.
pub static HD_LOGO: LogoAsset =
    LogoAsset::native("rescue-hd", 176, 44, 32, (1280, 720), LogoSource::Art(RESCUE_ART));

static NATIVE_LOGOS: &[&LogoAsset] = &[&HD_LOGO];

/// Picks the logo for a display, or `None` if no asset fits its geometry. A
/// native asset made for exactly this geometry wins over the scaled ones.
pub fn select(geometry: &Geometry) -> Option<&'static LogoAsset> {
    if let Some(&asset) = NATIVE_LOGOS.iter().find(|asset| asset.made_for(geometry)) {
        return Some(asset);
    }
    let asset = match geometry.bits_per_pixel {
        4 => &GRAY4_LOGO,
        16 | 32 => &MONO_LOGO,
        _ => return None,
    };
    let (width, height) = asset.scaled_size(geometry.scale());
    if width <= geometry.logical_width() && height <= geometry.logical_height() {
        Some(asset)
    } else {
        debug!(
            "Logo '{}' ({}x{}) doesn't fit {}x{}",
            asset.name,
            width,
            height,
            geometry.logical_width(),
            geometry.logical_height()
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Transform;

    struct Repeat(u8);

    impl Decompress for Repeat {
        fn decompress(&self, src: &[u8], dst: &mut [u8]) -> bool {
            if src.len() != 1 {
                return false;
            }
            dst.fill(src[0] ^ self.0);
            true
        }
    }

    #[test]
    fn art_decodes_to_mono_bits() {
        let data = MONO_LOGO.data(None).unwrap();
        assert_eq!(data.len(), 6 * 11);
        // Top border: 44 lit pixels, then padding.
        assert_eq!(&data[..6], &[0xff, 0xff, 0xff, 0xff, 0xff, 0xf0]);
        assert!(MONO_LOGO.is_lit(data, 0, 1));
        assert!(!MONO_LOGO.is_lit(data, 1, 1));
        assert!(MONO_LOGO.is_lit(data, 43, 1));
    }

    #[test]
    fn art_decodes_to_gray4_nibbles() {
        let data = GRAY4_LOGO.data(None).unwrap();
        assert_eq!(data.len(), 22 * 11);
        assert!(data[..22].iter().all(|&b| b == 0xff));
        // Second row: lit, dark, ..., dark, lit.
        assert_eq!(data[22], 0xf0);
        assert_eq!(data[43], 0x0f);
    }

    #[test]
    fn decoding_happens_once() {
        let first = MONO_LOGO.data(None).unwrap().as_ptr();
        let second = MONO_LOGO.data(None).unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn compressed_assets_use_the_decompressor() {
        static PACKED: LogoAsset =
            LogoAsset::new("packed", 16, 2, LogoEncoding::Mono, LogoSource::Compressed(&[0x0f]));
        assert!(PACKED.data(None).is_none());
        assert!(PACKED.data(Some(&Repeat(0))).is_some());
        assert_eq!(PACKED.data(None).unwrap(), &[0x0f; 4]);
    }

    #[test]
    fn failed_decompression_yields_nothing() {
        static BROKEN: LogoAsset =
            LogoAsset::new("broken", 8, 1, LogoEncoding::Mono, LogoSource::Compressed(&[1, 2]));
        assert!(BROKEN.data(Some(&Repeat(0))).is_none());
    }

    #[test]
    fn native_art_is_magnified_to_white_pixels() {
        let data = HD_LOGO.data(None).unwrap();
        assert_eq!(HD_LOGO.row_len(), 176 * 4);
        assert_eq!(data.len(), 176 * 4 * 44);
        assert_eq!(HD_LOGO.scaled_size(4), (176, 44));
        // Border cells are 4x4 blocks; the first inner cell starts at (4, 4).
        let pixel = |x: usize, y: usize| &data[y * 176 * 4 + x * 4..][..4];
        assert_eq!(pixel(3, 4), &[0xff; 4]);
        assert_eq!(pixel(4, 4), &[0; 4]);
        assert_eq!(pixel(4, 3), &[0xff; 4]);
        assert_eq!(pixel(175, 43), &[0xff; 4]);
    }

    #[test]
    fn art_that_does_not_magnify_evenly_is_rejected() {
        static SKEWED: LogoAsset =
            LogoAsset::new("skewed", 88, 11, LogoEncoding::Mono, LogoSource::Art(RESCUE_ART));
        assert!(SKEWED.data(None).is_none());
    }

    #[test]
    fn native_assets_only_draw_at_their_depth() {
        assert!(HD_LOGO.drawable_at(32));
        assert!(!HD_LOGO.drawable_at(16));
        assert!(MONO_LOGO.drawable_at(16));
        assert!(!GRAY4_LOGO.drawable_at(32));
    }

    #[test]
    fn native_logo_is_picked_for_its_exact_geometry() {
        let hd = Geometry::packed(1280, 720, 32, Transform::empty()).unwrap();
        assert_eq!(select(&hd).map(|l| l.name), Some("rescue-hd"));
        // Same size at another depth, or rotated, falls back to the mono art.
        let hd16 = Geometry::packed(1280, 720, 16, Transform::empty()).unwrap();
        assert_eq!(select(&hd16).map(|l| l.name), Some("rescue-mono"));
        let portrait = Geometry::packed(1280, 720, 32, Transform::INVERT_AXES).unwrap();
        assert_eq!(select(&portrait).map(|l| l.name), Some("rescue-mono"));
    }

    #[test]
    fn selection_depends_on_depth_and_fit() {
        let oled = Geometry::packed(128, 64, 4, Transform::empty()).unwrap();
        assert_eq!(select(&oled).map(|l| l.name), Some("rescue-gray4"));
        let lcd = Geometry::packed(400, 240, 16, Transform::empty()).unwrap();
        assert_eq!(select(&lcd).map(|l| l.name), Some("rescue-mono"));
        let tiny = Geometry::packed(32, 8, 4, Transform::empty()).unwrap();
        assert!(select(&tiny).is_none());
        // Scale 2 makes the logo 88 wide.
        let narrow = Geometry::packed(80, 240, 32, Transform::empty()).unwrap();
        assert!(select(&narrow).is_none());
    }
}
