// src/display/mod.rs
//! The display handle.
//!
//! - `DisplayDriver`: device-specific buffer ownership and presentation
//!   (OLED node, Linux framebuffer, headless)
//! - `Geometry`/`Transform`: buffer layout and logical-to-physical mapping
//! - `Display`: cursor, linear addressing, text, clears, color and logo, the
//!   same on every driver

pub mod driver;
pub mod drivers;
pub mod geometry;

pub use driver::DisplayDriver;
pub use geometry::{Geometry, Rect, Transform};

use anyhow::{anyhow, bail, Result};
use log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::SeekFrom;
use std::path::PathBuf;

use crate::color::{PixelFormat, ARGB_WHITE};
use crate::config::ConfigProvider;
use crate::glyph::{FONT_HEIGHT, FONT_WIDTH};
use crate::logo::{self, Decompress, LogoAsset};
use crate::rasterizer::{Canvas, Depth};
use drivers::{FramebufferDriver, HeadlessDriver, OledDriver};

/// The kinds of display a box may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    /// Character OLED/LCD on the front panel.
    Oled,
    /// Linux framebuffer (HDMI output).
    Framebuffer,
    /// In-memory display with configured geometry.
    Headless,
}

impl fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayKind::Oled => write!(f, "oled"),
            DisplayKind::Framebuffer => write!(f, "framebuffer"),
            DisplayKind::Headless => write!(f, "headless"),
        }
    }
}

/// Parameters for opening a display.
pub struct OpenOptions<'a> {
    /// Device node (OLED and framebuffer).
    pub device: PathBuf,
    /// Console switched to graphics mode (framebuffer only).
    pub console: Option<PathBuf>,
    /// Geometry source (OLED and headless).
    pub config: &'a dyn ConfigProvider,
    pub transform: Transform,
    /// Draw straight into mapped video memory (framebuffer only).
    pub mapped: bool,
    /// Service for compressed logo assets.
    pub decompressor: Option<&'static dyn Decompress>,
    /// Logo to draw instead of the one picked for the geometry.
    pub logo: Option<&'static LogoAsset>,
}

impl<'a> OpenOptions<'a> {
    pub fn new(device: impl Into<PathBuf>, config: &'a dyn ConfigProvider) -> Self {
        OpenOptions {
            device: device.into(),
            console: None,
            config,
            transform: Transform::empty(),
            mapped: true,
            decompressor: None,
            logo: None,
        }
    }

    pub fn console(mut self, console: impl Into<PathBuf>) -> Self {
        self.console = Some(console.into());
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn mapped(mut self, mapped: bool) -> Self {
        self.mapped = mapped;
        self
    }

    pub fn decompressor(mut self, decompressor: &'static dyn Decompress) -> Self {
        self.decompressor = Some(decompressor);
        self
    }

    pub fn logo(mut self, logo: &'static LogoAsset) -> Self {
        self.logo = Some(logo);
        self
    }
}

/// A text-capable display.
///
/// The cursor is a logical pixel position and may lie anywhere, including off
/// screen; drawing outside the display is clipped silently.
pub struct Display {
    driver: Box<dyn DisplayDriver>,
    geometry: Geometry,
    format: PixelFormat,
    depth: Depth,
    background: Vec<u8>,
    foreground: u32,
    x: i32,
    y: i32,
    logo: Option<&'static LogoAsset>,
    decompressor: Option<&'static dyn Decompress>,
    frames: u64,
}

impl Display {
    /// Opens a display, returning `None` on any failure. The cause is logged.
    pub fn open(kind: DisplayKind, options: &OpenOptions<'_>) -> Option<Display> {
        match Self::try_open(kind, options) {
            Ok(display) => Some(display),
            Err(e) => {
                error!("Can't open {} display: {:#}", kind, e);
                None
            }
        }
    }

    pub fn try_open(kind: DisplayKind, options: &OpenOptions<'_>) -> Result<Display> {
        let driver: Box<dyn DisplayDriver> = match kind {
            DisplayKind::Oled => Box::new(OledDriver::open(
                &options.device,
                options.config,
                options.transform,
            )?),
            DisplayKind::Framebuffer => Box::new(FramebufferDriver::open(
                &options.device,
                options.console.as_deref(),
                options.mapped,
                options.transform,
            )?),
            DisplayKind::Headless => {
                let (geometry, format) = drivers::oled::probe(options.config, options.transform)?;
                Box::new(HeadlessDriver::new(geometry, format))
            }
        };
        let mut display = Self::with_driver(driver)?;
        display.decompressor = options.decompressor;
        if let Some(logo) = options.logo {
            let bpp = display.geometry.bits_per_pixel;
            if !logo.drawable_at(bpp) {
                bail!("logo '{}' ({:?}) can't be drawn at {} bpp", logo.name, logo.encoding, bpp);
            }
            debug!("Using logo '{}'", logo.name);
            display.logo = Some(logo);
        }
        Ok(display)
    }

    /// Wraps an already opened driver.
    pub fn with_driver(driver: Box<dyn DisplayDriver>) -> Result<Display> {
        let geometry = *driver.geometry();
        let format = *driver.format();
        let depth = Depth::from_bpp(geometry.bits_per_pixel)
            .ok_or_else(|| anyhow!("unsupported depth: {} bpp", geometry.bits_per_pixel))?;
        if driver.buffer().len() < geometry.size {
            bail!(
                "inconsistent display driver: buffer is {} bytes, geometry needs {}",
                driver.buffer().len(),
                geometry.size
            );
        }

        let logo = logo::select(&geometry);
        info!(
            "Opened {} display: {}x{} logical, {} bpp, scale {}, logo {}",
            driver.kind(),
            geometry.logical_width(),
            geometry.logical_height(),
            geometry.bits_per_pixel,
            geometry.scale(),
            logo.map_or("none", |l| l.name)
        );

        let mut display = Display {
            driver,
            background: vec![0u8; geometry.size],
            geometry,
            format,
            depth,
            foreground: 0,
            x: 0,
            y: 0,
            logo,
            decompressor: None,
            frames: 0,
        };
        display.set_foreground(ARGB_WHITE);
        Ok(display)
    }

    /// Closes the device and frees the buffers.
    pub fn release(self) {
        debug!("Releasing {} display", self.driver.kind());
    }

    pub fn kind(&self) -> DisplayKind {
        self.driver.kind()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn format(&self) -> &PixelFormat {
        &self.format
    }

    /// The live pixel buffer.
    pub fn pixels(&self) -> &[u8] {
        self.driver.buffer()
    }

    pub fn background(&self) -> &[u8] {
        &self.background
    }

    /// Native pixel at a logical position, or `None` off screen.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        let (px, py) = self.geometry.to_physical(x, y);
        if !self.geometry.contains(px, py) {
            return None;
        }
        let offset = self.geometry.byte_offset(px as u32, py as u32);
        Some(self.depth.read(self.driver.buffer(), offset, px as u32))
    }

    // --- Queries ---

    pub fn width(&self) -> u32 {
        self.geometry.logical_width()
    }

    pub fn height(&self) -> u32 {
        self.geometry.logical_height()
    }

    pub fn font_width(&self) -> u32 {
        FONT_WIDTH * self.geometry.scale()
    }

    pub fn font_height(&self) -> u32 {
        FONT_HEIGHT * self.geometry.scale()
    }

    /// On-screen logo size, `(0, 0)` when this display has no logo.
    pub fn logo_size(&self) -> (u32, u32) {
        self.logo
            .map_or((0, 0), |logo| logo.scaled_size(self.geometry.scale()))
    }

    // --- Cursor ---

    pub fn cursor(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn set_x(&mut self, x: i32) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: i32) {
        self.y = y;
    }

    /// Moves the cursor as if the visible area were one linear byte stream
    /// and returns the byte offset of the new position within it.
    ///
    /// The offset is converted to whole pixels first, so at 4 bpp one byte is
    /// two pixels. `End` starts one row past the last.
    pub fn seek(&mut self, pos: SeekFrom) -> i64 {
        let (width, height) = (self.geometry.width as i64, self.geometry.height as i64);
        let bpp = self.geometry.bits_per_pixel as i64;
        let offset = match pos {
            SeekFrom::Start(offset) => {
                self.x = 0;
                self.y = 0;
                offset as i64
            }
            SeekFrom::Current(offset) => offset,
            SeekFrom::End(offset) => {
                self.x = 0;
                self.y = height as i32;
                offset
            }
        };
        let pixels = offset * 8 / bpp;

        let total = self.y as i64 * width + self.x as i64 + pixels;
        self.x = total.rem_euclid(width) as i32;
        self.y = total.div_euclid(width) as i32;

        self.geometry.stride as i64 * self.y as i64 + self.x as i64 * bpp / 8
    }

    /// Copies raw bytes into the buffer at the cursor's linear position,
    /// stopping at the end of the buffer. Returns how many bytes were copied.
    /// The cursor doesn't move.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> usize {
        let offset = self.seek(SeekFrom::Current(0));
        if offset < 0 {
            return 0;
        }
        let start = self.geometry.origin + offset as usize;
        let end = self.geometry.size.min(start.saturating_add(bytes.len()));
        if start >= end {
            return 0;
        }
        let count = end - start;
        self.driver.buffer_mut()[start..end].copy_from_slice(&bytes[..count]);
        count
    }

    // --- Text ---

    /// Draws one character at the cursor and advances it by one cell.
    pub fn put_char(&mut self, c: char) {
        let byte = if c.is_ascii() { c as u8 } else { b'?' };
        let mut canvas = Canvas {
            geometry: &self.geometry,
            pixels: self.driver.buffer_mut(),
            background: &self.background,
        };
        self.x = self
            .depth
            .draw_glyph(&mut canvas, self.x, self.y, byte, self.foreground);
    }

    /// Draws `text` up to the first NUL.
    pub fn put_str(&mut self, text: &str) {
        for c in text.chars().take_while(|&c| c != '\0') {
            self.put_char(c);
        }
    }

    /// Draws formatted text, returning the number of characters drawn.
    pub fn print(&mut self, args: fmt::Arguments<'_>) -> usize {
        let text = fmt::format(args);
        let count = text.chars().take_while(|&c| c != '\0').count();
        self.put_str(&text);
        count
    }

    // --- Color and background ---

    /// Sets the text color from 0xAARRGGBB.
    pub fn set_foreground(&mut self, argb: u32) {
        self.foreground = self.format.encode(argb);
        trace!("Foreground {:#010x} -> native {:#x}", argb, self.foreground);
    }

    /// The current text color as a native pixel.
    pub fn foreground(&self) -> u32 {
        self.foreground
    }

    /// Remembers the current image as the one clears restore.
    pub fn save_background(&mut self) {
        self.background.copy_from_slice(&self.driver.buffer()[..self.geometry.size]);
    }

    /// The physical rectangle `clear(lines)` would restore, before clipping.
    pub fn clear_region(&self, lines: u32) -> Rect {
        let logical = Rect::new(self.x, self.y, self.width() as i32, lines as i32);
        self.geometry.rect_to_physical(logical)
    }

    /// Restores `lines` logical rows from the saved background, starting at
    /// the cursor row and extending from the cursor to the right edge.
    pub fn clear(&mut self, lines: u32) {
        let region = self.clear_region(lines);
        let Some(rect) = region.clip(self.geometry.width, self.geometry.height) else {
            trace!("clear({}) at {:?}: nothing visible", lines, self.cursor());
            return;
        };

        let bpp = self.geometry.bits_per_pixel;
        let depth = self.depth;
        let pixels = self.driver.buffer_mut();
        for row in rect.y as u32..(rect.y + rect.height) as u32 {
            let line = self.geometry.byte_offset(0, row);
            let mut first = rect.x as u32;
            let mut last = (rect.x + rect.width) as u32;
            // A 4 bpp byte holds two pixels; copy a half-covered one by nibble.
            if (first * bpp) % 8 != 0 {
                let pixel = depth.read(&self.background, line + (first * bpp / 8) as usize, first);
                depth.write(pixels, line + (first * bpp / 8) as usize, first, pixel);
                first += 1;
            }
            if last > first && (last * bpp) % 8 != 0 {
                last -= 1;
                let pixel = depth.read(&self.background, line + (last * bpp / 8) as usize, last);
                depth.write(pixels, line + (last * bpp / 8) as usize, last, pixel);
            }
            if first < last {
                let (left, right) = (line + (first * bpp / 8) as usize, line + (last * bpp / 8) as usize);
                pixels[left..right].copy_from_slice(&self.background[left..right]);
            }
        }
    }

    // --- Logo ---

    /// Draws this display's logo with its top-left corner at the cursor and
    /// leaves the cursor on the row below it.
    pub fn draw_logo(&mut self) {
        let Some(logo) = self.logo else {
            debug!("No logo for this display");
            return;
        };
        let Some(data) = logo.data(self.decompressor) else {
            return;
        };

        let scale = self.geometry.scale();
        let rows = self.depth.render_logo(logo, data, scale, self.foreground);
        let (width, _) = logo.scaled_size(scale);
        let (x, y) = (self.x, self.y);
        let bpp = self.geometry.bits_per_pixel;

        // Untransformed, byte aligned and vertically on screen: rows go
        // straight through linear addressing.
        let streamable = self.geometry.transform.is_empty()
            && (0..self.geometry.width as i32).contains(&x)
            && (x as u32 * bpp) % 8 == 0
            && y >= 0
            && y as i64 + rows.len() as i64 <= self.geometry.height as i64;
        if streamable {
            let visible = (self.geometry.width - x as u32) as usize * bpp as usize / 8;
            let line = (self.geometry.width * bpp / 8) as i64;
            for row in &rows {
                let len = row.len().min(visible);
                self.write_bytes(&row[..len]);
                self.seek(SeekFrom::Current(line));
            }
        } else {
            let mut canvas = Canvas {
                geometry: &self.geometry,
                pixels: self.driver.buffer_mut(),
                background: &self.background,
            };
            self.depth.draw_rows(&mut canvas, x, y, &rows, width);
            self.set_cursor(x, y + rows.len() as i32);
        }
    }

    // --- Presentation ---

    /// Pushes the buffer to the device. Returns `false` if that failed; the
    /// cause is logged.
    pub fn update(&mut self) -> bool {
        match self.try_update() {
            Ok(()) => true,
            Err(e) => {
                error!("{} display update failed: {:#}", self.kind(), e);
                false
            }
        }
    }

    pub fn try_update(&mut self) -> Result<()> {
        self.driver.update()?;
        self.frames += 1;
        Ok(())
    }

    /// Number of successful updates since open.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl fmt::Write for Display {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_str(s);
        Ok(())
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("kind", &self.driver.kind())
            .field("geometry", &self.geometry)
            .field("format", &self.format)
            .field("cursor", &(self.x, self.y))
            .field("foreground", &self.foreground)
            .field("logo", &self.logo.map(|l| l.name))
            .field("frames", &self.frames)
            .finish()
    }
}
