//! Character OLED driver.
//!
//! The panel is a plain device node: the whole frame is pushed with one
//! blocking `write` of exactly the buffer size. Geometry is not discoverable
//! from the node itself and comes from the configuration provider.

use crate::color::PixelFormat;
use crate::config::{ConfigProvider, OLED_BPP, OLED_COLOR_FORMAT, OLED_XRES, OLED_YRES};
use crate::display::driver::{frame_written, DeviceClaim, DisplayDriver};
use crate::display::geometry::{Geometry, Transform};
use crate::display::DisplayKind;
use anyhow::{anyhow, Context, Result};
use log::info;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

const DEFAULT_WIDTH: u32 = 128;
const DEFAULT_HEIGHT: u32 = 64;
const DEFAULT_BPP: u32 = 4;

/// Reads panel geometry and color layout from `config`.
pub fn probe(config: &dyn ConfigProvider, transform: Transform) -> Result<(Geometry, PixelFormat)> {
    let width = config.get_uint(OLED_XRES, DEFAULT_WIDTH);
    let height = config.get_uint(OLED_YRES, DEFAULT_HEIGHT);
    let bits_per_pixel = config.get_uint(OLED_BPP, DEFAULT_BPP);

    let geometry = Geometry::packed(width, height, bits_per_pixel, transform)
        .context("Invalid OLED geometry")?;
    let format = PixelFormat::oled_default(bits_per_pixel)
        .ok_or_else(|| anyhow!("no pixel format for {} bpp", bits_per_pixel))?
        .with_override(config.get_string(OLED_COLOR_FORMAT).as_deref());
    format.validate()?;
    Ok((geometry, format))
}

pub struct OledDriver {
    file: File,
    geometry: Geometry,
    format: PixelFormat,
    buffer: Vec<u8>,
    _claim: DeviceClaim,
}

impl OledDriver {
    pub fn open(device: &Path, config: &dyn ConfigProvider, transform: Transform) -> Result<Self> {
        let (geometry, format) = probe(config, transform)?;
        let claim = DeviceClaim::acquire(device)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(device)
            .with_context(|| format!("Can't open {}", device.display()))?;

        info!(
            "OledDriver: {} is {}x{} at {} bpp, {} bytes per frame",
            device.display(),
            geometry.width,
            geometry.height,
            geometry.bits_per_pixel,
            geometry.size
        );

        Ok(OledDriver {
            file,
            geometry,
            format,
            buffer: vec![0u8; geometry.size],
            _claim: claim,
        })
    }
}

impl DisplayDriver for OledDriver {
    fn kind(&self) -> DisplayKind {
        DisplayKind::Oled
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn format(&self) -> &PixelFormat {
        &self.format
    }

    fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    fn update(&mut self) -> Result<()> {
        frame_written(self.file.write(&self.buffer), self.buffer.len())
            .context("OledDriver: frame not pushed")
    }
}
