//! Headless display driver: an in-memory buffer with no device behind it.

use crate::color::PixelFormat;
use crate::display::driver::DisplayDriver;
use crate::display::geometry::Geometry;
use crate::display::DisplayKind;
use anyhow::Result;
use log::{info, trace};

pub struct HeadlessDriver {
    geometry: Geometry,
    format: PixelFormat,
    buffer: Vec<u8>,
}

impl HeadlessDriver {
    pub fn new(geometry: Geometry, format: PixelFormat) -> Self {
        info!(
            "HeadlessDriver: {}x{} at {} bpp",
            geometry.width, geometry.height, geometry.bits_per_pixel
        );
        Self {
            geometry,
            format,
            buffer: vec![0u8; geometry.size],
        }
    }
}

impl DisplayDriver for HeadlessDriver {
    fn kind(&self) -> DisplayKind {
        DisplayKind::Headless
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
        trace!("HeadlessDriver: update ({} bytes)", self.buffer.len());
        Ok(())
    }
}
