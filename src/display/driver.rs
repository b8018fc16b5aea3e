// src/display/driver.rs
//! DisplayDriver trait - the device-specific half of a display.
//!
//! A driver owns the live pixel buffer and knows how to push it to the
//! hardware. Everything else (cursor, text, clears, logo, color) lives in
//! `Display` and works the same on every driver.
//!
//! ## Lifecycle
//! 1. `open` - acquire the device, probe geometry, allocate or map the buffer
//! 2. `buffer_mut` / `update` - drawing and presenting, any number of times
//! 3. `Drop` - unmap, restore console state, close the device

use anyhow::{bail, Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::color::PixelFormat;
use crate::display::geometry::Geometry;
use crate::display::DisplayKind;

/// Device-specific display primitives.
pub trait DisplayDriver {
    fn kind(&self) -> DisplayKind;

    fn geometry(&self) -> &Geometry;

    fn format(&self) -> &PixelFormat;

    /// The live pixel buffer, `geometry().size` bytes long.
    fn buffer(&self) -> &[u8];

    fn buffer_mut(&mut self) -> &mut [u8];

    /// Makes the buffer contents visible on the device. Never retried.
    fn update(&mut self) -> Result<()>;
}

/// Checks the outcome of pushing one whole frame with a single write. A
/// short write is an error; nothing is retried.
pub fn frame_written(result: io::Result<usize>, len: usize) -> Result<()> {
    let written = result.context("write failed")?;
    if written != len {
        bail!("short write: {} of {} bytes", written, len);
    }
    Ok(())
}

static CLAIMED_DEVICES: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Exclusive hold on a device node for the lifetime of one display.
#[derive(Debug)]
pub struct DeviceClaim {
    path: PathBuf,
}

impl DeviceClaim {
    pub fn acquire(path: &Path) -> Result<DeviceClaim> {
        let path = fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve device path {}", path.display()))?;
        let mut claimed = CLAIMED_DEVICES.lock().unwrap_or_else(|e| e.into_inner());
        if !claimed.insert(path.clone()) {
            bail!("{} is already open", path.display());
        }
        debug!("Claimed {}", path.display());
        Ok(DeviceClaim { path })
    }
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        let mut claimed = CLAIMED_DEVICES.lock().unwrap_or_else(|e| e.into_inner());
        claimed.remove(&self.path);
        debug!("Released {}", self.path.display());
    }
}
