//! Linux framebuffer driver.
//!
//! Two buffer strategies:
//! - mapped: video memory is `mmap`ed and drawn into directly, `update` has
//!   nothing to do.
//! - buffered: drawing goes to a private shadow buffer which `update` copies
//!   to the device with `pwrite`.
//!
//! Either way the buffer covers the whole virtual resolution and drawing is
//! confined to the visible window at (`xoffset`, `yoffset`).

use crate::color::PixelFormat;
use crate::display::driver::{frame_written, DeviceClaim, DisplayDriver};
use crate::display::geometry::{Geometry, Transform};
use crate::display::DisplayKind;
use crate::os::fbdev::{self, FbFixScreeninfo, FbVarScreeninfo, KD_GRAPHICS, KD_TEXT};
use crate::os::mmap::MappedRegion;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// Keeps a virtual console in graphics mode; switches it back to text mode
/// on drop.
struct GraphicsConsole {
    tty: File,
}

impl GraphicsConsole {
    fn enter(path: &Path) -> Result<Self> {
        let tty = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(path)
            .with_context(|| format!("Can't open console {}", path.display()))?;
        fbdev::set_console_mode(tty.as_raw_fd(), KD_GRAPHICS)
            .with_context(|| format!("Can't switch {} to graphics mode", path.display()))?;
        debug!("FramebufferDriver: {} in graphics mode", path.display());
        Ok(GraphicsConsole { tty })
    }
}

impl Drop for GraphicsConsole {
    fn drop(&mut self) {
        if let Err(e) = fbdev::set_console_mode(self.tty.as_raw_fd(), KD_TEXT) {
            warn!("FramebufferDriver: failed to restore text mode: {:#}", e);
        }
    }
}

enum FbMemory {
    Mapped(MappedRegion),
    Shadow(Vec<u8>),
}

pub struct FramebufferDriver {
    // Field order is drop order: unmap before closing the device, restore the
    // console last.
    memory: FbMemory,
    file: File,
    geometry: Geometry,
    format: PixelFormat,
    _console: Option<GraphicsConsole>,
    _claim: DeviceClaim,
}

/// Derives buffer geometry from the driver's reports, clamping a stride that
/// is too small to hold a visible row.
pub fn layout(var: &FbVarScreeninfo, fix: &FbFixScreeninfo, transform: Transform) -> Result<Geometry> {
    if !matches!(var.bits_per_pixel, 4 | 16 | 32) {
        bail!("unsupported depth: {} bits per pixel", var.bits_per_pixel);
    }
    if var.xres == 0 || var.yres == 0 {
        bail!("framebuffer reports an empty {}x{} screen", var.xres, var.yres);
    }

    let virtual_width = var.xres_virtual.max(var.xres);
    if var.xoffset + var.xres > virtual_width {
        bail!(
            "visible window {}+{} runs past the {} pixel virtual width",
            var.xoffset,
            var.xres,
            virtual_width
        );
    }

    // A row must hold the whole virtual width, not just the visible part.
    let min_stride = (virtual_width * var.bits_per_pixel).div_ceil(8);
    let stride = if fix.line_length < min_stride {
        warn!(
            "FramebufferDriver: line length {} is shorter than a {} pixel row, using {}",
            fix.line_length, virtual_width, min_stride
        );
        min_stride
    } else {
        fix.line_length
    };

    let virtual_height = var.yres_virtual.max(var.yres + var.yoffset);
    Ok(Geometry {
        width: var.xres,
        height: var.yres,
        bits_per_pixel: var.bits_per_pixel,
        stride,
        size: stride as usize * virtual_height as usize,
        origin: stride as usize * var.yoffset as usize
            + (var.xoffset * var.bits_per_pixel / 8) as usize,
        transform,
    })
}

/// Copies a whole shadow buffer to the start of video memory.
pub fn write_shadow(device: &File, shadow: &[u8]) -> Result<()> {
    frame_written(device.write_at(shadow, 0), shadow.len())
        .context("FramebufferDriver: shadow buffer not copied back")
}

impl FramebufferDriver {
    pub fn open(
        device: &Path,
        console: Option<&Path>,
        mapped: bool,
        transform: Transform,
    ) -> Result<Self> {
        let claim = DeviceClaim::acquire(device)?;
        let console = console.map(GraphicsConsole::enter).transpose()?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_CLOEXEC)
            .open(device)
            .with_context(|| format!("Can't open {}", device.display()))?;
        let fd = file.as_raw_fd();

        let var = fbdev::var_screeninfo(fd)?;
        let fix = fbdev::fix_screeninfo(fd)?;
        if let Err(e) = fbdev::unblank(fd) {
            warn!("FramebufferDriver: {:#}", e);
        }

        let geometry = layout(&var, &fix, transform)?;
        let format = var.pixel_format();
        format.validate().context("Framebuffer reports an unusable pixel format")?;

        let memory = if mapped {
            if fix.smem_len != 0 && geometry.size > fix.smem_len as usize {
                bail!(
                    "{} bytes of video memory needed, device has {}",
                    geometry.size,
                    fix.smem_len
                );
            }
            let region = MappedRegion::new(&file, geometry.size)
                .with_context(|| format!("Can't map {}", device.display()))?;
            FbMemory::Mapped(region)
        } else {
            FbMemory::Shadow(vec![0u8; geometry.size])
        };

        info!(
            "FramebufferDriver: {} is {}x{} ({}x{} virtual) at {} bpp, stride {}, {}",
            device.display(),
            var.xres,
            var.yres,
            var.xres_virtual,
            var.yres_virtual,
            var.bits_per_pixel,
            geometry.stride,
            if mapped { "mapped" } else { "buffered" }
        );

        Ok(FramebufferDriver {
            memory,
            file,
            geometry,
            format,
            _console: console,
            _claim: claim,
        })
    }
}

impl DisplayDriver for FramebufferDriver {
    fn kind(&self) -> DisplayKind {
        DisplayKind::Framebuffer
    }

    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn format(&self) -> &PixelFormat {
        &self.format
    }

    fn buffer(&self) -> &[u8] {
        match &self.memory {
            FbMemory::Mapped(region) => region.as_slice(),
            FbMemory::Shadow(buffer) => buffer,
        }
    }

    fn buffer_mut(&mut self) -> &mut [u8] {
        match &mut self.memory {
            FbMemory::Mapped(region) => region.as_mut_slice(),
            FbMemory::Shadow(buffer) => buffer,
        }
    }

    fn update(&mut self) -> Result<()> {
        match &self.memory {
            FbMemory::Mapped(_) => Ok(()),
            FbMemory::Shadow(buffer) => write_shadow(&self.file, buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(xres: u32, yres: u32, bpp: u32) -> FbVarScreeninfo {
        FbVarScreeninfo {
            xres,
            yres,
            xres_virtual: xres,
            yres_virtual: yres * 2,
            bits_per_pixel: bpp,
            ..Default::default()
        }
    }

    #[test]
    fn layout_covers_the_virtual_screen() {
        let var = screen(1280, 720, 32);
        let fix = FbFixScreeninfo {
            line_length: 5120,
            ..Default::default()
        };
        let geometry = layout(&var, &fix, Transform::empty()).unwrap();
        assert_eq!(geometry.stride, 5120);
        assert_eq!(geometry.size, 5120 * 1440);
        assert_eq!(geometry.origin, 0);
    }

    #[test]
    fn visible_window_offset_is_applied() {
        let mut var = screen(1280, 720, 32);
        var.xres_virtual = 1288;
        var.yoffset = 720;
        var.xoffset = 8;
        let fix = FbFixScreeninfo {
            line_length: 5184,
            ..Default::default()
        };
        let geometry = layout(&var, &fix, Transform::empty()).unwrap();
        assert_eq!(geometry.origin, 5184 * 720 + 32);
        assert_eq!(geometry.byte_offset(0, 0), geometry.origin);
    }

    #[test]
    fn window_past_the_virtual_width_is_rejected() {
        let mut var = screen(400, 240, 16);
        var.xoffset = 8;
        let fix = FbFixScreeninfo {
            line_length: 800,
            ..Default::default()
        };
        assert!(layout(&var, &fix, Transform::empty()).is_err());
    }

    #[test]
    fn clamped_stride_keeps_the_last_visible_pixel_in_the_buffer() {
        let mut var = screen(400, 240, 16);
        var.xres_virtual = 416;
        var.xoffset = 16;
        var.yoffset = 240;
        var.yres_virtual = 480;
        let fix = FbFixScreeninfo {
            line_length: 10,
            ..Default::default()
        };
        let geometry = layout(&var, &fix, Transform::empty()).unwrap();
        assert_eq!(geometry.stride, 832);
        assert!(geometry.byte_offset(399, 239) + 2 <= geometry.size);
    }

    #[test]
    fn shadow_buffer_lands_at_the_start_of_the_device() {
        let device = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(device.path(), [0xee; 32]).unwrap();
        let shadow: Vec<u8> = (0..24).collect();
        write_shadow(device.as_file(), &shadow).unwrap();

        let contents = std::fs::read(device.path()).unwrap();
        assert_eq!(&contents[..24], shadow.as_slice());
        assert_eq!(&contents[24..], &[0xee; 8]);
    }

    #[test]
    fn shadow_copy_fails_on_a_read_only_device() {
        let device = tempfile::NamedTempFile::new().unwrap();
        let read_only = File::open(device.path()).unwrap();
        assert!(write_shadow(&read_only, &[0u8; 16]).is_err());
    }

    #[test]
    fn short_line_length_is_clamped_up() {
        let var = screen(400, 240, 16);
        let fix = FbFixScreeninfo {
            line_length: 10,
            ..Default::default()
        };
        let geometry = layout(&var, &fix, Transform::empty()).unwrap();
        assert_eq!(geometry.stride, 800);
    }

    #[test]
    fn unsupported_depth_is_rejected() {
        let var = screen(640, 480, 8);
        assert!(layout(&var, &FbFixScreeninfo::default(), Transform::empty()).is_err());
    }
}
