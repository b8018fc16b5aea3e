// src/os/fbdev.rs

//! Linux framebuffer and virtual console ioctls.
//!
//! The structs mirror `struct fb_var_screeninfo` / `struct fb_fix_screeninfo`
//! from `<linux/fb.h>`; libc doesn't carry them.

use anyhow::{Context, Result};
use std::os::unix::io::RawFd;

use crate::color::{Channel, PixelFormat};

const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;
const FBIOBLANK: libc::c_ulong = 0x4611;
const KDSETMODE: libc::c_ulong = 0x4b3a;

const FB_BLANK_UNBLANK: libc::c_int = 0;
pub const KD_TEXT: libc::c_int = 0x00;
pub const KD_GRAPHICS: libc::c_int = 0x01;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbVarScreeninfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbFixScreeninfo {
    pub id: [libc::c_char; 16],
    pub smem_start: libc::c_ulong,
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

nix::ioctl_read_bad!(fbioget_vscreeninfo, FBIOGET_VSCREENINFO, FbVarScreeninfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, FBIOGET_FSCREENINFO, FbFixScreeninfo);
nix::ioctl_write_int_bad!(fbioblank, FBIOBLANK);
nix::ioctl_write_int_bad!(kdsetmode, KDSETMODE);

pub fn var_screeninfo(fd: RawFd) -> Result<FbVarScreeninfo> {
    let mut info = FbVarScreeninfo::default();
    unsafe { fbioget_vscreeninfo(fd, &mut info) }.context("FBIOGET_VSCREENINFO failed")?;
    Ok(info)
}

pub fn fix_screeninfo(fd: RawFd) -> Result<FbFixScreeninfo> {
    let mut info = FbFixScreeninfo::default();
    unsafe { fbioget_fscreeninfo(fd, &mut info) }.context("FBIOGET_FSCREENINFO failed")?;
    Ok(info)
}

pub fn unblank(fd: RawFd) -> Result<()> {
    unsafe { fbioblank(fd, FB_BLANK_UNBLANK) }.context("FBIOBLANK failed")?;
    Ok(())
}

/// Switches a virtual console between `KD_TEXT` and `KD_GRAPHICS`.
pub fn set_console_mode(fd: RawFd, mode: libc::c_int) -> Result<()> {
    unsafe { kdsetmode(fd, mode) }.with_context(|| format!("KDSETMODE {} failed", mode))?;
    Ok(())
}

impl FbVarScreeninfo {
    /// The channel layout the driver reports. Framebuffers are native-endian,
    /// so no byte swap.
    pub fn pixel_format(&self) -> PixelFormat {
        let channel = |field: &FbBitfield| Channel::new(field.offset, field.length);
        PixelFormat {
            bits_per_pixel: self.bits_per_pixel,
            red: channel(&self.red),
            green: channel(&self.green),
            blue: channel(&self.blue),
            alpha: channel(&self.transp),
            byte_swap: false,
        }
    }
}
