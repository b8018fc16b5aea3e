// src/color.rs

//! Pixel format descriptors and ARGB to native pixel conversion.
//!
//! Every display reports (or is assigned by convention) a `PixelFormat`
//! describing where each color channel lives inside a native pixel. The
//! rasterizer never deals with ARGB directly: callers resolve a color once via
//! `PixelFormat::encode` and the resulting native value is written verbatim.

use anyhow::{bail, Result};
use log::warn;

/// Opaque white, the foreground every display starts with.
pub const ARGB_WHITE: u32 = 0xffff_ffff;

/// Position and width of one color channel inside a native pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Channel {
    pub offset: u32,
    pub length: u32,
}

impl Channel {
    pub const fn new(offset: u32, length: u32) -> Self {
        Channel { offset, length }
    }

    /// Packs an 8-bit component into this channel, dropping low bits that
    /// don't fit.
    fn pack(&self, component: u8) -> u32 {
        if self.length == 0 {
            return 0;
        }
        let value = (component as u32) >> (8 - self.length.min(8));
        value << self.offset
    }

    /// Extracts this channel's raw value from a native pixel.
    pub fn extract(&self, pixel: u32) -> u32 {
        if self.length == 0 {
            return 0;
        }
        (pixel >> self.offset) & ((1u32 << self.length) - 1)
    }
}

/// Channel layout of a display's native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub bits_per_pixel: u32,
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
    pub alpha: Channel,
    /// Swap the two bytes of a 16-bit pixel after packing.
    pub byte_swap: bool,
}

impl PixelFormat {
    /// 4-bit grayscale: every channel maps onto the same nibble.
    pub const GRAY4: PixelFormat = PixelFormat {
        bits_per_pixel: 4,
        red: Channel::new(0, 4),
        green: Channel::new(0, 4),
        blue: Channel::new(0, 4),
        alpha: Channel::new(0, 0),
        byte_swap: false,
    };

    pub const RGB565: PixelFormat = PixelFormat {
        bits_per_pixel: 16,
        red: Channel::new(11, 5),
        green: Channel::new(5, 6),
        blue: Channel::new(0, 5),
        alpha: Channel::new(0, 0),
        byte_swap: false,
    };

    pub const BGR565: PixelFormat = PixelFormat {
        bits_per_pixel: 16,
        red: Channel::new(0, 5),
        green: Channel::new(5, 6),
        blue: Channel::new(11, 5),
        alpha: Channel::new(0, 0),
        byte_swap: false,
    };

    pub const ARGB8888: PixelFormat = PixelFormat {
        bits_per_pixel: 32,
        red: Channel::new(16, 8),
        green: Channel::new(8, 8),
        blue: Channel::new(0, 8),
        alpha: Channel::new(24, 8),
        byte_swap: false,
    };

    pub const ABGR8888: PixelFormat = PixelFormat {
        bits_per_pixel: 32,
        red: Channel::new(0, 8),
        green: Channel::new(8, 8),
        blue: Channel::new(16, 8),
        alpha: Channel::new(24, 8),
        byte_swap: false,
    };

    /// The layout a character OLED uses when nothing overrides it.
    ///
    /// 16-bit panels take RGB565 in big-endian byte order.
    pub fn oled_default(bits_per_pixel: u32) -> Option<PixelFormat> {
        match bits_per_pixel {
            4 => Some(Self::GRAY4),
            16 => Some(Self::RGB565.swapped()),
            32 => Some(Self::ARGB8888),
            _ => None,
        }
    }

    /// Parses a color format name as reported by the box's configuration
    /// files, e.g. `RGB565`, `BGR565_BE` or `ARGB8888`. A `_BE` suffix on a
    /// 16-bit format selects swapped byte order.
    pub fn from_name(name: &str) -> Option<PixelFormat> {
        let upper = name.trim().to_ascii_uppercase();
        let (base, swapped) = match upper.strip_suffix("_BE") {
            Some(base) => (base, true),
            None => (upper.strip_suffix("_LE").unwrap_or(upper.as_str()), false),
        };
        let format = match base {
            "GRAY4" | "L4" => Self::GRAY4,
            "RGB565" => Self::RGB565,
            "BGR565" => Self::BGR565,
            "ARGB8888" => Self::ARGB8888,
            "ABGR8888" => Self::ABGR8888,
            _ => return None,
        };
        if swapped && format.bits_per_pixel != 16 {
            return None;
        }
        Some(if swapped { format.swapped() } else { format })
    }

    /// Applies a configuration-supplied format name on top of `self`.
    ///
    /// Names that don't parse, or that describe a different depth, are
    /// ignored with a warning.
    pub fn with_override(self, name: Option<&str>) -> PixelFormat {
        let Some(name) = name else {
            return self;
        };
        match Self::from_name(name) {
            Some(format) if format.bits_per_pixel == self.bits_per_pixel => format,
            Some(format) => {
                warn!(
                    "Ignoring color format '{}': {} bpp does not match the display's {} bpp",
                    name, format.bits_per_pixel, self.bits_per_pixel
                );
                self
            }
            None => {
                warn!("Ignoring unknown color format '{}'", name);
                self
            }
        }
    }

    pub const fn swapped(mut self) -> PixelFormat {
        self.byte_swap = true;
        self
    }

    /// Checks that every channel fits inside a pixel.
    pub fn validate(&self) -> Result<()> {
        for (name, channel) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if channel.length > 8 || channel.offset + channel.length > self.bits_per_pixel {
                bail!(
                    "{} channel (offset {}, length {}) does not fit a {} bpp pixel",
                    name,
                    channel.offset,
                    channel.length,
                    self.bits_per_pixel
                );
            }
        }
        Ok(())
    }

    /// Converts a 32-bit ARGB color into this format's native pixel value.
    pub fn encode(&self, argb: u32) -> u32 {
        let [a, r, g, b] = argb.to_be_bytes();
        let pixel = self.alpha.pack(a) | self.red.pack(r) | self.green.pack(g) | self.blue.pack(b);
        if self.bits_per_pixel == 16 && self.byte_swap {
            (pixel as u16).swap_bytes() as u32
        } else {
            pixel
        }
    }

    /// Splits a native pixel back into raw (unscaled) A/R/G/B channel values.
    pub fn decode(&self, pixel: u32) -> [u32; 4] {
        let pixel = if self.bits_per_pixel == 16 && self.byte_swap {
            (pixel as u16).swap_bytes() as u32
        } else {
            pixel
        };
        [
            self.alpha.extract(pixel),
            self.red.extract(pixel),
            self.green.extract(pixel),
            self.blue.extract(pixel),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn truncated(component: u8, channel: Channel) -> u32 {
        if channel.length == 0 {
            0
        } else {
            component as u32 >> (8 - channel.length)
        }
    }

    #[test]
    fn white_fills_every_channel() {
        assert_eq!(PixelFormat::RGB565.encode(ARGB_WHITE), 0xffff);
        assert_eq!(PixelFormat::ARGB8888.encode(ARGB_WHITE), 0xffff_ffff);
        assert_eq!(PixelFormat::GRAY4.encode(ARGB_WHITE), 0xf);
    }

    #[test]
    fn rgb565_packs_and_truncates() {
        // r=0xff -> 0x1f, g=0x80 -> 0x20, b=0x08 -> 0x01
        let pixel = PixelFormat::RGB565.encode(0xffff_8008);
        assert_eq!(pixel, (0x1f << 11) | (0x20 << 5) | 0x01);
    }

    #[test]
    fn byte_swap_only_applies_to_16bpp() {
        let swapped = PixelFormat::RGB565.swapped();
        assert_eq!(swapped.encode(0xff00_00ff), 0x1f00);
        let mut wide = PixelFormat::ARGB8888;
        wide.byte_swap = true;
        assert_eq!(wide.encode(0x1122_3344), 0x1122_3344);
    }

    #[test]
    fn encode_is_idempotent_and_decodes_to_truncated_components() {
        let formats = [
            PixelFormat::RGB565,
            PixelFormat::RGB565.swapped(),
            PixelFormat::BGR565,
            PixelFormat::ARGB8888,
            PixelFormat::ABGR8888,
        ];
        for format in formats {
            for argb in [0x8040_20f0u32, 0x0123_4567, 0xfedc_ba98, 0] {
                let first = format.encode(argb);
                assert_eq!(first, format.encode(argb));
                let [a, r, g, b] = argb.to_be_bytes();
                assert_eq!(
                    format.decode(first),
                    [
                        truncated(a, format.alpha),
                        truncated(r, format.red),
                        truncated(g, format.green),
                        truncated(b, format.blue),
                    ],
                    "format {:?} argb {:#010x}",
                    format,
                    argb
                );
            }
        }
    }

    #[test]
    fn parses_format_names() {
        assert_eq!(PixelFormat::from_name("bgr565"), Some(PixelFormat::BGR565));
        assert_eq!(
            PixelFormat::from_name("RGB565_BE"),
            Some(PixelFormat::RGB565.swapped())
        );
        assert_eq!(PixelFormat::from_name("ARGB8888_BE"), None);
        assert_eq!(PixelFormat::from_name("YUV"), None);
    }

    #[test]
    fn override_requires_matching_depth() {
        let base = PixelFormat::RGB565.swapped();
        assert_eq!(base.with_override(None), base);
        assert_eq!(base.with_override(Some("BGR565")), PixelFormat::BGR565);
        assert_eq!(base.with_override(Some("ARGB8888")), base);
        assert_eq!(base.with_override(Some("nonsense")), base);
    }

    #[test]
    fn validate_rejects_channels_past_the_pixel() {
        let mut format = PixelFormat::RGB565;
        assert!(format.validate().is_ok());
        format.red = Channel::new(12, 5);
        assert!(format.validate().is_err());
    }
}
