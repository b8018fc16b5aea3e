// src/lib.rs

//! Text and logo rendering for rescue-mode displays: front-panel OLEDs driven
//! through a device node and Linux framebuffers, at 4, 16 or 32 bits per pixel.

pub mod color;
pub mod config;
pub mod display;
pub mod glyph;
pub mod logo;
pub mod os;
pub mod rasterizer;
pub mod ui;

pub use color::PixelFormat;
pub use config::{Config, ConfigProvider, ProcConfig, StaticConfig};
pub use display::{Display, DisplayKind, OpenOptions, Rect, Transform};
pub use logo::Decompress;
