// src/display/drivers/mod.rs
//! Display driver implementations.

pub mod fbdev;
pub mod headless;
pub mod oled;

pub use fbdev::FramebufferDriver;
pub use headless::HeadlessDriver;
pub use oled::OledDriver;
