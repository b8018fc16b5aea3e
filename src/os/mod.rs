// src/os/mod.rs

//! Thin wrappers over Linux device interfaces.

pub mod fbdev;
pub mod mmap;
