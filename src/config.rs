// src/config.rs

//! Configuration for the rescue display.
//!
//! Two layers live here:
//!
//! - `ConfigProvider`: the small key/value interface device drivers use to
//!   probe geometry at open time. On the box this is backed by text files
//!   under `/proc/stb/lcd` holding hexadecimal numbers (`ProcConfig`); tests
//!   and headless runs use `StaticConfig`.
//! - `Config`: application settings (device paths, orientation, banner text)
//!   deserialized from an optional JSON file. Every field has a default, so a
//!   missing file or a partial one is fine.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::display::{DisplayKind, Transform};

/// Key/value source for device probing.
pub trait ConfigProvider {
    /// Returns the unsigned integer stored under `key`, or `default` when the
    /// key is absent or empty.
    ///
    /// # Panics
    /// Implementations panic when a value is present but malformed. Geometry
    /// derived from a garbled value would corrupt buffer addressing.
    fn get_uint(&self, key: &str, default: u32) -> u32;

    /// Returns the trimmed first line stored under `key`.
    fn get_string(&self, key: &str) -> Option<String>;
}

/// Reads keys from files below a root directory, one value per file.
#[derive(Debug, Clone)]
pub struct ProcConfig {
    root: PathBuf,
}

impl ProcConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ProcConfig { root: root.into() }
    }

    fn first_line(&self, key: &str) -> Option<String> {
        let path = self.root.join(key);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let line = contents.lines().next().unwrap_or("").trim().to_string();
                debug!("ProcConfig: {} = '{}'", path.display(), line);
                Some(line)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("ProcConfig: can't read {}, using the default: {}", path.display(), e);
                None
            }
        }
    }
}

impl ConfigProvider for ProcConfig {
    fn get_uint(&self, key: &str, default: u32) -> u32 {
        match self.first_line(key) {
            Some(line) if !line.is_empty() => parse_hex(&line).unwrap_or_else(|| {
                panic!(
                    "{}: malformed hexadecimal value '{}'",
                    self.root.join(key).display(),
                    line
                )
            }),
            _ => default,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.first_line(key).filter(|line| !line.is_empty())
    }
}

/// In-memory provider. Values are stored as text and parsed exactly like the
/// files `ProcConfig` reads.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    values: HashMap<String, String>,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Geometry keys as an OLED driver expects them.
    pub fn geometry(width: u32, height: u32, bits_per_pixel: u32) -> Self {
        StaticConfig::new()
            .with(OLED_XRES, format!("{:x}", width))
            .with(OLED_YRES, format!("{:x}", height))
            .with(OLED_BPP, format!("{:x}", bits_per_pixel))
    }
}

impl ConfigProvider for StaticConfig {
    fn get_uint(&self, key: &str, default: u32) -> u32 {
        match self.values.get(key).map(|v| v.trim()) {
            Some(value) if !value.is_empty() => parse_hex(value)
                .unwrap_or_else(|| panic!("{}: malformed hexadecimal value '{}'", key, value)),
            _ => default,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn parse_hex(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

// Keys the OLED driver probes.
pub const OLED_XRES: &str = "xres";
pub const OLED_YRES: &str = "yres";
pub const OLED_BPP: &str = "bpp";
pub const OLED_COLOR_FORMAT: &str = "colorformat";

// --- Application settings ---

/// Root of the JSON settings file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub oled: OledConfig,
    pub framebuffer: FramebufferConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Config> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults.", path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Character OLED settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OledConfig {
    /// Device node the rendered buffer is written to.
    pub device: PathBuf,
    /// Directory holding the `xres`/`yres`/`bpp`/`colorformat` files.
    pub proc_root: PathBuf,
    pub orientation: Transform,
}

impl Default for OledConfig {
    fn default() -> Self {
        OledConfig {
            device: PathBuf::from("/dev/dbox/oled0"),
            proc_root: PathBuf::from("/proc/stb/lcd"),
            orientation: Transform::empty(),
        }
    }
}

/// Linux framebuffer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramebufferConfig {
    pub device: PathBuf,
    /// Virtual console switched into graphics mode while the display is open.
    pub console: PathBuf,
    /// Map video memory directly instead of drawing into a shadow buffer.
    pub mapped: bool,
    pub orientation: Transform,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        FramebufferConfig {
            device: PathBuf::from("/dev/fb0"),
            console: PathBuf::from("/dev/tty0"),
            mapped: true,
            orientation: Transform::empty(),
        }
    }
}

/// What the recovery UI shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub banner: String,
    /// Text color as 0xAARRGGBB.
    pub foreground: u32,
    /// Display kinds to try, in order. The first one that opens is used.
    pub displays: Vec<DisplayKind>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            banner: "RESCUE MODE".to_string(),
            foreground: crate::color::ARGB_WHITE,
            displays: vec![DisplayKind::Oled, DisplayKind::Framebuffer],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_log::test;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn proc_config_parses_hex_first_line() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "xres", "190\nignored\n");
        write_file(dir.path(), "yres", "0x40\n");
        let config = ProcConfig::new(dir.path());
        assert_eq!(config.get_uint("xres", 128), 400);
        assert_eq!(config.get_uint("yres", 0), 64);
    }

    #[test]
    fn proc_config_defaults_for_missing_or_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bpp", "\n");
        let config = ProcConfig::new(dir.path());
        assert_eq!(config.get_uint("bpp", 4), 4);
        assert_eq!(config.get_uint("xres", 0x80), 128);
        assert_eq!(config.get_string("colorformat"), None);
    }

    #[test]
    fn unreadable_keys_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where a value file should be can't be read as text.
        fs::create_dir(dir.path().join("yres")).unwrap();
        let config = ProcConfig::new(dir.path());
        assert_eq!(config.get_uint("yres", 0x40), 64);
        assert_eq!(config.get_string("yres"), None);
    }

    #[test]
    #[should_panic(expected = "malformed hexadecimal")]
    fn proc_config_panics_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "xres", "wide\n");
        ProcConfig::new(dir.path()).get_uint("xres", 128);
    }

    #[test]
    fn proc_config_strings_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "colorformat", "  BGR565 \nRGB565\n");
        let config = ProcConfig::new(dir.path());
        assert_eq!(config.get_string("colorformat").as_deref(), Some("BGR565"));
    }

    #[test]
    fn static_config_geometry_round_trips() {
        let config = StaticConfig::geometry(400, 240, 16).with(OLED_COLOR_FORMAT, "RGB565");
        assert_eq!(config.get_uint(OLED_XRES, 0), 400);
        assert_eq!(config.get_uint(OLED_YRES, 0), 240);
        assert_eq!(config.get_uint(OLED_BPP, 0), 16);
        assert_eq!(config.get_string(OLED_COLOR_FORMAT).as_deref(), Some("RGB565"));
    }

    #[test]
    fn settings_fill_in_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "framebuffer": { "mapped": false, "orientation": "REVERSE_X | INVERT_AXES" },
                 "ui": { "banner": "UPDATE MODE" } }"#,
        )
        .unwrap();
        assert!(!config.framebuffer.mapped);
        assert_eq!(
            config.framebuffer.orientation,
            Transform::REVERSE_X | Transform::INVERT_AXES
        );
        assert_eq!(config.framebuffer.device, PathBuf::from("/dev/fb0"));
        assert_eq!(config.ui.banner, "UPDATE MODE");
        assert_eq!(config.ui.foreground, 0xffff_ffff);
        assert_eq!(config.oled.device, PathBuf::from("/dev/dbox/oled0"));
    }

    #[test]
    fn missing_settings_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.ui.displays, vec![DisplayKind::Oled, DisplayKind::Framebuffer]);
    }

    #[test]
    fn invalid_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bad.json", "{ not json");
        assert!(Config::load(&dir.path().join("bad.json")).is_err());
    }
}
