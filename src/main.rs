// src/main.rs

use anyhow::{bail, Context, Result};
use log::{info, warn};
use std::path::PathBuf;

use rescue_lcd::config::{Config, ProcConfig, StaticConfig};
use rescue_lcd::display::{Display, DisplayKind, OpenOptions};
use rescue_lcd::ui;

const DEFAULT_CONFIG_PATH: &str = "/etc/recovery-ui.json";

struct Args {
    config: PathBuf,
    /// Width, height and depth of an in-memory display.
    headless: Option<(u32, u32, u32)>,
    messages: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: PathBuf::from(DEFAULT_CONFIG_PATH),
        headless: None,
        messages: Vec::new(),
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = PathBuf::from(path);
            }
            "--headless" => {
                let value = iter.next().context("--headless needs WIDTHxHEIGHTxBPP")?;
                args.headless = Some(parse_geometry(&value)?);
            }
            _ => args.messages.push(arg),
        }
    }
    Ok(args)
}

fn parse_geometry(value: &str) -> Result<(u32, u32, u32)> {
    let parts = value
        .split('x')
        .map(|part| part.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid geometry '{}'", value))?;
    match parts[..] {
        [width, height, bpp] => Ok((width, height, bpp)),
        _ => bail!("Invalid geometry '{}', expected WIDTHxHEIGHTxBPP", value),
    }
}

/// Tries each configured display kind in order and returns the first that opens.
fn open_display(config: &Config) -> Option<Display> {
    for &kind in &config.ui.displays {
        let display = match kind {
            DisplayKind::Oled => {
                let proc_config = ProcConfig::new(&config.oled.proc_root);
                let options = OpenOptions::new(&config.oled.device, &proc_config)
                    .transform(config.oled.orientation);
                Display::open(kind, &options)
            }
            DisplayKind::Framebuffer => {
                let no_config = StaticConfig::new();
                let options = OpenOptions::new(&config.framebuffer.device, &no_config)
                    .console(&config.framebuffer.console)
                    .mapped(config.framebuffer.mapped)
                    .transform(config.framebuffer.orientation);
                Display::open(kind, &options)
            }
            DisplayKind::Headless => {
                warn!("Headless display listed in config; use --headless instead");
                None
            }
        };
        if display.is_some() {
            return display;
        }
    }
    None
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args = parse_args()?;
    let config = Config::load(&args.config)?;

    let display = match args.headless {
        Some((width, height, bpp)) => {
            let geometry = StaticConfig::geometry(width, height, bpp);
            Display::open(DisplayKind::Headless, &OpenOptions::new("/dev/null", &geometry))
        }
        None => open_display(&config),
    };
    let Some(mut display) = display else {
        bail!("No usable display");
    };
    info!(
        "Drawing rescue screen on {} display ({}x{})",
        display.kind(),
        display.width(),
        display.height()
    );

    ui::draw_rescue_screen(&mut display, &config.ui, &args.messages);
    if !display.update() {
        bail!("Failed to push the rescue screen to the display");
    }

    display.release();
    Ok(())
}
