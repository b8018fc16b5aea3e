// src/ui.rs

//! The rescue screen: logo, mode banner and status lines.

use log::debug;

use crate::config::UiConfig;
use crate::display::Display;

/// Horizontal start that centres `chars` cells, or the left edge when the
/// text is wider than the display.
pub fn centred_x(display: &Display, chars: usize) -> i32 {
    let text = chars as i64 * display.font_width() as i64;
    ((display.width() as i64 - text) / 2).max(0) as i32
}

/// Draws the full rescue screen and leaves the background saved with only
/// the logo on it, so status lines can be cleared and redrawn later.
pub fn draw_rescue_screen(display: &mut Display, ui: &UiConfig, messages: &[String]) {
    let height = display.height() as i32;
    let font_height = display.font_height() as i32;

    display.set_cursor(0, 0);
    display.clear(display.height());

    let (logo_width, _) = display.logo_size();
    display.set_cursor((display.width().saturating_sub(logo_width) / 2) as i32, 16);
    display.draw_logo();
    display.save_background();

    display.set_foreground(ui.foreground);
    display.set_cursor(centred_x(display, ui.banner.chars().count()), height - font_height * 4);
    display.put_str(&ui.banner);

    for (row, message) in messages.iter().enumerate() {
        show_status(display, message, height - font_height * (2 - row as i32));
    }
    debug!("Rescue screen drawn with {} status lines", messages.len());
}

/// Replaces one status line at `y` with `text`.
pub fn show_status(display: &mut Display, text: &str, y: i32) {
    display.set_cursor(0, y);
    display.clear(display.font_height());
    display.set_cursor(centred_x(display, text.chars().count()), y);
    display.put_str(text);
}
