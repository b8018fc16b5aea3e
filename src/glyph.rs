// src/glyph.rs

//! The fixed 6x8 bitmap font.
//!
//! Each glyph is six columns; bit `n` of a column byte is pixel row `n`, top
//! row first. The sixth column is always blank and doubles as letter spacing.
//! Only printable ASCII is covered, everything else draws as a blank cell.

/// Unscaled glyph cell width in pixels.
pub const FONT_WIDTH: u32 = 6;
/// Unscaled glyph cell height in pixels.
pub const FONT_HEIGHT: u32 = 8;

const FIRST_PRINTABLE: u8 = b' ';
const LAST_PRINTABLE: u8 = b'~';

/// Column bitmap of a single character.
pub type Glyph = [u8; FONT_WIDTH as usize];

const BLANK: Glyph = [0; FONT_WIDTH as usize];

/// Looks up the bitmap for a byte. Bytes outside printable ASCII map to a
/// blank glyph.
pub fn glyph(c: u8) -> &'static Glyph {
    if (FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&c) {
        &FONT[(c - FIRST_PRINTABLE) as usize]
    } else {
        &BLANK
    }
}

/// Whether the pixel at (`column`, `row`) of a glyph scaled by `scale` is set.
pub fn is_set(glyph: &Glyph, column: u32, row: u32, scale: u32) -> bool {
    let column = (column / scale) as usize;
    let row = row / scale;
    column < glyph.len() && row < FONT_HEIGHT && glyph[column] & (1 << row) != 0
}

#[rustfmt::skip]
static FONT: [Glyph; (LAST_PRINTABLE - FIRST_PRINTABLE + 1) as usize] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x00, 0x00, 0x5f, 0x00, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00, 0x00], // "
    [0x14, 0x7f, 0x14, 0x7f, 0x14, 0x00], // #
    [0x24, 0x2a, 0x7f, 0x2a, 0x12, 0x00], // $
    [0x23, 0x13, 0x08, 0x64, 0x62, 0x00], // %
    [0x36, 0x49, 0x56, 0x20, 0x50, 0x00], // &
    [0x00, 0x08, 0x07, 0x03, 0x00, 0x00], // '
    [0x00, 0x1c, 0x22, 0x41, 0x00, 0x00], // (
    [0x00, 0x41, 0x22, 0x1c, 0x00, 0x00], // )
    [0x2a, 0x1c, 0x7f, 0x1c, 0x2a, 0x00], // *
    [0x08, 0x08, 0x3e, 0x08, 0x08, 0x00], // +
    [0x00, 0x80, 0x70, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08, 0x00], // -
    [0x00, 0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02, 0x00], // /
    [0x3e, 0x51, 0x49, 0x45, 0x3e, 0x00], // 0
    [0x00, 0x42, 0x7f, 0x40, 0x00, 0x00], // 1
    [0x72, 0x49, 0x49, 0x49, 0x46, 0x00], // 2
    [0x21, 0x41, 0x49, 0x4d, 0x33, 0x00], // 3
    [0x18, 0x14, 0x12, 0x7f, 0x10, 0x00], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39, 0x00], // 5
    [0x3c, 0x4a, 0x49, 0x49, 0x31, 0x00], // 6
    [0x41, 0x21, 0x11, 0x09, 0x07, 0x00], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36, 0x00], // 8
    [0x46, 0x49, 0x49, 0x29, 0x1e, 0x00], // 9
    [0x00, 0x00, 0x14, 0x00, 0x00, 0x00], // :
    [0x00, 0x40, 0x34, 0x00, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41, 0x00], // <
    [0x14, 0x14, 0x14, 0x14, 0x14, 0x00], // =
    [0x00, 0x41, 0x22, 0x14, 0x08, 0x00], // >
    [0x02, 0x01, 0x59, 0x09, 0x06, 0x00], // ?
    [0x3e, 0x41, 0x5d, 0x59, 0x4e, 0x00], // @
    [0x7c, 0x12, 0x11, 0x12, 0x7c, 0x00], // A
    [0x7f, 0x49, 0x49, 0x49, 0x36, 0x00], // B
    [0x3e, 0x41, 0x41, 0x41, 0x22, 0x00], // C
    [0x7f, 0x41, 0x41, 0x41, 0x3e, 0x00], // D
    [0x7f, 0x49, 0x49, 0x49, 0x41, 0x00], // E
    [0x7f, 0x09, 0x09, 0x09, 0x01, 0x00], // F
    [0x3e, 0x41, 0x41, 0x51, 0x73, 0x00], // G
    [0x7f, 0x08, 0x08, 0x08, 0x7f, 0x00], // H
    [0x00, 0x41, 0x7f, 0x41, 0x00, 0x00], // I
    [0x20, 0x40, 0x41, 0x3f, 0x01, 0x00], // J
    [0x7f, 0x08, 0x14, 0x22, 0x41, 0x00], // K
    [0x7f, 0x40, 0x40, 0x40, 0x40, 0x00], // L
    [0x7f, 0x02, 0x1c, 0x02, 0x7f, 0x00], // M
    [0x7f, 0x04, 0x08, 0x10, 0x7f, 0x00], // N
    [0x3e, 0x41, 0x41, 0x41, 0x3e, 0x00], // O
    [0x7f, 0x09, 0x09, 0x09, 0x06, 0x00], // P
    [0x3e, 0x41, 0x51, 0x21, 0x5e, 0x00], // Q
    [0x7f, 0x09, 0x19, 0x29, 0x46, 0x00], // R
    [0x26, 0x49, 0x49, 0x49, 0x32, 0x00], // S
    [0x03, 0x01, 0x7f, 0x01, 0x03, 0x00], // T
    [0x3f, 0x40, 0x40, 0x40, 0x3f, 0x00], // U
    [0x1f, 0x20, 0x40, 0x20, 0x1f, 0x00], // V
    [0x3f, 0x40, 0x38, 0x40, 0x3f, 0x00], // W
    [0x63, 0x14, 0x08, 0x14, 0x63, 0x00], // X
    [0x03, 0x04, 0x78, 0x04, 0x03, 0x00], // Y
    [0x61, 0x59, 0x49, 0x4d, 0x43, 0x00], // Z
    [0x00, 0x7f, 0x41, 0x41, 0x41, 0x00], // [
    [0x02, 0x04, 0x08, 0x10, 0x20, 0x00], // \
    [0x00, 0x41, 0x41, 0x41, 0x7f, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04, 0x00], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40, 0x00], // _
    [0x00, 0x03, 0x07, 0x08, 0x00, 0x00], // `
    [0x20, 0x54, 0x54, 0x78, 0x40, 0x00], // a
    [0x7f, 0x28, 0x44, 0x44, 0x38, 0x00], // b
    [0x38, 0x44, 0x44, 0x44, 0x28, 0x00], // c
    [0x38, 0x44, 0x44, 0x28, 0x7f, 0x00], // d
    [0x38, 0x54, 0x54, 0x54, 0x18, 0x00], // e
    [0x00, 0x08, 0x7e, 0x09, 0x02, 0x00], // f
    [0x18, 0xa4, 0xa4, 0x9c, 0x78, 0x00], // g
    [0x7f, 0x08, 0x04, 0x04, 0x78, 0x00], // h
    [0x00, 0x44, 0x7d, 0x40, 0x00, 0x00], // i
    [0x20, 0x40, 0x40, 0x3d, 0x00, 0x00], // j
    [0x7f, 0x10, 0x28, 0x44, 0x00, 0x00], // k
    [0x00, 0x41, 0x7f, 0x40, 0x00, 0x00], // l
    [0x7c, 0x04, 0x78, 0x04, 0x78, 0x00], // m
    [0x7c, 0x08, 0x04, 0x04, 0x78, 0x00], // n
    [0x38, 0x44, 0x44, 0x44, 0x38, 0x00], // o
    [0xfc, 0x18, 0x24, 0x24, 0x18, 0x00], // p
    [0x18, 0x24, 0x24, 0x18, 0xfc, 0x00], // q
    [0x7c, 0x08, 0x04, 0x04, 0x08, 0x00], // r
    [0x48, 0x54, 0x54, 0x54, 0x24, 0x00], // s
    [0x04, 0x04, 0x3f, 0x44, 0x24, 0x00], // t
    [0x3c, 0x40, 0x40, 0x20, 0x7c, 0x00], // u
    [0x1c, 0x20, 0x40, 0x20, 0x1c, 0x00], // v
    [0x3c, 0x40, 0x30, 0x40, 0x3c, 0x00], // w
    [0x44, 0x28, 0x10, 0x28, 0x44, 0x00], // x
    [0x4c, 0x90, 0x90, 0x90, 0x7c, 0x00], // y
    [0x44, 0x64, 0x54, 0x4c, 0x44, 0x00], // z
    [0x00, 0x08, 0x36, 0x41, 0x00, 0x00], // {
    [0x00, 0x00, 0x77, 0x00, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00, 0x00], // }
    [0x02, 0x01, 0x02, 0x04, 0x02, 0x00], // ~
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_ascii_is_covered() {
        assert_eq!(glyph(b'A'), &[0x7c, 0x12, 0x11, 0x12, 0x7c, 0x00]);
        assert_eq!(glyph(b' '), &BLANK);
        assert_ne!(glyph(b'~'), &BLANK);
    }

    #[test]
    fn non_printable_bytes_are_blank() {
        assert_eq!(glyph(0), &BLANK);
        assert_eq!(glyph(b'\n'), &BLANK);
        assert_eq!(glyph(0xc3), &BLANK);
    }

    #[test]
    fn last_column_is_spacing() {
        for c in FIRST_PRINTABLE..=LAST_PRINTABLE {
            assert_eq!(glyph(c)[5], 0, "glyph {:?}", c as char);
        }
    }

    #[test]
    fn scaled_sampling_repeats_source_pixels() {
        let a = glyph(b'A');
        // Column 0 of 'A' is 0x7c: rows 2..=6 set.
        assert!(!is_set(a, 0, 1, 1));
        assert!(is_set(a, 0, 2, 1));
        assert!(is_set(a, 1, 4, 2));
        assert!(is_set(a, 1, 5, 2));
        assert!(!is_set(a, 1, 3, 2));
        assert!(!is_set(a, 0, 16, 2));
    }
}
