/// Address of the first font glyph. The glyphs occupy 0x050..0x0A0.
pub const FONT_ADDR: usize = 0x050;

/// Bytes per glyph. Each byte is one row; only the high nibble is drawn.
pub const GLYPH_SIZE: usize = 5;

/// Sprites for the hexadecimal digits, used by `Fx29`.
pub const FONT: [u8; 16 * GLYPH_SIZE] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // '0'
    0x20, 0x60, 0x20, 0x20, 0x70, // '1'
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // '2'
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // '3'
    0x90, 0x90, 0xF0, 0x10, 0x10, // '4'
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // '5'
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // '6'
    0xF0, 0x10, 0x20, 0x40, 0x40, // '7'
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // '8'
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // '9'
    0xF0, 0x90, 0xF0, 0x90, 0x90, // 'A'
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // 'B'
    0xF0, 0x80, 0x80, 0x80, 0xF0, // 'C'
    0xE0, 0x90, 0x90, 0x90, 0xE0, // 'D'
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // 'E'
    0xF0, 0x80, 0xF0, 0x80, 0x80, // 'F'
];

/// Address of the glyph for `digit`.
pub fn glyph_addr(digit: u8) -> u16 {
    (FONT_ADDR + GLYPH_SIZE * digit as usize) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyphs_are_laid_out_consecutively() {
        assert_eq!(glyph_addr(0x0), 0x050);
        assert_eq!(glyph_addr(0xA), 0x082);
        assert_eq!(glyph_addr(0xF), 0x09B);
    }

    #[test]
    fn glyphs_only_use_the_high_nibble() {
        assert!(FONT.iter().all(|row| row & 0x0F == 0));
    }
}
