const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;

/// 3x5 bitmaps for ' '..='_', five 3-bit rows packed top row first.
/// Lowercase letters reuse the uppercase shapes.
const GLYPHS: [u16; 64] = [
    0x0000, 0x2482, 0x5A00, 0x5F7D, 0x7DDF, 0x52A5, 0x2AAB, 0x2400,
    0x1491, 0x4494, 0x0AA8, 0x05D0, 0x0014, 0x01C0, 0x0002, 0x12A4,
    0x7B6F, 0x2C97, 0x73E7, 0x73CF, 0x5BC9, 0x79CF, 0x79EF, 0x7292,
    0x7BEF, 0x7BCF, 0x0410, 0x0414, 0x1511, 0x0E38, 0x4454, 0x72C2,
    0x7BE7, 0x2BED, 0x6BAE, 0x7927, 0x6B6E, 0x79A7, 0x79A4, 0x796F,
    0x5BED, 0x7497, 0x726F, 0x5BAD, 0x4927, 0x5FED, 0x5FFD, 0x7B6F,
    0x6BA4, 0x7B79, 0x6BAD, 0x79CF, 0x7492, 0x5B6F, 0x5B6A, 0x5BFD,
    0x5AAD, 0x5A92, 0x72A7, 0x6926, 0x4889, 0x324B, 0x2A00, 0x0007,
];

const FALLBACK: char = '?';

pub(crate) fn glyph_bits(ch: char) -> u16 {
    let upper = ch.to_ascii_uppercase();
    let index = match upper {
        ' '..='_' => upper as usize - ' ' as usize,
        _ => FALLBACK as usize - ' ' as usize,
    };
    GLYPHS[index]
}

/// Iterates lit cells of a glyph as (column, row).
pub(crate) fn glyph_cells(ch: char) -> impl Iterator<Item = (u32, u32)> {
    let bits = glyph_bits(ch);
    (0..GLYPH_HEIGHT).flat_map(move |row| {
        (0..GLYPH_WIDTH).filter_map(move |col| {
            let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
            ((bits >> shift) & 1 == 1).then_some((col, row))
        })
    })
}

pub(crate) fn advance_px(scale: u32) -> f32 {
    ((GLYPH_WIDTH + 1) * scale.max(1)) as f32
}

pub(crate) fn glyph_height_px(scale: u32) -> f32 {
    (GLYPH_HEIGHT * scale.max(1)) as f32
}

pub(crate) fn line_height_px(scale: u32) -> f32 {
    ((GLYPH_HEIGHT + 2) * scale.max(1)) as f32
}

pub(crate) fn text_width_px(text: &str, scale: u32) -> f32 {
    let count = text.chars().count() as f32;
    if count == 0.0 {
        return 0.0;
    }
    count * advance_px(scale) - scale.max(1) as f32
}
