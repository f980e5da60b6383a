//! Making an unpopulated base font acceptable to font validators.

use crate::buffer::ByteCursor;
use crate::error::IncrFontErr;
use crate::font::{CFF_ENDCHAR, EMPTY_GLYPH_MARKER};
use crate::types::FontInfo;

/// Only the last glyph of each block of this many glyph ids is marked.
pub const LOCA_BLOCK_SIZE: u32 = 64;

/// Put placeholder glyph programs where the real glyphs will later go.
pub fn sanitize_base_font(info: &mut FontInfo, font: &mut [u8]) -> Result<(), IncrFontErr> {
    info.dirty = true;
    let mut cursor = ByteCursor::new(font, 0);
    if info.is_ttf {
        mark_loca_blocks(info, &mut cursor)
    } else {
        fill_charstrings(info, &mut cursor)
    }
}

fn mark_loca_blocks(info: &FontInfo, cursor: &mut ByteCursor<&mut [u8]>) -> Result<(), IncrFontErr> {
    let (table, size) = (info.glyph_data_offset, info.offset_size);
    let mut marked = 0;
    for gid in (LOCA_BLOCK_SIZE - 1..info.num_glyphs as u32).step_by(LOCA_BLOCK_SIZE as usize) {
        let this_one = cursor.read_glyph_offset(table, size, gid)?;
        let next_one = cursor.read_glyph_offset(table, size, gid + 1)?;
        if this_one != next_one {
            cursor.seek(info.glyph_offset as usize + this_one as usize);
            cursor.write_i16(EMPTY_GLYPH_MARKER)?;
            marked += 1;
        }
    }
    log::debug!("marked {marked} TrueType glyphs as empty");
    Ok(())
}

// Runs of equal offsets are spread into consecutive one byte charstrings.
fn fill_charstrings(info: &FontInfo, cursor: &mut ByteCursor<&mut [u8]>) -> Result<(), IncrFontErr> {
    let (table, size) = (info.glyph_data_offset, info.offset_size);
    let num_glyphs = info.num_glyphs as u32;

    let mut last_real = cursor.read_glyph_offset(table, size, 0)?;
    let mut delta = 0;
    for gid in 0..=num_glyphs {
        let mut this_one = cursor.read_glyph_offset(table, size, gid)?;
        if this_one == last_real {
            this_one = last_real + delta;
            cursor.write_glyph_offset(table, size, gid, this_one)?;
            delta += 1;
        } else {
            last_real = this_one;
            delta = 1;
        }
        if gid < num_glyphs {
            cursor.seek(info.glyph_offset as usize + this_one as usize);
            cursor.write_u8(CFF_ENDCHAR)?;
        }
    }
    Ok(())
}
