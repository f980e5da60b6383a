//! Patching fetched glyphs into the base font.
//!
//! Glyphs arrive in any order. Slots of glyphs that are still missing share
//! offsets with their neighbours, so every injection also repairs the offsets
//! around the new glyph to keep the offset array non-decreasing.

use crate::buffer::ByteCursor;
use crate::error::{IncrFontErr, bail};
use crate::font::bundle::{GlyphBundle, GlyphRecord};
use crate::font::{CFF_ENDCHAR, EMPTY_GLYPH_MARKER};
use crate::types::FontInfo;

/// Copy every glyph of `bundle` into `font`, updating metrics and offsets.
///
/// Injecting the same bundle twice leaves the font as injecting it once.
pub fn inject_glyphs(
    info: &mut FontInfo,
    font: &mut [u8],
    bundle: &GlyphBundle,
) -> Result<(), IncrFontErr> {
    info.dirty = true;
    let mut cursor = ByteCursor::new(font, 0);
    let is_cff = bundle.is_cff();

    for record in &bundle.records {
        if let Some(side_bearing) = record.hmtx {
            cursor.write_side_bearing(
                info.hmtx_offset,
                info.hmetric_count,
                record.glyph_id,
                side_bearing,
            )?;
        }
        if let Some(side_bearing) = record.vmtx {
            cursor.write_side_bearing(
                info.vmtx_offset,
                info.vmetric_count,
                record.glyph_id,
                side_bearing,
            )?;
        }

        let offsets = GlyphOffsets::new(info, record)?;
        if is_cff {
            offsets.update_charstrings(&mut cursor)?;
        } else {
            offsets.update_loca(&mut cursor)?;
        }

        cursor.seek(info.glyph_offset as usize + record.offset as usize);
        cursor.write_bytes(record.data)?;
    }

    log::debug!(
        "injected {} {} glyphs",
        bundle.records.len(),
        if is_cff { "CFF" } else { "TrueType" }
    );
    Ok(())
}

struct GlyphOffsets<'a> {
    info: &'a FontInfo,
    gid: u32,
    start: u32,
    end: u32,
}

impl<'a> GlyphOffsets<'a> {
    fn new(info: &'a FontInfo, record: &GlyphRecord) -> Result<Self, IncrFontErr> {
        let Some(end) = record.offset.checked_add(record.data.len() as u32) else {
            bail!(IncrFontErr::InvalidArgument("glyph ends past 4GiB"));
        };
        Ok(GlyphOffsets {
            info,
            gid: record.glyph_id as u32,
            start: record.offset,
            end,
        })
    }

    fn get(&self, cursor: &mut ByteCursor<&mut [u8]>, gid: u32) -> Result<u32, IncrFontErr> {
        cursor.read_glyph_offset(self.info.glyph_data_offset, self.info.offset_size, gid)
    }

    fn set(
        &self,
        cursor: &mut ByteCursor<&mut [u8]>,
        gid: u32,
        value: u32,
    ) -> Result<(), IncrFontErr> {
        cursor.write_glyph_offset(self.info.glyph_data_offset, self.info.offset_size, gid, value)
    }

    fn seek_glyph_data(&self, cursor: &mut ByteCursor<&mut [u8]>, offset: u32) {
        cursor.seek(self.info.glyph_offset as usize + offset as usize);
    }

    fn update_loca(&self, cursor: &mut ByteCursor<&mut [u8]>) -> Result<(), IncrFontErr> {
        let (gid, start, end) = (self.gid, self.start, self.end);
        self.set(cursor, gid, start)?;
        let old_end = self.get(cursor, gid + 1)?;
        self.set(cursor, gid + 1, end)?;

        // Earlier missing glyphs may still point past us.
        for prev in (0..gid).rev() {
            if self.get(cursor, prev)? <= start {
                break;
            }
            self.set(cursor, prev, start)?;
        }

        if old_end != end {
            // The following glyph is still missing, mark it empty. A zero
            // length glyph shares its end with whatever comes next, so only
            // mark that if nothing was written there yet.
            self.seek_glyph_data(cursor, end);
            let untouched = end != start || {
                let first = cursor.read_u32()?;
                let second = cursor.read_u32()?;
                first == 0 && second == 0
            };
            if untouched {
                self.seek_glyph_data(cursor, end);
                cursor.write_i16(EMPTY_GLYPH_MARKER)?;
            }
        }
        Ok(())
    }

    fn update_charstrings(&self, cursor: &mut ByteCursor<&mut [u8]>) -> Result<(), IncrFontErr> {
        let (gid, start, end) = (self.gid, self.start, self.end);
        let offset_count = self.info.num_glyphs as u32 + 1;
        self.set(cursor, gid, start)?;
        let old_end = self.get(cursor, gid + 1)?;
        self.set(cursor, gid + 1, end)?;

        let mut current = end;
        if old_end < current && gid + 1 < offset_count - 1 {
            self.seek_glyph_data(cursor, current);
            cursor.write_u8(CFF_ENDCHAR)?;
        }

        // Missing glyphs we now overlap move up one byte at a time.
        for next_id in gid + 2..offset_count {
            if self.get(cursor, next_id)? > current {
                break;
            }
            current += 1;
            self.set(cursor, next_id, current)?;
            if next_id < offset_count - 1 {
                self.seek_glyph_data(cursor, current);
                cursor.write_u8(CFF_ENDCHAR)?;
            }
        }
        Ok(())
    }
}
