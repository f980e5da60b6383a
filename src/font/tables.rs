//! Writing the cmap and charset subtables back from their compacted form.
//!
//! The decoded base font already carries every subtable header and has room
//! for the arrays, only the array contents were stripped before transfer.

use crate::buffer::ByteCursor;
use crate::error::{FormatError, IncrFontErr, bail, bail_if, bail_with_msg_if};
use crate::types::{CompactCmap, FontInfo, SegmentGroup, SegmentKind};

// format, reserved, length, language, numGroups
const CMAP12_GROUPS_START: usize = 16;
// format, length, language
const CMAP4_SEG_COUNT_X2: usize = 6;
// format
const CHARSET_RANGES_START: usize = 1;

/// Write every table the header describes.
pub fn rebuild_tables(info: &mut FontInfo, font: &mut [u8]) -> Result<(), IncrFontErr> {
    write_cmap12(info, font)?;
    write_cmap4(info, font)?;
    write_charset(info, font)
}

pub fn write_cmap12(info: &FontInfo, font: &mut [u8]) -> Result<(), IncrFontErr> {
    let Some(cmap12) = info.cmap12 else {
        return Ok(());
    };
    let ranges = match &info.compact_cmap {
        Some(CompactCmap {
            cmap12: SegmentGroup::Ranges { ranges, .. },
            ..
        }) => ranges,
        _ => bail!(FormatError::MissingCompactCmap),
    };
    let n_groups = cmap12.n_groups as usize;
    bail_if!(
        ranges.len() < n_groups,
        FormatError::SegmentCountMismatch {
            expected: n_groups,
            found: ranges.len()
        }
    );

    let mut cursor = ByteCursor::new(font, cmap12.offset as usize + CMAP12_GROUPS_START);
    for range in &ranges[..n_groups] {
        cursor.write_u32(range.start_code as u32)?;
        cursor.write_u32(range.end_code() as u32)?;
        cursor.write_u32(range.glyph_id as u32)?;
    }
    log::trace!("wrote {n_groups} cmap12 groups at {}", cmap12.offset);
    Ok(())
}

/// Fill the format 4 arrays. The segment count is taken from the subtable
/// itself and recorded in `info` together with the glyph id array length.
pub fn write_cmap4(info: &mut FontInfo, font: &mut [u8]) -> Result<(), IncrFontErr> {
    let Some(cmap4) = info.cmap4.as_mut() else {
        return Ok(());
    };
    let Some(synthesized) = info.compact_cmap.as_ref().and_then(|c| c.cmap4.as_ref()) else {
        bail!(FormatError::MissingCompactCmap);
    };

    let mut cursor = ByteCursor::new(font, cmap4.offset as usize + CMAP4_SEG_COUNT_X2);
    let seg_count = cursor.read_u16()? / 2;
    let glyph_id_array_len = (cmap4.length as i64 - 16 - seg_count as i64 * 8) / 2;
    cmap4.seg_count = seg_count;
    cmap4.glyph_id_array_len = glyph_id_array_len.max(0) as u32;

    let segments = &synthesized.segments;
    bail_with_msg_if!(
        segments.len() < seg_count as usize,
        FormatError::SegmentCountMismatch {
            expected: seg_count as usize,
            found: segments.len()
        },
        "cmap4 at {} has {} segments, compact cmap rebuilt {}",
        cmap4.offset,
        seg_count,
        segments.len()
    );
    let segments = &segments[..seg_count as usize];

    // searchRange, entrySelector, rangeShift
    cursor.skip(6)?;
    for segment in segments {
        cursor.write_u16(segment.end_code)?;
    }
    // reservedPad
    cursor.skip(2)?;
    for segment in segments {
        cursor.write_u16(segment.start_code)?;
    }
    for segment in segments {
        cursor.write_u16(segment.id_delta)?;
    }
    for segment in segments {
        cursor.write_u16(segment.id_range_offset)?;
    }
    if cmap4.glyph_id_array_len > 0 {
        cursor.write_array(&synthesized.glyph_id_array, |c, gid| c.write_u16(gid))?;
    }
    Ok(())
}

/// Fill the ranges of a CFF charset: format 2 ranges carry a u16 `nLeft`,
/// format 1 ranges a u8.
pub fn write_charset(info: &FontInfo, font: &mut [u8]) -> Result<(), IncrFontErr> {
    let Some(charset) = &info.charset else {
        return Ok(());
    };
    let SegmentGroup::Charset { kind, ranges } = &charset.group else {
        bail!(FormatError::UnknownSegmentType(charset.format() as u8));
    };

    let mut cursor = ByteCursor::new(font, charset.offset as usize + CHARSET_RANGES_START);
    for range in ranges {
        cursor.write_u16(range.first as u16)?;
        match kind {
            SegmentKind::CharsetRange16 => cursor.write_u16(range.n_left as u16)?,
            _ => cursor.write_u8(range.n_left as u8)?,
        }
    }
    Ok(())
}
