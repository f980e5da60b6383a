//! Rebuilding cmap format 4 segments from the compact cmap groups.
//!
//! A font with both cmap subtables only ships the format 12 ranges plus one
//! run length per format 4 segment. Each run says how many consecutive format
//! 12 ranges the segment spans.

use crate::error::{FormatError, IncrFontErr, bail_with_msg_if};
use crate::types::{Cmap4Segment, Cmap4Segments, CodeRange};

/// The segment that terminates every format 4 subtable.
pub const FINAL_SEGMENT: Cmap4Segment = Cmap4Segment {
    start_code: 0xFFFF,
    end_code: 0xFFFF,
    id_delta: 1,
    id_range_offset: 0,
};

/// Expand `run_lengths` over `ranges` into format 4 segments and their glyph id array.
///
/// A run of one range maps its codes with `idDelta` alone. Longer runs get an
/// `idRangeOffset` into the glyph id array, which receives one glyph id per
/// code of the segment with 0 for codes that fall between ranges.
pub fn synthesize_cmap4(
    ranges: &[CodeRange],
    run_lengths: &[i64],
) -> Result<Cmap4Segments, IncrFontErr> {
    let run_count = run_lengths.len() as i64;
    let mut segments = Vec::with_capacity(run_lengths.len() + 1);
    let mut glyph_id_array: Vec<u16> = Vec::new();

    let mut next = 0;
    for (i, &run) in run_lengths.iter().enumerate() {
        let left = ranges.len() - next;
        bail_with_msg_if!(
            run < 1 || run as u64 > left as u64,
            FormatError::InvalidRunLength(run),
            "cmap4 segment {} spans {} ranges but {} are left",
            i,
            run,
            left
        );
        let run_ranges = &ranges[next..next + run as usize];
        next += run as usize;

        let first = run_ranges[0];
        let start_code = first.start_code;
        let end_code = run_ranges[run_ranges.len() - 1].end_code();

        // cmap4 only covers the BMP, codes are truncated to 16 bits.
        let segment = if run == 1 {
            Cmap4Segment {
                start_code: start_code as u16,
                end_code: end_code as u16,
                id_delta: ((first.glyph_id - start_code) & 0xFFFF) as u16,
                id_range_offset: 0,
            }
        } else {
            bail_with_msg_if!(
                end_code > 0xFFFF,
                FormatError::InvalidRunLength(run),
                "cmap4 segment {} ends at 0x{:X}, past the BMP",
                i,
                end_code
            );
            let id_range_offset = 2 * (glyph_id_array.len() as i64 - i as i64 + run_count);
            push_glyph_ids(run_ranges, start_code, end_code, &mut glyph_id_array);
            Cmap4Segment {
                start_code: start_code as u16,
                end_code: end_code as u16,
                id_delta: 0,
                id_range_offset: id_range_offset as u16,
            }
        };
        segments.push(segment);
    }
    segments.push(FINAL_SEGMENT);

    log::trace!(
        "synthesized {} cmap4 segments, {} glyph ids",
        segments.len(),
        glyph_id_array.len()
    );
    Ok(Cmap4Segments {
        segments,
        glyph_id_array,
    })
}

fn push_glyph_ids(ranges: &[CodeRange], start_code: i64, end_code: i64, out: &mut Vec<u16>) {
    let mut current = 0;
    for code in start_code..=end_code {
        while current < ranges.len() && code > ranges[current].end_code() {
            current += 1;
        }
        let gid = match ranges.get(current) {
            Some(range) if code >= range.start_code => range.glyph_id + code - range.start_code,
            _ => 0,
        };
        out.push(gid as u16);
    }
}
