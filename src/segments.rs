//! Groups of segments: the compacted form of cmap ranges and CFF charsets.
//!
//! A group is a type byte, a u16 entry count and the entries as fixed width
//! bit fields. A field holding its all-ones value is escaped: the real value is
//! taken from a stream of nibble coded integers that follows the entries, in
//! the order the escapes were met. Delta coded fields are summed up only after
//! the escaped values have been substituted.

use bytes::BufMut;

use crate::buffer::ByteCursor;
use crate::error::{IncrFontErr, bail, bail_if};
use crate::types::{CharsetRange, CodeRange, SegmentGroup, SegmentKind};
use crate::variable_length::{NibbleWriter, read_extra_array};

/// Decode the group of segments at the cursor.
pub fn read_segment_group<B: AsRef<[u8]>>(
    cursor: &mut ByteCursor<B>,
) -> Result<SegmentGroup, IncrFontErr> {
    let kind = SegmentKind::try_from(cursor.read_u8()?)?;
    let n_groups = cursor.read_u16()? as usize;

    let group = match kind {
        SegmentKind::Raw => {
            let ranges = cursor.read_array(n_groups, |c| {
                Ok(CodeRange {
                    start_code: c.read_u32()? as i64,
                    length: c.read_u32()? as i64,
                    glyph_id: c.read_u32()? as i64,
                })
            })?;
            SegmentGroup::Ranges { kind, ranges }
        }
        SegmentKind::RunLength => {
            let packed = cursor.read_bytes(n_groups.div_ceil(4))?;
            let mut entries: Vec<[i64; 1]> = (0..n_groups)
                .map(|i| [((packed[i / 4] >> (6 - 2 * (i % 4))) & 0x3) as i64])
                .collect();
            resolve_escapes(cursor, &mut entries, [Some(0x3)])?;
            SegmentGroup::RunLengths(entries.into_iter().map(|[len]| len).collect())
        }
        SegmentKind::Packed => {
            let mut entries = cursor.read_array(n_groups, |c| {
                let segment = c.read_u24()?;
                Ok([
                    ((segment >> 19) & 0x1F) as i64,
                    ((segment >> 16) & 0x7) as i64,
                    (segment & 0xFFFF) as i64,
                ])
            })?;
            resolve_escapes(cursor, &mut entries, [Some(0x1F), Some(0x7), None])?;
            prefix_sum(&mut entries, [true, false, false]);
            SegmentGroup::Ranges {
                kind,
                ranges: entries.into_iter().map(code_range).collect(),
            }
        }
        SegmentKind::DeltaByte => {
            let mut entries = cursor.read_array(n_groups, |c| {
                let segment = c.read_u8()?;
                Ok([
                    ((segment >> 5) & 0x7) as i64,
                    ((segment >> 3) & 0x3) as i64,
                    (segment & 0x7) as i64,
                ])
            })?;
            resolve_escapes(cursor, &mut entries, [Some(0x7), Some(0x3), Some(0x7)])?;
            prefix_sum(&mut entries, [true, false, true]);
            SegmentGroup::Ranges {
                kind,
                ranges: entries.into_iter().map(code_range).collect(),
            }
        }
        SegmentKind::CharsetRange16 | SegmentKind::CharsetRange8 => {
            let mut entries = cursor.read_array(n_groups, |c| {
                let segment = c.read_u8()?;
                Ok([((segment >> 3) & 0x1F) as i64, (segment & 0x7) as i64])
            })?;
            resolve_escapes(cursor, &mut entries, [Some(0x1F), Some(0x7)])?;
            prefix_sum(&mut entries, [true, true]);
            SegmentGroup::Charset {
                kind,
                ranges: entries
                    .into_iter()
                    .map(|[first, n_left]| CharsetRange { first, n_left })
                    .collect(),
            }
        }
    };

    debug_assert_eq!(group.len(), n_groups);
    Ok(group)
}

fn code_range([start_code, length, glyph_id]: [i64; 3]) -> CodeRange {
    CodeRange {
        start_code,
        length,
        glyph_id,
    }
}

/// Replace every field equal to its sentinel with the next value from the nibble stream.
fn resolve_escapes<B: AsRef<[u8]>, const N: usize>(
    cursor: &mut ByteCursor<B>,
    entries: &mut [[i64; N]],
    sentinels: [Option<i64>; N],
) -> Result<(), IncrFontErr> {
    let mut escaped: Vec<(usize, usize)> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        for field in 0..N {
            if sentinels[field] == Some(entry[field]) {
                escaped.push((i, field));
            }
        }
    }

    let extra = read_extra_array(cursor, escaped.len())?;
    for ((i, field), value) in escaped.into_iter().zip(extra) {
        entries[i][field] = value;
    }
    Ok(())
}

fn prefix_sum<const N: usize>(entries: &mut [[i64; N]], fields: [bool; N]) {
    for i in 1..entries.len() {
        for field in 0..N {
            if fields[field] {
                entries[i][field] += entries[i - 1][field];
            }
        }
    }
}

fn deltas(values: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut previous = 0;
    values
        .map(|value| {
            let delta = value - previous;
            previous = value;
            delta
        })
        .collect()
}

/// `value` if it fits below the all-ones value of a `bits` wide field, otherwise
/// the all-ones escape with `value` pushed onto the nibble stream.
fn fixed_or_escape(value: i64, bits: u32, extra: &mut NibbleWriter) -> Result<u32, IncrFontErr> {
    let sentinel = (1i64 << bits) - 1;
    if value < 0 || value >= sentinel {
        extra.write_signed_int(value)?;
        Ok(sentinel as u32)
    } else {
        Ok(value as u32)
    }
}

fn checked_u32(value: i64) -> Result<u32, IncrFontErr> {
    u32::try_from(value).map_err(|_| IncrFontErr::InvalidArgument("value does not fit in a u32"))
}

/// Append the compact encoding of `group` to `out`.
pub fn write_segment_group(group: &SegmentGroup, out: &mut impl BufMut) -> Result<(), IncrFontErr> {
    let Ok(n_groups) = u16::try_from(group.len()) else {
        bail!(IncrFontErr::InvalidArgument("too many segments for one group"));
    };
    out.put_u8(group.kind() as u8);
    out.put_u16(n_groups);

    let mut extra = NibbleWriter::new();
    match group {
        SegmentGroup::Ranges { kind, ranges } => match kind {
            SegmentKind::Raw => {
                for range in ranges {
                    out.put_u32(checked_u32(range.start_code)?);
                    out.put_u32(checked_u32(range.length)?);
                    out.put_u32(checked_u32(range.glyph_id)?);
                }
            }
            SegmentKind::Packed => {
                let start_deltas = deltas(ranges.iter().map(|r| r.start_code));
                for (range, start_delta) in ranges.iter().zip(start_deltas) {
                    bail_if!(
                        !(0..=0xFFFF).contains(&range.glyph_id),
                        IncrFontErr::InvalidArgument("packed glyph ids must fit in 16 bits")
                    );
                    let start = fixed_or_escape(start_delta, 5, &mut extra)?;
                    let length = fixed_or_escape(range.length, 3, &mut extra)?;
                    let segment = start << 19 | length << 16 | range.glyph_id as u32;
                    out.put_slice(&segment.to_be_bytes()[1..]);
                }
            }
            SegmentKind::DeltaByte => {
                let start_deltas = deltas(ranges.iter().map(|r| r.start_code));
                let gid_deltas = deltas(ranges.iter().map(|r| r.glyph_id));
                for ((range, start_delta), gid_delta) in
                    ranges.iter().zip(start_deltas).zip(gid_deltas)
                {
                    let start = fixed_or_escape(start_delta, 3, &mut extra)?;
                    let length = fixed_or_escape(range.length, 2, &mut extra)?;
                    let gid = fixed_or_escape(gid_delta, 3, &mut extra)?;
                    out.put_u8((start << 5 | length << 3 | gid) as u8);
                }
            }
            _ => bail!(IncrFontErr::InvalidArgument(
                "code ranges need a segment type of 2, 3 or 5"
            )),
        },
        SegmentGroup::RunLengths(lengths) => {
            for chunk in lengths.chunks(4) {
                let mut packed = 0u8;
                for (j, len) in chunk.iter().enumerate() {
                    let len = fixed_or_escape(*len, 2, &mut extra)? as u8;
                    packed |= len << (6 - 2 * j);
                }
                out.put_u8(packed);
            }
        }
        SegmentGroup::Charset { kind, ranges } => {
            bail_if!(
                !matches!(
                    kind,
                    SegmentKind::CharsetRange16 | SegmentKind::CharsetRange8
                ),
                IncrFontErr::InvalidArgument("charset ranges need a segment type of 6 or 7")
            );
            let first_deltas = deltas(ranges.iter().map(|r| r.first));
            let n_left_deltas = deltas(ranges.iter().map(|r| r.n_left));
            for (first_delta, n_left_delta) in first_deltas.into_iter().zip(n_left_deltas) {
                let first = fixed_or_escape(first_delta, 5, &mut extra)?;
                let n_left = fixed_or_escape(n_left_delta, 3, &mut extra)?;
                out.put_u8((first << 3 | n_left) as u8);
            }
        }
    }

    out.put_slice(&extra.into_bytes());
    Ok(())
}

pub fn encode_segment_group(group: &SegmentGroup) -> Result<Vec<u8>, IncrFontErr> {
    let mut out = Vec::new();
    write_segment_group(group, &mut out)?;
    Ok(out)
}
