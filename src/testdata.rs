//! Synthetic fonts, bundles and transfer files for tests.

use bytes::BufMut;

use crate::buffer::ByteCursor;
use crate::error::IncrFontErr;
use crate::font::{BundleFlags, GlyphBundle, GlyphRecord, inject_glyphs, sanitize_base_font};
use crate::rle::{RLE_COPY, RLE_FILL};
use crate::types::{FontInfo, OffsetSize};

// Room after the glyph data for the markers written past the last glyph.
const SLACK: usize = 8;

/// A font with hmtx, vmtx, a glyph offset array and glyph data, in that order.
pub struct SyntheticFont {
    pub info: FontInfo,
    pub data: Vec<u8>,
    /// Outline bytes of every glyph of the complete font.
    pub glyphs: Vec<Vec<u8>>,
    /// Glyph offsets of the complete font.
    pub full_offsets: Vec<u32>,
}

impl SyntheticFont {
    /// All zero metrics, offsets and glyph data.
    pub fn empty(is_ttf: bool, num_glyphs: u16, glyph_data_len: usize) -> Self {
        let hmetric_count = num_glyphs / 2;
        let vmetric_count = num_glyphs / 3;
        let mtx_len = |count: u16| 4 * count as usize + 2 * (num_glyphs - count) as usize;

        let hmtx_offset = 0;
        let vmtx_offset = hmtx_offset + mtx_len(hmetric_count);
        let loca_offset = vmtx_offset + mtx_len(vmetric_count);
        let glyph_offset = loca_offset + 4 * (num_glyphs as usize + 1);

        SyntheticFont {
            info: FontInfo {
                head_size: 1,
                version: 1,
                num_glyphs,
                glyph_offset: glyph_offset as u32,
                glyph_data_offset: loca_offset as u32,
                offset_size: OffsetSize::Four,
                hmtx_offset: hmtx_offset as u32,
                vmtx_offset: vmtx_offset as u32,
                hmetric_count,
                vmetric_count,
                is_ttf,
                ..FontInfo::default()
            },
            data: vec![0; glyph_offset + glyph_data_len],
            glyphs: Vec::new(),
            full_offsets: Vec::new(),
        }
    }

    /// A base font with room for glyphs of `lengths` bytes, none of them present.
    ///
    /// TrueType loca points every glyph but the first at the end of the glyph
    /// data. CFF offsets all start out as 1, to be spread by the sanitizer.
    pub fn new(is_ttf: bool, lengths: &[u16]) -> Self {
        let first = if is_ttf { 0 } else { 1 };
        let mut full_offsets = vec![first];
        for length in lengths {
            full_offsets.push(full_offsets[full_offsets.len() - 1] + *length as u32);
        }
        let end = full_offsets[lengths.len()];

        let mut font = Self::empty(is_ttf, lengths.len() as u16, end as usize + SLACK);
        for gid in 0..=lengths.len() as u32 {
            let offset = match (is_ttf, gid) {
                (true, 0) => 0,
                (true, _) => end,
                (false, _) => 1,
            };
            font.set_offset(gid, offset);
        }
        font.glyphs = lengths
            .iter()
            .enumerate()
            .map(|(gid, length)| {
                (0..*length as usize)
                    .map(|i| (gid * 31 + i * 7 + 1) as u8)
                    .collect()
            })
            .collect();
        font.full_offsets = full_offsets;
        font
    }

    pub fn glyph_data_start(&self) -> usize {
        self.info.glyph_offset as usize
    }

    pub fn set_offset(&mut self, gid: u32, value: u32) {
        let (table, size) = (self.info.glyph_data_offset, self.info.offset_size);
        ByteCursor::new(&mut self.data[..], 0)
            .write_glyph_offset(table, size, gid, value)
            .unwrap();
    }

    pub fn offsets(&self) -> Vec<u32> {
        let (table, size) = (self.info.glyph_data_offset, self.info.offset_size);
        let mut cursor = ByteCursor::new(&self.data[..], 0);
        (0..=self.info.num_glyphs as u32)
            .map(|gid| cursor.read_glyph_offset(table, size, gid).unwrap())
            .collect()
    }

    pub fn sanitize(&mut self) -> Result<(), IncrFontErr> {
        sanitize_base_font(&mut self.info, &mut self.data)
    }

    /// Wire bytes of a bundle holding `gids`, with both side bearings.
    pub fn bundle_bytes(&self, gids: &[u16]) -> Vec<u8> {
        let mut flags = BundleFlags::HAS_HMTX | BundleFlags::HAS_VMTX;
        if !self.info.is_ttf {
            flags = flags | BundleFlags::HAS_CFF;
        }
        let records = gids
            .iter()
            .map(|&gid| GlyphRecord {
                glyph_id: gid,
                hmtx: Some(-(gid as i16)),
                vmtx: Some(gid as i16 + 100),
                offset: self.full_offsets[gid as usize],
                data: &self.glyphs[gid as usize],
            })
            .collect();
        GlyphBundle { flags, records }.to_bytes().unwrap()
    }

    pub fn inject(&mut self, gids: &[u16]) -> Result<(), IncrFontErr> {
        let bytes = self.bundle_bytes(gids);
        let bundle = GlyphBundle::parse(&bytes)?;
        inject_glyphs(&mut self.info, &mut self.data, &bundle)
    }

    /// The glyph data region of the complete font.
    pub fn glyph_data(&self) -> &[u8] {
        let start = self.glyph_data_start();
        let first = self.full_offsets[0] as usize;
        let end = self.full_offsets[self.full_offsets.len() - 1] as usize;
        &self.data[start + first..start + end]
    }

    pub fn expected_glyph_data(&self) -> Vec<u8> {
        self.glyphs.concat()
    }

    pub fn hmtx_side_bearing(&self, gid: u16) -> i16 {
        self.side_bearing(self.info.hmtx_offset, self.info.hmetric_count, gid)
    }

    pub fn vmtx_side_bearing(&self, gid: u16) -> i16 {
        self.side_bearing(self.info.vmtx_offset, self.info.vmetric_count, gid)
    }

    fn side_bearing(&self, table: u32, metric_count: u16, gid: u16) -> i16 {
        let mut cursor = ByteCursor::new(&self.data[..], table as usize);
        if gid < metric_count {
            cursor.seek(gid as usize * 4 + 2);
        } else {
            cursor.seek(2 * gid as usize + 2 * metric_count as usize);
        }
        cursor.read_i16().unwrap()
    }
}

pub fn count_byte(data: &[u8], byte: u8) -> usize {
    data.iter().filter(|b| **b == byte).count()
}

/// Run length encode `data`: runs of four or more equal bytes become fills,
/// everything else is copied.
pub fn rle_encode(data: &[u8]) -> Vec<u8> {
    let run_at = |i: usize| data[i..].iter().take_while(|b| **b == data[i]).count();

    let mut out = Vec::new();
    out.put_u32(data.len() as u32);
    let mut i = 0;
    while i < data.len() {
        let run = run_at(i);
        if run >= 4 {
            out.put_u8(RLE_FILL | 2);
            out.put_u32(run as u32);
            out.put_u8(data[i]);
            i += run;
        } else {
            let start = i;
            while i < data.len() && run_at(i) < 4 {
                i += 1;
            }
            out.put_u8(RLE_COPY | 2);
            out.put_u32((i - start) as u32);
            out.put_slice(&data[start..i]);
        }
    }
    out
}
