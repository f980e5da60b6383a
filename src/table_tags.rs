/* Copyright 2014 Google Inc. All Rights Reserved.

   Distributed under MIT license.
   See file LICENSE for detail or copy at https://opensource.org/licenses/MIT
*/

//! Tags of the compact base font header

use font_types::Tag;

pub const BSAC_MAGIC: Tag = Tag::new(b"BSAC");

/// The fixed set of tags that may appear in the header directory.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HeaderTag {
    GlyphOffset,
    GlyphCount,
    LocaOffset,
    LocaFormat,
    HmtxOffset,
    VmtxOffset,
    HmetricCount,
    VmetricCount,
    FontType,
    Cmap12,
    Cmap4,
    CompactCmap,
    CharsetFormat2,
}

pub static KNOWN_HEADER_TAGS: [(Tag, HeaderTag); 13] = [
    (Tag::new(b"GLOF"), HeaderTag::GlyphOffset),
    (Tag::new(b"GLCN"), HeaderTag::GlyphCount),
    (Tag::new(b"LCOF"), HeaderTag::LocaOffset),
    (Tag::new(b"LCFM"), HeaderTag::LocaFormat),
    (Tag::new(b"HMOF"), HeaderTag::HmtxOffset),
    (Tag::new(b"VMOF"), HeaderTag::VmtxOffset),
    (Tag::new(b"HMMC"), HeaderTag::HmetricCount),
    (Tag::new(b"VMMC"), HeaderTag::VmetricCount),
    (Tag::new(b"TYPE"), HeaderTag::FontType),
    (Tag::new(b"CM12"), HeaderTag::Cmap12),
    (Tag::new(b"CM04"), HeaderTag::Cmap4),
    (Tag::new(b"CCMP"), HeaderTag::CompactCmap),
    (Tag::new(b"CS02"), HeaderTag::CharsetFormat2),
];

impl HeaderTag {
    pub fn from_tag(tag: Tag) -> Option<HeaderTag> {
        KNOWN_HEADER_TAGS
            .iter()
            .find(|(known, _)| *known == tag)
            .map(|(_, header_tag)| *header_tag)
    }

    pub fn tag(self) -> Tag {
        let tag = match self {
            HeaderTag::GlyphOffset => b"GLOF",
            HeaderTag::GlyphCount => b"GLCN",
            HeaderTag::LocaOffset => b"LCOF",
            HeaderTag::LocaFormat => b"LCFM",
            HeaderTag::HmtxOffset => b"HMOF",
            HeaderTag::VmtxOffset => b"VMOF",
            HeaderTag::HmetricCount => b"HMMC",
            HeaderTag::VmetricCount => b"VMMC",
            HeaderTag::FontType => b"TYPE",
            HeaderTag::Cmap12 => b"CM12",
            HeaderTag::Cmap4 => b"CM04",
            HeaderTag::CompactCmap => b"CCMP",
            HeaderTag::CharsetFormat2 => b"CS02",
        };
        Tag::new(tag)
    }

    pub fn description(self) -> &'static str {
        match self {
            HeaderTag::GlyphOffset => "Start of the glyphs data relative to font file start",
            HeaderTag::GlyphCount => "Number of glyphs in the font",
            HeaderTag::LocaOffset => "Start of glyph data location offsets",
            HeaderTag::LocaFormat => "Offset size of the offsets in loca table",
            HeaderTag::HmtxOffset => "Start of the HMTX table relative to font file start",
            HeaderTag::VmtxOffset => "Start of the VMTX table relative to font file start",
            HeaderTag::HmetricCount => "Number of hmetrics in hmtx table",
            HeaderTag::VmetricCount => "Number of vmetrics in vmtx table",
            HeaderTag::FontType => "Type of the font. 1 for TTF and 0 for CFF",
            HeaderTag::Cmap12 => "Start offset and number of groups in cmap fmt 12 table",
            HeaderTag::Cmap4 => "Start offset and length of cmap fmt 4 table",
            HeaderTag::CompactCmap => "Compact cmap, groups of segments",
            HeaderTag::CharsetFormat2 => "CFF Charset format 2 in compacted format",
        }
    }
}
