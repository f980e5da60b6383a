use crate::error::{FormatError, IncrFontErr};

/// Width in bytes of the entries of a loca / charstrings offset array.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OffsetSize {
    One = 1,
    Two = 2,
    Three = 3,
    #[default]
    Four = 4,
}

impl OffsetSize {
    pub fn byte_len(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for OffsetSize {
    type Error = IncrFontErr;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OffsetSize::One),
            2 => Ok(OffsetSize::Two),
            3 => Ok(OffsetSize::Three),
            4 => Ok(OffsetSize::Four),
            _ => Err(FormatError::BadOffsetSize(value).into()),
        }
    }
}

/// Everything the compact header tells us about where the tables of the base font live.
///
/// Built once by [`crate::header::parse_header`] and then updated in place by
/// the later stages of the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontInfo {
    /// Size of the compact header in the transferred bytes.
    pub head_size: i32,
    pub version: i32,
    /// The total number of glyphs in the font
    pub num_glyphs: u16,
    /// Start of the glyph data ('glyf' or CFF charstring data)
    pub glyph_offset: u32,
    /// Start of the glyph offset array ('loca' or the CFF charstrings INDEX offsets)
    pub glyph_data_offset: u32,
    pub offset_size: OffsetSize,
    pub hmtx_offset: u32,
    pub vmtx_offset: u32,
    pub hmetric_count: u16,
    pub vmetric_count: u16,
    /// TrueType outlines when set, CFF outlines otherwise.
    pub is_ttf: bool,
    pub cmap12: Option<Cmap12Info>,
    pub cmap4: Option<Cmap4Info>,
    pub charset: Option<CharsetInfo>,
    pub compact_cmap: Option<CompactCmap>,
    /// Set whenever the font bytes were modified since the caller last cleared it.
    pub dirty: bool,
}

/// Location of the cmap format 12 subtable
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cmap12Info {
    pub offset: u32,
    pub n_groups: u32,
}

/// Location of the cmap format 4 subtable
///
/// `seg_count` and `glyph_id_array_len` are only known once the subtable
/// header has been read back out of the decoded font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cmap4Info {
    pub offset: u32,
    pub length: u32,
    pub seg_count: u16,
    pub glyph_id_array_len: u32,
}

/// Location and compacted content of the CFF charset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharsetInfo {
    pub offset: u32,
    pub group: SegmentGroup,
}

impl CharsetInfo {
    pub fn format(&self) -> SegmentKind {
        self.group.kind()
    }
}

/// cmap data reconstructed from the compact cmap groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactCmap {
    /// Character ranges of the format 12 subtable.
    pub cmap12: SegmentGroup,
    /// Format 4 segments, present when the font carries both subtables.
    pub cmap4: Option<Cmap4Segments>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cmap4Segments {
    /// Includes the final 0xFFFF segment.
    pub segments: Vec<Cmap4Segment>,
    pub glyph_id_array: Vec<u16>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cmap4Segment {
    pub start_code: u16,
    pub end_code: u16,
    pub id_delta: u16,
    pub id_range_offset: u16,
}

/// Type byte of a group of segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// One byte per range: delta start code (3 bits), length (2 bits), delta glyph id (3 bits)
    DeltaByte = 2,
    /// Three bytes per range: delta start code (5 bits), length (3 bits), glyph id (16 bits)
    Packed = 3,
    /// Two bits per cmap4 segment: how many cmap12 ranges it covers
    RunLength = 4,
    /// Twelve bytes per range: start code, length, glyph id as u32
    Raw = 5,
    /// CFF charset format 2 ranges
    CharsetRange16 = 6,
    /// CFF charset format 1 ranges
    CharsetRange8 = 7,
}

impl TryFrom<u8> for SegmentKind {
    type Error = IncrFontErr;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            2 => SegmentKind::DeltaByte,
            3 => SegmentKind::Packed,
            4 => SegmentKind::RunLength,
            5 => SegmentKind::Raw,
            6 => SegmentKind::CharsetRange16,
            7 => SegmentKind::CharsetRange8,
            _ => return Err(FormatError::UnknownSegmentType(value).into()),
        })
    }
}

/// A run of consecutive character codes mapped to consecutive glyph ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodeRange {
    pub start_code: i64,
    pub length: i64,
    pub glyph_id: i64,
}

impl CodeRange {
    pub fn end_code(&self) -> i64 {
        self.start_code + self.length - 1
    }
}

/// A CFF charset range: `first` SID followed by `n_left` more.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharsetRange {
    pub first: i64,
    pub n_left: i64,
}

/// A decoded group of segments, with every delta already resolved to an absolute value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentGroup {
    Ranges {
        kind: SegmentKind,
        ranges: Vec<CodeRange>,
    },
    RunLengths(Vec<i64>),
    Charset {
        kind: SegmentKind,
        ranges: Vec<CharsetRange>,
    },
}

impl SegmentGroup {
    pub fn kind(&self) -> SegmentKind {
        match self {
            SegmentGroup::Ranges { kind, .. } | SegmentGroup::Charset { kind, .. } => *kind,
            SegmentGroup::RunLengths(_) => SegmentKind::RunLength,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SegmentGroup::Ranges { ranges, .. } => ranges.len(),
            SegmentGroup::RunLengths(lengths) => lengths.len(),
            SegmentGroup::Charset { ranges, .. } => ranges.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
