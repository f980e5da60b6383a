//! The compact "BSAC" header that precedes a transferred base font.
//!
//! ```text
//! magic "BSAC" | headSize: i32 | version: i32 | count: u16
//! count x (tag: [u8; 4], offset: u32)
//! tag payloads, each at `count * 8 + 14 + offset`
//! ```

use bytes::BufMut;
use font_types::Tag;

use crate::buffer::ByteCursor;
use crate::compact_cmap::synthesize_cmap4;
use crate::error::{FormatError, IncrFontErr, bail, bail_with_msg_if};
use crate::segments::{read_segment_group, write_segment_group};
use crate::table_tags::{BSAC_MAGIC, HeaderTag};
use crate::types::{
    CharsetInfo, Cmap4Info, Cmap12Info, CompactCmap, FontInfo, OffsetSize, SegmentGroup,
};

/// The header version this crate was written against.
pub const BASE_VERSION: i32 = 1;

// magic + headSize + version + count
const PREAMBLE_SIZE: usize = 4 + 4 + 4 + 2;
const DIRECTORY_ENTRY_SIZE: usize = 8;

/// What to do with a header whose version is not [`BASE_VERSION`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VersionPolicy {
    /// Log a warning and keep going. Servers in the wild send other versions.
    #[default]
    Tolerate,
    /// Fail with [`FormatError::UnsupportedVersion`].
    Enforce,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub version_policy: VersionPolicy,
}

pub fn parse_header(data: &[u8]) -> Result<FontInfo, IncrFontErr> {
    parse_header_with_options(data, &DecodeOptions::default())
}

/// Parse the header at the start of `data` into a fresh [`FontInfo`].
pub fn parse_header_with_options(
    data: &[u8],
    options: &DecodeOptions,
) -> Result<FontInfo, IncrFontErr> {
    let mut cursor = ByteCursor::new(data, 0);

    let magic = cursor.read_tag()?;
    bail_with_msg_if!(
        magic != BSAC_MAGIC,
        FormatError::BadMagic(magic),
        "magic number mismatch: expected '{}' but got '{}'",
        BSAC_MAGIC,
        magic
    );

    let mut header = HeaderParse {
        info: FontInfo {
            head_size: cursor.read_i32()?,
            version: cursor.read_i32()?,
            ..FontInfo::default()
        },
        compact_groups: None,
    };
    let version = header.info.version;
    if version != BASE_VERSION {
        match options.version_policy {
            VersionPolicy::Tolerate => {
                log::warn!("base font version {version} differs from {BASE_VERSION}")
            }
            VersionPolicy::Enforce => bail!(FormatError::UnsupportedVersion(version)),
        }
    }

    let count = cursor.read_u16()? as usize;
    let data_start = count * DIRECTORY_ENTRY_SIZE + PREAMBLE_SIZE;
    for _ in 0..count {
        let tag = cursor.read_tag()?;
        let tag_offset = cursor.read_u32()? as usize;
        let Some(header_tag) = HeaderTag::from_tag(tag) else {
            bail!(FormatError::UnknownTag(tag));
        };
        log::trace!("{tag} at +{tag_offset}: {}", header_tag.description());

        let saved = cursor.tell();
        cursor.seek(data_start.saturating_add(tag_offset));
        header.read_payload(header_tag, &mut cursor)?;
        cursor.seek(saved);
    }

    header.finish()
}

struct HeaderParse {
    info: FontInfo,
    // Kept aside until every tag is read, the cmap4 synthesis needs CM04 and CM12.
    compact_groups: Option<Vec<SegmentGroup>>,
}

impl HeaderParse {
    fn read_payload(
        &mut self,
        tag: HeaderTag,
        cursor: &mut ByteCursor<&[u8]>,
    ) -> Result<(), IncrFontErr> {
        let info = &mut self.info;
        match tag {
            HeaderTag::GlyphOffset => info.glyph_offset = cursor.read_u32()?,
            HeaderTag::GlyphCount => info.num_glyphs = cursor.read_u16()?,
            HeaderTag::LocaOffset => info.glyph_data_offset = cursor.read_u32()?,
            HeaderTag::LocaFormat => info.offset_size = OffsetSize::try_from(cursor.read_u8()?)?,
            HeaderTag::HmtxOffset => info.hmtx_offset = cursor.read_u32()?,
            HeaderTag::VmtxOffset => info.vmtx_offset = cursor.read_u32()?,
            HeaderTag::HmetricCount => info.hmetric_count = cursor.read_u16()?,
            HeaderTag::VmetricCount => info.vmetric_count = cursor.read_u16()?,
            HeaderTag::FontType => info.is_ttf = cursor.read_u8()? != 0,
            HeaderTag::Cmap12 => {
                info.cmap12 = Some(Cmap12Info {
                    offset: cursor.read_u32()?,
                    n_groups: cursor.read_u32()?,
                })
            }
            HeaderTag::Cmap4 => {
                info.cmap4 = Some(Cmap4Info {
                    offset: cursor.read_u32()?,
                    length: cursor.read_u32()?,
                    ..Cmap4Info::default()
                })
            }
            HeaderTag::CompactCmap => {
                let group_count = cursor.read_u8()?;
                let mut groups = Vec::with_capacity(group_count as usize);
                for _ in 0..group_count {
                    groups.push(read_segment_group(cursor)?);
                }
                self.compact_groups = Some(groups);
            }
            HeaderTag::CharsetFormat2 => {
                let offset = cursor.read_u32()?;
                let group = read_segment_group(cursor)?;
                bail_with_msg_if!(
                    !matches!(group, SegmentGroup::Charset { .. }),
                    FormatError::UnknownSegmentType(group.kind() as u8),
                    "charset needs charset ranges, got type {}",
                    group.kind() as u8
                );
                info.charset = Some(CharsetInfo { offset, group });
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<FontInfo, IncrFontErr> {
        if let Some(groups) = self.compact_groups.take() {
            self.info.compact_cmap = compact_cmap(&self.info, groups)?;
        }
        bail_with_msg_if!(
            self.info.head_size <= 0,
            FormatError::MissingHeader,
            "header size {} is not positive",
            self.info.head_size
        );
        Ok(self.info)
    }
}

fn compact_cmap(
    info: &FontInfo,
    groups: Vec<SegmentGroup>,
) -> Result<Option<CompactCmap>, IncrFontErr> {
    let run_lengths = match groups.as_slice() {
        [_, SegmentGroup::RunLengths(lengths)] if info.cmap4.is_some() && info.cmap12.is_some() => {
            Some(lengths.clone())
        }
        _ => None,
    };
    let Some(cmap12) = groups.into_iter().next() else {
        return Ok(None);
    };
    let SegmentGroup::Ranges { ranges, .. } = &cmap12 else {
        log::debug!(
            "compact cmap must start with code ranges, got type {}",
            cmap12.kind() as u8
        );
        bail!(FormatError::UnknownSegmentType(cmap12.kind() as u8));
    };
    let cmap4 = match run_lengths {
        Some(run_lengths) => Some(synthesize_cmap4(ranges, &run_lengths)?),
        None => None,
    };
    Ok(Some(CompactCmap { cmap12, cmap4 }))
}

/// Writes a BSAC header. Payloads are laid out in the order the tags are added.
#[derive(Clone, Debug)]
pub struct HeaderBuilder {
    version: i32,
    entries: Vec<(Tag, Vec<u8>)>,
}

impl Default for HeaderBuilder {
    fn default() -> Self {
        HeaderBuilder {
            version: BASE_VERSION,
            entries: Vec::new(),
        }
    }
}

impl HeaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&mut self, version: i32) -> &mut Self {
        self.version = version;
        self
    }

    /// Add a tag with an already encoded payload.
    pub fn raw(&mut self, tag: HeaderTag, payload: Vec<u8>) -> &mut Self {
        self.entries.push((tag.tag(), payload));
        self
    }

    pub fn glyph_offset(&mut self, offset: u32) -> &mut Self {
        self.raw(HeaderTag::GlyphOffset, offset.to_be_bytes().to_vec())
    }

    pub fn glyph_count(&mut self, count: u16) -> &mut Self {
        self.raw(HeaderTag::GlyphCount, count.to_be_bytes().to_vec())
    }

    pub fn loca_offset(&mut self, offset: u32) -> &mut Self {
        self.raw(HeaderTag::LocaOffset, offset.to_be_bytes().to_vec())
    }

    pub fn loca_format(&mut self, size: OffsetSize) -> &mut Self {
        self.raw(HeaderTag::LocaFormat, vec![size as u8])
    }

    pub fn hmtx_offset(&mut self, offset: u32) -> &mut Self {
        self.raw(HeaderTag::HmtxOffset, offset.to_be_bytes().to_vec())
    }

    pub fn vmtx_offset(&mut self, offset: u32) -> &mut Self {
        self.raw(HeaderTag::VmtxOffset, offset.to_be_bytes().to_vec())
    }

    pub fn hmetric_count(&mut self, count: u16) -> &mut Self {
        self.raw(HeaderTag::HmetricCount, count.to_be_bytes().to_vec())
    }

    pub fn vmetric_count(&mut self, count: u16) -> &mut Self {
        self.raw(HeaderTag::VmetricCount, count.to_be_bytes().to_vec())
    }

    pub fn font_type(&mut self, is_ttf: bool) -> &mut Self {
        self.raw(HeaderTag::FontType, vec![is_ttf as u8])
    }

    pub fn cmap12(&mut self, offset: u32, n_groups: u32) -> &mut Self {
        let mut payload = Vec::with_capacity(8);
        payload.put_u32(offset);
        payload.put_u32(n_groups);
        self.raw(HeaderTag::Cmap12, payload)
    }

    pub fn cmap4(&mut self, offset: u32, length: u32) -> &mut Self {
        let mut payload = Vec::with_capacity(8);
        payload.put_u32(offset);
        payload.put_u32(length);
        self.raw(HeaderTag::Cmap4, payload)
    }

    pub fn compact_cmap(&mut self, groups: &[SegmentGroup]) -> Result<&mut Self, IncrFontErr> {
        let Ok(group_count) = u8::try_from(groups.len()) else {
            bail!(IncrFontErr::InvalidArgument("at most 255 compact cmap groups"));
        };
        let mut payload = vec![group_count];
        for group in groups {
            write_segment_group(group, &mut payload)?;
        }
        Ok(self.raw(HeaderTag::CompactCmap, payload))
    }

    pub fn charset(&mut self, offset: u32, group: &SegmentGroup) -> Result<&mut Self, IncrFontErr> {
        let mut payload = Vec::new();
        payload.put_u32(offset);
        write_segment_group(group, &mut payload)?;
        Ok(self.raw(HeaderTag::CharsetFormat2, payload))
    }

    /// Size of the header [`build`](Self::build) will produce.
    pub fn head_size(&self) -> usize {
        PREAMBLE_SIZE
            + self.entries.len() * DIRECTORY_ENTRY_SIZE
            + self.entries.iter().map(|(_, p)| p.len()).sum::<usize>()
    }

    pub fn build(&self) -> Result<Vec<u8>, IncrFontErr> {
        let Ok(count) = u16::try_from(self.entries.len()) else {
            bail!(IncrFontErr::InvalidArgument("too many header tags"));
        };
        let Ok(head_size) = i32::try_from(self.head_size()) else {
            bail!(IncrFontErr::InvalidArgument("header too large"));
        };

        let mut out = Vec::with_capacity(head_size as usize);
        out.put_slice(&BSAC_MAGIC.to_be_bytes());
        out.put_i32(head_size);
        out.put_i32(self.version);
        out.put_u16(count);

        let mut offset = 0u32;
        for (tag, payload) in &self.entries {
            out.put_slice(&tag.to_be_bytes());
            out.put_u32(offset);
            offset += payload.len() as u32;
        }
        for (_, payload) in &self.entries {
            out.put_slice(payload);
        }
        debug_assert_eq!(out.len(), head_size as usize);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::{CharsetRange, CodeRange, SegmentKind};

    fn code_ranges() -> SegmentGroup {
        SegmentGroup::Ranges {
            kind: SegmentKind::Packed,
            ranges: vec![
                CodeRange {
                    start_code: 0x20,
                    length: 3,
                    glyph_id: 1,
                },
                CodeRange {
                    start_code: 0x30,
                    length: 2,
                    glyph_id: 10,
                },
                CodeRange {
                    start_code: 0x33,
                    length: 1,
                    glyph_id: 20,
                },
            ],
        }
    }

    fn charset() -> SegmentGroup {
        SegmentGroup::Charset {
            kind: SegmentKind::CharsetRange8,
            ranges: vec![
                CharsetRange { first: 1, n_left: 4 },
                CharsetRange {
                    first: 391,
                    n_left: 40,
                },
            ],
        }
    }

    #[test]
    fn tag_data_starts_after_directory() {
        #[rustfmt::skip]
        let data = [
            b'B', b'S', b'A', b'C',
            0, 0, 0, 30, // headSize
            0, 0, 0, 1, // version
            0, 2, // count
            b'G', b'L', b'C', b'N', 0, 0, 0, 2,
            b'T', b'Y', b'P', b'E', 0, 0, 0, 0,
            1, // TYPE
            0, // unused
            0x01, 0x02, // GLCN
        ];
        let info = parse_header(&data).unwrap();
        assert_eq!(info.head_size, 30);
        assert_eq!(info.version, 1);
        assert_eq!(info.num_glyphs, 0x0102);
        assert!(info.is_ttf);
    }

    #[test]
    fn every_field_survives_any_directory_order() {
        let mut builder = HeaderBuilder::new();
        builder
            .vmetric_count(3)
            .cmap4(400, 64)
            .glyph_count(700)
            .loca_format(OffsetSize::Three)
            .font_type(false)
            .hmtx_offset(1000)
            .vmtx_offset(2000)
            .glyph_offset(5000)
            .cmap12(300, 3)
            .hmetric_count(650)
            .loca_offset(4000);
        builder
            .charset(90, &charset())
            .unwrap()
            .compact_cmap(&[code_ranges(), SegmentGroup::RunLengths(vec![1, 2])])
            .unwrap();
        let data = builder.build().unwrap();
        assert_eq!(data.len(), builder.head_size());

        let info = parse_header(&data).unwrap();
        let cmap4 = synthesize_cmap4(
            match &code_ranges() {
                SegmentGroup::Ranges { ranges, .. } => ranges,
                _ => unreachable!(),
            },
            &[1, 2],
        )
        .unwrap();
        assert_eq!(
            info,
            FontInfo {
                head_size: data.len() as i32,
                version: BASE_VERSION,
                num_glyphs: 700,
                glyph_offset: 5000,
                glyph_data_offset: 4000,
                offset_size: OffsetSize::Three,
                hmtx_offset: 1000,
                vmtx_offset: 2000,
                hmetric_count: 650,
                vmetric_count: 3,
                is_ttf: false,
                cmap12: Some(Cmap12Info {
                    offset: 300,
                    n_groups: 3
                }),
                cmap4: Some(Cmap4Info {
                    offset: 400,
                    length: 64,
                    ..Cmap4Info::default()
                }),
                charset: Some(CharsetInfo {
                    offset: 90,
                    group: charset()
                }),
                compact_cmap: Some(CompactCmap {
                    cmap12: code_ranges(),
                    cmap4: Some(cmap4),
                }),
                dirty: false,
            }
        );
    }

    #[test]
    fn compact_cmap_before_its_tables() {
        let mut builder = HeaderBuilder::new();
        builder
            .compact_cmap(&[code_ranges(), SegmentGroup::RunLengths(vec![1, 2])])
            .unwrap()
            .cmap4(400, 64)
            .cmap12(300, 3);
        let data = builder.build().unwrap();
        assert_eq!(&data[14..18], b"CCMP");

        let compact = parse_header(&data).unwrap().compact_cmap.unwrap();
        assert_eq!(compact.cmap12, code_ranges());
        let cmap4 = compact.cmap4.unwrap();
        assert_eq!(cmap4.segments.len(), 3);
    }

    #[test]
    fn no_cmap4_without_both_tables() {
        let mut builder = HeaderBuilder::new();
        builder.cmap12(300, 3);
        builder
            .compact_cmap(&[code_ranges(), SegmentGroup::RunLengths(vec![1, 2])])
            .unwrap();
        let info = parse_header(&builder.build().unwrap()).unwrap();
        let compact = info.compact_cmap.unwrap();
        assert_eq!(compact.cmap12, code_ranges());
        assert_eq!(compact.cmap4, None);
    }

    #[test]
    fn compact_cmap_must_start_with_ranges() {
        let mut builder = HeaderBuilder::new();
        builder
            .compact_cmap(&[SegmentGroup::RunLengths(vec![1])])
            .unwrap();
        assert_eq!(
            parse_header(&builder.build().unwrap()),
            Err(IncrFontErr::Format(FormatError::UnknownSegmentType(4)))
        );
    }

    #[test]
    fn bad_magic() {
        let mut data = HeaderBuilder::new().glyph_count(1).build().unwrap();
        data[..4].copy_from_slice(b"OTTO");
        assert_eq!(
            parse_header(&data),
            Err(IncrFontErr::Format(FormatError::BadMagic(Tag::new(b"OTTO"))))
        );
    }

    #[test]
    fn unknown_tag() {
        let mut data = HeaderBuilder::new().glyph_count(1).build().unwrap();
        data[14..18].copy_from_slice(b"GSUB");
        assert_eq!(
            parse_header(&data),
            Err(IncrFontErr::Format(FormatError::UnknownTag(Tag::new(b"GSUB"))))
        );
    }

    #[test]
    fn missing_head_size() {
        let mut data = HeaderBuilder::new().glyph_count(1).build().unwrap();
        data[4..8].copy_from_slice(&[0, 0, 0, 0]);
        assert_eq!(
            parse_header(&data),
            Err(IncrFontErr::Format(FormatError::MissingHeader))
        );
        data[4..8].copy_from_slice(&(-5i32).to_be_bytes());
        assert_eq!(
            parse_header(&data),
            Err(IncrFontErr::Format(FormatError::MissingHeader))
        );
    }

    #[test]
    fn version_policy() {
        let _ = env_logger::builder().is_test(true).try_init();
        let data = HeaderBuilder::new()
            .version(2)
            .glyph_count(9)
            .build()
            .unwrap();
        assert_eq!(parse_header(&data).unwrap().version, 2);

        let strict = DecodeOptions {
            version_policy: VersionPolicy::Enforce,
        };
        assert_eq!(
            parse_header_with_options(&data, &strict),
            Err(IncrFontErr::Format(FormatError::UnsupportedVersion(2)))
        );
    }

    #[test]
    fn bad_loca_format() {
        let data = HeaderBuilder::new()
            .raw(HeaderTag::LocaFormat, vec![5])
            .build()
            .unwrap();
        assert_eq!(
            parse_header(&data),
            Err(IncrFontErr::Format(FormatError::BadOffsetSize(5)))
        );
    }

    #[test]
    fn truncated_payload() {
        let mut data = HeaderBuilder::new().glyph_offset(77).build().unwrap();
        data.truncate(data.len() - 1);
        assert!(matches!(
            parse_header(&data),
            Err(IncrFontErr::OutOfBounds { .. })
        ));
    }
}
