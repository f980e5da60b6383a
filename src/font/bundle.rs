//! The glyph bundles a server answers character requests with.
//!
//! ```text
//! count: u16 | flags: u8
//! count x { glyphId: u16, [hmtx: i16], [vmtx: i16], offset: u32, length: u16, bytes }
//! ```

use bytes::{Buf, BufMut};

use crate::error::{IncrFontErr, bail, bail_if};

/// Which optional fields the records of a bundle carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BundleFlags(u8);

impl BundleFlags {
    pub const HAS_HMTX: BundleFlags = BundleFlags(1 << 0);
    pub const HAS_VMTX: BundleFlags = BundleFlags(1 << 1);
    /// Glyph data are CFF charstrings rather than TrueType outlines.
    pub const HAS_CFF: BundleFlags = BundleFlags(1 << 2);

    pub const fn from_bits(bits: u8) -> Self {
        BundleFlags(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: BundleFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for BundleFlags {
    type Output = BundleFlags;

    fn bitor(self, rhs: BundleFlags) -> BundleFlags {
        BundleFlags(self.0 | rhs.0)
    }
}

/// One glyph of a bundle, borrowing its outline bytes from the bundle data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphRecord<'a> {
    pub glyph_id: u16,
    pub hmtx: Option<i16>,
    pub vmtx: Option<i16>,
    /// Position of the glyph inside the glyph data of the complete font.
    pub offset: u32,
    pub data: &'a [u8],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphBundle<'a> {
    pub flags: BundleFlags,
    pub records: Vec<GlyphRecord<'a>>,
}

impl<'a> GlyphBundle<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, IncrFontErr> {
        let mut input = data;
        let count = input.try_get_u16()?;
        let flags = BundleFlags::from_bits(input.try_get_u8()?);

        let mut records = Vec::with_capacity((count as usize).min(input.remaining()));
        for _ in 0..count {
            let glyph_id = input.try_get_u16()?;
            let hmtx = match flags.contains(BundleFlags::HAS_HMTX) {
                true => Some(input.try_get_i16()?),
                false => None,
            };
            let vmtx = match flags.contains(BundleFlags::HAS_VMTX) {
                true => Some(input.try_get_i16()?),
                false => None,
            };
            let offset = input.try_get_u32()?;
            let length = input.try_get_u16()? as usize;
            bail_if!(
                input.len() < length,
                IncrFontErr::OutOfBounds {
                    requested: length,
                    available: input.len(),
                }
            );
            let (glyph_data, rest) = input.split_at(length);
            input = rest;

            records.push(GlyphRecord {
                glyph_id,
                hmtx,
                vmtx,
                offset,
                data: glyph_data,
            });
        }

        if input.has_remaining() {
            log::debug!("{} bytes after the last glyph record", input.remaining());
        }
        Ok(GlyphBundle { flags, records })
    }

    pub fn is_cff(&self) -> bool {
        self.flags.contains(BundleFlags::HAS_CFF)
    }

    /// Serialize back to the wire format. Metrics are written only when the
    /// matching flag is set and a record without them is rejected.
    pub fn to_bytes(&self) -> Result<Vec<u8>, IncrFontErr> {
        let Ok(count) = u16::try_from(self.records.len()) else {
            bail!(IncrFontErr::InvalidArgument("too many glyphs for one bundle"));
        };
        let mut out = Vec::new();
        out.put_u16(count);
        out.put_u8(self.flags.bits());

        for record in &self.records {
            out.put_u16(record.glyph_id);
            for (flag, metric) in [
                (BundleFlags::HAS_HMTX, record.hmtx),
                (BundleFlags::HAS_VMTX, record.vmtx),
            ] {
                if self.flags.contains(flag) {
                    let Some(metric) = metric else {
                        bail!(IncrFontErr::InvalidArgument(
                            "bundle flags promise a side bearing the record lacks"
                        ));
                    };
                    out.put_i16(metric);
                }
            }
            let Ok(length) = u16::try_from(record.data.len()) else {
                bail!(IncrFontErr::InvalidArgument("glyph longer than 65535 bytes"));
            };
            out.put_u32(record.offset);
            out.put_u16(length);
            out.put_slice(record.data);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_with_metrics() {
        #[rustfmt::skip]
        let data = [
            0, 2, // count
            0b011, // hmtx + vmtx
            0, 7, 0xFF, 0xFE, 0, 40, 0, 0, 0, 100, 0, 3, 1, 2, 3,
            1, 0, 0, 5, 0, 0, 0, 0, 0, 103, 0, 0,
        ];
        let bundle = GlyphBundle::parse(&data).unwrap();
        assert!(!bundle.is_cff());
        assert_eq!(
            bundle.records,
            vec![
                GlyphRecord {
                    glyph_id: 7,
                    hmtx: Some(-2),
                    vmtx: Some(40),
                    offset: 100,
                    data: &[1, 2, 3],
                },
                GlyphRecord {
                    glyph_id: 256,
                    hmtx: Some(5),
                    vmtx: Some(0),
                    offset: 103,
                    data: &[],
                },
            ]
        );
        assert_eq!(bundle.to_bytes().unwrap(), data.to_vec());
    }

    #[test]
    fn parse_cff_without_metrics() {
        let data = [0, 1, 0b100, 0, 3, 0, 0, 0, 9, 0, 1, 14];
        let bundle = GlyphBundle::parse(&data).unwrap();
        assert!(bundle.is_cff());
        assert_eq!(bundle.records[0].hmtx, None);
        assert_eq!(bundle.records[0].vmtx, None);
        assert_eq!(bundle.records[0].data, &[14]);
    }

    #[test]
    fn truncated_glyph_bytes() {
        let data = [0, 1, 0, 0, 3, 0, 0, 0, 9, 0, 4, 1, 2];
        assert_eq!(
            GlyphBundle::parse(&data),
            Err(IncrFontErr::OutOfBounds {
                requested: 4,
                available: 2
            })
        );
    }

    #[test]
    fn missing_metric_is_rejected() {
        let bundle = GlyphBundle {
            flags: BundleFlags::HAS_HMTX | BundleFlags::HAS_CFF,
            records: vec![GlyphRecord {
                glyph_id: 1,
                hmtx: None,
                vmtx: None,
                offset: 0,
                data: &[],
            }],
        };
        assert!(matches!(
            bundle.to_bytes(),
            Err(IncrFontErr::InvalidArgument(_))
        ));
    }
}
