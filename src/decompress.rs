use crate::{
    error::{IncrFontErr, bail_if},
    font::{GlyphBundle, inject_glyphs, rebuild_tables, sanitize_base_font},
    header::{DecodeOptions, parse_header_with_options},
    rle::rle_decode,
    types::FontInfo,
};

/// A decoded base font, ready to receive glyphs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseFont {
    pub info: FontInfo,
    pub data: Vec<u8>,
}

impl BaseFont {
    /// Patch the glyphs of a bundle, as received over the wire, into the font.
    pub fn inject(&mut self, bundle: &[u8]) -> Result<(), IncrFontErr> {
        let bundle = GlyphBundle::parse(bundle)?;
        inject_glyphs(&mut self.info, &mut self.data, &bundle)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

pub fn decompress_base_font(transfer: &[u8]) -> Result<BaseFont, IncrFontErr> {
    decompress_base_font_with_options(transfer, &DecodeOptions::default())
}

/// Turn the bytes of a transferred base font into a font with placeholder glyphs.
///
/// The header is parsed, the run length encoded font after it expanded, the
/// cmap and charset tables filled back in and the glyph slots sanitized.
pub fn decompress_base_font_with_options(
    transfer: &[u8],
    options: &DecodeOptions,
) -> Result<BaseFont, IncrFontErr> {
    let mut info = parse_header_with_options(transfer, options)?;

    let head_size = info.head_size as usize;
    bail_if!(
        head_size > transfer.len(),
        IncrFontErr::OutOfBounds {
            requested: head_size,
            available: transfer.len(),
        }
    );
    let mut data = rle_decode(None, &transfer[head_size..])?;
    log::debug!(
        "expanded {} transferred bytes to a {} byte font with {} glyphs",
        transfer.len(),
        data.len(),
        info.num_glyphs
    );

    rebuild_tables(&mut info, &mut data)?;
    sanitize_base_font(&mut info, &mut data)?;

    Ok(BaseFont { info, data })
}
