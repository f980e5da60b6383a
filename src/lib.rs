//! Pure Rust decoding of incrementally transferred fonts.
//!
//! A base font arrives with its glyphs stripped, its cmap arrays compacted and
//! the rest run length encoded behind a small "BSAC" header.
//! [`decompress_base_font`] turns it back into a loadable font and
//! [`BaseFont::inject`] patches in glyph bundles as they are fetched.

#![allow(clippy::needless_range_loop)]

pub mod buffer;
pub mod compact_cmap;
mod decompress;
mod error;
pub mod font;
pub mod header;
pub mod rle;
pub mod segments;
pub mod table_tags;
pub mod types;
pub mod variable_length;

#[cfg(test)]
mod testdata;

pub use decompress::{BaseFont, decompress_base_font, decompress_base_font_with_options};
pub use error::{FormatError, IncrFontErr};
pub use header::{DecodeOptions, HeaderBuilder, VersionPolicy, parse_header, parse_header_with_options};
pub use types::FontInfo;
