//! In place edits of the decoded base font.

pub mod bundle;
pub mod inject;
pub mod sanitize;
pub mod tables;

pub use bundle::{BundleFlags, GlyphBundle, GlyphRecord};
pub use inject::inject_glyphs;
pub use sanitize::sanitize_base_font;
pub use tables::rebuild_tables;

/// The CFF `endchar` operator, the smallest valid charstring.
pub const CFF_ENDCHAR: u8 = 14;

/// Written over the first word of TrueType glyph data that has not arrived yet.
pub const EMPTY_GLYPH_MARKER: i16 = -1;
