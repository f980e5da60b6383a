use font_types::Tag;

/// An error that occurs while decoding a transferred font or patching glyphs into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncrFontErr {
    /// The input bytes do not follow one of the wire formats.
    Format(FormatError),
    /// A read or write would have gone past the end of a buffer.
    OutOfBounds { requested: usize, available: usize },
    /// The caller passed a value the operation cannot accept.
    InvalidArgument(&'static str),
}

/// The ways in which input data can violate a wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    BadMagic(Tag),
    UnknownTag(Tag),
    MissingHeader,
    UnsupportedVersion(i32),
    BadOffsetSize(u8),
    UnknownSegmentType(u8),
    CorruptRleOpcode(u8),
    RleOverrun { needed: usize, remaining: usize },
    InvalidRunLength(i64),
    MissingCompactCmap,
    SegmentCountMismatch { expected: usize, found: usize },
}

impl From<FormatError> for IncrFontErr {
    fn from(err: FormatError) -> Self {
        IncrFontErr::Format(err)
    }
}

impl From<bytes::TryGetError> for IncrFontErr {
    fn from(err: bytes::TryGetError) -> Self {
        IncrFontErr::OutOfBounds {
            requested: err.requested,
            available: err.available,
        }
    }
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FormatError::BadMagic(magic) => {
                write!(f, "magic number mismatch: expected 'BSAC' but got '{magic}'")
            }
            FormatError::UnknownTag(tag) => write!(f, "unknown base font header tag '{tag}'"),
            FormatError::MissingHeader => write!(f, "missing header info"),
            FormatError::UnsupportedVersion(version) => {
                write!(f, "incompatible base font version {version}")
            }
            FormatError::BadOffsetSize(size) => {
                write!(f, "offset size must be 1, 2, 3 or 4 bytes, got {size}")
            }
            FormatError::UnknownSegmentType(kind) => {
                write!(f, "unknown segment group type {kind}")
            }
            FormatError::CorruptRleOpcode(op) => write!(f, "corrupt RLE opcode 0x{op:02X}"),
            FormatError::RleOverrun { needed, remaining } => write!(
                f,
                "RLE run of {needed} bytes exceeds the {remaining} bytes left in the output"
            ),
            FormatError::InvalidRunLength(len) => {
                write!(f, "compact cmap run length {len} does not match the cmap12 groups")
            }
            FormatError::MissingCompactCmap => {
                write!(f, "cmap table declared without compact cmap groups")
            }
            FormatError::SegmentCountMismatch { expected, found } => write!(
                f,
                "table needs {expected} segments but only {found} were decoded"
            ),
        }
    }
}

impl std::fmt::Display for IncrFontErr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IncrFontErr::Format(err) => write!(f, "Malformed font data: {err}"),
            IncrFontErr::OutOfBounds {
                requested,
                available,
            } => write!(
                f,
                "Out of bounds access: needed {requested} bytes but only {available} available"
            ),
            IncrFontErr::InvalidArgument(msg) => write!(f, "Invalid argument: '{msg}'"),
        }
    }
}

impl std::error::Error for IncrFontErr {}

pub(crate) fn usize_will_overflow(a: usize, b: usize) -> bool {
    a.checked_add(b).is_none()
}

#[cfg(not(feature = "debug"))]
mod regular {
    macro_rules! bail {
        ($err: expr) => {
            return Err($err.into())
        };
    }
    pub(crate) use bail;

    macro_rules! bail_if {
        ($cond: expr, $err: expr) => {
            if $cond {
                return Err($err.into());
            }
        };
    }
    pub(crate) use bail_if;

    macro_rules! bail_with_msg_if {
        ($cond: expr, $err: expr, $($msg:tt)*) => {
            if $cond {
                log::debug!($($msg)*);
                return Err($err.into());
            }
        };
    }
    pub(crate) use bail_with_msg_if;
}
#[cfg(not(feature = "debug"))]
pub(crate) use regular::*;

#[cfg(feature = "debug")]
mod debug {
    macro_rules! bail {
        ($err: expr) => {
            panic!("{:?}", $err)
        };
    }
    pub(crate) use bail;

    macro_rules! bail_if {
        ($cond: expr, $err: expr) => {
            if $cond {
                panic!("{}: {:?}", stringify!($cond), $err)
            }
        };
    }
    pub(crate) use bail_if;

    macro_rules! bail_with_msg_if {
        ($cond: expr, $err: expr, $($msg:tt)*) => {
            if $cond {
                panic!($($msg)*);
            }
        };
    }
    pub(crate) use bail_with_msg_if;
}
#[cfg(feature = "debug")]
pub(crate) use debug::*;
