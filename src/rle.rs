//! Run length decoding of the transferred font bytes.
//!
//! The payload starts with a u32 giving the number of bytes it expands to,
//! followed by operations. Each operation byte holds the operation in its high
//! six bits and the width of the following count in its low two bits.

use bytes::Buf as _;

use crate::error::{
    FormatError, IncrFontErr, bail, bail_if, bail_with_msg_if, usize_will_overflow,
};

const OP_MASK: u8 = 0xFC;
const COUNT_WIDTH_MASK: u8 = 0x03;

/// Copy the next `count` payload bytes.
pub const RLE_COPY: u8 = 0xC0;
/// Repeat the next payload byte `count` times.
pub const RLE_FILL: u8 = 0xC8;

/// Expand `payload`, placing `prefix` verbatim in front of the decoded bytes.
pub fn rle_decode(prefix: Option<&[u8]>, payload: &[u8]) -> Result<Vec<u8>, IncrFontErr> {
    let mut input = payload;
    let prefix = prefix.unwrap_or_default();

    let extra_size = input.try_get_u32()? as usize;
    bail_if!(
        usize_will_overflow(prefix.len(), extra_size),
        IncrFontErr::InvalidArgument("decoded size does not fit in memory")
    );
    let total_size = prefix.len() + extra_size;

    // Zero fills rely on the output starting out zeroed.
    let mut out = vec![0u8; total_size];
    out[..prefix.len()].copy_from_slice(prefix);

    let mut write_offset = prefix.len();
    while write_offset < total_size {
        let op = input.try_get_u8()?;
        let operation = op & OP_MASK;
        bail_with_msg_if!(
            operation != RLE_COPY && operation != RLE_FILL,
            FormatError::CorruptRleOpcode(op),
            "unknown RLE operation 0x{:02X} at output offset {}",
            op,
            write_offset
        );
        let count = match op & COUNT_WIDTH_MASK {
            0 => input.try_get_u8()? as usize,
            1 => input.try_get_u16()? as usize,
            2 => input.try_get_u32()? as usize,
            _ => bail!(FormatError::CorruptRleOpcode(op)),
        };

        let remaining = total_size - write_offset;
        bail_if!(
            count > remaining,
            FormatError::RleOverrun {
                needed: count,
                remaining
            }
        );
        let run = &mut out[write_offset..write_offset + count];
        if operation == RLE_COPY {
            input.try_copy_to_slice(run)?;
        } else {
            let fill_byte = input.try_get_u8()?;
            if fill_byte != 0 {
                run.fill(fill_byte);
            }
        }
        write_offset += count;
    }

    if input.has_remaining() {
        log::debug!("{} trailing bytes after RLE data", input.remaining());
    }
    Ok(out)
}
