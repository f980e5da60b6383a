/* Copyright 2014 Google Inc. All Rights Reserved.

   Distributed under MIT license.
   See file LICENSE for detail or copy at https://opensource.org/licenses/MIT
*/

//! Helper functions for the nibble coded integers which carry the values that
//! don't fit in the fixed width fields of a group of segments.
//!
//! Each integer starts with a length nibble `L`. `L < 8` means a nonnegative
//! value of `L + 1` nibbles, otherwise a negative value of `L - 7` nibbles.
//! Nibbles are read high half of each byte first.

use arrayvec::ArrayVec;

use crate::buffer::ByteCursor;
use crate::error::{IncrFontErr, bail_if};

// A u32 magnitude never needs more than 8 value nibbles.
const MAX_VALUE_NIBBLES: usize = 8;

/// Reads 4 bit values from a cursor, consuming one byte per two nibbles.
///
/// A fresh reader always starts on a byte boundary. Dropping a reader halfway
/// through a byte discards the low nibble.
pub struct NibbleReader<'a, B> {
    cursor: &'a mut ByteCursor<B>,
    low_nibble: Option<u8>,
}

impl<'a, B: AsRef<[u8]>> NibbleReader<'a, B> {
    pub fn new(cursor: &'a mut ByteCursor<B>) -> Self {
        NibbleReader {
            cursor,
            low_nibble: None,
        }
    }

    pub fn read_nibble(&mut self) -> Result<u8, IncrFontErr> {
        match self.low_nibble.take() {
            Some(nibble) => Ok(nibble),
            None => {
                let byte = self.cursor.read_u8()?;
                self.low_nibble = Some(byte & 0x0F);
                Ok(byte >> 4)
            }
        }
    }

    pub fn read_signed_int(&mut self) -> Result<i64, IncrFontErr> {
        let length = self.read_nibble()?;
        let (sign, num_nibbles) = if length < 8 {
            (1, length + 1)
        } else {
            (-1, length - 7)
        };
        let mut value: i64 = 0;
        for _ in 0..num_nibbles {
            value = (value << 4) | self.read_nibble()? as i64;
        }
        Ok(sign * value)
    }
}

/// Read the `count` nibble coded integers that follow the fixed width part of a group.
pub(crate) fn read_extra_array<B: AsRef<[u8]>>(
    cursor: &mut ByteCursor<B>,
    count: usize,
) -> Result<Vec<i64>, IncrFontErr> {
    let mut reader = NibbleReader::new(cursor);
    let mut extra = Vec::with_capacity(count);
    for _ in 0..count {
        extra.push(reader.read_signed_int()?);
    }
    Ok(extra)
}

fn nibble_count(mut magnitude: u64) -> usize {
    let mut count = 1;
    while magnitude > 0xF {
        magnitude >>= 4;
        count += 1;
    }
    count
}

/// Nibbles (length nibble first) encoding `value`.
pub(crate) fn signed_int_nibbles(value: i64) -> Result<ArrayVec<u8, 9>, IncrFontErr> {
    let magnitude = value.unsigned_abs();
    let count = nibble_count(magnitude);
    bail_if!(
        count > MAX_VALUE_NIBBLES,
        IncrFontErr::InvalidArgument("value does not fit in 8 nibbles")
    );

    let mut nibbles: ArrayVec<u8, 9> = ArrayVec::new();
    let length = if value >= 0 { count - 1 } else { count + 7 };
    nibbles.push(length as u8);
    for i in (0..count).rev() {
        nibbles.push(((magnitude >> (4 * i)) & 0xF) as u8);
    }
    Ok(nibbles)
}

/// Packs nibbles two per byte. The last byte is zero padded.
#[derive(Default)]
pub struct NibbleWriter {
    bytes: Vec<u8>,
    half_full: bool,
}

impl NibbleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_nibble(&mut self, nibble: u8) {
        let nibble = nibble & 0x0F;
        if self.half_full {
            if let Some(last) = self.bytes.last_mut() {
                *last |= nibble;
            }
        } else {
            self.bytes.push(nibble << 4);
        }
        self.half_full = !self.half_full;
    }

    pub fn write_signed_int(&mut self, value: i64) -> Result<(), IncrFontErr> {
        for nibble in signed_int_nibbles(value)? {
            self.write_nibble(nibble);
        }
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibbles_high_half_first() {
        let data = [0xAB, 0xCD];
        let mut cursor = ByteCursor::new(&data[..], 0);
        let mut reader = NibbleReader::new(&mut cursor);
        let nibbles: Vec<u8> = (0..4).map(|_| reader.read_nibble().unwrap()).collect();
        assert_eq!(nibbles, vec![0xA, 0xB, 0xC, 0xD]);
        assert!(reader.read_nibble().is_err());
    }

    #[test]
    fn decode_signed_ints() {
        // 17 -> 0x111, -17 -> 0x911, 0 -> 0x00, 100 -> 0x164
        let data = [0x11, 0x19, 0x11, 0x00, 0x16, 0x40];
        let mut cursor = ByteCursor::new(&data[..], 0);
        let values = read_extra_array(&mut cursor, 4).unwrap();
        assert_eq!(values, vec![17, -17, 0, 100]);
        assert_eq!(cursor.tell(), 6);
    }

    #[test]
    fn encoder_matches_reference_encodings() {
        assert_eq!(signed_int_nibbles(17).unwrap().as_slice(), &[1, 1, 1]);
        assert_eq!(signed_int_nibbles(-17).unwrap().as_slice(), &[9, 1, 1]);
        assert_eq!(signed_int_nibbles(0).unwrap().as_slice(), &[0, 0]);
        assert_eq!(signed_int_nibbles(-1).unwrap().as_slice(), &[8, 1]);
        assert_eq!(
            signed_int_nibbles(0xFFFF_FFFF).unwrap().as_slice(),
            &[7, 0xF, 0xF, 0xF, 0xF, 0xF, 0xF, 0xF, 0xF]
        );
        assert!(signed_int_nibbles(0x1_0000_0000).is_err());
    }

    #[test]
    fn writer_pads_last_byte() {
        let mut writer = NibbleWriter::new();
        writer.write_signed_int(100).unwrap();
        writer.write_signed_int(-2).unwrap();
        // 1 6 4 | 8 2 | pad
        assert_eq!(writer.into_bytes(), vec![0x16, 0x48, 0x20]);
    }

    #[test]
    fn written_values_read_back() {
        let values = [5, -300, 0x7FFF_FFFF, -0xFFFF_FFFF, 0];
        let mut writer = NibbleWriter::new();
        for value in values {
            writer.write_signed_int(value).unwrap();
        }
        let bytes = writer.into_bytes();
        let mut cursor = ByteCursor::new(&bytes[..], 0);
        assert_eq!(
            read_extra_array(&mut cursor, values.len()).unwrap(),
            values.to_vec()
        );
    }
}
