/* Copyright 2014 Google Inc. All Rights Reserved.

   Distributed under MIT license.
   See file LICENSE for detail or copy at https://opensource.org/licenses/MIT
*/

use font_types::Tag;

use crate::error::{IncrFontErr, bail_if, usize_will_overflow};
use crate::types::OffsetSize;

// -----------------------------------------------------------------------------
// Big-endian cursor over a font buffer.
//
// Every position is relative to `base`, so a cursor can be opened directly on a
// table inside the font. Reads are available on any byte container, writes on
// containers that can be borrowed mutably. All accesses are bounds checked.
// -----------------------------------------------------------------------------
pub struct ByteCursor<B> {
    data: B,
    base: usize,
    offset: usize,
}

impl<B: AsRef<[u8]>> ByteCursor<B> {
    pub fn new(data: B, base: usize) -> ByteCursor<B> {
        ByteCursor {
            data,
            base,
            offset: 0,
        }
    }

    /// Move to `offset` bytes past the base.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn skip(&mut self, n_bytes: isize) -> Result<(), IncrFontErr> {
        bail_if!(
            n_bytes < 0,
            IncrFontErr::InvalidArgument("only nonnegative numbers are accepted")
        );
        let n_bytes = n_bytes as usize;
        bail_if!(
            n_bytes > self.remaining(),
            IncrFontErr::OutOfBounds {
                requested: n_bytes,
                available: self.remaining(),
            }
        );
        self.offset += n_bytes;
        Ok(())
    }

    pub fn tell(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes left between the cursor and the end of the underlying buffer.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.base.saturating_add(self.offset))
    }

    /// Absolute start of the next `n_bytes` access, after checking it fits.
    fn checked_start(&self, n_bytes: usize) -> Result<usize, IncrFontErr> {
        let out_of_bounds = IncrFontErr::OutOfBounds {
            requested: n_bytes,
            available: self.remaining(),
        };
        bail_if!(usize_will_overflow(self.base, self.offset), out_of_bounds);
        let start = self.base + self.offset;
        bail_if!(usize_will_overflow(start, n_bytes), out_of_bounds);
        bail_if!(start + n_bytes > self.len(), out_of_bounds);
        Ok(start)
    }

    #[inline(always)]
    fn read_n_bytes<const N: usize>(&mut self) -> Result<[u8; N], IncrFontErr> {
        let start = self.checked_start(N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data.as_ref()[start..start + N]);
        self.offset += N;
        Ok(bytes)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, IncrFontErr> {
        Ok(self.read_n_bytes::<1>()?[0])
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, IncrFontErr> {
        Ok(u16::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16, IncrFontErr> {
        Ok(i16::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_u24(&mut self) -> Result<u32, IncrFontErr> {
        let bytes: [u8; 3] = self.read_n_bytes()?;
        Ok((bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | (bytes[2] as u32))
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, IncrFontErr> {
        Ok(u32::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32, IncrFontErr> {
        Ok(i32::from_be_bytes(self.read_n_bytes()?))
    }

    #[inline]
    pub fn read_tag(&mut self) -> Result<Tag, IncrFontErr> {
        Ok(Tag::new(&self.read_n_bytes::<4>()?))
    }

    pub fn read_bytes(&mut self, n_bytes: usize) -> Result<&[u8], IncrFontErr> {
        let start = self.checked_start(n_bytes)?;
        self.offset += n_bytes;
        Ok(&self.data.as_ref()[start..start + n_bytes])
    }

    /// Read `count` consecutive values with `getter`.
    pub fn read_array<T>(
        &mut self,
        count: usize,
        mut getter: impl FnMut(&mut Self) -> Result<T, IncrFontErr>,
    ) -> Result<Vec<T>, IncrFontErr> {
        let mut values = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            values.push(getter(self)?);
        }
        Ok(values)
    }

    /// Read a big-endian offset that is `size` bytes wide.
    pub fn read_offset(&mut self, size: OffsetSize) -> Result<u32, IncrFontErr> {
        match size {
            OffsetSize::One => Ok(self.read_u8()? as u32),
            OffsetSize::Two => Ok(self.read_u16()? as u32),
            OffsetSize::Three => self.read_u24(),
            OffsetSize::Four => self.read_u32(),
        }
    }

    /// Read entry `gid` of a loca / charstrings offset array starting at `table_start`.
    pub fn read_glyph_offset(
        &mut self,
        table_start: u32,
        size: OffsetSize,
        gid: u32,
    ) -> Result<u32, IncrFontErr> {
        self.seek(table_start as usize + gid as usize * size.byte_len());
        self.read_offset(size)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ByteCursor<B> {
    #[inline(always)]
    fn write_n_bytes<const N: usize>(&mut self, bytes: [u8; N]) -> Result<(), IncrFontErr> {
        let start = self.checked_start(N)?;
        self.data.as_mut()[start..start + N].copy_from_slice(&bytes);
        self.offset += N;
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<(), IncrFontErr> {
        self.write_n_bytes([value])
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<(), IncrFontErr> {
        self.write_n_bytes(value.to_be_bytes())
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) -> Result<(), IncrFontErr> {
        self.write_n_bytes(value.to_be_bytes())
    }

    #[inline]
    pub fn write_u24(&mut self, value: u32) -> Result<(), IncrFontErr> {
        let [_, b1, b2, b3] = value.to_be_bytes();
        self.write_n_bytes([b1, b2, b3])
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<(), IncrFontErr> {
        self.write_n_bytes(value.to_be_bytes())
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) -> Result<(), IncrFontErr> {
        self.write_n_bytes(value.to_be_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), IncrFontErr> {
        let start = self.checked_start(bytes.len())?;
        self.data.as_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
        Ok(())
    }

    /// Write every value of `values` with `setter`.
    pub fn write_array<T: Copy>(
        &mut self,
        values: &[T],
        mut setter: impl FnMut(&mut Self, T) -> Result<(), IncrFontErr>,
    ) -> Result<(), IncrFontErr> {
        for value in values {
            setter(self, *value)?;
        }
        Ok(())
    }

    pub fn write_offset(&mut self, size: OffsetSize, value: u32) -> Result<(), IncrFontErr> {
        match size {
            OffsetSize::One => self.write_u8(value as u8),
            OffsetSize::Two => self.write_u16(value as u16),
            OffsetSize::Three => self.write_u24(value),
            OffsetSize::Four => self.write_u32(value),
        }
    }

    pub fn write_glyph_offset(
        &mut self,
        table_start: u32,
        size: OffsetSize,
        gid: u32,
        value: u32,
    ) -> Result<(), IncrFontErr> {
        self.seek(table_start as usize + gid as usize * size.byte_len());
        self.write_offset(size, value)
    }

    /// Set the side bearing of `gid` in an hmtx / vmtx table starting at `table_start`.
    ///
    /// The first `metric_count` glyphs have a full 4 byte metric record with the
    /// side bearing in its second half, the remaining glyphs only have a 2 byte
    /// side bearing stored after those records.
    pub fn write_side_bearing(
        &mut self,
        table_start: u32,
        metric_count: u16,
        gid: u16,
        value: i16,
    ) -> Result<(), IncrFontErr> {
        let table_start = table_start as usize;
        let (gid, metric_count) = (gid as usize, metric_count as usize);
        if gid < metric_count {
            self.seek(table_start + gid * 4 + 2);
        } else {
            self.seek(table_start + 2 * gid + 2 * metric_count);
        }
        self.write_i16(value)
    }
}
