//! Post-decode filters.
//!
//! The compressor may run executable or multimedia data through a reversible
//! transform before entropy coding. Sub-decoders report such regions as
//! [`FilterBlock`]s; once a region is fully decoded the caller runs it through
//! [`FilterBlock::apply`] (or one of the transforms directly) before using it.
//!
//! Every transform is pure: the result depends only on the buffer, its
//! absolute offset in the decompressed stream and the filter parameters.

use log::trace;

use crate::error::FilterError;

/// Maximum filter block size (4MB).
pub const MAX_FILTER_BLOCK_SIZE: usize = 0x400000;

/// Maximum number of delta planes.
pub const MAX_DELTA_CHANNELS: usize = 1024;

/// Address space modulus used by the x86 filter (16MB).
const FILE_SIZE: i32 = 0x1000000;

/// ARM `BL` instruction byte.
const ARM_BL: u8 = 0xEB;

/// Filter transform and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// x86 CALL/JMP relocation.
    ///
    /// Bytes equal to `0xE8` or `opcode` mark a 32-bit address. `rar5`
    /// wraps the running offset into the 16MB address space first.
    E8 { opcode: u8, rar5: bool },
    /// Byte-plane delta with `channels` interleaved planes.
    Delta { channels: usize },
    /// ARM `BL` branch offset patch.
    Arm,
}

impl FilterKind {
    /// x86 CALL filter (E8 only).
    pub fn e8() -> Self {
        FilterKind::E8 {
            opcode: 0xE8,
            rar5: false,
        }
    }

    /// x86 CALL/JMP filter (E8 and E9).
    pub fn e8e9() -> Self {
        FilterKind::E8 {
            opcode: 0xE9,
            rar5: false,
        }
    }

    /// Parse a RAR5 filter type code. `channels` is only used by delta.
    pub fn from_rar5_bits(bits: u8, channels: usize) -> Option<Self> {
        match bits {
            0 => Some(FilterKind::Delta { channels }),
            1 => Some(FilterKind::E8 {
                opcode: 0xE8,
                rar5: true,
            }),
            2 => Some(FilterKind::E8 {
                opcode: 0xE9,
                rar5: true,
            }),
            3 => Some(FilterKind::Arm),
            _ => None,
        }
    }
}

/// A pending filter over a region of the decompressed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBlock {
    kind: FilterKind,
    offset: u64,
    length: usize,
}

impl FilterBlock {
    /// Create a filter over `length` bytes starting at absolute `offset`.
    pub fn new(kind: FilterKind, offset: u64, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
        }
    }

    /// Filter transform.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Absolute start in the decompressed stream.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Length of the filtered region.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Absolute end (exclusive) in the decompressed stream.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length as u64)
    }

    /// Check block length and kind parameters without touching any data.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.length > MAX_FILTER_BLOCK_SIZE {
            return Err(FilterError::BlockTooLarge {
                length: self.length,
                max: MAX_FILTER_BLOCK_SIZE,
            });
        }
        if self.offset.checked_add(self.length as u64).is_none() {
            return Err(FilterError::RegionOverflow {
                offset: self.offset,
                length: self.length,
            });
        }
        if let FilterKind::Delta { channels } = self.kind {
            check_channels(channels)?;
        }
        Ok(())
    }

    /// Run the filter over `buf`, the decoded bytes of this block.
    ///
    /// E8 and ARM work in place; delta returns a freshly allocated buffer.
    pub fn apply(&self, mut buf: Vec<u8>) -> Result<Vec<u8>, FilterError> {
        self.validate()?;
        if buf.len() != self.length {
            return Err(FilterError::LengthMismatch {
                expected: self.length,
                actual: buf.len(),
            });
        }
        trace!(
            "applying {:?} filter at {} ({} bytes)",
            self.kind,
            self.offset,
            self.length
        );

        let offset = self.offset as i64;
        match self.kind {
            FilterKind::E8 { opcode, rar5 } => {
                filter_e8(&mut buf, offset, opcode, rar5);
                Ok(buf)
            }
            FilterKind::Delta { channels } => filter_delta(&buf, channels),
            FilterKind::Arm => {
                filter_arm(&mut buf, offset);
                Ok(buf)
            }
        }
    }
}

fn check_channels(channels: usize) -> Result<(), FilterError> {
    if channels == 0 || channels > MAX_DELTA_CHANNELS {
        return Err(FilterError::InvalidChannels(channels));
    }
    Ok(())
}

/// Undo the x86 CALL/JMP transform in place.
///
/// `offset` is the absolute position of `buf[0]`. Each byte equal to `0xE8`
/// or `opcode` is followed by a 32-bit little-endian address that the
/// compressor made absolute; it is turned back into a relative displacement.
/// Addresses outside the 16MB space are left alone.
pub fn filter_e8(buf: &mut [u8], offset: i64, opcode: u8, rar5: bool) {
    let mut off = offset as i32;
    let mut pos = 0;

    while buf.len() - pos >= 5 {
        let ch = buf[pos];
        pos += 1;
        off = off.wrapping_add(1);
        if ch != 0xE8 && ch != opcode {
            continue;
        }
        if rar5 {
            off %= FILE_SIZE;
        }

        let addr = i32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]);
        if addr < 0 {
            if addr.wrapping_add(off) >= 0 {
                buf[pos..pos + 4].copy_from_slice(&(addr + FILE_SIZE).to_le_bytes());
            }
        } else if addr < FILE_SIZE {
            buf[pos..pos + 4].copy_from_slice(&addr.wrapping_sub(off).to_le_bytes());
        }

        off = off.wrapping_add(4);
        pos += 4;
    }
}

/// Undo the byte-plane delta transform into a new buffer.
///
/// `buf` holds `channels` delta-coded planes one after another; the result
/// interleaves them back.
pub fn filter_delta(buf: &[u8], channels: usize) -> Result<Vec<u8>, FilterError> {
    let mut output = vec![0u8; buf.len()];
    filter_delta_into(buf, &mut output, channels)?;
    Ok(output)
}

/// Undo the byte-plane delta transform into a caller-owned buffer.
///
/// `dst` must be exactly as long as `src`. The two can never alias, so a
/// caller may keep reusing one scratch buffer across blocks.
pub fn filter_delta_into(src: &[u8], dst: &mut [u8], channels: usize) -> Result<(), FilterError> {
    check_channels(channels)?;
    if dst.len() != src.len() {
        return Err(FilterError::LengthMismatch {
            expected: src.len(),
            actual: dst.len(),
        });
    }

    // Bytes of one plane are stored together; scatter them back to every
    // `channels`-th position.
    let mut src_pos = 0;
    for cur_channel in 0..channels {
        let mut prev_byte: u8 = 0;
        let mut dest_pos = cur_channel;
        while dest_pos < dst.len() {
            prev_byte = prev_byte.wrapping_sub(src[src_pos]);
            dst[dest_pos] = prev_byte;
            src_pos += 1;
            dest_pos += channels;
        }
    }
    Ok(())
}

/// Undo the ARM `BL` transform in place.
///
/// `offset` is the absolute position of `buf[0]`. Only the 24-bit offset field
/// of aligned words whose top byte is `0xEB` changes.
pub fn filter_arm(buf: &mut [u8], offset: i64) {
    let base = offset as u64;
    let mut cur_pos = 0;

    while buf.len() - cur_pos > 3 {
        if buf[cur_pos + 3] == ARM_BL {
            let field = u32::from_le_bytes([buf[cur_pos], buf[cur_pos + 1], buf[cur_pos + 2], 0]);
            let shift = (base.wrapping_add(cur_pos as u64) / 4) as u32;
            let new_field = field.wrapping_sub(shift);
            buf[cur_pos] = new_field as u8;
            buf[cur_pos + 1] = (new_field >> 8) as u8;
            buf[cur_pos + 2] = (new_field >> 16) as u8;
        }
        cur_pos += 4;
    }
}
