//! Bit reader for compressed data streams.
//!
//! Reads bits MSB first from any [`Read`] source (RAR convention). Bytes are
//! pulled one at a time, so wrap unbuffered sources in a `BufReader`.

use std::io::{self, Read};

use crate::error::{DecompressError, Result};

/// Bit reader over a byte source.
pub struct BitReader<R> {
    inner: R,
    /// Current bit buffer, left aligned (up to 32 bits)
    buffer: u32,
    /// Bits available in buffer
    bits_in_buffer: u32,
    /// Bits consumed since the last reset
    bit_pos: u64,
}

impl<R: Read> BitReader<R> {
    /// Create a new bit reader over `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: 0,
            bits_in_buffer: 0,
            bit_pos: 0,
        }
    }

    /// Switch to a new source, dropping any buffered bits of the old one.
    pub fn reset(&mut self, inner: R) {
        self.inner = inner;
        self.buffer = 0;
        self.bits_in_buffer = 0;
        self.bit_pos = 0;
    }

    /// Pull one byte from the source. `None` at end of input.
    fn next_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Make sure at least `n` bits are buffered.
    fn fill_buffer(&mut self, n: u32) -> Result<()> {
        while self.bits_in_buffer < n {
            let byte = self.next_byte()?.ok_or(DecompressError::UnexpectedEof)?;
            self.buffer |= (byte as u32) << (24 - self.bits_in_buffer);
            self.bits_in_buffer += 8;
        }
        Ok(())
    }

    /// Peek at the next n bits without consuming them.
    #[inline]
    pub fn peek_bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n <= 16);
        if n == 0 {
            return Ok(0);
        }
        self.fill_buffer(n)?;
        Ok(self.buffer >> (32 - n))
    }

    /// Read n bits and advance the position.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        let value = self.peek_bits(n)?;
        self.advance_bits(n);
        Ok(value)
    }

    /// Advance by n already buffered bits.
    #[inline]
    fn advance_bits(&mut self, n: u32) {
        debug_assert!(n <= self.bits_in_buffer);
        if n == 0 {
            return;
        }
        self.buffer = if n >= 32 { 0 } else { self.buffer << n };
        self.bits_in_buffer -= n;
        self.bit_pos += n as u64;
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read a single byte (8 bits).
    #[inline]
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Align to byte boundary by skipping remaining bits in current byte.
    ///
    /// The skipped bits always belong to a byte that is already buffered.
    #[inline]
    pub fn align_to_byte(&mut self) {
        let bits_used_in_byte = (self.bit_pos % 8) as u32;
        if bits_used_in_byte > 0 {
            self.advance_bits(8 - bits_used_in_byte);
        }
    }

    /// Get the number of bits consumed since the last reset.
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }

    /// Check if no further bits can be read.
    pub fn is_eof(&mut self) -> Result<bool> {
        if self.bits_in_buffer > 0 {
            return Ok(false);
        }
        match self.fill_buffer(8) {
            Ok(()) => Ok(false),
            Err(DecompressError::UnexpectedEof) => Ok(true),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits() {
        let data = [0b10110100, 0b11001010];
        let mut reader = BitReader::new(&data[..]);

        assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
        assert_eq!(reader.read_bits(4).unwrap(), 0b0100);
        assert_eq!(reader.read_bits(8).unwrap(), 0b11001010);
    }

    #[test]
    fn test_peek_bits() {
        let data = [0b10110100];
        let mut reader = BitReader::new(&data[..]);

        assert_eq!(reader.peek_bits(4).unwrap(), 0b1011);
        assert_eq!(reader.peek_bits(8).unwrap(), 0b10110100);
        assert_eq!(reader.bit_position(), 0);
    }

    #[test]
    fn test_read_across_bytes() {
        let data = [0xAB, 0xCD, 0xEF];
        let mut reader = BitReader::new(&data[..]);

        assert_eq!(reader.read_bits(4).unwrap(), 0xA);
        assert_eq!(reader.read_bits(16).unwrap(), 0xBCDE);
        assert_eq!(reader.read_bits(4).unwrap(), 0xF);
    }

    #[test]
    fn test_align_to_byte() {
        let data = [0b1000_0000, 0b0100_0000];
        let mut reader = BitReader::new(&data[..]);

        assert!(reader.read_bit().unwrap());
        reader.align_to_byte();
        assert_eq!(reader.bit_position(), 8);
        assert!(!reader.read_bit().unwrap());
        assert!(reader.read_bit().unwrap());

        // Already aligned: no-op
        let mut reader = BitReader::new(&data[..]);
        reader.align_to_byte();
        assert_eq!(reader.bit_position(), 0);
    }

    #[test]
    fn test_eof() {
        let data = [0xFF];
        let mut reader = BitReader::new(&data[..]);

        assert!(!reader.is_eof().unwrap());
        reader.read_bits(8).unwrap();
        assert!(reader.is_eof().unwrap());
        assert!(matches!(
            reader.read_bit(),
            Err(DecompressError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_reset_drops_buffered_bits() {
        let first = [0xFF, 0xFF];
        let second = [0x00];
        let mut reader = BitReader::new(&first[..]);
        reader.read_bits(3).unwrap();

        reader.reset(&second[..]);
        assert_eq!(reader.bit_position(), 0);
        assert_eq!(reader.read_byte().unwrap(), 0x00);
        assert!(reader.is_eof().unwrap());
    }
}
