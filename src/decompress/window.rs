//! Sliding output window.
//!
//! The window is both the output buffer that sub-decoders append to and the
//! LZ dictionary that back references copy from. Written bytes stay "pending"
//! until the caller reads them out; [`Window::available`] only counts space
//! that does not overwrite pending bytes. Filters never write back into the
//! window: later matches must see the unfiltered bytes.

use crate::error::{DecompressError, FilterError, Result};

/// Window size for RAR29 (4MB).
pub const WINDOW_SIZE_29: usize = 0x400000;

/// Circular output buffer with read/write accounting.
pub struct Window {
    /// Sliding window buffer
    buf: Vec<u8>,
    /// Window size mask for wrap-around
    mask: usize,
    /// Current write position in window
    pos: usize,
    /// Total bytes written
    total_written: u64,
    /// Total bytes handed to the caller
    total_read: u64,
}

impl Window {
    /// Create a new window of `size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size` is not a nonzero power of two. Use
    /// [`try_new`](Self::try_new) for sizes from untrusted input.
    pub fn new(size: usize) -> Self {
        match Self::try_new(size) {
            Ok(window) => window,
            Err(e) => panic!("{}", e),
        }
    }

    /// Create a new window, rejecting sizes that are not a nonzero power of two.
    pub fn try_new(size: usize) -> Result<Self> {
        if !size.is_power_of_two() {
            return Err(DecompressError::InvalidWindowSize(size));
        }
        Ok(Self {
            buf: vec![0; size],
            mask: size - 1,
            pos: 0,
            total_written: 0,
            total_read: 0,
        })
    }

    /// Reset the window for an unrelated stream, avoiding reallocation.
    /// Window contents are not cleared; reads are validated against `total_written`.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.total_written = 0;
        self.total_read = 0;
    }

    /// Window capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written but not yet read.
    #[inline]
    pub fn pending(&self) -> usize {
        (self.total_written - self.total_read) as usize
    }

    /// Bytes that can be written before pending output would be overwritten.
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity().saturating_sub(self.pending())
    }

    /// Write a literal byte to the output.
    #[inline]
    pub fn write_literal(&mut self, byte: u8) {
        debug_assert!(self.available() > 0);
        self.buf[self.pos] = byte;
        self.pos = (self.pos + 1) & self.mask;
        self.total_written += 1;
    }

    /// Write a run of literal bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.available());
        for &b in bytes {
            self.buf[self.pos] = b;
            self.pos = (self.pos + 1) & self.mask;
        }
        self.total_written += bytes.len() as u64;
    }

    /// Copy bytes from a previous position in the window.
    #[inline]
    pub fn copy_match(&mut self, distance: u32, length: u32) -> Result<()> {
        if distance == 0 || distance as u64 > self.total_written || distance as usize > self.buf.len() {
            return Err(DecompressError::InvalidBackReference {
                distance,
                written: self.total_written,
            });
        }
        debug_assert!(length as usize <= self.available());

        let len = length as usize;
        let dist = distance as usize;

        // Fast path: no wrap and no overlap
        if dist >= len && self.pos + len <= self.buf.len() && self.pos >= dist {
            let src_start = self.pos - dist;
            self.buf.copy_within(src_start..src_start + len, self.pos);
            self.pos = (self.pos + len) & self.mask;
            self.total_written += length as u64;
            return Ok(());
        }

        let src_pos = self.pos.wrapping_sub(dist) & self.mask;
        for i in 0..len {
            let byte = self.buf[(src_pos + i) & self.mask];
            self.buf[self.pos] = byte;
            self.pos = (self.pos + 1) & self.mask;
        }

        self.total_written += length as u64;
        Ok(())
    }

    /// Get total bytes written.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Get total bytes read out.
    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    /// Index in `buf` of absolute stream position `abs`.
    /// Callers must ensure `abs` is still held in the window.
    #[inline]
    fn index_of(&self, abs: u64) -> usize {
        let back = (self.total_written - abs) as usize;
        self.pos.wrapping_sub(back) & self.mask
    }

    /// Move pending bytes into `out`, up to absolute position `limit`.
    /// Returns the number of bytes copied.
    pub fn read_to(&mut self, limit: u64, out: &mut [u8]) -> usize {
        let limit = limit.min(self.total_written);
        if limit <= self.total_read {
            return 0;
        }
        let n = ((limit - self.total_read) as usize).min(out.len());
        let start = self.index_of(self.total_read);
        let first = n.min(self.buf.len() - start);
        out[..first].copy_from_slice(&self.buf[start..start + first]);
        out[first..n].copy_from_slice(&self.buf[..n - first]);
        self.total_read += n as u64;
        n
    }

    /// Validate that `[start, start + len)` is written and still unread.
    fn check_region(&self, start: u64, len: usize) -> Result<()> {
        let end = start.checked_add(len as u64);
        if start < self.total_read || end.is_none_or(|end| end > self.total_written) {
            return Err(FilterError::OutOfWindow { start, length: len }.into());
        }
        Ok(())
    }

    /// Copy out the unread region `[start, start + len)`.
    pub fn region(&self, start: u64, len: usize) -> Result<Vec<u8>> {
        self.check_region(start, len)?;
        let idx = self.index_of(start);
        let mut output = Vec::with_capacity(len);
        let first = len.min(self.buf.len() - idx);
        output.extend_from_slice(&self.buf[idx..idx + first]);
        output.extend_from_slice(&self.buf[..len - first]);
        Ok(output)
    }

    /// Mark up to `len` pending bytes as read without copying them.
    pub fn consume(&mut self, len: usize) -> usize {
        let n = len.min(self.pending());
        self.total_read += n as u64;
        n
    }

    /// Get the most recent `len` bytes from the window.
    pub fn get_recent(&self, len: usize) -> Vec<u8> {
        let actual_len = len.min(self.total_written as usize).min(self.buf.len());
        let start = self.pos.wrapping_sub(actual_len) & self.mask;
        (0..actual_len)
            .map(|i| self.buf[(start + i) & self.mask])
            .collect()
    }
}
