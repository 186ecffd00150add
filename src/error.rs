//! Error types for block decoding and filter application.
//!
//! This module provides [`DecompressError`], returned by the block dispatcher,
//! the bit reader, the window and sub-decoders, and [`FilterError`], returned
//! by the filter engine for malformed filter parameters.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Truncation | [`DecoderOutOfData`], [`UnexpectedEof`] | Input ended where more data was required |
//! | Initialization | [`DecoderInit`] | A sub-decoder rejected its block header |
//! | Configuration | [`InvalidWindowSize`] | Window size is not a nonzero power of two |
//! | Corrupt data | [`InvalidData`], [`InvalidBackReference`] | Malformed entropy-coded data |
//! | Filters | [`Filter`] | Malformed filter parameters |
//! | I/O | [`Io`] | The byte source failed |
//!
//! A cleanly finished stream is not an error: [`Rar29Decoder::fill`] reports it
//! as [`FillStatus::EndOfStream`].
//!
//! [`DecoderOutOfData`]: DecompressError::DecoderOutOfData
//! [`UnexpectedEof`]: DecompressError::UnexpectedEof
//! [`DecoderInit`]: DecompressError::DecoderInit
//! [`InvalidWindowSize`]: DecompressError::InvalidWindowSize
//! [`InvalidData`]: DecompressError::InvalidData
//! [`InvalidBackReference`]: DecompressError::InvalidBackReference
//! [`Filter`]: DecompressError::Filter
//! [`Io`]: DecompressError::Io
//! [`Rar29Decoder::fill`]: crate::Rar29Decoder::fill
//! [`FillStatus::EndOfStream`]: crate::FillStatus::EndOfStream

use std::io;

use thiserror::Error;

use crate::decompress::BlockMethod;

/// Decompression errors.
#[derive(Debug, Error)]
pub enum DecompressError {
    /// The bit source ran dry while a sub-decoder or the bit reader still
    /// needed data.
    ///
    /// Sub-decoders return this freely; the block dispatcher never lets it
    /// escape and reports [`DecoderOutOfData`](Self::DecoderOutOfData) instead.
    #[error("unexpected end of compressed data")]
    UnexpectedEof,

    /// A block header or a block body was expected but the input ended.
    ///
    /// This indicates a truncated or incomplete archive.
    #[error("decoder ran out of data")]
    DecoderOutOfData,

    /// The sub-decoder selected by a block header failed to initialize.
    #[error("failed to initialize {method} decoder")]
    DecoderInit {
        /// Decoder selected by the header bit.
        method: BlockMethod,
        /// Error returned by the decoder's `init`.
        #[source]
        source: Box<DecompressError>,
    },

    /// [`fill`](crate::Rar29Decoder::fill) was called before
    /// [`init`](crate::Rar29Decoder::init) selected a decoder.
    #[error("decoder used before a block header was read")]
    NotInitialized,

    /// Window size is zero or not a power of two.
    #[error("invalid window size: {0} (must be a nonzero power of two)")]
    InvalidWindowSize(usize),

    /// Malformed entropy-coded data reported by a sub-decoder.
    #[error("invalid compressed data: {0}")]
    InvalidData(&'static str),

    /// A match referenced bytes that were never written to the window.
    #[error("invalid back reference: distance {distance} exceeds {written} bytes written")]
    InvalidBackReference {
        /// Requested match distance.
        distance: u32,
        /// Bytes written to the window so far.
        written: u64,
    },

    /// Malformed filter parameters.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The underlying byte source failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DecompressError {
    /// Whether this error means the input was cut short.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEof | Self::DecoderOutOfData)
    }
}

impl From<DecompressError> for io::Error {
    fn from(e: DecompressError) -> Self {
        match e {
            DecompressError::Io(e) => e,
            e if e.is_truncation() => io::Error::new(io::ErrorKind::UnexpectedEof, e),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

/// Filter parameter errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Delta plane count outside `1..=MAX_DELTA_CHANNELS`.
    #[error("invalid delta channel count: {0}")]
    InvalidChannels(usize),

    /// Filter block longer than the allowed maximum.
    #[error("filter block too large: {length} bytes (max {max})")]
    BlockTooLarge {
        /// Requested block length.
        length: usize,
        /// Largest block that can be filtered.
        max: usize,
    },

    /// Buffer length does not match the filter block length.
    #[error("filter buffer length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Length the filter expects.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A filter starts before bytes that were already handed to the caller.
    #[error("filter at offset {offset} starts before read position {read}")]
    OutOfOrder {
        /// Absolute filter start.
        offset: u64,
        /// Absolute read position of the output.
        read: u64,
    },

    /// Filter region extends past the end of the addressable stream.
    #[error("filter region {offset}+{length} overflows the stream position")]
    RegionOverflow {
        /// Absolute region start.
        offset: u64,
        /// Region length.
        length: usize,
    },

    /// A filter region is not held unread in the window.
    #[error("filter region {start}+{length} is outside the window")]
    OutOfWindow {
        /// Absolute region start.
        start: u64,
        /// Region length.
        length: usize,
    },
}

/// Result alias for decoding operations.
pub type Result<T> = std::result::Result<T, DecompressError>;
