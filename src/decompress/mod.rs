//! RAR 2.9 block decoding and filters.
//!
//! This module provides the block dispatcher that drives the LZ and PPMd
//! sub-decoders of RAR 2.9-4.x streams, and the filters that undo the
//! compressor's preprocessing of executable and multimedia data.
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | [`BitReader`] | MSB-first bit access to the compressed stream |
//! | [`Window`] | Sliding output window / LZ dictionary |
//! | [`SubDecoder`] | Contract implemented by the LZ and PPMd block decoders |
//! | [`Rar29Decoder`] | Block header and end-of-block/file state machine |
//! | [`filter`] | E8/E8E9, delta and ARM inverse transforms |
//! | [`Unpacker`] | Drives the decoder, applies filters, implements `Read` |
//!
//! ## Filter Support
//!
//! | Filter | Description |
//! |--------|-------------|
//! | E8/E8E9 | x86 CALL/JMP absolute-to-relative address conversion |
//! | Delta | Byte-plane delta (audio, images, tables) |
//! | ARM | ARM `BL` branch offset conversion |
//!
//! ## Architecture
//!
//! ```text
//! Compressed Data
//!       ↓
//! ┌─────────────┐
//! │ BitReader   │ ← Bit-level access to compressed stream
//! └─────────────┘
//!       ↓
//! ┌─────────────┐
//! │ Rar29Decoder│ ← Block header bit picks LZ or PPMd per block
//! └─────────────┘
//!       ↓
//! ┌─────────────┐
//! │ Window      │ ← Decoded bytes + pending FilterBlocks
//! └─────────────┘
//!       ↓
//! ┌─────────────┐
//! │ Filters     │ ← Apply inverse preprocessing (E8, Delta, ARM)
//! └─────────────┘
//!       ↓
//! Decompressed Data
//! ```

use std::fmt;

mod bit_reader;
pub mod filter;
mod rar29;
mod stream;
mod window;


pub use bit_reader::BitReader;
pub use filter::{FilterBlock, FilterKind};
pub use rar29::{Fill, FillStatus, Rar29Decoder, Step, SubDecoder};
pub use stream::Unpacker;
pub use window::{Window, WINDOW_SIZE_29};

/// Entropy coder selected by a block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMethod {
    /// LZ77 + Huffman
    Lz,
    /// PPMd, variant H
    Ppm,
}

impl fmt::Display for BlockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lz => write!(f, "LZ"),
            Self::Ppm => write!(f, "PPM"),
        }
    }
}
