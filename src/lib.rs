//! RAR 2.9 block decoding core.
//!
//! Drives the LZ and PPMd sub-decoders of RAR 2.9-4.x compressed streams
//! across block and file boundaries, and undoes the compressor's filters
//! (x86 E8/E8E9, delta, ARM) on the decoded output.
//!
//! The entropy decoders themselves plug in through [`SubDecoder`]; archive
//! parsing (headers, volumes, CRCs, encryption) is left to the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rar_unpack::{Unpacker, WINDOW_SIZE_29};
//!
//! // `Lz` and `Ppm` implement `SubDecoder`
//! let mut unpacker = Unpacker::new(Lz::new(), Ppm::new(), WINDOW_SIZE_29)?;
//! unpacker.start(compressed_data, true)?;
//! let data = unpacker.decompress_to_vec()?;
//! ```
//!
//! ## Logging
//!
//! Block boundaries and filter applications are reported through the `log`
//! facade at `debug` and `trace` level; truncation is reported at `warn`.

pub mod decompress;
pub mod error;

pub use error::{DecompressError, FilterError};

pub use decompress::filter::{
    filter_arm, filter_delta, filter_delta_into, filter_e8, MAX_DELTA_CHANNELS,
    MAX_FILTER_BLOCK_SIZE,
};
pub use decompress::{
    BitReader, BlockMethod, Fill, FillStatus, FilterBlock, FilterKind, Rar29Decoder, Step,
    SubDecoder, Unpacker, Window, WINDOW_SIZE_29,
};
