//! RAR 2.9 (RAR3/RAR4) block dispatcher.
//!
//! Compressed input is a sequence of blocks. Each block starts on a byte
//! boundary with a single bit that picks the entropy decoder for that block
//! (1 = PPMd, 0 = LZ). Block length is not stored: a block ends when its
//! decoder reports an end-of-block and/or end-of-file marker.

use std::io::Read;

use log::{debug, warn};

use super::{BitReader, BlockMethod, FilterBlock, Window};
use crate::error::{DecompressError, Result};

/// Outcome of a single decode step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// More data follows in the current block.
    Continue,
    /// A filter was decoded; its region is (or will be) written to the window.
    Filter(FilterBlock),
    /// The current block is exhausted; a new block header follows.
    EndOfBlock,
    /// The file is complete; decoder state carries over to the next file.
    EndOfFile,
    /// Block and file are complete; the next file starts with a fresh header.
    EndOfBlockAndFile,
}

/// Entropy decoder for one block type.
///
/// Implemented by the LZ and PPMd decoders. `decode` performs a single decode
/// operation: it either writes to the window or surfaces a filter. After
/// returning anything other than [`Step::Continue`] or [`Step::Filter`] it must
/// leave the window untouched.
pub trait SubDecoder {
    /// Drop all state (tables, model, history).
    fn reset(&mut self);

    /// Read this decoder's block header from the current bit position.
    fn init<R: Read>(&mut self, reader: &mut BitReader<R>) -> Result<()>;

    /// Perform one decode step. Return [`DecompressError::UnexpectedEof`]
    /// if the input ends mid-block.
    fn decode<R: Read>(&mut self, reader: &mut BitReader<R>, window: &mut Window) -> Result<Step>;
}

/// Why [`Rar29Decoder::fill`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStatus {
    /// The window has no space left; drain it and call `fill` again.
    WindowFull,
    /// The file is complete. No more data until the next `init`.
    EndOfStream,
}

/// Result of one [`Rar29Decoder::fill`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// Filters decoded during this call, in stream order.
    pub filters: Vec<FilterBlock>,
    /// Why the call returned.
    pub status: FillStatus,
}

impl Fill {
    /// Whether the stream is finished.
    pub fn is_end_of_stream(&self) -> bool {
        self.status == FillStatus::EndOfStream
    }
}

/// RAR 2.9 decoder state.
///
/// Owns the bit reader, both sub-decoders and the block/file boundary state.
/// The window is owned by the caller and passed to every [`fill`](Self::fill).
pub struct Rar29Decoder<R, L, P> {
    reader: Option<BitReader<R>>,
    /// At end of file
    eof: bool,
    /// Decoder for the current block, `None` until a header is read
    active: Option<BlockMethod>,
    lz: L,
    ppm: P,
}

impl<R: Read, L: SubDecoder, P: SubDecoder> Rar29Decoder<R, L, P> {
    /// Create a new decoder from its two block decoders.
    pub fn new(lz: L, ppm: P) -> Self {
        Self {
            reader: None,
            eof: false,
            active: None,
            lz,
            ppm,
        }
    }

    /// Start decoding a new file from `source`.
    ///
    /// With `reset` both sub-decoders are cleared and a block header is read
    /// (new volume or independent file). Without it, decoding continues with
    /// the current decoder (solid continuation), reading a header only if the
    /// previous file ended together with its block.
    pub fn init(&mut self, source: R, reset: bool) -> Result<()> {
        match self.reader.as_mut() {
            Some(reader) => reader.reset(source),
            None => self.reader = Some(BitReader::new(source)),
        }
        self.eof = false;
        if reset {
            self.lz.reset();
            self.ppm.reset();
            self.active = None;
        }
        if self.active.is_none() {
            return self.read_block_header();
        }
        Ok(())
    }

    /// Select and initialize the decoder for the next block.
    fn read_block_header(&mut self) -> Result<()> {
        self.active = None;
        let reader = self.reader.as_mut().ok_or(DecompressError::NotInitialized)?;
        reader.align_to_byte();

        let method = match reader.read_bit() {
            Ok(true) => BlockMethod::Ppm,
            Ok(false) => BlockMethod::Lz,
            Err(e) => return Err(out_of_data(e)),
        };
        debug!(
            "block header at bit {}: {} block",
            reader.bit_position(),
            method
        );

        let result = match method {
            BlockMethod::Lz => self.lz.init(reader),
            BlockMethod::Ppm => self.ppm.init(reader),
        };
        match result {
            Ok(()) => {
                self.active = Some(method);
                Ok(())
            }
            Err(e) if e.is_truncation() => Err(out_of_data(e)),
            Err(e) => Err(DecompressError::DecoderInit {
                method,
                source: Box::new(e),
            }),
        }
    }

    /// Decode into `window` until it is full or the file ends.
    ///
    /// Once the file has ended every call returns [`FillStatus::EndOfStream`]
    /// without touching the input, until the next [`init`](Self::init).
    pub fn fill(&mut self, window: &mut Window) -> Result<Fill> {
        let mut filters = Vec::new();
        if self.eof {
            return Ok(Fill {
                filters,
                status: FillStatus::EndOfStream,
            });
        }

        while window.available() > 0 {
            let method = self.active.ok_or(DecompressError::NotInitialized)?;
            let reader = self.reader.as_mut().ok_or(DecompressError::NotInitialized)?;

            let step = match method {
                BlockMethod::Lz => self.lz.decode(reader, window),
                BlockMethod::Ppm => self.ppm.decode(reader, window),
            };

            match step {
                Ok(Step::Continue) => {}
                Ok(Step::Filter(filter)) => filters.push(filter),
                Ok(Step::EndOfBlock) => self.read_block_header()?,
                Ok(Step::EndOfFile) => {
                    debug!("end of file after {} bytes", window.total_written());
                    self.eof = true;
                    return Ok(Fill {
                        filters,
                        status: FillStatus::EndOfStream,
                    });
                }
                Ok(Step::EndOfBlockAndFile) => {
                    debug!("end of block and file after {} bytes", window.total_written());
                    self.eof = true;
                    // next init() reads a fresh block header
                    self.active = None;
                    return Ok(Fill {
                        filters,
                        status: FillStatus::EndOfStream,
                    });
                }
                Err(e) if e.is_truncation() => return Err(out_of_data(e)),
                Err(e) => return Err(e),
            }
        }

        Ok(Fill {
            filters,
            status: FillStatus::WindowFull,
        })
    }

    /// Whether the current file has ended.
    pub fn is_end_of_stream(&self) -> bool {
        self.eof
    }

    /// Decoder selected by the last block header.
    pub fn active_method(&self) -> Option<BlockMethod> {
        self.active
    }

    /// The LZ block decoder.
    pub fn lz(&self) -> &L {
        &self.lz
    }

    /// The PPMd block decoder.
    pub fn ppm(&self) -> &P {
        &self.ppm
    }
}

impl<R: Read, L: SubDecoder + Default, P: SubDecoder + Default> Default for Rar29Decoder<R, L, P> {
    fn default() -> Self {
        Self::new(L::default(), P::default())
    }
}

/// Map end of input where data was still expected to a truncation error.
fn out_of_data(e: DecompressError) -> DecompressError {
    if e.is_truncation() {
        warn!("compressed data truncated: {}", e);
        DecompressError::DecoderOutOfData
    } else {
        e
    }
}
