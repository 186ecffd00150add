//! Streaming decompressor.
//!
//! [`Unpacker`] pulls data through [`Rar29Decoder`], holds back bytes covered
//! by a pending filter until the whole region is decoded, runs the filter and
//! hands out the final bytes through [`std::io::Read`].

use std::collections::VecDeque;
use std::io::{self, Read};

use log::debug;

use super::{FilterBlock, Rar29Decoder, SubDecoder, Window};
use crate::error::{DecompressError, FilterError, Result};

/// Read adapter over a [`Rar29Decoder`] and its window.
///
/// Filter offsets are absolute positions in the output since the last
/// `start(.., true)`.
pub struct Unpacker<R, L, P> {
    decoder: Rar29Decoder<R, L, P>,
    window: Window,
    /// Filters waiting for their region, in stream order
    filters: VecDeque<FilterBlock>,
    /// Filtered bytes not yet handed out
    output: Vec<u8>,
    output_pos: usize,
    /// Decoder reported end of stream
    finished: bool,
}

impl<R: Read, L: SubDecoder, P: SubDecoder> Unpacker<R, L, P> {
    /// Create an unpacker with a window of `window_size` bytes.
    ///
    /// Fails with [`DecompressError::InvalidWindowSize`] unless the size is a
    /// nonzero power of two.
    pub fn new(lz: L, ppm: P, window_size: usize) -> Result<Self> {
        Ok(Self {
            decoder: Rar29Decoder::new(lz, ppm),
            window: Window::try_new(window_size)?,
            filters: VecDeque::new(),
            output: Vec::new(),
            output_pos: 0,
            finished: false,
        })
    }

    /// Start unpacking a file from `source`.
    ///
    /// `reset` starts an independent stream: window, pending filters and
    /// decoder state are dropped. Without it the file continues a solid
    /// stream and keeps the dictionary.
    pub fn start(&mut self, source: R, reset: bool) -> Result<()> {
        if reset {
            self.window.reset();
            self.filters.clear();
            self.output.clear();
            self.output_pos = 0;
        }
        self.finished = false;
        self.decoder.init(source, reset)
    }

    /// Decompress the rest of the current file into a vector.
    pub fn decompress_to_vec(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = vec![0u8; 0x10000];
        loop {
            let n = self.read_chunk(&mut chunk)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }

    /// The underlying block decoder.
    pub fn decoder(&self) -> &Rar29Decoder<R, L, P> {
        &self.decoder
    }

    /// Queue a filter reported by the decoder.
    fn queue_filter(&mut self, filter: FilterBlock) -> Result<()> {
        filter.validate()?;
        if filter.length() > self.window.capacity() {
            return Err(FilterError::BlockTooLarge {
                length: filter.length(),
                max: self.window.capacity(),
            }
            .into());
        }
        let min_start = self
            .filters
            .back()
            .map_or(self.window.total_read(), FilterBlock::end);
        if filter.offset() < min_start {
            return Err(FilterError::OutOfOrder {
                offset: filter.offset(),
                read: min_start,
            }
            .into());
        }
        self.filters.push_back(filter);
        Ok(())
    }

    /// Copy the next available bytes into `buf`. Returns 0 at end of file.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.output_pos < self.output.len() {
                let n = buf.len().min(self.output.len() - self.output_pos);
                buf[..n].copy_from_slice(&self.output[self.output_pos..self.output_pos + n]);
                self.output_pos += n;
                return Ok(n);
            }

            let read = self.window.total_read();
            let written = self.window.total_written();
            let next_filter = self.filters.front().map(|f| (f.offset(), f.end()));
            match next_filter {
                Some((start, end)) if start == read => {
                    if end <= written {
                        if let Some(filter) = self.filters.pop_front() {
                            let data = self.window.region(start, filter.length())?;
                            self.window.consume(filter.length());
                            self.output = filter.apply(data)?;
                            self.output_pos = 0;
                            continue;
                        }
                    }
                }
                Some((start, _)) => {
                    let n = self.window.read_to(start, buf);
                    if n > 0 {
                        return Ok(n);
                    }
                }
                None => {
                    let n = self.window.read_to(u64::MAX, buf);
                    if n > 0 {
                        return Ok(n);
                    }
                }
            }

            if self.finished {
                if let Some(filter) = self.filters.front() {
                    debug!(
                        "stream ended inside filter region {}..{}",
                        filter.offset(),
                        filter.end()
                    );
                    return Err(DecompressError::DecoderOutOfData);
                }
                return Ok(0);
            }

            let fill = self.decoder.fill(&mut self.window)?;
            self.finished = fill.is_end_of_stream();
            for filter in fill.filters {
                self.queue_filter(filter)?;
            }
        }
    }
}

impl<R: Read, L: SubDecoder, P: SubDecoder> Read for Unpacker<R, L, P> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf).map_err(io::Error::from)
    }
}
