use std::io::Write;

use brotli::{BrotliDecompressStream, BrotliResult, BrotliState, HeapAlloc, HuffmanCode};
use emaildb_core::codec::{CompressionAlgorithm, CompressionProvider};
use emaildb_core::error::{Error, Result};

const BUFFER_SIZE: usize = 4096;

/// Brotli provider.
///
/// Best ratio of the bundled providers on text, at a noticeably higher
/// compression cost than zstd.
///
/// Best for: cold archive blocks written once and rarely read.
#[derive(Debug, Clone, Copy)]
pub struct BrotliProvider {
    /// 0 (fast) to 11 (smallest).
    pub quality: u32,
    /// Window size as log2 bytes, 10 to 24.
    pub lgwin: u32,
}

impl Default for BrotliProvider {
    fn default() -> Self {
        Self {
            quality: 5,
            lgwin: 22,
        }
    }
}

impl BrotliProvider {
    pub fn new(quality: u32, lgwin: u32) -> Self {
        Self {
            quality: quality.min(11),
            lgwin: lgwin.clamp(10, 24),
        }
    }
}

impl CompressionProvider for BrotliProvider {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::Brotli
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut writer =
            brotli::CompressorWriter::new(Vec::new(), BUFFER_SIZE, self.quality, self.lgwin);
        writer.write_all(data).map_err(|source| Error::Encoder {
            algorithm: CompressionAlgorithm::Brotli,
            source,
        })?;
        // into_inner finishes the stream
        Ok(writer.into_inner())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decompress_bounded(data, usize::MAX)
    }

    /// Drives the decoder directly over `data` so that leftover input after
    /// the final meta-block can be seen and rejected.
    fn decompress_bounded(&self, data: &[u8], max_len: usize) -> Result<Vec<u8>> {
        let corrupt = |reason: &str| Error::corrupt_payload(CompressionAlgorithm::Brotli, reason);
        if data.is_empty() {
            return Err(corrupt("empty input is not a brotli stream"));
        }

        let mut state = BrotliState::new(
            HeapAlloc::<u8>::default(),
            HeapAlloc::<u32>::default(),
            HeapAlloc::<HuffmanCode>::default(),
        );
        let mut available_in = data.len();
        let mut input_offset = 0;
        let mut total_out = 0;
        let mut chunk = [0u8; BUFFER_SIZE];
        let mut raw = Vec::new();

        loop {
            let mut available_out = chunk.len();
            let mut output_offset = 0;
            let result = BrotliDecompressStream(
                &mut available_in,
                &mut input_offset,
                data,
                &mut available_out,
                &mut output_offset,
                &mut chunk,
                &mut total_out,
                &mut state,
            );
            if raw.len().saturating_add(output_offset) > max_len {
                return Err(Error::output_limit(CompressionAlgorithm::Brotli, max_len));
            }
            raw.extend_from_slice(&chunk[..output_offset]);

            match result {
                BrotliResult::ResultSuccess => break,
                BrotliResult::NeedsMoreOutput => continue,
                BrotliResult::NeedsMoreInput => return Err(corrupt("stream ends before its last meta-block")),
                BrotliResult::ResultFailure => return Err(corrupt("malformed stream")),
            }
        }

        if available_in != 0 {
            return Err(Error::corrupt_payload(
                CompressionAlgorithm::Brotli,
                format!("{available_in} trailing bytes after brotli stream"),
            ));
        }
        Ok(raw)
    }
}
