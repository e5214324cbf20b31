use std::io::Write;

use emaildb_core::codec::{CompressionAlgorithm, CompressionProvider};
use emaildb_core::error::{Error, Result};
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::read_bounded;

/// Gzip (RFC 1952) provider backed by `flate2`.
///
/// Each payload is a single gzip member. The member trailer carries a CRC32
/// and the input size, so truncation and most bit flips are caught on decode.
///
/// Best for: message bodies and headers that other tools may need to read.
#[derive(Debug, Clone, Copy)]
pub struct GzipProvider {
    /// 0 (store) to 9 (smallest).
    pub level: u32,
}

impl Default for GzipProvider {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl GzipProvider {
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

impl CompressionProvider for GzipProvider {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::Gzip
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let encoder_err = |source| Error::Encoder {
            algorithm: CompressionAlgorithm::Gzip,
            source,
        };
        let mut encoder = GzEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(data).map_err(encoder_err)?;
        encoder.finish().map_err(encoder_err)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decompress_bounded(data, usize::MAX)
    }

    fn decompress_bounded(&self, data: &[u8], max_len: usize) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(Error::corrupt_payload(
                CompressionAlgorithm::Gzip,
                "empty input is not a gzip member",
            ));
        }
        let mut decoder = GzDecoder::new(data);
        let raw = read_bounded(&mut decoder, CompressionAlgorithm::Gzip, max_len)?;

        let rest = decoder.into_inner();
        if !rest.is_empty() {
            return Err(Error::corrupt_payload(
                CompressionAlgorithm::Gzip,
                format!("{} trailing bytes after gzip member", rest.len()),
            ));
        }
        Ok(raw)
    }
}
