use emaildb_core::codec::{CompressionAlgorithm, CompressionProvider};
use emaildb_core::error::{Error, Result};
use zstd::stream::read::Decoder;

use crate::read_bounded;

/// Zstandard provider.
///
/// Each payload is one zstd frame at the configured level (default: 3). The
/// frame records its content size, so decode needs no size hint.
///
/// Best for: general text, mailbox indexes, mixed structured data.
#[derive(Debug, Clone, Copy)]
pub struct ZstdProvider {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdProvider {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl ZstdProvider {
    pub fn new(level: i32) -> Self {
        let range = zstd::compression_level_range();
        Self {
            level: level.clamp(*range.start(), *range.end()),
        }
    }
}

impl CompressionProvider for ZstdProvider {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::Zstd
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        zstd::bulk::compress(data, self.level).map_err(|source| Error::Encoder {
            algorithm: CompressionAlgorithm::Zstd,
            source,
        })
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decompress_bounded(data, usize::MAX)
    }

    fn decompress_bounded(&self, data: &[u8], max_len: usize) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(Error::corrupt_payload(
                CompressionAlgorithm::Zstd,
                "empty input is not a zstd frame",
            ));
        }
        let decoder =
            Decoder::with_buffer(data).map_err(|e| Error::corrupt_payload(CompressionAlgorithm::Zstd, e))?;
        read_bounded(decoder, CompressionAlgorithm::Zstd, max_len)
    }
}
