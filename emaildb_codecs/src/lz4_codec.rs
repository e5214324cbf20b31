use emaildb_core::codec::{CompressionAlgorithm, CompressionProvider};
use emaildb_core::error::{Error, Result};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

/// Upper bound on the LZ4 block expansion ratio. A size prefix claiming more
/// than this per input byte cannot be genuine.
const MAX_EXPANSION: usize = 255;

/// LZ4 block provider with a u32 LE uncompressed-size prefix.
///
/// Fastest decompression of all bundled providers. The block format has no
/// checksum of its own; integrity relies on the block header checksum.
///
/// Best for: hot metadata blocks read on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Provider;

impl CompressionProvider for Lz4Provider {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::Lz4
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(compress_prepend_size(data))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decompress_bounded(data, usize::MAX)
    }

    fn decompress_bounded(&self, data: &[u8], max_len: usize) -> Result<Vec<u8>> {
        let Some(prefix) = data.get(..4) else {
            return Err(Error::corrupt_payload(
                CompressionAlgorithm::Lz4,
                format!("{} bytes is too short for the size prefix", data.len()),
            ));
        };
        let claimed = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if claimed > max_len {
            return Err(Error::output_limit(CompressionAlgorithm::Lz4, max_len));
        }
        if claimed > (data.len() - 4).saturating_mul(MAX_EXPANSION).saturating_add(16) {
            return Err(Error::corrupt_payload(
                CompressionAlgorithm::Lz4,
                format!("size prefix {claimed} is impossible for {} input bytes", data.len()),
            ));
        }

        let raw = decompress_size_prepended(data)
            .map_err(|e| Error::corrupt_payload(CompressionAlgorithm::Lz4, e))?;
        if raw.len() != claimed {
            return Err(Error::corrupt_payload(
                CompressionAlgorithm::Lz4,
                format!("decoded {} bytes but size prefix says {claimed}", raw.len()),
            ));
        }
        Ok(raw)
    }
}
