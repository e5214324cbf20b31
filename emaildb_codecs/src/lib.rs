mod brotli_codec;
mod gzip_codec;
mod lz4_codec;
mod passthrough;
mod zstd_codec;

pub use brotli_codec::BrotliProvider;
pub use gzip_codec::GzipProvider;
pub use lz4_codec::Lz4Provider;
pub use passthrough::NoneProvider;
pub use zstd_codec::ZstdProvider;

use std::io::Read;

use emaildb_core::codec::{CompressionAlgorithm, CompressionProvider};
use emaildb_core::config::CompressionSettings;
use emaildb_core::error::{Error, Result};

/// One bundled provider, selected at runtime.
///
/// A closed variant per algorithm, so dispatch is a `match` rather than a
/// vtable call and adding an algorithm forces every match to be revisited.
#[derive(Debug, Clone, Copy)]
pub enum Provider {
    None(NoneProvider),
    Gzip(GzipProvider),
    Lz4(Lz4Provider),
    Zstd(ZstdProvider),
    Brotli(BrotliProvider),
}

impl CompressionProvider for Provider {
    fn algorithm(&self) -> CompressionAlgorithm {
        match self {
            Provider::None(p) => p.algorithm(),
            Provider::Gzip(p) => p.algorithm(),
            Provider::Lz4(p) => p.algorithm(),
            Provider::Zstd(p) => p.algorithm(),
            Provider::Brotli(p) => p.algorithm(),
        }
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let out = match self {
            Provider::None(p) => p.compress(data),
            Provider::Gzip(p) => p.compress(data),
            Provider::Lz4(p) => p.compress(data),
            Provider::Zstd(p) => p.compress(data),
            Provider::Brotli(p) => p.compress(data),
        }?;
        tracing::trace!(
            algorithm = %self.algorithm(),
            raw = data.len(),
            compressed = out.len(),
            "compressed payload"
        );
        Ok(out)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decompress_bounded(data, usize::MAX)
    }

    fn decompress_bounded(&self, data: &[u8], max_len: usize) -> Result<Vec<u8>> {
        let out = match self {
            Provider::None(p) => p.decompress_bounded(data, max_len),
            Provider::Gzip(p) => p.decompress_bounded(data, max_len),
            Provider::Lz4(p) => p.decompress_bounded(data, max_len),
            Provider::Zstd(p) => p.decompress_bounded(data, max_len),
            Provider::Brotli(p) => p.decompress_bounded(data, max_len),
        }?;
        tracing::trace!(
            algorithm = %self.algorithm(),
            compressed = data.len(),
            raw = out.len(),
            "decompressed payload"
        );
        Ok(out)
    }
}

/// Resolve the provider for `algorithm` with default settings.
///
/// Total over the closed enumeration: there is no failure path, and the
/// returned provider always reports `algorithm` back.
pub fn get_provider(algorithm: CompressionAlgorithm) -> Provider {
    match algorithm {
        CompressionAlgorithm::None => Provider::None(NoneProvider),
        CompressionAlgorithm::Gzip => Provider::Gzip(GzipProvider::default()),
        CompressionAlgorithm::Lz4 => Provider::Lz4(Lz4Provider),
        CompressionAlgorithm::Zstd => Provider::Zstd(ZstdProvider::default()),
        CompressionAlgorithm::Brotli => Provider::Brotli(BrotliProvider::default()),
    }
}

/// Resolve the provider for `algorithm`, taking levels from `settings`.
///
/// Out-of-range levels are clamped to what the codec library accepts.
pub fn get_provider_with(algorithm: CompressionAlgorithm, settings: &CompressionSettings) -> Provider {
    match algorithm {
        CompressionAlgorithm::None => Provider::None(NoneProvider),
        CompressionAlgorithm::Gzip => Provider::Gzip(GzipProvider::new(settings.gzip_level)),
        CompressionAlgorithm::Lz4 => Provider::Lz4(Lz4Provider),
        CompressionAlgorithm::Zstd => Provider::Zstd(ZstdProvider::new(settings.zstd_level)),
        CompressionAlgorithm::Brotli => Provider::Brotli(BrotliProvider::new(
            settings.brotli_quality,
            settings.brotli_lgwin,
        )),
    }
}

/// Drain a streaming decoder, failing once it yields more than `max_len`
/// bytes. Reads at most one byte past the limit.
fn read_bounded(reader: impl Read, algorithm: CompressionAlgorithm, max_len: usize) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    reader
        .take((max_len as u64).saturating_add(1))
        .read_to_end(&mut raw)
        .map_err(|e| Error::corrupt_payload(algorithm, e))?;
    if raw.len() > max_len {
        return Err(Error::output_limit(algorithm, max_len));
    }
    Ok(raw)
}
