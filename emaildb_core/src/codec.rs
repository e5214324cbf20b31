use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::{ALGO_BROTLI, ALGO_GZIP, ALGO_LZ4, ALGO_NONE, ALGO_ZSTD};

/// Compression algorithm recorded in every block header.
///
/// The numeric codes are part of the on-disk format. Changing them breaks
/// every existing database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CompressionAlgorithm {
    #[default]
    None = ALGO_NONE,
    Gzip = ALGO_GZIP,
    Lz4 = ALGO_LZ4,
    Zstd = ALGO_ZSTD,
    Brotli = ALGO_BROTLI,
}

impl CompressionAlgorithm {
    /// Every algorithm, in code order.
    pub const ALL: [CompressionAlgorithm; 5] = [
        CompressionAlgorithm::None,
        CompressionAlgorithm::Gzip,
        CompressionAlgorithm::Lz4,
        CompressionAlgorithm::Zstd,
        CompressionAlgorithm::Brotli,
    ];

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            ALGO_NONE => Some(Self::None),
            ALGO_GZIP => Some(Self::Gzip),
            ALGO_LZ4 => Some(Self::Lz4),
            ALGO_ZSTD => Some(Self::Zstd),
            ALGO_BROTLI => Some(Self::Brotli),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
            Self::Brotli => "brotli",
        }
    }

    /// False only for `None`.
    #[inline]
    pub const fn is_compressing(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl TryFrom<u8> for CompressionAlgorithm {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Self::from_code(code)
            .ok_or_else(|| Error::CorruptHeader(format!("unknown compression algorithm code {code}")))
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown compression algorithm '{s}'. Valid options: none, gzip, lz4, zstd, brotli")
            })
    }
}

/// Core compression abstraction.
///
/// Each provider:
/// - Reports a constant `algorithm()`, which is what the block header records.
/// - Compresses every payload independently. No state carries over between
///   calls, so a provider can be shared across threads without locking.
/// - Guarantees `decompress(compress(x)) == x` for every byte sequence,
///   including the empty one.
pub trait CompressionProvider: Send + Sync {
    /// Algorithm recorded in the header of blocks this provider encodes.
    fn algorithm(&self) -> CompressionAlgorithm;

    /// Compress a whole payload.
    ///
    /// Accepts any input. Output for empty input may be a non-empty minimal
    /// frame; it always decompresses back to empty.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a payload produced by `compress`.
    ///
    /// Malformed, truncated, or checksum-failing input yields
    /// [`Error::CorruptPayload`].
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Like [`decompress`](Self::decompress), but stops with
    /// [`Error::CorruptPayload`] as soon as the output would exceed `max_len`
    /// bytes, so a hostile stream cannot force an unbounded allocation.
    fn decompress_bounded(&self, data: &[u8], max_len: usize) -> Result<Vec<u8>> {
        let raw = self.decompress(data)?;
        if raw.len() > max_len {
            return Err(Error::output_limit(self.algorithm(), max_len));
        }
        Ok(raw)
    }
}
