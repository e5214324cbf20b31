//! Block header flag word.
//!
//! ## Layout (u16, little endian on disk)
//!
//! | Bits   | Name         | Description                                      |
//! |--------|--------------|--------------------------------------------------|
//! | 0      | COMPRESSED   | Derived, set iff the algorithm is not `None`     |
//! | 1      | CHECKSUMMED  | Header carries an xxh3-64 of the stored payload  |
//! | 2..=3  | reserved     | Must be zero                                     |
//! | 4..=6  | ALGORITHM    | `CompressionAlgorithm` code                      |
//! | 7..=15 | reserved     | Must be zero                                     |

use crate::codec::CompressionAlgorithm;
use crate::error::{Error, Result};
use crate::format::{ALGO_MASK, ALGO_SHIFT, FLAG_CHECKSUMMED, FLAG_COMPRESSED, RESERVED_FLAG_BITS};

/// Single-bit indicators testable with [`BlockFlags::has_flag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFlag {
    Compressed,
    Checksummed,
}

impl BlockFlag {
    #[inline]
    pub const fn bit(self) -> u16 {
        match self {
            Self::Compressed => FLAG_COMPRESSED,
            Self::Checksummed => FLAG_CHECKSUMMED,
        }
    }
}

/// Flag word attached to every block.
///
/// Holds the decoded sub-fields rather than raw bits, so the derived
/// `COMPRESSED` bit cannot go stale: it is computed from the algorithm each
/// time the word is packed. The only mutators return new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockFlags {
    algorithm: CompressionAlgorithm,
    checksummed: bool,
}

impl BlockFlags {
    /// No compression, no checksum.
    pub const NONE: BlockFlags = BlockFlags {
        algorithm: CompressionAlgorithm::None,
        checksummed: false,
    };

    /// Replace the algorithm sub-field. The compressed indicator follows it;
    /// every other bit is preserved.
    #[must_use]
    pub const fn set_compression_algorithm(self, algorithm: CompressionAlgorithm) -> Self {
        Self { algorithm, ..self }
    }

    #[inline]
    pub const fn get_compression_algorithm(self) -> CompressionAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub const fn with_checksum(self, checksummed: bool) -> Self {
        Self {
            checksummed,
            ..self
        }
    }

    #[inline]
    pub const fn has_flag(self, flag: BlockFlag) -> bool {
        self.bits() & flag.bit() != 0
    }

    #[inline]
    pub const fn is_compressed(self) -> bool {
        self.has_flag(BlockFlag::Compressed)
    }

    /// Packed on-disk representation.
    pub const fn bits(self) -> u16 {
        let mut bits = (self.algorithm.code() as u16) << ALGO_SHIFT;
        if self.algorithm.is_compressing() {
            bits |= FLAG_COMPRESSED;
        }
        if self.checksummed {
            bits |= FLAG_CHECKSUMMED;
        }
        bits
    }

    /// Decode a packed flag word read from disk.
    ///
    /// Fails with `CorruptHeader` on an unknown algorithm code, on a
    /// compressed bit that disagrees with the algorithm, or on reserved bits.
    pub fn from_bits(bits: u16) -> Result<Self> {
        if bits & RESERVED_FLAG_BITS != 0 {
            return Err(Error::CorruptHeader(format!(
                "reserved block flag bits set: 0x{bits:04x}"
            )));
        }
        let code = ((bits & ALGO_MASK) >> ALGO_SHIFT) as u8;
        let algorithm = CompressionAlgorithm::try_from(code)?;
        let compressed = bits & FLAG_COMPRESSED != 0;
        if compressed != algorithm.is_compressing() {
            return Err(Error::CorruptHeader(format!(
                "compressed bit is {} but algorithm is {algorithm}",
                if compressed { "set" } else { "clear" }
            )));
        }
        Ok(Self {
            algorithm,
            checksummed: bits & FLAG_CHECKSUMMED != 0,
        })
    }
}
