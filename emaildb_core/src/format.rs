use xxhash_rust::xxh3::xxh3_64;

use crate::error::{Error, Result};
use crate::flags::BlockFlags;

/// Magic bytes at the start of every EmailDB file.
pub const MAGIC: &[u8; 8] = b"EMAILDB\x01";

/// Current file format version.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed size of the database file header in bytes.
///   magic[8] + version:u16 + reserved[6] + block_count:u64 + checksum:u64
///   = 8 + 2 + 6 + 8 + 8 = 32
pub const FILE_HEADER_SIZE: u64 = 32;

/// Fixed size of each block header in bytes.
///   flags:u16 + reserved[6] + block_id:u64 + stored_len:u64
///   + raw_len:u64 + checksum:u64
///   = 2 + 6 + 8 + 8 + 8 + 8 = 40
pub const BLOCK_HEADER_SIZE: u64 = 40;

// ── Block flag bits ────────────────────────────────────────────────────────

/// Derived: set exactly when the algorithm sub-field is not `None`.
pub const FLAG_COMPRESSED: u16 = 1 << 0;

/// The block header carries an xxh3-64 checksum of the stored payload.
pub const FLAG_CHECKSUMMED: u16 = 1 << 1;

/// Bit offset of the 3-bit compression algorithm sub-field.
pub const ALGO_SHIFT: u16 = 4;

/// Mask of the compression algorithm sub-field, in place.
pub const ALGO_MASK: u16 = 0b111 << ALGO_SHIFT;

/// Bits with no assigned meaning. Must be zero on disk.
pub const RESERVED_FLAG_BITS: u16 = !(FLAG_COMPRESSED | FLAG_CHECKSUMMED | ALGO_MASK);

// ── Compression algorithm codes ────────────────────────────────────────────

pub const ALGO_NONE: u8 = 0;
pub const ALGO_GZIP: u8 = 1;
pub const ALGO_LZ4: u8 = 2;
pub const ALGO_ZSTD: u8 = 3;
pub const ALGO_BROTLI: u8 = 4;

// ── File header ────────────────────────────────────────────────────────────

/// Decoded representation of the 32-byte file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u16,
    pub block_count: u64,
}

impl FileHeader {
    /// Header for a freshly created, empty database.
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            block_count: 0,
        }
    }

    /// Serialize to exactly `FILE_HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE as usize] {
        let mut buf = [0u8; FILE_HEADER_SIZE as usize];
        buf[..8].copy_from_slice(MAGIC);
        buf[8..10].copy_from_slice(&self.version.to_le_bytes());
        // buf[10..16] reserved, stays zero
        buf[16..24].copy_from_slice(&self.block_count.to_le_bytes());
        let checksum = xxh3_64(&buf[..24]);
        buf[24..32].copy_from_slice(&checksum.to_le_bytes());
        buf
    }

    /// Deserialize from `FILE_HEADER_SIZE` bytes, checking magic, version and checksum.
    pub fn from_bytes(buf: &[u8; FILE_HEADER_SIZE as usize]) -> Result<Self> {
        if &buf[..8] != MAGIC {
            return Err(Error::CorruptHeader(
                "invalid magic bytes, not an EmailDB file".into(),
            ));
        }
        let stored = u64::from_le_bytes(le_array(&buf[24..32]));
        let computed = xxh3_64(&buf[..24]);
        if stored != computed {
            return Err(Error::CorruptHeader(format!(
                "file header checksum mismatch: expected {stored:016x}, got {computed:016x}"
            )));
        }
        let version = u16::from_le_bytes(le_array(&buf[8..10]));
        if version != FORMAT_VERSION {
            return Err(Error::CorruptHeader(format!(
                "unsupported format version {version} (only version {FORMAT_VERSION} is supported)"
            )));
        }
        Ok(Self {
            version,
            block_count: u64::from_le_bytes(le_array(&buf[16..24])),
        })
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

// ── Block header ───────────────────────────────────────────────────────────

/// Fixed-layout prefix of every block. The payload region of `stored_len`
/// bytes follows it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHeader {
    /// Compression algorithm and indicator bits. Always at offset 0.
    pub flags: BlockFlags,
    pub block_id: u64,
    /// Length of the payload region as stored (after compression).
    pub stored_len: u64,
    /// Length of the payload after decompression.
    pub raw_len: u64,
    /// xxh3-64 of the stored payload; zero unless the block is checksummed.
    pub checksum: u64,
}

impl BlockHeader {
    /// Serialize to exactly `BLOCK_HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; BLOCK_HEADER_SIZE as usize] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE as usize];
        buf[0..2].copy_from_slice(&self.flags.bits().to_le_bytes());
        // buf[2..8] reserved, stays zero
        buf[8..16].copy_from_slice(&self.block_id.to_le_bytes());
        buf[16..24].copy_from_slice(&self.stored_len.to_le_bytes());
        buf[24..32].copy_from_slice(&self.raw_len.to_le_bytes());
        buf[32..40].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Deserialize from `BLOCK_HEADER_SIZE` bytes.
    ///
    /// Rejects flags that decode to an unknown algorithm or carry reserved
    /// bits, and non-zero reserved bytes.
    pub fn from_bytes(buf: &[u8; BLOCK_HEADER_SIZE as usize]) -> Result<Self> {
        let flags = BlockFlags::from_bits(u16::from_le_bytes(le_array(&buf[0..2])))?;
        if buf[2..8].iter().any(|&b| b != 0) {
            return Err(Error::CorruptHeader(
                "reserved block header bytes are not zero".into(),
            ));
        }
        Ok(Self {
            flags,
            block_id: u64::from_le_bytes(le_array(&buf[8..16])),
            stored_len: u64::from_le_bytes(le_array(&buf[16..24])),
            raw_len: u64::from_le_bytes(le_array(&buf[24..32])),
            checksum: u64::from_le_bytes(le_array(&buf[32..40])),
        })
    }

    /// Total on-disk size of the block this header describes.
    pub fn encoded_len(&self) -> u64 {
        BLOCK_HEADER_SIZE + self.stored_len
    }
}

/// Copy a fixed-width little-endian field out of a header buffer.
fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CompressionAlgorithm;

    #[test]
    fn file_header_roundtrip() {
        let header = FileHeader {
            version: FORMAT_VERSION,
            block_count: 42,
        };
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..8], MAGIC);
        assert_eq!(FileHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn file_header_rejects_bad_magic() {
        let mut bytes = FileHeader::new().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            FileHeader::from_bytes(&bytes),
            Err(Error::CorruptHeader(_))
        ));
    }

    #[test]
    fn file_header_rejects_checksum_mismatch() {
        let mut bytes = FileHeader::new().to_bytes();
        bytes[16] ^= 0x01;
        let err = FileHeader::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"), "got: {err}");
    }

    #[test]
    fn block_header_flags_sit_at_offset_zero() {
        let header = BlockHeader {
            flags: BlockFlags::NONE.set_compression_algorithm(CompressionAlgorithm::Zstd),
            block_id: 9,
            stored_len: 100,
            raw_len: 1000,
            checksum: 0xABCD,
        };
        let bytes = header.to_bytes();
        assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), header.flags.bits());
        assert_eq!(BlockHeader::from_bytes(&bytes).unwrap(), header);
        assert_eq!(header.encoded_len(), BLOCK_HEADER_SIZE + 100);
    }

    #[test]
    fn block_header_rejects_unknown_algorithm_code() {
        let mut bytes = BlockHeader::default().to_bytes();
        // code 6 with the compressed bit set
        let raw = (6u16 << ALGO_SHIFT) | FLAG_COMPRESSED;
        bytes[0..2].copy_from_slice(&raw.to_le_bytes());
        assert!(matches!(
            BlockHeader::from_bytes(&bytes),
            Err(Error::CorruptHeader(_))
        ));
    }

    #[test]
    fn block_header_rejects_reserved_bytes() {
        let mut bytes = BlockHeader::default().to_bytes();
        bytes[5] = 1;
        assert!(matches!(
            BlockHeader::from_bytes(&bytes),
            Err(Error::CorruptHeader(_))
        ));
    }
}
