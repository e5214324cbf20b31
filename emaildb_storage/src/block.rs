use emaildb_codecs::{get_provider, get_provider_with};
use emaildb_core::codec::{CompressionAlgorithm, CompressionProvider};
use emaildb_core::config::CompressionSettings;
use emaildb_core::error::{Error, Result};
use emaildb_core::flags::{BlockFlag, BlockFlags};
use emaildb_core::format::{BlockHeader, BLOCK_HEADER_SIZE};
use xxhash_rust::xxh3::xxh3_64;

/// Knobs applied when a block is encoded.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub compression: CompressionSettings,
    /// Store an xxh3-64 of the stored payload in the header.
    pub checksum: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compression: CompressionSettings::default(),
            checksum: true,
        }
    }
}

/// One storage unit: an id plus the raw payload it carries.
///
/// Built transiently for a single encode or decode and dropped afterwards.
/// The on-disk form is a [`BlockHeader`] followed by the payload as
/// transformed by the algorithm recorded in the header flags:
///
/// ```text
/// [flags:u16][reserved:6][block_id:u64][stored_len:u64][raw_len:u64][checksum:u64]
/// [stored payload: stored_len bytes]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    block_id: u64,
    payload: Vec<u8>,
}

impl Block {
    pub fn new(block_id: u64, payload: Vec<u8>) -> Self {
        Self { block_id, payload }
    }

    pub fn block_id(&self) -> u64 {
        self.block_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Encode to the full on-disk byte representation.
    pub fn encode(&self, algorithm: CompressionAlgorithm, options: &EncodeOptions) -> Result<Vec<u8>> {
        let (header, stored) = self.encode_parts(algorithm, options)?;
        let mut out = Vec::with_capacity(header.encoded_len() as usize);
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&stored);
        Ok(out)
    }

    /// Compress the payload and build the header describing it, without
    /// concatenating the two.
    pub fn encode_parts(
        &self,
        algorithm: CompressionAlgorithm,
        options: &EncodeOptions,
    ) -> Result<(BlockHeader, Vec<u8>)> {
        let provider = get_provider_with(algorithm, &options.compression);
        let stored = provider.compress(&self.payload)?;

        let flags = BlockFlags::NONE
            .set_compression_algorithm(provider.algorithm())
            .with_checksum(options.checksum);
        let header = BlockHeader {
            flags,
            block_id: self.block_id,
            stored_len: stored.len() as u64,
            raw_len: self.payload.len() as u64,
            checksum: if options.checksum { xxh3_64(&stored) } else { 0 },
        };
        Ok((header, stored))
    }

    /// Decode one block from its exact on-disk bytes.
    ///
    /// `CorruptHeader` if the header does not parse or its lengths disagree
    /// with `bytes`; `CorruptPayload` if the payload fails to verify or decode.
    pub fn decode(bytes: &[u8]) -> Result<Block> {
        let Some((head, stored)) = bytes.split_first_chunk::<{ BLOCK_HEADER_SIZE as usize }>() else {
            return Err(Error::CorruptHeader(format!(
                "{} bytes is too short for a {BLOCK_HEADER_SIZE}-byte block header",
                bytes.len()
            )));
        };
        let header = BlockHeader::from_bytes(head)?;
        Self::decode_parts(&header, stored)
    }

    /// Decode a payload region against an already parsed header.
    pub fn decode_parts(header: &BlockHeader, stored: &[u8]) -> Result<Block> {
        if header.stored_len != stored.len() as u64 {
            return Err(Error::CorruptHeader(format!(
                "block {} header says {} stored bytes but {} are present",
                header.block_id,
                header.stored_len,
                stored.len()
            )));
        }

        let algorithm = header.flags.get_compression_algorithm();
        if header.flags.has_flag(BlockFlag::Checksummed) {
            let computed = xxh3_64(stored);
            if computed != header.checksum {
                return Err(Error::corrupt_payload(
                    algorithm,
                    format!(
                        "block {} checksum mismatch: expected {:016x}, got {computed:016x}",
                        header.block_id, header.checksum
                    ),
                ));
            }
        } else if header.checksum != 0 {
            return Err(Error::CorruptHeader(format!(
                "block {} has a checksum value but no checksum flag",
                header.block_id
            )));
        }

        // the header length caps decoder output before it is trusted
        let max_len = usize::try_from(header.raw_len).unwrap_or(usize::MAX);
        let payload = get_provider(algorithm).decompress_bounded(stored, max_len)?;
        if payload.len() as u64 != header.raw_len {
            return Err(Error::corrupt_payload(
                algorithm,
                format!(
                    "block {} decoded to {} bytes but header says {}",
                    header.block_id,
                    payload.len(),
                    header.raw_len
                ),
            ));
        }

        Ok(Block {
            block_id: header.block_id,
            payload,
        })
    }
}
