use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use emaildb_core::codec::CompressionAlgorithm;
use emaildb_core::error::{Error, Result};
use emaildb_core::format::{BlockHeader, FileHeader, BLOCK_HEADER_SIZE, FILE_HEADER_SIZE};
use tracing::{debug, info, warn};

use crate::block::Block;
use crate::options::DatabaseOptions;

/// Location of one block in the file, kept in RAM after open.
#[derive(Debug, Clone, Copy)]
struct BlockEntry {
    offset: u64,
    header: BlockHeader,
}

/// Size accounting over every block in a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatabaseStats {
    pub block_count: u64,
    /// Total payload bytes before compression.
    pub raw_bytes: u64,
    /// Total payload bytes as stored (excluding headers).
    pub stored_bytes: u64,
    /// Size of the file on disk, headers included.
    pub file_bytes: u64,
}

impl DatabaseStats {
    /// Compression ratio (raw / stored).
    pub fn ratio(&self) -> f64 {
        if self.stored_bytes == 0 {
            return 1.0;
        }
        self.raw_bytes as f64 / self.stored_bytes as f64
    }
}

/// Append-only block file.
///
/// # Layout
/// ```text
/// [FILE HEADER: 32 bytes]
/// [BLOCK 0 header: 40 bytes][BLOCK 0 payload]
/// [BLOCK 1 header: 40 bytes][BLOCK 1 payload]
/// ...
/// ```
///
/// # Open sequence
/// 1. Missing or zero-length file: write a fresh file header and fsync before
///    returning, so the file is non-empty as soon as `open` succeeds.
/// 2. Otherwise read and validate the file header, then walk the block
///    headers to rebuild the offset index. A block cut short at the tail (a
///    write interrupted by a crash) is truncated away.
///
/// Block ids are assigned sequentially from 0. Every payload written or read
/// passes through [`Block::encode_parts`] / [`Block::decode`]. Mutating calls
/// take `&mut self`, which gives the single-writer discipline the file needs.
pub struct Database {
    file: File,
    path: PathBuf,
    header: FileHeader,
    options: DatabaseOptions,
    entries: Vec<BlockEntry>,
    /// End of the last complete block (mirrors the file length).
    end_offset: u64,
}

impl Database {
    /// Open or create the database at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, DatabaseOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: DatabaseOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            let header = FileHeader::new();
            file.write_all(&header.to_bytes())?;
            file.sync_all()?;
            info!(path = %path.display(), "created database");
            return Ok(Self {
                file,
                path,
                header,
                options,
                entries: Vec::new(),
                end_offset: FILE_HEADER_SIZE,
            });
        }

        if len < FILE_HEADER_SIZE {
            return Err(Error::CorruptHeader(format!(
                "{} is {len} bytes, shorter than the {FILE_HEADER_SIZE}-byte file header",
                path.display()
            )));
        }

        // ── Read and validate file header ───────────────────────────────────
        let mut header_buf = [0u8; FILE_HEADER_SIZE as usize];
        file.read_exact(&mut header_buf)?;
        let mut header = FileHeader::from_bytes(&header_buf)?;

        // ── Walk block headers ──────────────────────────────────────────────
        // Nothing is written until the scan is known to be consistent, so a
        // refused file is left exactly as it was found.
        let (entries, end_offset) = scan_blocks(&mut file, len)?;
        let scanned = entries.len() as u64;
        if header.block_count > scanned {
            return Err(Error::CorruptHeader(format!(
                "file header records {} blocks but only {scanned} are present",
                header.block_count
            )));
        }

        if end_offset < len {
            warn!(
                path = %path.display(),
                kept = end_offset,
                dropped = len - end_offset,
                "truncating incomplete trailing block"
            );
            file.set_len(end_offset)?;
        }
        if header.block_count < scanned {
            warn!(
                path = %path.display(),
                recorded = header.block_count,
                scanned,
                "file header block count is stale, rewriting"
            );
            header.block_count = scanned;
            write_file_header(&mut file, &header)?;
            file.sync_all()?;
        }

        debug!(path = %path.display(), blocks = scanned, bytes = end_offset, "opened database");
        Ok(Self {
            file,
            path,
            header,
            options,
            entries,
            end_offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    #[inline]
    pub fn block_count(&self) -> u64 {
        self.entries.len() as u64
    }

    /// Append `payload` as a new block using the default algorithm.
    ///
    /// Returns the id of the new block.
    pub fn write_block(&mut self, payload: impl Into<Vec<u8>>) -> Result<u64> {
        let algorithm = self.options.default_algorithm;
        self.write_block_with(payload, algorithm)
    }

    /// Append `payload` as a new block compressed with `algorithm`.
    pub fn write_block_with(
        &mut self,
        payload: impl Into<Vec<u8>>,
        algorithm: CompressionAlgorithm,
    ) -> Result<u64> {
        let block_id = self.block_count();
        let block = Block::new(block_id, payload.into());
        let (block_header, stored) = block.encode_parts(algorithm, &self.options.encode_options())?;

        let offset = self.end_offset;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&block_header.to_bytes())?;
        self.file.write_all(&stored)?;

        self.entries.push(BlockEntry {
            offset,
            header: block_header,
        });
        self.end_offset += block_header.encoded_len();

        self.header.block_count = self.block_count();
        write_file_header(&mut self.file, &self.header)?;
        if self.options.sync_on_write {
            self.file.sync_data()?;
        }

        debug!(
            block_id,
            %algorithm,
            raw = block_header.raw_len,
            stored = block_header.stored_len,
            "wrote block"
        );
        Ok(block_id)
    }

    /// Read block `block_id` from disk and return its original payload.
    pub fn read_block(&mut self, block_id: u64) -> Result<Vec<u8>> {
        let entry = *self.entry(block_id)?;

        let mut bytes = vec![0u8; entry.header.encoded_len() as usize];
        self.file.seek(SeekFrom::Start(entry.offset))?;
        self.file.read_exact(&mut bytes)?;

        let block = Block::decode(&bytes)?;
        if block.block_id() != block_id {
            return Err(Error::CorruptHeader(format!(
                "block at offset {} has id {} but {block_id} was expected",
                entry.offset,
                block.block_id()
            )));
        }

        debug!(block_id, raw = block.payload().len(), "read block");
        Ok(block.into_payload())
    }

    /// Algorithm recorded for `block_id`, without touching the payload.
    pub fn block_algorithm(&self, block_id: u64) -> Result<CompressionAlgorithm> {
        Ok(self.entry(block_id)?.header.flags.get_compression_algorithm())
    }

    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            block_count: self.block_count(),
            raw_bytes: self.entries.iter().map(|e| e.header.raw_len).sum(),
            stored_bytes: self.entries.iter().map(|e| e.header.stored_len).sum(),
            file_bytes: self.end_offset,
        }
    }

    /// Flush and fsync, then release the file handle.
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        debug!(path = %self.path.display(), blocks = self.block_count(), "closed database");
        Ok(())
    }

    fn entry(&self, block_id: u64) -> Result<&BlockEntry> {
        usize::try_from(block_id)
            .ok()
            .and_then(|idx| self.entries.get(idx))
            .ok_or(Error::BlockNotFound(block_id))
    }
}

fn write_file_header(file: &mut File, header: &FileHeader) -> Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header.to_bytes())?;
    Ok(())
}

/// Walk block headers from the end of the file header up to `len`.
///
/// Returns the index and the end offset of the last complete block. A block
/// whose header or payload runs past `len` ends the scan there. A header that
/// is complete but does not parse is an error.
fn scan_blocks(file: &mut File, len: u64) -> Result<(Vec<BlockEntry>, u64)> {
    let mut entries = Vec::new();
    let mut offset = FILE_HEADER_SIZE;
    let mut buf = [0u8; BLOCK_HEADER_SIZE as usize];

    while len - offset >= BLOCK_HEADER_SIZE {
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        let header = BlockHeader::from_bytes(&buf)?;

        if header.stored_len > len - offset - BLOCK_HEADER_SIZE {
            break;
        }
        let expected_id = entries.len() as u64;
        if header.block_id != expected_id {
            return Err(Error::CorruptHeader(format!(
                "block at offset {offset} has id {} but {expected_id} was expected",
                header.block_id
            )));
        }

        entries.push(BlockEntry { offset, header });
        offset += header.encoded_len();
    }

    Ok((entries, offset))
}
