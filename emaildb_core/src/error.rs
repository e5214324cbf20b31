use std::io;

use thiserror::Error;

use crate::codec::CompressionAlgorithm;

/// Errors produced by the block format, the compression providers and the
/// database file layer.
///
/// `CorruptHeader` and `CorruptPayload` are the two data-integrity conditions.
/// They are kept apart so a caller can tell "the header metadata is bad" from
/// "the header is fine but the payload does not decode under the algorithm it
/// names".
#[derive(Debug, Error)]
pub enum Error {
    /// A block or file header does not parse to a legal header.
    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    /// Payload bytes fail to decode or verify under the recorded algorithm.
    #[error("corrupt {algorithm} payload: {reason}")]
    CorruptPayload {
        algorithm: CompressionAlgorithm,
        reason: String,
    },

    /// The codec library failed while compressing.
    #[error("{algorithm} encoder failed: {source}")]
    Encoder {
        algorithm: CompressionAlgorithm,
        #[source]
        source: io::Error,
    },

    /// The database holds no block with this id.
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// Backing storage failure, propagated unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn corrupt_payload(algorithm: CompressionAlgorithm, reason: impl ToString) -> Self {
        Error::CorruptPayload {
            algorithm,
            reason: reason.to_string(),
        }
    }

    /// Output grew past the length the caller allowed.
    pub fn output_limit(algorithm: CompressionAlgorithm, max_len: usize) -> Self {
        Self::corrupt_payload(algorithm, format!("decoded output exceeds {max_len} bytes"))
    }

    /// True for `CorruptHeader` and `CorruptPayload`.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CorruptHeader(_) | Error::CorruptPayload { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
