pub mod codec;
pub mod config;
pub mod error;
pub mod flags;
pub mod format;

pub use codec::{CompressionAlgorithm, CompressionProvider};
pub use config::CompressionSettings;
pub use error::{Error, Result};
pub use flags::{BlockFlag, BlockFlags};
pub use format::{BlockHeader, FileHeader, BLOCK_HEADER_SIZE, FILE_HEADER_SIZE, MAGIC};
