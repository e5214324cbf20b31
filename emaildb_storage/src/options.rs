use emaildb_core::codec::CompressionAlgorithm;
use emaildb_core::config::CompressionSettings;
use serde::{Deserialize, Serialize};

use crate::block::EncodeOptions;

/// Settings a [`Database`](crate::Database) is opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Algorithm used by `write_block` when the caller does not pick one.
    pub default_algorithm: CompressionAlgorithm,
    pub compression: CompressionSettings,
    /// Record an xxh3-64 checksum of every stored payload.
    pub checksum_blocks: bool,
    /// fsync after every block write instead of only on close.
    pub sync_on_write: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            default_algorithm: CompressionAlgorithm::Zstd,
            compression: CompressionSettings::default(),
            checksum_blocks: true,
            sync_on_write: false,
        }
    }
}

impl DatabaseOptions {
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            compression: self.compression.clone(),
            checksum: self.checksum_blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = DatabaseOptions::default();
        assert_eq!(options.default_algorithm, CompressionAlgorithm::Zstd);
        assert!(options.checksum_blocks);
        assert!(!options.sync_on_write);
    }

    #[test]
    fn parse_partial_json() {
        let options: DatabaseOptions = serde_json::from_str(
            r#"{ "default_algorithm": "brotli", "compression": { "brotli_quality": 9 } }"#,
        )
        .unwrap();
        assert_eq!(options.default_algorithm, CompressionAlgorithm::Brotli);
        assert_eq!(options.compression.brotli_quality, 9);
        assert_eq!(options.compression.zstd_level, 3);
        assert!(options.checksum_blocks);
    }

    #[test]
    fn encode_options_follow_settings() {
        let options = DatabaseOptions {
            checksum_blocks: false,
            ..DatabaseOptions::default()
        };
        assert!(!options.encode_options().checksum);
    }
}
