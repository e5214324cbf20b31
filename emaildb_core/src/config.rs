use serde::{Deserialize, Serialize};

/// Tunables for the bundled compression providers.
///
/// Missing fields fall back to the defaults below when deserialized, so a
/// config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    /// 0 (store) to 9 (smallest).
    pub gzip_level: u32,
    /// 1 (fast / larger) to 22 (slow / smallest).
    pub zstd_level: i32,
    /// 0 to 11.
    pub brotli_quality: u32,
    /// Brotli window size as log2 bytes, 10 to 24.
    pub brotli_lgwin: u32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            gzip_level: 6,
            zstd_level: 3,
            brotli_quality: 5,
            brotli_lgwin: 22,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let settings: CompressionSettings = serde_json::from_str(r#"{"zstd_level": 19}"#).unwrap();
        assert_eq!(settings.zstd_level, 19);
        assert_eq!(settings.gzip_level, 6);
        assert_eq!(settings.brotli_quality, 5);
        assert_eq!(settings.brotli_lgwin, 22);
    }
}
