use emaildb_core::codec::{CompressionAlgorithm, CompressionProvider};
use emaildb_core::error::{Error, Result};

/// Identity provider: stores payloads verbatim.
///
/// Lets callers treat "no compression" through the same interface as every
/// other algorithm. Also the right choice for payloads that are already
/// compressed (attachments such as JPEG or ZIP), where a second pass would
/// only grow them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneProvider;

impl CompressionProvider for NoneProvider {
    fn algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::None
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress_bounded(&self, data: &[u8], max_len: usize) -> Result<Vec<u8>> {
        if data.len() > max_len {
            return Err(Error::output_limit(CompressionAlgorithm::None, max_len));
        }
        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_both_ways() {
        let data = b"\x00\xffplain bytes\x01".to_vec();
        assert_eq!(NoneProvider.compress(&data).unwrap(), data);
        assert_eq!(NoneProvider.decompress(&data).unwrap(), data);
        assert!(NoneProvider.compress(&[]).unwrap().is_empty());
    }
}
