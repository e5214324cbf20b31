/// Provider-level tests: every bundled algorithm must round-trip byte-exactly,
/// shrink repetitive input, and reject damaged input with `CorruptPayload`.
use std::sync::Arc;
use std::thread;

use emaildb_codecs::{get_provider, get_provider_with, Provider};
use emaildb_core::{CompressionAlgorithm, CompressionProvider, CompressionSettings, Error};
use proptest::prelude::*;

/// Generate `len` deterministic bytes using a simple LCG.
fn pseudo_random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (rng >> 56) as u8
        })
        .collect()
}

/// Generate `len` highly compressible bytes (repeating pattern).
fn compressible_bytes(len: usize) -> Vec<u8> {
    let pattern = b"Subject: Re: quarterly report\r\nFrom: alice@example.org\r\n";
    (0..len).map(|i| pattern[i % pattern.len()]).collect()
}

fn roundtrip(provider: &Provider, data: &[u8]) -> Vec<u8> {
    let compressed = provider.compress(data).unwrap();
    provider.decompress(&compressed).unwrap()
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn test_factory_reports_requested_algorithm() {
    for algo in CompressionAlgorithm::ALL {
        assert_eq!(get_provider(algo).algorithm(), algo);
        assert_eq!(
            get_provider_with(algo, &CompressionSettings::default()).algorithm(),
            algo
        );
    }
}

#[test]
fn test_roundtrip_all_algorithms() {
    let inputs = [
        Vec::new(),
        vec![0x42],
        compressible_bytes(10_000),
        pseudo_random_bytes(256 * 1024, 0xDEAD_BEEF),
    ];
    for algo in CompressionAlgorithm::ALL {
        let provider = get_provider(algo);
        for data in &inputs {
            assert_eq!(
                &roundtrip(&provider, data),
                data,
                "{algo} round-trip failed for {} bytes",
                data.len()
            );
        }
    }
}

#[test]
fn test_empty_input_yields_well_formed_output() {
    for algo in CompressionAlgorithm::ALL {
        let provider = get_provider(algo);
        let compressed = provider.compress(&[]).unwrap();
        if algo.is_compressing() {
            assert!(!compressed.is_empty(), "{algo} should emit a minimal frame");
        }
        assert!(provider.decompress(&compressed).unwrap().is_empty());
    }
}

#[test]
fn test_repeated_bytes_compress_below_ten_percent() {
    let data = vec![b'A'; 1000];
    for algo in CompressionAlgorithm::ALL {
        let compressed = get_provider(algo).compress(&data).unwrap();
        if algo.is_compressing() {
            assert!(
                compressed.len() < 100,
                "{algo} compressed 1000 repeated bytes to {} bytes",
                compressed.len()
            );
        } else {
            assert_eq!(compressed.len(), 1000);
        }
    }
}

#[test]
fn test_truncated_gzip_is_corrupt_payload() {
    let provider = get_provider(CompressionAlgorithm::Gzip);
    let mut compressed = provider.compress(&compressible_bytes(4096)).unwrap();
    compressed.pop();
    let err = provider.decompress(&compressed).unwrap_err();
    assert!(
        matches!(
            err,
            Error::CorruptPayload {
                algorithm: CompressionAlgorithm::Gzip,
                ..
            }
        ),
        "expected CorruptPayload, got {err:?}"
    );
}

#[test]
fn test_truncated_zstd_is_corrupt_payload() {
    let provider = get_provider(CompressionAlgorithm::Zstd);
    let compressed = provider.compress(&compressible_bytes(4096)).unwrap();
    let err = provider
        .decompress(&compressed[..compressed.len() / 2])
        .unwrap_err();
    assert!(matches!(err, Error::CorruptPayload { .. }), "got {err:?}");
}

#[test]
fn test_gzip_checksum_catches_bit_flip() {
    let provider = get_provider(CompressionAlgorithm::Gzip);
    let mut compressed = provider.compress(&compressible_bytes(2048)).unwrap();
    // CRC32 sits in the first four trailer bytes
    let crc_at = compressed.len() - 8;
    compressed[crc_at] ^= 0x01;
    assert!(matches!(
        provider.decompress(&compressed),
        Err(Error::CorruptPayload { .. })
    ));
}

#[test]
fn test_cross_algorithm_decode_fails() {
    let data = b"cross algorithm test data for the header check";
    let gzip = get_provider(CompressionAlgorithm::Gzip).compress(data).unwrap();
    assert!(get_provider(CompressionAlgorithm::Zstd).decompress(&gzip).is_err());

    let zstd = get_provider(CompressionAlgorithm::Zstd).compress(data).unwrap();
    assert!(get_provider(CompressionAlgorithm::Gzip).decompress(&zstd).is_err());
}

#[test]
fn test_empty_input_rejected_by_framed_decoders() {
    for algo in [
        CompressionAlgorithm::Gzip,
        CompressionAlgorithm::Lz4,
        CompressionAlgorithm::Zstd,
        CompressionAlgorithm::Brotli,
    ] {
        assert!(
            matches!(get_provider(algo).decompress(&[]), Err(Error::CorruptPayload { .. })),
            "{algo} accepted an empty stream"
        );
    }
}

#[test]
fn test_trailing_bytes_rejected_by_framed_decoders() {
    for algo in [
        CompressionAlgorithm::Gzip,
        CompressionAlgorithm::Zstd,
        CompressionAlgorithm::Brotli,
    ] {
        let provider = get_provider(algo);
        let mut compressed = provider.compress(&compressible_bytes(2048)).unwrap();
        compressed.extend_from_slice(&[0xA5; 7]);
        assert!(
            matches!(provider.decompress(&compressed), Err(Error::CorruptPayload { .. })),
            "{algo} ignored trailing bytes"
        );
    }
}

#[test]
fn test_bounded_decompress_honours_limit() {
    let data = compressible_bytes(32 * 1024);
    for algo in CompressionAlgorithm::ALL {
        let provider = get_provider(algo);
        let compressed = provider.compress(&data).unwrap();
        assert_eq!(provider.decompress_bounded(&compressed, data.len()).unwrap(), data);
        let err = provider
            .decompress_bounded(&compressed, data.len() - 1)
            .unwrap_err();
        assert!(
            matches!(err, Error::CorruptPayload { algorithm, .. } if algorithm == algo),
            "{algo}: got {err:?}"
        );
    }
}

#[test]
fn test_settings_change_output_not_result() {
    let data = compressible_bytes(64 * 1024);
    let fast = CompressionSettings {
        zstd_level: 1,
        ..CompressionSettings::default()
    };
    let small = CompressionSettings {
        zstd_level: 19,
        ..CompressionSettings::default()
    };
    let a = get_provider_with(CompressionAlgorithm::Zstd, &fast);
    let b = get_provider_with(CompressionAlgorithm::Zstd, &small);
    let ca = a.compress(&data).unwrap();
    let cb = b.compress(&data).unwrap();
    // any level decodes any other level's output
    assert_eq!(b.decompress(&ca).unwrap(), data);
    assert_eq!(a.decompress(&cb).unwrap(), data);
}

#[test]
fn test_providers_shared_across_threads() -> anyhow::Result<()> {
    let providers: Arc<Vec<Provider>> =
        Arc::new(CompressionAlgorithm::ALL.into_iter().map(get_provider).collect());

    let handles: Vec<_> = (0..4u64)
        .map(|seed| {
            let providers = Arc::clone(&providers);
            thread::spawn(move || {
                let data = pseudo_random_bytes(8 * 1024, seed);
                providers
                    .iter()
                    .all(|p| roundtrip(p, &data) == data)
            })
        })
        .collect();

    for handle in handles {
        let ok = handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker thread panicked"))?;
        assert!(ok);
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_roundtrip(
        algo in proptest::sample::select(CompressionAlgorithm::ALL.to_vec()),
        data in proptest::collection::vec(any::<u8>(), 0..4096),
    ) {
        let provider = get_provider(algo);
        let compressed = provider.compress(&data).unwrap();
        prop_assert_eq!(provider.decompress(&compressed).unwrap(), data);
    }
}
