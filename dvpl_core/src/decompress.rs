use crate::codec::codec_for_kind;
use crate::error::{DvplError, Result};
use crate::format::{split_container, FooterData};

/// Validate a DVPL container and return the original bytes.
///
/// # Check order
/// 1. The container must hold at least the 20-byte footer.
/// 2. The footer magic must be `"DVPL"`.
/// 3. The payload length must equal `compressed_size`.
/// 4. The payload CRC-32 must equal `checksum`.
/// 5. `compression_kind` selects the codec; anything above 2 is rejected.
///
/// Size and checksum are verified before any decompression is attempted, so a
/// corrupt payload never reaches the LZ4 decoder.
pub fn decompress(container: &[u8]) -> Result<Vec<u8>> {
    let (payload, trailer) = split_container(container)?;
    let footer = FooterData::from_bytes(trailer)?;

    verify_payload(payload, &footer)?;

    let codec = codec_for_kind(footer.kind()?);
    codec.decode(payload, &footer)
}

/// Check `payload` against the size and checksum recorded in `footer`.
pub fn verify_payload(payload: &[u8], footer: &FooterData) -> Result<()> {
    if payload.len() != footer.compressed_size as usize {
        return Err(DvplError::SizeMismatch {
            expected: footer.compressed_size,
            actual: payload.len(),
        });
    }

    let actual = crc32fast::hash(payload);
    if actual != footer.checksum {
        return Err(DvplError::ChecksumMismatch {
            expected: footer.checksum,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FOOTER_SIZE;

    fn container(payload: &[u8], footer: FooterData) -> Vec<u8> {
        let mut out = payload.to_vec();
        out.extend_from_slice(&footer.to_bytes());
        out
    }

    fn stored_footer(payload: &[u8]) -> FooterData {
        FooterData {
            original_size: payload.len() as u32,
            compressed_size: payload.len() as u32,
            checksum: crc32fast::hash(payload),
            compression_kind: 0,
        }
    }

    #[test]
    fn stored_payload_is_returned_verbatim() {
        let payload = b"raw\x00bytes\x00\x00";
        let out = decompress(&container(payload, stored_footer(payload))).unwrap();
        assert_eq!(out, payload);
    }

    #[test]
    fn empty_stored_container() {
        let out = decompress(&container(b"", stored_footer(b""))).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn shorter_than_footer_is_truncated() {
        let err = decompress(&[0u8; FOOTER_SIZE - 1]).unwrap_err();
        assert!(matches!(err, DvplError::Truncated { len: 19 }));
    }

    #[test]
    fn size_mismatch_is_reported() {
        let payload = b"abcdef";
        let mut footer = stored_footer(payload);
        footer.compressed_size = 5;
        let err = decompress(&container(payload, footer)).unwrap_err();
        assert!(matches!(err, DvplError::SizeMismatch { expected: 5, actual: 6 }));
    }

    #[test]
    fn checksum_mismatch_is_reported() {
        let payload = b"abcdef";
        let mut footer = stored_footer(payload);
        footer.checksum ^= 1;
        let err = decompress(&container(payload, footer)).unwrap_err();
        assert!(matches!(err, DvplError::ChecksumMismatch { .. }));
    }

    #[test]
    fn checksum_is_checked_before_kind() {
        let payload = b"abcdef";
        let mut footer = stored_footer(payload);
        footer.compression_kind = 9;
        footer.checksum ^= 0xFF;
        let err = decompress(&container(payload, footer)).unwrap_err();
        assert!(matches!(err, DvplError::ChecksumMismatch { .. }));
    }

    #[test]
    fn kind_three_is_unsupported() {
        let payload = b"abcdef";
        let mut footer = stored_footer(payload);
        footer.compression_kind = 3;
        let err = decompress(&container(payload, footer)).unwrap_err();
        assert!(matches!(err, DvplError::UnsupportedCompressionKind(3)));
    }

    #[test]
    fn stored_with_different_sizes_is_inconsistent() {
        let payload = b"abcdef";
        let mut footer = stored_footer(payload);
        footer.original_size = 100;
        let err = decompress(&container(payload, footer)).unwrap_err();
        assert!(matches!(
            err,
            DvplError::InconsistentStoredSize { original: 100, compressed: 6 }
        ));
    }

    #[test]
    fn garbage_lz4_with_valid_checksum_fails_decompression() {
        // Token promises 15 literals but the block ends immediately.
        let payload = [0xF0u8];
        let footer = FooterData {
            original_size: 64,
            compressed_size: 1,
            checksum: crc32fast::hash(&payload),
            compression_kind: 1,
        };
        let err = decompress(&container(&payload, footer)).unwrap_err();
        assert!(matches!(err, DvplError::DecompressionFailure(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
