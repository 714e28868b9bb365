use crate::codec::{codec_for_kind, PayloadCodec};
use crate::error::{DvplError, Result};
use crate::format::{CompressionKind, FooterData, FOOTER_SIZE};

/// How `compress` should treat its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionPolicy {
    /// Write the input verbatim under kind 0. The compressor is not run, so
    /// the payload round-trips byte for byte, trailing zeros included.
    Stored,
    /// Zero-pad to the LZ4 block bound and compress under kind 2.
    #[default]
    Compressed,
}

impl CompressionPolicy {
    pub fn kind(self) -> CompressionKind {
        match self {
            Self::Stored => CompressionKind::Stored,
            Self::Compressed => CompressionKind::Lz4High,
        }
    }

    pub fn codec(self) -> &'static dyn PayloadCodec {
        codec_for_kind(self.kind())
    }
}

/// Wrap `raw` into a DVPL container: payload followed by the 20-byte footer.
pub fn compress(raw: &[u8], policy: CompressionPolicy) -> Result<Vec<u8>> {
    let codec = policy.codec();
    let encoded = codec.encode(raw)?;

    let footer = FooterData {
        original_size: size_field(encoded.original_size)?,
        compressed_size: size_field(encoded.bytes.len())?,
        checksum: crc32fast::hash(&encoded.bytes),
        compression_kind: codec.kind().as_u32(),
    };

    let mut out = encoded.bytes;
    out.reserve_exact(FOOTER_SIZE);
    out.extend_from_slice(&footer.to_bytes());
    Ok(out)
}

fn size_field(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| DvplError::PayloadTooLarge { len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{compress_bound, decode_footer};

    #[test]
    fn compressed_footer_describes_payload() {
        let raw = b"the quick brown fox jumps over the lazy dog";
        let out = compress(raw, CompressionPolicy::Compressed).unwrap();
        let footer = decode_footer(&out).unwrap();
        let payload = &out[..out.len() - FOOTER_SIZE];

        assert_eq!(footer.original_size as usize, compress_bound(raw.len()));
        assert_eq!(footer.compressed_size as usize, payload.len());
        assert_eq!(footer.checksum, crc32fast::hash(payload));
        assert_eq!(footer.compression_kind, 2);
        assert_eq!(&out[out.len() - 4..], b"DVPL");
    }

    #[test]
    fn stored_policy_skips_compressor() {
        let raw = b"\x89PNG not really a texture\x00\x00";
        let out = compress(raw, CompressionPolicy::Stored).unwrap();
        let footer = decode_footer(&out).unwrap();

        assert_eq!(&out[..raw.len()], raw);
        assert_eq!(out.len(), raw.len() + FOOTER_SIZE);
        assert_eq!(footer.original_size, raw.len() as u32);
        assert_eq!(footer.compressed_size, raw.len() as u32);
        assert_eq!(footer.compression_kind, 0);
    }

    #[test]
    fn empty_input_still_produces_a_container() {
        let out = compress(b"", CompressionPolicy::Compressed).unwrap();
        let footer = decode_footer(&out).unwrap();
        assert_eq!(footer.original_size, 16);
        assert_eq!(out.len(), footer.compressed_size as usize + FOOTER_SIZE);
    }

    #[test]
    fn default_policy_compresses() {
        assert_eq!(CompressionPolicy::default().kind(), CompressionKind::Lz4High);
        assert_eq!(CompressionPolicy::Stored.codec().name(), "stored");
    }
}
