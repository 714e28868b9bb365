use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size};

use crate::error::{DvplError, Result};
use crate::format::{compress_bound, CompressionKind, FooterData};

/// Payload bytes produced by a codec, plus the size to record as
/// `original_size` in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub bytes: Vec<u8>,
    /// Input length after any padding the codec applied.
    pub original_size: usize,
}

/// Payload transformation for one family of compression kinds.
///
/// Implementations are stateless: the footer of a verified container carries
/// everything `decode` needs. Integrity checks (size, checksum) are done by
/// the caller before `decode` is reached.
pub trait PayloadCodec: Send + Sync {
    /// Kind written into the footer by `encode`.
    fn kind(&self) -> CompressionKind;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    fn encode(&self, raw: &[u8]) -> Result<EncodedPayload>;

    /// Reconstitute the original bytes from a payload whose size and checksum
    /// already matched `footer`.
    fn decode(&self, payload: &[u8], footer: &FooterData) -> Result<Vec<u8>>;
}

/// Kind 0: the payload is the original bytes.
pub struct StoredCodec;

impl PayloadCodec for StoredCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Stored
    }

    fn name(&self) -> &'static str {
        "stored"
    }

    fn encode(&self, raw: &[u8]) -> Result<EncodedPayload> {
        Ok(EncodedPayload {
            bytes: raw.to_vec(),
            original_size: raw.len(),
        })
    }

    fn decode(&self, payload: &[u8], footer: &FooterData) -> Result<Vec<u8>> {
        if footer.original_size != footer.compressed_size {
            return Err(DvplError::InconsistentStoredSize {
                original: footer.original_size,
                compressed: footer.compressed_size,
            });
        }
        Ok(payload.to_vec())
    }
}

/// Kinds 1 and 2: a single LZ4 block over the zero-padded input.
///
/// The input is padded with zeros up to [`compress_bound`] before
/// compression, and every trailing zero is stripped after decompression.
/// Original data ending in `0x00` therefore loses those bytes on decode;
/// existing containers depend on this behaviour, so it is kept.
pub struct Lz4Codec;

impl PayloadCodec for Lz4Codec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Lz4High
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn encode(&self, raw: &[u8]) -> Result<EncodedPayload> {
        let bound = compress_bound(raw.len());
        let mut padded = Vec::with_capacity(bound);
        padded.extend_from_slice(raw);
        padded.resize(bound, 0);

        let mut out = vec![0u8; get_maximum_output_size(padded.len())];
        let written = compress_into(&padded, &mut out).map_err(DvplError::CompressionFailure)?;
        out.truncate(written);

        Ok(EncodedPayload {
            bytes: out,
            original_size: padded.len(),
        })
    }

    fn decode(&self, payload: &[u8], footer: &FooterData) -> Result<Vec<u8>> {
        let mut out = vec![0u8; footer.original_size as usize];
        let written = decompress_into(payload, &mut out).map_err(DvplError::DecompressionFailure)?;
        out.truncate(written);
        strip_trailing_zeros(&mut out);
        Ok(out)
    }
}

/// Drop every trailing `0x00`, keeping up to and including the last non-zero
/// byte. An all-zero buffer becomes empty.
pub fn strip_trailing_zeros(buf: &mut Vec<u8>) {
    let end = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    buf.truncate(end);
}

static STORED: StoredCodec = StoredCodec;
static LZ4: Lz4Codec = Lz4Codec;

/// Resolve the codec that decodes payloads of `kind`.
pub fn codec_for_kind(kind: CompressionKind) -> &'static dyn PayloadCodec {
    match kind {
        CompressionKind::Stored => &STORED,
        CompressionKind::Lz4 | CompressionKind::Lz4High => &LZ4,
    }
}
