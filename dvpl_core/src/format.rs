use serde::{Deserialize, Serialize};

use crate::error::{DvplError, Result};

/// Magic tag closing every DVPL container.
pub const MAGIC: &[u8; 4] = b"DVPL";

/// Fixed size of the DVPL footer in bytes.
///   original_size:u32 + compressed_size:u32 + checksum:u32
///   + compression_kind:u32 + magic[4]
///   = 4 + 4 + 4 + 4 + 4 = 20
pub const FOOTER_SIZE: usize = 20;

/// File extension used for DVPL containers on disk.
pub const EXTENSION: &str = "dvpl";

// ── Compression kinds ──────────────────────────────────────────────────────

/// Payload interpretation selected by the footer's `compression_kind` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CompressionKind {
    /// Payload is the original bytes, untouched.
    Stored = 0,
    /// LZ4 block, fast mode.
    Lz4 = 1,
    /// LZ4 block, high-compression mode. The kind `compress` writes.
    Lz4High = 2,
}

impl CompressionKind {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn is_lz4(self) -> bool {
        matches!(self, Self::Lz4 | Self::Lz4High)
    }
}

impl TryFrom<u32> for CompressionKind {
    type Error = DvplError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Stored),
            1 => Ok(Self::Lz4),
            2 => Ok(Self::Lz4High),
            other => Err(DvplError::UnsupportedCompressionKind(other)),
        }
    }
}

/// LZ4 block bound for `len` input bytes: `len + len / 255 + 16`.
///
/// The compressor zero-pads its input up to this size, and the resulting
/// padded length is what lands in `original_size`.
pub fn compress_bound(len: usize) -> usize {
    len + len / 255 + 16
}

// ── Footer ─────────────────────────────────────────────────────────────────

/// Decoded representation of the 20-byte DVPL footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FooterData {
    /// Payload length before compression, including any zero padding.
    pub original_size: u32,
    /// Length of the payload bytes preceding the footer.
    pub compressed_size: u32,
    /// CRC-32/IEEE of the payload bytes preceding the footer.
    pub checksum: u32,
    /// Raw kind value; only 0, 1 and 2 are valid (see [`CompressionKind`]).
    pub compression_kind: u32,
}

impl FooterData {
    /// Serialize to exactly `FOOTER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; FOOTER_SIZE] {
        let mut buf = [0u8; FOOTER_SIZE];
        buf[0..4].copy_from_slice(&self.original_size.to_le_bytes());
        buf[4..8].copy_from_slice(&self.compressed_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        buf[12..16].copy_from_slice(&self.compression_kind.to_le_bytes());
        buf[16..20].copy_from_slice(MAGIC);
        buf
    }

    /// Deserialize from `FOOTER_SIZE` bytes, checking only the magic.
    pub fn from_bytes(buf: &[u8; FOOTER_SIZE]) -> Result<Self> {
        let found = word(buf, 16);
        if &found != MAGIC {
            return Err(DvplError::InvalidMagic { found });
        }
        Ok(Self {
            original_size: u32::from_le_bytes(word(buf, 0)),
            compressed_size: u32::from_le_bytes(word(buf, 4)),
            checksum: u32::from_le_bytes(word(buf, 8)),
            compression_kind: u32::from_le_bytes(word(buf, 12)),
        })
    }

    /// Parse the footer from the last `FOOTER_SIZE` bytes of `container`.
    pub fn from_container(container: &[u8]) -> Result<Self> {
        let (_, trailer) = split_container(container)?;
        Self::from_bytes(trailer)
    }

    /// Typed view of `compression_kind`.
    pub fn kind(&self) -> Result<CompressionKind> {
        CompressionKind::try_from(self.compression_kind)
    }
}

fn word(buf: &[u8; FOOTER_SIZE], at: usize) -> [u8; 4] {
    [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]
}

/// Split a container into its payload and its 20-byte trailer.
pub(crate) fn split_container(container: &[u8]) -> Result<(&[u8], &[u8; FOOTER_SIZE])> {
    let payload_len = container
        .len()
        .checked_sub(FOOTER_SIZE)
        .ok_or(DvplError::Truncated { len: container.len() })?;
    let (payload, trailer) = container.split_at(payload_len);
    let trailer = trailer
        .try_into()
        .map_err(|_| DvplError::Truncated { len: container.len() })?;
    Ok((payload, trailer))
}

/// Decode the footer at the end of `buffer`.
///
/// Only the magic is checked here; size, checksum and kind validation is the
/// decompressor's job.
pub fn decode_footer(buffer: &[u8]) -> Result<FooterData> {
    FooterData::from_container(buffer)
}

/// Encode `footer` into its 20-byte on-disk form.
pub fn encode_footer(footer: &FooterData) -> [u8; FOOTER_SIZE] {
    footer.to_bytes()
}
