use thiserror::Error;

/// Every way a DVPL encode or decode can fail.
///
/// None of these are retried or recovered from inside the crate; they are
/// returned to the caller as soon as the offending check fails.
#[derive(Error, Debug)]
pub enum DvplError {
    #[error("buffer of {len} bytes is too short to hold a 20-byte DVPL footer")]
    Truncated { len: usize },

    #[error("invalid footer magic {found:?}, expected \"DVPL\"")]
    InvalidMagic { found: [u8; 4] },

    #[error("payload is {actual} bytes but the footer says {expected}")]
    SizeMismatch { expected: u32, actual: usize },

    #[error("payload crc32 {actual:08x} does not match footer checksum {expected:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("stored payload has original size {original} but compressed size {compressed}")]
    InconsistentStoredSize { original: u32, compressed: u32 },

    #[error("unsupported compression kind {0}; DVPL only defines kinds 0 to 2")]
    UnsupportedCompressionKind(u32),

    #[error("lz4 block decompression failed")]
    DecompressionFailure(#[source] lz4_flex::block::DecompressError),

    #[error("lz4 block compression failed")]
    CompressionFailure(#[source] lz4_flex::block::CompressError),

    #[error("payload of {len} bytes does not fit in a DVPL footer size field")]
    PayloadTooLarge { len: usize },
}

pub type Result<T> = std::result::Result<T, DvplError>;
