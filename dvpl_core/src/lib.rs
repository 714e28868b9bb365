pub mod codec;
pub mod compress;
pub mod decompress;
pub mod error;
pub mod format;

pub use codec::{codec_for_kind, Lz4Codec, PayloadCodec, StoredCodec};
pub use compress::{compress, CompressionPolicy};
pub use decompress::{decompress, verify_payload};
pub use error::{DvplError, Result};
pub use format::{
    compress_bound, decode_footer, encode_footer, CompressionKind, FooterData, EXTENSION,
    FOOTER_SIZE, MAGIC,
};
