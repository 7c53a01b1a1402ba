use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store: encode: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("store: decode: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("store: invalid format: {0}")]
    InvalidFormat(String),

    #[error("store: column {column} has {got} entries, want {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("store: unknown item {0:?}")]
    UnknownItem(String),
}
