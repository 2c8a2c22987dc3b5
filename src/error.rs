use thiserror::Error;

/// Errors produced by virtual file operations and the record stores behind them.
///
/// Every kind is distinct and matchable; nothing is retried or swallowed
/// internally. Store failures during `close` propagate as-is.
#[derive(Debug, Error)]
pub enum FsError {
    /// Any operation (other than a repeated `close`) on a closed handle.
    #[error("i/o operation on closed file")]
    Closed,

    /// `read`/`readline`/`readlines` on a file whose mode has no read permission.
    #[error("file not open for reading")]
    NotReadable,

    /// `write` on a file whose mode has no write permission.
    #[error("file not open for writing")]
    NotWritable,

    /// A mode string that is not a recognized combination of `r`/`w`/`a`/`+`/`b`/`t`.
    #[error("invalid open mode: {0:?}")]
    InvalidMode(String),

    /// A seek that resolves to a negative (or unrepresentable) position.
    #[error("seek resolves outside the addressable range: {0}")]
    InvalidSeek(i64),

    /// Text-mode encode/decode attempted with no encoding set.
    /// Checked defensively at each codec site; does not occur under normal construction.
    #[error("encoding is not set")]
    EncodingMissing,

    /// A text operation on a binary-mode file.
    #[error("text data passed to a binary-mode file")]
    TypeMismatch,

    /// The buffer contains bytes the file's encoding cannot decode.
    #[error("cannot decode buffer as {0}")]
    Decode(&'static str),

    /// The input contains characters the file's encoding cannot represent.
    #[error("cannot encode text as {0}")]
    Encode(&'static str),

    /// The SQLite record store failed.
    #[error("record store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Host filesystem failure while dispatching outside the virtual boundary.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;
