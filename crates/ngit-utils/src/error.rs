/// Base error type for ngit-utils operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("date parse error: {0}")]
    DateParse(String),

    #[error("signature parse error: {0}")]
    SignatureParse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
