/// Errors produced by utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("date parse error: {0}")]
    DateParse(String),

    #[error("signature parse error: {0}")]
    SignatureParse(String),
}
