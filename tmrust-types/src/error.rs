pub type Result<T> = std::result::Result<T, Error>;

/// Value-level errors: bytes that decoded but do not name a known
/// enumerated value
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),
}
