use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),
}
