use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlicerError {
    /// Parameter ordering or range violated; raised before any audio is touched.
    #[error("invalid slicer configuration: {0}")]
    InvalidConfiguration(String),
}
