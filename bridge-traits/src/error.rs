use thiserror::Error;

/// Failure of a host-supplied capability.
///
/// Bridge implementations fold their platform errors into these variants;
/// the core crates translate them into domain errors at the seam.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host did not wire up this capability.
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    /// The capability exists but the operation failed.
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
