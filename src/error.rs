/// Error taxonomy for a validation run
use thiserror::Error;

/// Errors raised while validating the installed kubectl
///
/// Only [`ValidationError::ClientNotInstalled`] aborts a run. The other
/// variants are logged and reported as an ordinary failed validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The client could not be run, or its version report was unusable.
    #[error("kubectl not installed ({binary}): {reason}")]
    ClientNotInstalled { binary: String, reason: String },

    /// Resolving `latest` failed before any version was received.
    #[error("failed to resolve latest version: {0:#}")]
    Resolution(#[source] anyhow::Error),

    /// No meaningful comparison is possible.
    #[error("cannot compare versions: {reason}")]
    Comparison { reason: String },
}

impl ValidationError {
    /// Whether this error terminates the run instead of failing the validation
    pub fn is_fatal(&self) -> bool {
        matches!(self, ValidationError::ClientNotInstalled { .. })
    }
}
