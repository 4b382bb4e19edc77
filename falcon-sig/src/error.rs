use alloc::string::String;

use thiserror::Error;

/// Errors raised by key generation, signing and signature decoding.
///
/// Some variants only ever appear inside rejection-sampling loops, where they tell the loop to
/// draw fresh randomness; see [FalconError::is_retryable].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FalconError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("compressed polynomial does not fit into {max_bytes} bytes")]
    EncodingOverflow { max_bytes: usize },
    #[error("malformed signature: {0}")]
    MalformedSignature(&'static str),
    #[error("squared norm {norm} exceeds the bound {bound}")]
    NormBoundExceeded { norm: u64, bound: u64 },
    #[error("polynomial is not invertible modulo q")]
    NonInvertible,
    #[error("no solution to the NTRU equation for the sampled f and g")]
    NtruUnsolvable,
}

impl FalconError {
    /// Returns true if the error only means that the current attempt has to be repeated with
    /// fresh randomness.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EncodingOverflow { .. }
                | Self::NormBoundExceeded { .. }
                | Self::NonInvertible
                | Self::NtruUnsolvable
        )
    }
}

/// Outcome of a single pass through a rejection-sampling loop.
pub(crate) enum Attempt<T> {
    Accept(T),
    Retry(FalconError),
}

impl<T> From<Result<T, FalconError>> for Attempt<T> {
    fn from(result: Result<T, FalconError>) -> Self {
        match result {
            Ok(value) => Self::Accept(value),
            Err(err) => Self::Retry(err),
        }
    }
}
