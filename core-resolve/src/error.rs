use crate::model::ProviderId;
use thiserror::Error;

/// Failure taxonomy for one lookup, and for the resolution chain as a whole.
///
/// Provider failures are never fatal on their own: the orchestrator records
/// the most recent concrete error and keeps walking the chain, so a caller
/// that sees an error here knows every provider and barcode form was tried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Credentials for the provider are absent; no network call was made.
    #[error("{provider} is not configured")]
    NotConfigured { provider: ProviderId },

    /// The provider was reached and answered with zero matches.
    #[error("{provider} returned no results")]
    NoResults { provider: ProviderId },

    /// Network failure, timeout, non-2xx status, or unparsable body.
    #[error("{provider} lookup failed: {reason}")]
    Transient { provider: ProviderId, reason: String },

    /// The caller's cancellation fired; the chain was abandoned promptly.
    #[error("lookup cancelled by caller")]
    Cancelled,

    /// No provider path exists for this operation.
    #[error("lookup not implemented")]
    NotImplemented,
}

pub type Result<T> = std::result::Result<T, ResolveError>;
