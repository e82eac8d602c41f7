//! Error types for campaign-sync.

use std::fmt;

use thiserror::Error;

use campaign_core::CampaignId;

/// Failure of a single call against the campaign source or the record store.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, DNS, TLS or timeout failure; no HTTP status was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Run-fatal errors: the run aborts before any record is written.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The campaign list could not be fetched.
    #[error("campaign source unavailable: {0}")]
    SourceUnavailable(#[source] ApiError),

    /// The known-identifier index could not be fetched from the record store.
    #[error("record store unavailable: {0}")]
    StoreUnavailable(#[source] ApiError),
}

/// Which write a [`RecordWriteFailed`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteKind::Create => write!(f, "create"),
            WriteKind::Update => write!(f, "update"),
        }
    }
}

/// Non-fatal error: one create/update call failed, the run continued.
#[derive(Debug, Error)]
#[error("{kind} failed for campaign {id}: {source}")]
pub struct RecordWriteFailed {
    pub id: CampaignId,
    pub kind: WriteKind,
    #[source]
    pub source: ApiError,
}

/// Bodies of error responses are cut to this many characters before logging.
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 300;

/// Map a ureq outcome onto [`ApiError`], keeping a preview of error bodies.
pub(crate) fn from_ureq(result: Result<ureq::Response, ureq::Error>) -> Result<ureq::Response, ApiError> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(ApiError::Status {
                status,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            })
        }
        Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport(transport.to_string())),
    }
}

/// Read a response body as text.
pub(crate) fn read_body(response: ureq::Response) -> Result<String, ApiError> {
    response
        .into_string()
        .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))
}
