//! Error types for the cloudpdf library.
//!
//! Every failure is fatal: no stage recovers and nothing is retried, so a
//! single enum, [`ConvertError`], covers the whole run. Variants are grouped
//! by where the failure originates:
//!
//! * **Configuration**: detected by [`crate::config::ConversionConfigBuilder::build`]
//!   before any network request is issued.
//! * **Input**: the source document cannot be read or its media type is unknown.
//! * **Transport / HTTP**: a request could not be sent, or the service answered
//!   with a non-success status. Statuses are surfaced verbatim, with no
//!   classification by cause.
//! * **Protocol**: the service answered successfully but broke its own contract
//!   (missing `Location` header, unknown job status, malformed JSON).
//! * **Polling**: the job did not finish within the configured budget, or the
//!   caller cancelled the wait.
//! * **Local I/O**: the converted PDF could not be written.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The pipeline stage a network error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Authenticate,
    AllocateAsset,
    Upload,
    RequestConversion,
    Poll,
    Download,
    Cleanup,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ALL: [Stage; 7] = [
        Stage::Authenticate,
        Stage::AllocateAsset,
        Stage::Upload,
        Stage::RequestConversion,
        Stage::Poll,
        Stage::Download,
        Stage::Cleanup,
    ];

    /// Short human-readable label used in logs and progress output.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Authenticate => "authenticate",
            Stage::AllocateAsset => "allocate asset",
            Stage::Upload => "upload",
            Stage::RequestConversion => "request conversion",
            Stage::Poll => "poll status",
            Stage::Download => "download",
            Stage::Cleanup => "delete asset",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// All errors returned by the cloudpdf library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Client id or secret is empty or still set to the placeholder value.
    #[error(
        "Client ID or secret not set.\n\
Provide --client-id/--client-secret or set PDF_SERVICES_CLIENT_ID and PDF_SERVICES_CLIENT_SECRET."
    )]
    MissingCredentials,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// No media type is known for the input's extension.
    #[error("Cannot determine media type of '{path}'\nPass --media-type explicitly.")]
    UnsupportedInput { path: PathBuf },

    /// Reading the source document failed after it was opened.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport / HTTP errors ───────────────────────────────────────────
    /// The request could not be sent or its body could not be received.
    #[error("{stage}: request failed: {source}")]
    Transport {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{stage}: HTTP {status}: {body}")]
    HttpStatus {
        stage: Stage,
        status: u16,
        body: String,
    },

    // ── Protocol errors ───────────────────────────────────────────────────
    /// A success response did not have the expected shape.
    #[error("{stage}: invalid response: {detail}")]
    InvalidResponse { stage: Stage, detail: String },

    /// The conversion request succeeded but carried no `Location` header.
    #[error("request conversion: response has no Location header")]
    MissingLocation,

    /// The status endpoint reported a value other than `in progress` or `done`.
    #[error("Unknown status: {status}")]
    UnexpectedStatus { status: String },

    // ── Polling errors ────────────────────────────────────────────────────
    /// The job was still running when the polling budget ran out.
    #[error("Conversion did not finish after {attempts} status checks in {elapsed_secs}s\nIncrease --poll-timeout.")]
    PollTimeout { attempts: u32, elapsed_secs: u64 },

    /// The caller cancelled the run while it was waiting on the service.
    #[error("Conversion cancelled")]
    Cancelled,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Cleanup ───────────────────────────────────────────────────────────
    /// Conversion succeeded but the remote asset could not be deleted.
    #[error("PDF written, but deleting remote asset '{asset_id}' failed: {source}")]
    CleanupFailed {
        asset_id: String,
        #[source]
        source: Box<ConvertError>,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Stage the error was raised in, when it came from the network.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ConvertError::Transport { stage, .. }
            | ConvertError::HttpStatus { stage, .. }
            | ConvertError::InvalidResponse { stage, .. } => Some(*stage),
            ConvertError::MissingLocation => Some(Stage::RequestConversion),
            ConvertError::UnexpectedStatus { .. }
            | ConvertError::PollTimeout { .. }
            | ConvertError::Cancelled => Some(Stage::Poll),
            ConvertError::CleanupFailed { .. } => Some(Stage::Cleanup),
            _ => None,
        }
    }

    /// HTTP status code, when the service answered with a non-success status.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ConvertError::HttpStatus { status, .. } => Some(*status),
            ConvertError::CleanupFailed { source, .. } => source.http_status(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_carries_literal() {
        let e = ConvertError::UnexpectedStatus {
            status: "failed".into(),
        };
        assert!(e.to_string().contains("failed"), "got: {e}");
        assert_eq!(e.stage(), Some(Stage::Poll));
    }

    #[test]
    fn http_status_display() {
        let e = ConvertError::HttpStatus {
            stage: Stage::Authenticate,
            status: 401,
            body: "invalid_client".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("authenticate"), "got: {msg}");
        assert!(msg.contains("401"), "got: {msg}");
        assert!(msg.contains("invalid_client"), "got: {msg}");
        assert_eq!(e.http_status(), Some(401));
    }

    #[test]
    fn poll_timeout_display() {
        let e = ConvertError::PollTimeout {
            attempts: 12,
            elapsed_secs: 30,
        };
        assert!(e.to_string().contains("12 status checks"));
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn cleanup_failure_exposes_inner_status() {
        let e = ConvertError::CleanupFailed {
            asset_id: "a1".into(),
            source: Box::new(ConvertError::HttpStatus {
                stage: Stage::Cleanup,
                status: 404,
                body: String::new(),
            }),
        };
        assert!(e.to_string().contains("a1"));
        assert_eq!(e.http_status(), Some(404));
        assert_eq!(e.stage(), Some(Stage::Cleanup));
    }

    #[test]
    fn stages_are_ordered() {
        assert_eq!(Stage::ALL.first(), Some(&Stage::Authenticate));
        assert_eq!(Stage::ALL.last(), Some(&Stage::Cleanup));
        assert_eq!(Stage::RequestConversion.to_string(), "request conversion");
    }
}
