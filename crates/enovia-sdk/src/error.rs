//! SDK error types.
//!
//! [`EnoviaError`] is the single error type returned by every fallible
//! operation in the SDK. Its variants follow the lifecycle of the client:
//! configuration problems are fatal at startup, authentication failures are
//! fatal for the session, download failures only affect the call that raised
//! them, and local write failures are kept apart from protocol failures.

use std::path::PathBuf;

use enovia_models::{AuthStep, DownloadStep, ModelError};
use reqwest::StatusCode;

/// Longest server body excerpt carried in an error message.
const BODY_EXCERPT: usize = 200;

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum EnoviaError {
    /// Missing or invalid configuration (e.g. unset `SERVICE_SECRET`).
    #[error("configuration error: {0}")]
    Config(String),

    /// A step of the session bootstrap was rejected or unreachable.
    ///
    /// The whole bootstrap is one transaction: no partial session survives.
    #[error("authentication failed at {step}: {reason}")]
    Auth {
        /// Step that failed.
        step: AuthStep,
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// Human-readable explanation.
        reason: String,
    },

    /// A step of a file download was rejected or unreachable.
    ///
    /// The session stays usable; the download must restart from the
    /// document fetch.
    #[error("download failed at {step}: {reason}")]
    Download {
        /// Step that failed.
        step: DownloadStep,
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// Human-readable explanation.
        reason: String,
    },

    /// Writing the downloaded bytes to disk failed.
    #[error("I/O error writing {}: {source}", .path.display())]
    Io {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A caller-supplied value failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ModelError),
}

impl EnoviaError {
    pub(crate) fn auth(
        step: AuthStep,
        status: Option<StatusCode>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Auth {
            step,
            status: status.map(|s| s.as_u16()),
            reason: reason.into(),
        }
    }

    pub(crate) fn download(
        step: DownloadStep,
        status: Option<StatusCode>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Download {
            step,
            status: status.map(|s| s.as_u16()),
            reason: reason.into(),
        }
    }

    /// HTTP status attached to an authentication or download failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Download { status, .. } => *status,
            _ => None,
        }
    }

    /// `true` when a download step was answered with `401 Unauthorized`,
    /// which is how 3DSpace reports an expired or unknown session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Download { status: Some(401), .. })
    }
}

/// Describe a non-2xx answer, including the start of its body.
pub(crate) fn rejection(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("server answered {status}");
    }
    let excerpt: String = body.chars().take(BODY_EXCERPT).collect();
    let ellipsis = if body.chars().count() > BODY_EXCERPT { "…" } else { "" };
    format!("server answered {status}: {excerpt}{ellipsis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_display_names_step() {
        let err = EnoviaError::auth(
            AuthStep::ServiceTicket,
            Some(StatusCode::UNAUTHORIZED),
            "server answered 401 Unauthorized",
        );
        assert_eq!(
            err.to_string(),
            "authentication failed at service ticket: server answered 401 Unauthorized"
        );
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_session_expired());
    }

    #[test]
    fn download_401_is_session_expiry() {
        let err =
            EnoviaError::download(DownloadStep::Document, Some(StatusCode::UNAUTHORIZED), "x");
        assert!(err.is_session_expired());
        let err =
            EnoviaError::download(DownloadStep::TicketIssuance, Some(StatusCode::FORBIDDEN), "x");
        assert!(!err.is_session_expired());
        let err = EnoviaError::download(DownloadStep::TicketRedemption, None, "timeout");
        assert!(!err.is_session_expired());
    }

    #[test]
    fn io_display_includes_path() {
        let err = EnoviaError::Io {
            path: PathBuf::from("/tmp/out.bin"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "I/O error writing /tmp/out.bin: denied");
    }

    #[test]
    fn rejection_truncates_long_bodies() {
        let body = "x".repeat(500);
        let msg = rejection(StatusCode::FORBIDDEN, &body);
        assert!(msg.starts_with("server answered 403 Forbidden: "));
        assert!(msg.ends_with('…'));
        assert!(msg.len() < 300);
        assert_eq!(
            rejection(StatusCode::NOT_FOUND, "  "),
            "server answered 404 Not Found"
        );
    }

    #[test]
    fn model_error_converts() {
        let err: EnoviaError = enovia_models::DocumentId::new("").unwrap_err().into();
        assert!(matches!(err, EnoviaError::InvalidInput(_)));
    }
}
