//! Error types for the pdf2tex library.
//!
//! Every error here is **fatal** to the workflow: the conversion pipeline is
//! a single linear chain (upload → poll → retrieve) and no phase retries on
//! its own. The only wait-and-see behaviour in the crate is the bounded poll
//! loop, which waits for service-side completion — it never re-issues a
//! request that already failed.
//!
//! The variants deliberately separate failure *origins* so operators can
//! tell local misconfiguration ([`Pdf2TexError::MissingCredentials`],
//! [`Pdf2TexError::FileNotFound`]) from network trouble
//! ([`Pdf2TexError::Transport`], [`Pdf2TexError::Http`]) from a service
//! that answered 200 with the wrong shape ([`Pdf2TexError::Protocol`]) from
//! a job the service itself gave up on ([`Pdf2TexError::JobFailed`]).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// All errors returned by the pdf2tex library.
#[derive(Debug, Error)]
pub enum Pdf2TexError {
    // ── Local preconditions ───────────────────────────────────────────────
    /// One or both credential environment variables are absent or empty.
    ///
    /// Carries the exact variable names so the fix is obvious; checked
    /// before any network call is attempted.
    #[error(
        "Missing environment variables: {}\nGet credentials at https://accounts.mathpix.com/",
        missing.join(", ")
    )]
    MissingCredentials { missing: Vec<&'static str> },

    /// Input PDF was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    // ── Network errors ────────────────────────────────────────────────────
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}\nResponse body: {body}")]
    Transport {
        url: String,
        status: u16,
        body: String,
    },

    /// The request could not be sent or the response body could not be read.
    #[error("Request to {url} failed: {source}\nCheck your internet connection.")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // ── Service contract errors ───────────────────────────────────────────
    /// The service answered 200 but the body violates the expected shape
    /// (e.g. a submission response without a job identifier).
    #[error("Unexpected response from conversion service: {body}")]
    Protocol { body: String },

    /// The service explicitly reported the job as failed.
    #[error("Conversion job failed: {detail}")]
    JobFailed { detail: String },

    /// The job never reached a terminal state within the poll budget.
    #[error("Timed out waiting for conversion after {}s", elapsed.as_secs())]
    Timeout { elapsed: Duration },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The downloaded archive could not be read or extracted.
    #[error("Failed to extract archive '{path}': {reason}")]
    Archive { path: PathBuf, reason: String },

    /// Could not create or write into the destination directory.
    #[error("Failed to write output under '{path}': {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_names_every_variable() {
        let e = Pdf2TexError::MissingCredentials {
            missing: vec!["MATHPIX_APP_ID", "MATHPIX_API_KEY"],
        };
        let msg = e.to_string();
        assert!(msg.contains("MATHPIX_APP_ID"), "got: {msg}");
        assert!(msg.contains("MATHPIX_API_KEY"), "got: {msg}");
        assert!(msg.contains("accounts.mathpix.com"), "got: {msg}");
    }

    #[test]
    fn transport_display_carries_status_and_body() {
        let e = Pdf2TexError::Transport {
            url: "https://api.example.com/v3/pdf".into(),
            status: 401,
            body: r#"{"error":"unauthorized"}"#.into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("unauthorized"));
    }

    #[test]
    fn timeout_display_reports_elapsed_seconds() {
        let e = Pdf2TexError::Timeout {
            elapsed: Duration::from_secs(600),
        };
        assert!(e.to_string().contains("600s"));
    }

    #[test]
    fn job_failed_display_carries_diagnostic() {
        let e = Pdf2TexError::JobFailed {
            detail: r#"{"status":"error","error_info":{"id":"pdf_encrypted"}}"#.into(),
        };
        assert!(e.to_string().contains("pdf_encrypted"));
    }
}
