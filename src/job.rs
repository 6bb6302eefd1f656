//! Wire types for the remote conversion job.
//!
//! [`JobHandle`] is the opaque identifier returned by the submission
//! endpoint; [`JobStatus`] is the snapshot returned by each status query.
//! Snapshots are produced anew on every poll — only the most recent one is
//! ever kept, there is no history.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque job identifier returned by the service on successful upload.
///
/// Owned by the orchestrator for the duration of the workflow and passed by
/// value into the poll and retrieval phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job processing state as reported by the status endpoint.
///
/// The service emits intermediate labels beyond the documented four (e.g.
/// `"loaded"`, `"split"` while ingesting); those arrive as
/// [`JobState::Other`] and are treated as non-terminal so an API addition
/// never aborts a running job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Error,
    /// Any label this client does not know; kept verbatim for display.
    Other(String),
}

impl JobState {
    /// `completed` or `error` — either ends the poll loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Error)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => f.write_str("pending"),
            JobState::Processing => f.write_str("processing"),
            JobState::Completed => f.write_str("completed"),
            JobState::Error => f.write_str("error"),
            JobState::Other(label) => f.write_str(label),
        }
    }
}

impl<'de> Deserialize<'de> for JobState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(match label.as_str() {
            "pending" => JobState::Pending,
            "processing" => JobState::Processing,
            "completed" => JobState::Completed,
            "error" => JobState::Error,
            _ => JobState::Other(label),
        })
    }
}

/// One status snapshot for a job.
///
/// The raw decoded body is retained alongside the typed fields: completed
/// snapshots carry per-format retrieval URLs under format-named keys
/// (`{"tex.zip": {"url": …}}`), and error snapshots are reported to the
/// caller verbatim as the service diagnostic.
#[derive(Debug, Clone)]
pub struct JobStatus {
    pub state: JobState,
    /// Completion percentage, 0–100. Absent on early snapshots.
    pub percent_done: u8,
    raw: serde_json::Value,
}

impl JobStatus {
    /// Decode a snapshot from the status endpoint's JSON body.
    ///
    /// Returns `None` when the body lacks a `status` field (malformed
    /// success response); callers turn that into a protocol error with the
    /// raw body attached.
    pub fn from_value(raw: serde_json::Value) -> Option<Self> {
        let state: JobState = serde_json::from_value(raw.get("status")?.clone()).ok()?;
        let percent_done = raw
            .get("percent_done")
            .and_then(|v| v.as_u64())
            .map(|v| v.min(100) as u8)
            .unwrap_or(0);
        Some(Self {
            state,
            percent_done,
            raw,
        })
    }

    /// Direct retrieval URL for the given output format, if the snapshot
    /// carries one.
    pub fn retrieval_url(&self, format: &str) -> Option<&str> {
        self.raw.get(format)?.get("url")?.as_str()
    }

    /// The full decoded body, for diagnostics.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn state_decodes_known_labels() {
        let status = JobStatus::from_value(json!({"status": "processing"})).unwrap();
        assert_eq!(status.state, JobState::Processing);
        assert_eq!(status.percent_done, 0);
        assert!(!status.state.is_terminal());
    }

    #[test]
    fn state_keeps_unknown_label_nonterminal() {
        let status = JobStatus::from_value(json!({"status": "split", "percent_done": 5})).unwrap();
        assert_eq!(status.state, JobState::Other("split".to_string()));
        assert_eq!(status.state.to_string(), "split");
        assert!(!status.state.is_terminal());
    }

    #[test]
    fn completed_snapshot_exposes_format_url() {
        let status = JobStatus::from_value(json!({
            "status": "completed",
            "percent_done": 100,
            "tex.zip": {"url": "https://cdn.example.com/job.tex.zip"}
        }))
        .unwrap();
        assert!(status.state.is_terminal());
        assert_eq!(status.percent_done, 100);
        assert_eq!(
            status.retrieval_url("tex.zip"),
            Some("https://cdn.example.com/job.tex.zip")
        );
        assert_eq!(status.retrieval_url("docx"), None);
    }

    #[test]
    fn percent_is_clamped_to_100() {
        let status =
            JobStatus::from_value(json!({"status": "processing", "percent_done": 250})).unwrap();
        assert_eq!(status.percent_done, 100);
    }

    #[test]
    fn missing_status_field_is_rejected() {
        assert!(JobStatus::from_value(json!({"percent_done": 10})).is_none());
        assert!(JobStatus::from_value(json!("not an object")).is_none());
    }
}
