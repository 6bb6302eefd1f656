//! Progress-observer trait for workflow events.
//!
//! Inject an [`Arc<dyn ConversionProgress>`] via
//! [`crate::config::ConversionConfigBuilder::progress`] to receive events
//! as the workflow moves through its phases. The poll phase invokes
//! [`ConversionProgress::on_status`] on every iteration, which is how the
//! CLI renders its in-place "status (percent)" line without the polling
//! algorithm knowing anything about terminals.
//!
//! # Why a callback instead of a channel?
//!
//! The observer is the least-invasive integration point: callers can
//! forward events to a progress bar, a log, or a channel of their own
//! without the library prescribing a transport. The trait is `Send + Sync`
//! so a workflow can be spawned onto a worker task.

use crate::job::{JobHandle, JobState};
use std::path::Path;
use std::sync::Arc;

/// Called by the workflow as it progresses.
///
/// All methods have default no-op implementations so implementors only
/// override what they care about. Status reports are monotonic in
/// wall-clock time; the reported percentage is whatever the service said
/// and may not be monotonic itself.
pub trait ConversionProgress: Send + Sync {
    /// Called once before the upload request is sent.
    fn on_upload_start(&self, path: &Path) {
        let _ = path;
    }

    /// Called when the service has accepted the upload and assigned a job.
    fn on_submitted(&self, job: &JobHandle) {
        let _ = job;
    }

    /// Called on every poll iteration with the freshly decoded snapshot.
    fn on_status(&self, state: &JobState, percent: u8) {
        let _ = (state, percent);
    }

    /// Called just before the output archive download begins.
    fn on_download_start(&self, url: &str) {
        let _ = url;
    }

    /// Called after extraction with the number of files written.
    fn on_extracted(&self, files: usize) {
        let _ = files;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl ConversionProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressHandle = Arc<dyn ConversionProgress>;
