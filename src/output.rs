//! Result types returned by a completed workflow run.

use crate::job::JobHandle;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The files materialised on disk after archive extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedOutput {
    /// Destination directory everything was extracted into.
    pub dir: PathBuf,
    /// Every file written during extraction, in archive order.
    pub files: Vec<PathBuf>,
    /// The first file matching the configured primary extension, in sorted
    /// recursive traversal order. `None` when the archive contained no such
    /// file — a valid outcome, not an error.
    pub primary: Option<PathBuf>,
}

impl ExtractedOutput {
    /// The most useful path to hand to the user: the primary output file
    /// when one was found, otherwise the destination directory itself.
    ///
    /// Callers that need a file specifically should match on
    /// [`ExtractedOutput::primary`] instead.
    pub fn resolved_path(&self) -> &Path {
        self.primary.as_deref().unwrap_or(&self.dir)
    }
}

/// Final result of a conversion workflow.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Identifier the service assigned to the job.
    pub job_id: JobHandle,
    /// Extracted files and the located primary output.
    pub output: ExtractedOutput,
    /// Per-phase timing and polling statistics.
    pub stats: ConversionStats,
}

/// Wall-clock timings for each phase of a workflow run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub upload_ms: u64,
    pub poll_ms: u64,
    pub download_ms: u64,
    pub total_ms: u64,
    /// Number of status queries issued by the poll phase.
    pub status_queries: u32,
    pub extracted_files: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_path_prefers_primary_file() {
        let out = ExtractedOutput {
            dir: PathBuf::from("/out"),
            files: vec![PathBuf::from("/out/a.tex")],
            primary: Some(PathBuf::from("/out/a.tex")),
        };
        assert_eq!(out.resolved_path(), Path::new("/out/a.tex"));
    }

    #[test]
    fn resolved_path_falls_back_to_directory() {
        let out = ExtractedOutput {
            dir: PathBuf::from("/out"),
            files: vec![PathBuf::from("/out/fig.png")],
            primary: None,
        };
        assert_eq!(out.resolved_path(), Path::new("/out"));
    }
}
