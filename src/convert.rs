//! Workflow orchestration entry points.
//!
//! [`convert`] runs the four phases in strict sequence — credential check
//! is the caller's job (a [`crate::config::Credentials`] value cannot exist
//! half-resolved), then upload → poll → retrieve. Each phase's full output
//! is the next phase's full input; a failure anywhere aborts the whole run
//! with no partial retry. This is a linear pipeline, not a resumable state
//! machine.

use crate::config::{ConversionConfig, Credentials};
use crate::error::Pdf2TexError;
use crate::output::{ConversionOutput, ConversionStats};
use crate::pipeline::{poll, retrieve, upload};
use reqwest::Client;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Convert a local PDF to LaTeX via the remote service.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `pdf_path`    — local PDF file (must exist)
/// * `output_dir`  — destination for the extracted output (created if absent)
/// * `credentials` — the resolved service secrets
/// * `config`      — endpoint, formats, and poll budget
///
/// # Errors
/// Any [`Pdf2TexError`]; every failure kind is fatal and distinct (see the
/// crate-level docs for the taxonomy).
///
/// # Example
/// ```rust,no_run
/// use pdf2tex::{convert, ConversionConfig, Credentials};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::from_env()?;
/// let config = ConversionConfig::default();
/// let output = convert("paper.pdf", "out/", &credentials, &config).await?;
/// println!("{}", output.output.resolved_path().display());
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    credentials: &Credentials,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TexError> {
    let pdf_path = pdf_path.as_ref();
    let output_dir = output_dir.as_ref();
    let total_start = Instant::now();

    // ── Step 1: Local precondition ───────────────────────────────────────
    if !pdf_path.is_file() {
        return Err(Pdf2TexError::FileNotFound {
            path: pdf_path.to_path_buf(),
        });
    }
    info!("Starting conversion: {}", pdf_path.display());

    let client = Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| Pdf2TexError::InvalidConfig(format!("HTTP client: {e}")))?;

    // ── Step 2: Upload ───────────────────────────────────────────────────
    if let Some(progress) = &config.progress {
        progress.on_upload_start(pdf_path);
    }
    let upload_start = Instant::now();
    let job_id = upload::submit(&client, credentials, config, pdf_path).await?;
    let upload_ms = upload_start.elapsed().as_millis() as u64;
    if let Some(progress) = &config.progress {
        progress.on_submitted(&job_id);
    }
    info!("Uploaded in {}ms, job id: {}", upload_ms, job_id);

    // ── Step 3: Poll until terminal ──────────────────────────────────────
    let poll_start = Instant::now();
    let (status, status_queries) =
        poll::wait_with_count(&client, credentials, config, &job_id).await?;
    let poll_ms = poll_start.elapsed().as_millis() as u64;
    info!(
        "Job {} completed after {} queries ({}ms)",
        job_id, status_queries, poll_ms
    );

    // ── Step 4: Retrieve and extract ─────────────────────────────────────
    let download_start = Instant::now();
    let output =
        retrieve::fetch_output(&client, credentials, config, &job_id, &status, output_dir).await?;
    let download_ms = download_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        upload_ms,
        poll_ms,
        download_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
        status_queries,
        extracted_files: output.files.len(),
    };
    info!(
        "Conversion done: {} ({}ms total)",
        output.resolved_path().display(),
        stats.total_ms
    );

    Ok(ConversionOutput {
        job_id,
        output,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally. For callers that are not
/// already async; the workflow itself is unchanged.
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    credentials: &Credentials,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2TexError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2TexError::InvalidConfig(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(pdf_path, output_dir, credentials, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn convert_rejects_missing_input_before_any_network_call() {
        let credentials = Credentials::new("id", "key").unwrap();
        let config = ConversionConfig::default();

        let err = convert(
            "/definitely/not/a/real/file.pdf",
            "/tmp/pdf2tex-nowhere",
            &credentials,
            &config,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Pdf2TexError::FileNotFound { .. }));
    }
}
