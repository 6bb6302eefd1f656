//! Poll phase: query job status until a terminal state or the budget runs out.
//!
//! Fixed-interval polling is a deliberate choice over exponential backoff:
//! conversion jobs are short and bounded, so adapting the interval buys
//! nothing and complicates the query-count guarantees the tests rely on.
//!
//! The inter-query sleep is clamped to the overall deadline
//! (`sleep_until(min(next, deadline))`), so the loop never oversleeps its
//! budget and the whole future stays promptly cancellable — dropping it
//! aborts at the next await point.

use crate::config::{ConversionConfig, Credentials};
use crate::error::Pdf2TexError;
use crate::job::{JobHandle, JobState, JobStatus};
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Poll the status endpoint for `job` until it completes.
///
/// Invokes the configured progress observer with `(state, percent)` on
/// every iteration. Returns the completed snapshot — the single success
/// exit of this phase.
///
/// # Errors
/// * [`Pdf2TexError::Transport`] / [`Pdf2TexError::Http`] — a hard network
///   failure on any query is fatal immediately; the poll loop waits for the
///   service, it does not mask broken connectivity.
/// * [`Pdf2TexError::JobFailed`] — the service reported the job as failed;
///   carries the raw diagnostic payload.
/// * [`Pdf2TexError::Timeout`] — no terminal state within
///   `config.poll_timeout`.
pub async fn wait_for_completion(
    client: &Client,
    credentials: &Credentials,
    config: &ConversionConfig,
    job: &JobHandle,
) -> Result<JobStatus, Pdf2TexError> {
    wait_with_count(client, credentials, config, job)
        .await
        .map(|(status, _)| status)
}

/// Like [`wait_for_completion`] but also reports how many status queries
/// were issued, for the orchestrator's stats.
pub async fn wait_with_count(
    client: &Client,
    credentials: &Credentials,
    config: &ConversionConfig,
    job: &JobHandle,
) -> Result<(JobStatus, u32), Pdf2TexError> {
    let url = config.status_url(job.as_str());
    let start = Instant::now();
    let deadline = start + config.poll_timeout;
    let mut queries: u32 = 0;

    while Instant::now() < deadline {
        let snapshot = query_status(client, credentials, &url).await?;
        queries += 1;

        if let Some(progress) = &config.progress {
            progress.on_status(&snapshot.state, snapshot.percent_done);
        }
        debug!(
            "Job {}: {} ({}%)",
            job,
            snapshot.state,
            snapshot.percent_done
        );

        match snapshot.state {
            JobState::Completed => {
                info!("Job {} completed after {} queries", job, queries);
                return Ok((snapshot, queries));
            }
            JobState::Error => {
                warn!("Job {} reported failure", job);
                return Err(Pdf2TexError::JobFailed {
                    detail: snapshot.raw().to_string(),
                });
            }
            _ => {}
        }

        // Clamp the sleep so the loop wakes exactly at the deadline instead
        // of overshooting by up to one interval.
        let next = Instant::now() + config.poll_interval;
        tokio::time::sleep_until(next.min(deadline)).await;
    }

    let elapsed: Duration = start.elapsed();
    warn!("Job {}: no terminal state after {:?}", job, elapsed);
    Err(Pdf2TexError::Timeout { elapsed })
}

/// One status query. Transport failures are fatal — no retry inside the
/// poll loop.
async fn query_status(
    client: &Client,
    credentials: &Credentials,
    url: &str,
) -> Result<JobStatus, Pdf2TexError> {
    let response = credentials
        .apply(client.get(url))
        .send()
        .await
        .map_err(|e| Pdf2TexError::Http {
            url: url.to_string(),
            source: e,
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| Pdf2TexError::Http {
        url: url.to_string(),
        source: e,
    })?;

    if !status.is_success() {
        return Err(Pdf2TexError::Transport {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let raw: serde_json::Value =
        serde_json::from_str(&body).map_err(|_| Pdf2TexError::Protocol { body: body.clone() })?;
    JobStatus::from_value(raw).ok_or(Pdf2TexError::Protocol { body })
}
