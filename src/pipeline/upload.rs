//! Upload phase: submit the PDF and obtain a job identifier.
//!
//! One multipart POST carrying the raw file bytes plus the serialized
//! [`crate::config::ConversionOptions`] payload. No local state is mutated;
//! the phase's entire output is the opaque job handle.

use crate::config::{ConversionConfig, Credentials};
use crate::error::Pdf2TexError;
use crate::job::JobHandle;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use tracing::{debug, info};

/// Shape of a successful submission response.
#[derive(serde::Deserialize)]
struct SubmitResponse {
    pdf_id: Option<String>,
}

/// Submit the PDF at `pdf_path` for conversion.
///
/// The caller has already verified the file exists; a read failure here
/// still maps to [`Pdf2TexError::FileNotFound`] (the file vanished between
/// check and read).
///
/// # Errors
/// * [`Pdf2TexError::Transport`] on any non-success HTTP status.
/// * [`Pdf2TexError::Protocol`] when the service answers 200 but the body
///   lacks the `pdf_id` field (or is not JSON at all) — a schema mismatch,
///   not a network problem, so it is reported distinctly.
pub async fn submit(
    client: &Client,
    credentials: &Credentials,
    config: &ConversionConfig,
    pdf_path: &Path,
) -> Result<JobHandle, Pdf2TexError> {
    let bytes = tokio::fs::read(pdf_path)
        .await
        .map_err(|_| Pdf2TexError::FileNotFound {
            path: pdf_path.to_path_buf(),
        })?;
    debug!("Read {} bytes from {}", bytes.len(), pdf_path.display());

    let options_json =
        serde_json::to_string(&config.options).map_err(|e| Pdf2TexError::InvalidConfig(
            format!("options payload is not serialisable: {e}"),
        ))?;

    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    let form = Form::new()
        .text("options_json", options_json)
        .part("file", Part::bytes(bytes).file_name(file_name));

    let url = config.base_url.clone();
    let response = credentials
        .apply(client.post(&url))
        .multipart(form)
        .send()
        .await
        .map_err(|e| Pdf2TexError::Http {
            url: url.clone(),
            source: e,
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| Pdf2TexError::Http {
        url: url.clone(),
        source: e,
    })?;

    if !status.is_success() {
        return Err(Pdf2TexError::Transport {
            url,
            status: status.as_u16(),
            body,
        });
    }

    // 200 with the wrong shape is a service/schema mismatch, kept distinct
    // from transport failures.
    let decoded: SubmitResponse =
        serde_json::from_str(&body).map_err(|_| Pdf2TexError::Protocol { body: body.clone() })?;
    let pdf_id = decoded
        .pdf_id
        .filter(|id| !id.is_empty())
        .ok_or(Pdf2TexError::Protocol { body })?;

    info!("Upload accepted, job id: {}", pdf_id);
    Ok(JobHandle::new(pdf_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_response_decodes_pdf_id() {
        let decoded: SubmitResponse =
            serde_json::from_str(r#"{"pdf_id": "abc123", "extra": 1}"#).unwrap();
        assert_eq!(decoded.pdf_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn submit_response_tolerates_missing_field() {
        let decoded: SubmitResponse = serde_json::from_str(r#"{"note": "throttled"}"#).unwrap();
        assert!(decoded.pdf_id.is_none());
    }
}
