//! Configuration types for the conversion workflow.
//!
//! Everything a workflow run needs travels in two explicit values:
//! [`Credentials`] (the two Mathpix secrets, resolved once per process) and
//! [`ConversionConfig`] (endpoint, formats, poll budget), built via
//! [`ConversionConfigBuilder`]. Nothing is ambient: phases receive both by
//! reference, which is what makes the whole pipeline testable against a
//! fake endpoint with fake credentials.
//!
//! # Design choice: builder over constructor
//! A many-field constructor breaks on every new knob. The builder lets
//! callers set only what they care about and rely on documented defaults.

use crate::error::Pdf2TexError;
use crate::progress::ConversionProgress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the Mathpix application id.
pub const APP_ID_VAR: &str = "MATHPIX_APP_ID";
/// Environment variable holding the Mathpix API key.
pub const APP_KEY_VAR: &str = "MATHPIX_API_KEY";

/// The two secrets required by every request to the conversion service.
///
/// Resolved once per process invocation and immutable afterwards. Both
/// fields are guaranteed non-empty by construction — an empty variable
/// counts as missing, so no network phase can start with half a credential.
#[derive(Clone)]
pub struct Credentials {
    app_id: String,
    app_key: String,
}

impl Credentials {
    /// Resolve credentials from the process environment.
    ///
    /// # Errors
    /// [`Pdf2TexError::MissingCredentials`] naming **every** absent or empty
    /// variable, not just the first one found.
    pub fn from_env() -> Result<Self, Pdf2TexError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve credentials through an arbitrary lookup function.
    ///
    /// This is the seam the tests use: pass a closure over a map instead of
    /// mutating the process environment (which is racy across parallel
    /// tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Pdf2TexError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_id = lookup(APP_ID_VAR).filter(|v| !v.is_empty());
        let app_key = lookup(APP_KEY_VAR).filter(|v| !v.is_empty());

        match (app_id, app_key) {
            (Some(app_id), Some(app_key)) => Ok(Self { app_id, app_key }),
            (app_id, app_key) => {
                let mut missing = Vec::new();
                if app_id.is_none() {
                    missing.push(APP_ID_VAR);
                }
                if app_key.is_none() {
                    missing.push(APP_KEY_VAR);
                }
                Err(Pdf2TexError::MissingCredentials { missing })
            }
        }
    }

    /// Build credentials from explicit values (tests, embedding callers).
    ///
    /// # Errors
    /// [`Pdf2TexError::MissingCredentials`] if either value is empty.
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Result<Self, Pdf2TexError> {
        let (app_id, app_key) = (app_id.into(), app_key.into());
        Self::from_lookup(|name| match name {
            APP_ID_VAR => Some(app_id.clone()),
            APP_KEY_VAR => Some(app_key.clone()),
            _ => None,
        })
    }

    /// Attach the credential headers to an outgoing request.
    ///
    /// Every call the workflow makes goes through here, so no phase can
    /// forget authentication.
    pub fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("app_id", &self.app_id).header("app_key", &self.app_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// The options payload serialized into the submission request.
///
/// Sent once as the multipart `options_json` field; immutable thereafter.
/// Defaults request a `tex.zip` archive with `$…$` inline math and
/// whitespace normalisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Which derived formats the service should produce, keyed by format
    /// name. `BTreeMap` keeps serialization order stable.
    pub conversion_formats: BTreeMap<String, bool>,
    /// Delimiter pair wrapped around inline math in the output.
    pub math_inline_delimiters: [String; 2],
    /// Collapse redundant whitespace in the recognised text.
    pub rm_spaces: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        let mut conversion_formats = BTreeMap::new();
        conversion_formats.insert("tex.zip".to_string(), true);
        Self {
            conversion_formats,
            math_inline_delimiters: ["$".to_string(), "$".to_string()],
            rm_spaces: true,
        }
    }
}

/// Configuration for one conversion workflow run.
///
/// Built via [`ConversionConfig::builder()`] or [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2tex::ConversionConfig;
/// use std::time::Duration;
///
/// let config = ConversionConfig::builder()
///     .poll_interval(Duration::from_secs(2))
///     .poll_timeout(Duration::from_secs(300))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Submission endpoint base URL. Default: the public Mathpix v3/pdf API.
    pub base_url: String,

    /// Options payload sent with the upload. Default: [`ConversionOptions::default`].
    pub options: ConversionOptions,

    /// Format name looked up in the status snapshot and requested from the
    /// service. Default: `"tex.zip"`.
    pub target_format: String,

    /// Extension of the primary output file searched for after extraction.
    /// Default: `"tex"`.
    pub primary_extension: String,

    /// Template for the secondary retrieval endpoint, used when the status
    /// snapshot carries no URL for the target format or that URL 404s.
    ///
    /// Placeholders: `{base}`, `{job_id}`, `{format}`. The shape is an
    /// undocumented service convention, hence configurable rather than
    /// hard-coded. Default: `"{base}/{job_id}.{format}"`.
    pub fallback_url_template: String,

    /// Fixed delay between status queries. Default: 2 s.
    ///
    /// Fixed-interval polling is deliberate: conversion jobs are short and
    /// bounded, so an adaptive backoff buys nothing here.
    pub poll_interval: Duration,

    /// Total budget for the poll phase. Default: 600 s.
    pub poll_timeout: Duration,

    /// Per-request HTTP timeout. Default: 120 s.
    ///
    /// Applies to each individual upload/status/download call, not to the
    /// poll loop as a whole (that is `poll_timeout`'s job).
    pub request_timeout: Duration,

    /// Observer for workflow progress events. Default: none.
    pub progress: Option<Arc<dyn ConversionProgress>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mathpix.com/v3/pdf".to_string(),
            options: ConversionOptions::default(),
            target_format: "tex.zip".to_string(),
            primary_extension: "tex".to_string(),
            fallback_url_template: "{base}/{job_id}.{format}".to_string(),
            poll_interval: Duration::from_secs(2),
            poll_timeout: Duration::from_secs(600),
            request_timeout: Duration::from_secs(120),
            progress: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .field("target_format", &self.target_format)
            .field("primary_extension", &self.primary_extension)
            .field("fallback_url_template", &self.fallback_url_template)
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn ConversionProgress>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Status endpoint for a job: `{base}/{job_id}`.
    pub fn status_url(&self, job_id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), job_id)
    }

    /// Render the fallback retrieval URL for a job from the template.
    pub fn fallback_url(&self, job_id: &str) -> String {
        self.fallback_url_template
            .replace("{base}", self.base_url.trim_end_matches('/'))
            .replace("{job_id}", job_id)
            .replace("{format}", &self.target_format)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn options(mut self, options: ConversionOptions) -> Self {
        self.config.options = options;
        self
    }

    /// Set the requested archive format, keeping the options payload and the
    /// primary-extension search in sync (`"md.zip"` → `"md"`, `"docx"` →
    /// `"docx"`). Call [`ConversionConfigBuilder::primary_extension`]
    /// afterwards to override the derived extension.
    pub fn target_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        self.config.primary_extension = format
            .strip_suffix(".zip")
            .unwrap_or(format.as_str())
            .to_string();
        self.config.options.conversion_formats.clear();
        self.config
            .options
            .conversion_formats
            .insert(format.clone(), true);
        self.config.target_format = format;
        self
    }

    pub fn primary_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.primary_extension = ext.into();
        self
    }

    pub fn fallback_url_template(mut self, template: impl Into<String>) -> Self {
        self.config.fallback_url_template = template.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ConversionProgress>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2TexError> {
        let c = &self.config;
        if c.base_url.is_empty() {
            return Err(Pdf2TexError::InvalidConfig("base_url must not be empty".into()));
        }
        if c.poll_interval.is_zero() {
            return Err(Pdf2TexError::InvalidConfig(
                "poll_interval must be greater than zero".into(),
            ));
        }
        if c.poll_timeout < c.poll_interval {
            return Err(Pdf2TexError::InvalidConfig(format!(
                "poll_timeout ({:?}) must be at least one poll_interval ({:?})",
                c.poll_timeout, c.poll_interval
            )));
        }
        if c.target_format.is_empty() {
            return Err(Pdf2TexError::InvalidConfig(
                "target_format must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_missing_both_names_both() {
        let err = Credentials::from_lookup(|_| None).unwrap_err();
        match err {
            Pdf2TexError::MissingCredentials { missing } => {
                assert_eq!(missing, vec![APP_ID_VAR, APP_KEY_VAR]);
            }
            other => panic!("expected MissingCredentials, got {other:?}"),
        }
    }

    #[test]
    fn credentials_empty_value_counts_as_missing() {
        let err = Credentials::from_lookup(|name| match name {
            APP_ID_VAR => Some(String::new()),
            APP_KEY_VAR => Some("key".to_string()),
            _ => None,
        })
        .unwrap_err();
        match err {
            Pdf2TexError::MissingCredentials { missing } => {
                assert_eq!(missing, vec![APP_ID_VAR]);
            }
            other => panic!("expected MissingCredentials, got {other:?}"),
        }
    }

    #[test]
    fn credentials_debug_redacts_key() {
        let creds = Credentials::new("id-123", "secret-456").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("id-123"));
        assert!(!debug.contains("secret-456"));
    }

    #[test]
    fn options_serialize_matches_wire_shape() {
        let json = serde_json::to_value(ConversionOptions::default()).unwrap();
        assert_eq!(json["conversion_formats"]["tex.zip"], true);
        assert_eq!(json["math_inline_delimiters"][0], "$");
        assert_eq!(json["math_inline_delimiters"][1], "$");
        assert_eq!(json["rm_spaces"], true);
    }

    #[test]
    fn status_url_joins_without_double_slash() {
        let config = ConversionConfig::builder()
            .base_url("https://api.example.com/v3/pdf/")
            .build()
            .unwrap();
        assert_eq!(
            config.status_url("job-1"),
            "https://api.example.com/v3/pdf/job-1"
        );
    }

    #[test]
    fn fallback_url_renders_all_placeholders() {
        let config = ConversionConfig::builder()
            .base_url("https://api.example.com/v3/pdf")
            .build()
            .unwrap();
        assert_eq!(
            config.fallback_url("abc123"),
            "https://api.example.com/v3/pdf/abc123.tex.zip"
        );
    }

    #[test]
    fn credentials_new_accepts_owned_and_borrowed_values() {
        let id = String::from("id-owned");
        let creds = Credentials::new(id, "key-borrowed").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("id-owned"));
    }

    #[test]
    fn target_format_keeps_options_in_sync() {
        let config = ConversionConfig::builder()
            .target_format("docx")
            .build()
            .unwrap();
        assert_eq!(config.target_format, "docx");
        assert_eq!(config.options.conversion_formats.get("docx"), Some(&true));
        assert!(!config.options.conversion_formats.contains_key("tex.zip"));
    }

    #[test]
    fn target_format_derives_primary_extension() {
        let config = ConversionConfig::builder()
            .target_format("md.zip")
            .build()
            .unwrap();
        assert_eq!(config.primary_extension, "md");

        let config = ConversionConfig::builder()
            .target_format("docx")
            .build()
            .unwrap();
        assert_eq!(config.primary_extension, "docx");
    }

    #[test]
    fn primary_extension_set_after_target_format_wins() {
        let config = ConversionConfig::builder()
            .target_format("docx")
            .primary_extension("tex")
            .build()
            .unwrap();
        assert_eq!(config.primary_extension, "tex");
    }

    #[test]
    fn builder_rejects_timeout_shorter_than_interval() {
        let result = ConversionConfig::builder()
            .poll_interval(Duration::from_secs(10))
            .poll_timeout(Duration::from_secs(5))
            .build();
        assert!(matches!(result, Err(Pdf2TexError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_zero_interval() {
        let result = ConversionConfig::builder()
            .poll_interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(Pdf2TexError::InvalidConfig(_))));
    }
}
