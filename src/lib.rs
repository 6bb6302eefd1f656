//! # pdf2tex
//!
//! Convert PDF documents to LaTeX through the Mathpix conversion API.
//!
//! ## Why this crate?
//!
//! Local PDF-to-LaTeX tooling mangles mathematics. The Mathpix service does
//! the recognition server-side; what a client actually needs to get right
//! is the *job protocol* around it: submit a binary artifact, poll for
//! completion under a bounded time budget, and retrieve the produced
//! archive with defined failure behaviour at every phase. That protocol is
//! what this crate implements.
//!
//! ## Workflow Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Credentials  resolve + validate the two env secrets (fail fast)
//!  ├─ 2. Upload       multipart POST, obtain the opaque job id
//!  ├─ 3. Poll         fixed-interval status loop, bounded by a deadline
//!  ├─ 4. Retrieve     download tex.zip (with fallback endpoint), extract
//!  └─ 5. Output       located primary .tex file + per-phase stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2tex::{convert, ConversionConfig, Credentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MATHPIX_APP_ID / MATHPIX_API_KEY; errors name what is missing.
//!     let credentials = Credentials::from_env()?;
//!     let config = ConversionConfig::default();
//!     let output = convert("paper.pdf", "out/", &credentials, &config).await?;
//!     println!("{}", output.output.resolved_path().display());
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Every error is fatal to the workflow — there is no silent retry
//! anywhere. The taxonomy keeps failure origins distinct:
//!
//! | Variant                                   | Meaning |
//! |-------------------------------------------|---------|
//! | [`Pdf2TexError::MissingCredentials`]      | env secrets absent — nothing was sent |
//! | [`Pdf2TexError::FileNotFound`]            | local input missing |
//! | [`Pdf2TexError::Transport`] / [`Pdf2TexError::Http`] | HTTP/network failure, any phase |
//! | [`Pdf2TexError::Protocol`]                | 200 with the wrong shape — schema mismatch |
//! | [`Pdf2TexError::JobFailed`]               | the service gave up on the job |
//! | [`Pdf2TexError::Timeout`]                 | no terminal state within the poll budget |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2tex` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2tex = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ConversionOptions, Credentials};
pub use convert::{convert, convert_sync};
pub use error::Pdf2TexError;
pub use job::{JobHandle, JobState, JobStatus};
pub use output::{ConversionOutput, ConversionStats, ExtractedOutput};
pub use progress::{ConversionProgress, NoopProgress, ProgressHandle};
