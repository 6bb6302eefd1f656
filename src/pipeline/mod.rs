//! Workflow phases for the remote conversion job.
//!
//! Each submodule implements exactly one phase. Keeping phases separate
//! makes each independently testable against a fake endpoint and keeps the
//! orchestrator ([`crate::convert`]) a pure sequencing concern.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ poll ──▶ retrieve
//! (PDF)   (JobHandle) (JobStatus)
//! ```
//!
//! 1. [`upload`]   — one multipart POST; yields the opaque [`crate::job::JobHandle`]
//! 2. [`poll`]     — fixed-interval status loop bounded by the poll budget;
//!    yields the completed [`crate::job::JobStatus`] snapshot
//! 3. [`retrieve`] — download the produced archive (with fallback endpoint),
//!    extract it, locate the primary output file

pub mod poll;
pub mod retrieve;
pub mod upload;
