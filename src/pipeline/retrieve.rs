//! Retrieval phase: download the produced archive, extract it, and locate
//! the primary output file.
//!
//! ## Why a named temp file inside the destination?
//!
//! The downloaded archive is an intermediate artifact the caller must never
//! see. Writing it to a [`tempfile::NamedTempFile`] created *in* the
//! destination directory keeps the write on the same filesystem and — the
//! part that matters — ties deletion to scope exit, so the archive is
//! cleaned up whether extraction succeeds, fails, or panics.

use crate::config::{ConversionConfig, Credentials};
use crate::error::Pdf2TexError;
use crate::job::{JobHandle, JobStatus};
use crate::output::ExtractedOutput;
use reqwest::Client;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Download and extract the output archive for a completed job.
///
/// The retrieval URL comes from the status snapshot when present; when it
/// is absent, or answers 404, the templated secondary endpoint derived from
/// the job handle is tried instead. Any other non-success outcome is fatal.
///
/// Extraction only adds or overwrites archive members — files already in
/// `dest` that the archive does not mention are left untouched.
pub async fn fetch_output(
    client: &Client,
    credentials: &Credentials,
    config: &ConversionConfig,
    job: &JobHandle,
    status: &JobStatus,
    dest: &Path,
) -> Result<ExtractedOutput, Pdf2TexError> {
    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|e| Pdf2TexError::OutputWrite {
            path: dest.to_path_buf(),
            source: e,
        })?;

    let bytes = download_archive(client, credentials, config, job, status).await?;

    // Blocking I/O (archive write + inflate) goes to the blocking pool. The
    // temp file travels into the closure and is dropped there — deletion
    // happens even when extraction errors out.
    let dest_owned = dest.to_path_buf();
    let files = tokio::task::spawn_blocking(move || {
        let mut archive = NamedTempFile::new_in(&dest_owned).map_err(|e| {
            Pdf2TexError::OutputWrite {
                path: dest_owned.clone(),
                source: e,
            }
        })?;
        archive
            .write_all(&bytes)
            .map_err(|e| Pdf2TexError::OutputWrite {
                path: dest_owned.clone(),
                source: e,
            })?;
        extract_archive(archive.path(), &dest_owned)
    })
    .await
    .map_err(|e| Pdf2TexError::Archive {
        path: dest.to_path_buf(),
        reason: format!("extraction task failed: {e}"),
    })??;

    if let Some(progress) = &config.progress {
        progress.on_extracted(files.len());
    }
    info!("Extracted {} file(s) into {}", files.len(), dest.display());

    let primary = find_primary(dest, &config.primary_extension);
    match &primary {
        Some(p) => debug!("Primary output: {}", p.display()),
        None => debug!(
            "No *.{} file among extracted output",
            config.primary_extension
        ),
    }

    Ok(ExtractedOutput {
        dir: dest.to_path_buf(),
        files,
        primary,
    })
}

/// Fetch the archive bytes, falling back to the secondary endpoint when the
/// snapshot has no URL for the target format or the primary URL 404s.
async fn download_archive(
    client: &Client,
    credentials: &Credentials,
    config: &ConversionConfig,
    job: &JobHandle,
    status: &JobStatus,
) -> Result<Vec<u8>, Pdf2TexError> {
    if let Some(url) = status.retrieval_url(&config.target_format) {
        let url = url.to_string();
        if let Some(progress) = &config.progress {
            progress.on_download_start(&url);
        }
        match fetch_bytes(client, credentials, &url).await {
            Ok(bytes) => return Ok(bytes),
            Err(Pdf2TexError::Transport { status: 404, .. }) => {
                warn!("Primary retrieval URL 404ed, trying fallback endpoint");
            }
            Err(other) => return Err(other),
        }
    } else {
        debug!(
            "Status snapshot carries no '{}' URL, using fallback endpoint",
            config.target_format
        );
    }

    let fallback = config.fallback_url(job.as_str());
    if let Some(progress) = &config.progress {
        progress.on_download_start(&fallback);
    }
    fetch_bytes(client, credentials, &fallback).await
}

/// GET a URL and return the body bytes, or a transport error.
async fn fetch_bytes(
    client: &Client,
    credentials: &Credentials,
    url: &str,
) -> Result<Vec<u8>, Pdf2TexError> {
    debug!("Downloading {}", url);
    let response = credentials
        .apply(client.get(url))
        .send()
        .await
        .map_err(|e| Pdf2TexError::Http {
            url: url.to_string(),
            source: e,
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Pdf2TexError::Transport {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await.map_err(|e| Pdf2TexError::Http {
        url: url.to_string(),
        source: e,
    })?;
    Ok(bytes.to_vec())
}

/// Extract every member of the ZIP archive at `archive_path` into `dest`.
///
/// Entries with unsafe paths (absolute, or escaping `dest` via `..`) are
/// skipped rather than trusted. Returns the files written, in archive
/// order.
fn extract_archive(archive_path: &Path, dest: &Path) -> Result<Vec<PathBuf>, Pdf2TexError> {
    let file = std::fs::File::open(archive_path).map_err(|e| Pdf2TexError::Archive {
        path: archive_path.to_path_buf(),
        reason: format!("failed to open archive: {e}"),
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| Pdf2TexError::Archive {
        path: archive_path.to_path_buf(),
        reason: format!("not a readable ZIP archive: {e}"),
    })?;

    let mut extracted = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| Pdf2TexError::Archive {
            path: archive_path.to_path_buf(),
            reason: format!("failed to read entry {i}: {e}"),
        })?;

        let entry_path = match entry.enclosed_name() {
            Some(p) => dest.join(p),
            None => {
                warn!("Skipping archive entry with unsafe path: {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&entry_path).map_err(|e| Pdf2TexError::OutputWrite {
                path: entry_path.clone(),
                source: e,
            })?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Pdf2TexError::OutputWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut out = std::fs::File::create(&entry_path).map_err(|e| Pdf2TexError::OutputWrite {
            path: entry_path.clone(),
            source: e,
        })?;
        std::io::copy(&mut entry, &mut out).map_err(|e| Pdf2TexError::OutputWrite {
            path: entry_path.clone(),
            source: e,
        })?;

        extracted.push(entry_path);
    }

    Ok(extracted)
}

/// Recursively search `dir` for the first file with extension `ext`.
///
/// Entries are sorted by name at every level and files are considered
/// before subdirectories, so the selection is deterministic for a given
/// tree regardless of filesystem listing order.
fn find_primary(dir: &Path, ext: &str) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries.iter().filter(|p| p.is_file()) {
        if path.extension().is_some_and(|e| e == ext) {
            return Some(path.clone());
        }
    }
    for path in entries.iter().filter(|p| p.is_dir()) {
        if let Some(found) = find_primary(path, ext) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn find_primary_picks_first_in_sorted_order() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("b.tex"), "b").unwrap();
        std::fs::write(tmp.path().join("a.tex"), "a").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "n").unwrap();

        let found = find_primary(tmp.path(), "tex").unwrap();
        assert_eq!(found.file_name().unwrap(), "a.tex");
    }

    #[test]
    fn find_primary_prefers_top_level_files_over_subdirs() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("aaa")).unwrap();
        std::fs::write(tmp.path().join("aaa/deep.tex"), "d").unwrap();
        std::fs::write(tmp.path().join("zzz.tex"), "z").unwrap();

        let found = find_primary(tmp.path(), "tex").unwrap();
        assert_eq!(found.file_name().unwrap(), "zzz.tex");
    }

    #[test]
    fn find_primary_recurses_when_top_level_has_no_match() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        std::fs::write(tmp.path().join("sub/main.tex"), "m").unwrap();
        std::fs::write(tmp.path().join("readme.txt"), "r").unwrap();

        let found = find_primary(tmp.path(), "tex").unwrap();
        assert!(found.ends_with("sub/main.tex"));
    }

    #[test]
    fn find_primary_returns_none_without_match() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("fig.png"), "p").unwrap();
        assert!(find_primary(tmp.path(), "tex").is_none());
    }

    #[test]
    fn extract_archive_skips_unsafe_paths() {
        let tmp = TempDir::new().unwrap();
        let archive_path = tmp.path().join("evil.zip");

        let file = std::fs::File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let opts = zip::write::FileOptions::default();
        writer.start_file("../escape.txt", opts).unwrap();
        std::io::Write::write_all(&mut writer, b"nope").unwrap();
        writer.start_file("safe.txt", opts).unwrap();
        std::io::Write::write_all(&mut writer, b"ok").unwrap();
        writer.finish().unwrap();

        let dest = tmp.path().join("out");
        std::fs::create_dir(&dest).unwrap();
        let files = extract_archive(&archive_path, &dest).unwrap();

        assert_eq!(files.len(), 1);
        assert!(dest.join("safe.txt").is_file());
        assert!(!tmp.path().join("escape.txt").exists());
    }

    #[test]
    fn extract_archive_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let bogus = tmp.path().join("bogus.zip");
        std::fs::write(&bogus, b"this is not a zip file").unwrap();

        let err = extract_archive(&bogus, tmp.path()).unwrap_err();
        assert!(matches!(err, Pdf2TexError::Archive { .. }));
    }
}
