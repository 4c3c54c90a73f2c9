//! Archive download, extraction and layout normalization.
//!
//! Everything here is blocking and single-shot: no retries, no timeouts
//! beyond the transport defaults, no rollback of partially written
//! directories. A directory that already exists is taken as fully populated
//! and skipped wholesale.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::error::{DataError, Result};

/// Archive container format, selected by the caller (never sniffed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// A `.zip` archive.
    Zip,
    /// A gzip-compressed tarball (`.tar.gz`).
    TarGz,
}

/// Download `url` and unpack it into `local_dir`.
///
/// Skips all work when `local_dir` already exists as a directory, so a
/// second call for the same data set is a no-op. Otherwise the archive is
/// streamed to a temporary file inside `local_dir`, extracted there, deleted,
/// and the resulting layout is normalized: if extraction produced exactly one
/// subdirectory and no loose files, that wrapping directory is flattened away
/// so data files always sit directly under `local_dir`.
///
/// # Errors
///
/// [`DataError::Fetch`] when the remote is unreachable or answers with a
/// non-success status; [`DataError::Archive`] when the archive cannot be
/// decoded. In both cases `local_dir` may have been created and left
/// incomplete — it is not rolled back.
pub fn fetch_and_unpack(url: &str, local_dir: &Path, format: ArchiveFormat) -> Result<()> {
    if local_dir.is_dir() {
        tracing::debug!(dir = %local_dir.display(), "already cached, skipping fetch");
        return Ok(());
    }
    fs::create_dir_all(local_dir)?;

    let archive_name = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("archive.tmp");
    let archive_path = local_dir.join(archive_name);

    download_file(url, &archive_path)?;

    match format {
        ArchiveFormat::Zip => extract_zip(&archive_path, local_dir)?,
        ArchiveFormat::TarGz => extract_tar_gz(&archive_path, local_dir)?,
    }

    let _ = fs::remove_file(&archive_path);

    flatten_single_subdir(local_dir)
}

/// Download a file from `url` to `path`, returning the bytes transferred.
///
/// The body is streamed in fixed-size chunks with cumulative progress
/// reported through `tracing` at trace level.
pub fn download_file(url: &str, path: &Path) -> Result<u64> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| DataError::Fetch(format!("failed to download {}: {}", url, e)))?;

    if response.status() != 200 {
        return Err(DataError::Fetch(format!(
            "HTTP {} for {}",
            response.status(),
            url
        )));
    }

    let total = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok());

    let mut reader = response.into_reader();
    let mut file = File::create(path)?;
    let mut buffer = [0u8; 8192];
    let mut transferred = 0u64;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        file.write_all(&buffer[..n])?;
        transferred += n as u64;
        tracing::trace!(transferred, total, url, "downloading");
    }

    Ok(transferred)
}

/// Extract every entry of a zip archive into `target_dir`.
fn extract_zip(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        DataError::Archive(format!("invalid zip file {}: {}", archive_path.display(), e))
    })?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| DataError::Archive(format!("failed to read zip entry {}: {}", i, e)))?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(DataError::Archive(format!(
                "unsafe path in zip entry: {}",
                entry.name()
            )));
        };
        let out_path = target_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out_file)?;
    }

    Ok(())
}

/// Extract a gzip-compressed tarball into `target_dir`.
fn extract_tar_gz(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    archive.unpack(target_dir).map_err(|e| {
        DataError::Archive(format!(
            "invalid tar archive {}: {}",
            archive_path.display(),
            e
        ))
    })
}

/// One immediate child of a directory, as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirChild {
    /// Path of the child.
    pub path: PathBuf,
    /// Whether the child is a directory.
    pub is_dir: bool,
}

/// Decide whether `children` is exactly one subdirectory and nothing else,
/// i.e. a spurious wrapping directory produced by the archive.
///
/// Pure function over a directory snapshot; the caller performs the moves.
/// Any loose file, or a second subdirectory, means the layout is kept as-is.
#[must_use]
pub fn single_wrapping_dir(children: &[DirChild]) -> Option<&Path> {
    let mut dirs = children.iter().filter(|c| c.is_dir);
    let first = dirs.next()?;
    if dirs.next().is_some() || children.iter().any(|c| !c.is_dir) {
        return None;
    }
    Some(&first.path)
}

/// Move the contents of a single wrapping subdirectory up into `dir` and
/// remove the emptied wrapper. Layouts with more than one subdirectory, or
/// any loose file, are left untouched.
pub fn flatten_single_subdir(dir: &Path) -> Result<()> {
    let children = snapshot(dir)?;
    let Some(wrap) = single_wrapping_dir(&children) else {
        return Ok(());
    };

    for entry in fs::read_dir(wrap)? {
        let entry = entry?;
        fs::rename(entry.path(), dir.join(entry.file_name()))?;
    }
    fs::remove_dir(wrap)?;
    tracing::debug!(dir = %dir.display(), "flattened single wrapping subdirectory");
    Ok(())
}

fn snapshot(dir: &Path) -> Result<Vec<DirChild>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_dir = path.is_dir();
        children.push(DirChild { path, is_dir });
    }
    Ok(children)
}
