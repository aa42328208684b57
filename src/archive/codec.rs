//! Zip compression and extraction
//!
//! Entries always use `/` separators and paths relative to the archived
//! root, so an archive built on one platform restores on any other.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{BackupError, BackupResult};

/// Deflate level used for every entry
pub const COMPRESSION_LEVEL: i64 = 9;

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
}

/// Convert a relative filesystem path into an archive entry name
pub fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compress `source_dir` recursively into a zip file at `output`
///
/// Returns the number of files written (directories are recorded but not
/// counted).
pub fn compress_dir(source_dir: &Path, output: &Path) -> BackupResult<usize> {
    if !source_dir.is_dir() {
        return Err(BackupError::Archive(format!(
            "Not a directory: {}",
            source_dir.display()
        )));
    }

    let mut builder = ArchiveBuilder::create(output)?;

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source_dir).map_err(|e| {
            BackupError::Archive(format!("Failed to relativize {}: {}", entry.path().display(), e))
        })?;
        let name = entry_name(relative);

        if entry.file_type().is_dir() {
            builder.add_directory(&name)?;
        } else if entry.file_type().is_file() {
            builder.append_file(&name, entry.path())?;
        }
    }

    builder.finish()
}

/// Extract every entry of `archive` below `dest_dir`
///
/// Entries whose names would escape `dest_dir` are skipped with a warning.
/// Returns the number of files extracted.
pub fn extract(archive: &Path, dest_dir: &Path) -> BackupResult<usize> {
    let file = File::open(archive).map_err(|e| {
        BackupError::Archive(format!("Failed to open {}: {}", archive.display(), e))
    })?;
    let mut zip = ZipArchive::new(file)?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted = 0usize;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let outpath: PathBuf = match entry.enclosed_name() {
            Some(path) => dest_dir.join(path),
            None => {
                warn!("Skipping unsafe archive entry {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut outfile = File::create(&outpath)?;
        io::copy(&mut entry, &mut outfile)?;
        extracted += 1;
    }

    debug!("Extracted {} files from {}", extracted, archive.display());
    Ok(extracted)
}

/// Incrementally builds a zip archive on disk
pub struct ArchiveBuilder {
    path: PathBuf,
    writer: ZipWriter<BufWriter<File>>,
    files: usize,
}

impl ArchiveBuilder {
    /// Create a new archive at `path`, truncating any existing file
    pub fn create(path: &Path) -> BackupResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path).map_err(|e| {
            BackupError::Archive(format!("Failed to create {}: {}", path.display(), e))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: ZipWriter::new(BufWriter::new(file)),
            files: 0,
        })
    }

    /// Append an in-memory entry
    pub fn append(&mut self, name: &str, bytes: &[u8]) -> BackupResult<()> {
        self.writer.start_file(name, entry_options())?;
        self.writer.write_all(bytes)?;
        self.files += 1;
        Ok(())
    }

    /// Append a file from disk, streaming its contents
    pub fn append_file(&mut self, name: &str, source: &Path) -> BackupResult<()> {
        let mut input = File::open(source)?;
        self.writer.start_file(name, entry_options())?;
        io::copy(&mut input, &mut self.writer)?;
        self.files += 1;
        Ok(())
    }

    /// Record an empty directory entry
    pub fn add_directory(&mut self, name: &str) -> BackupResult<()> {
        self.writer.add_directory(name, entry_options())?;
        Ok(())
    }

    /// Number of file entries appended so far
    pub fn len(&self) -> usize {
        self.files
    }

    /// Whether no file entries have been appended
    pub fn is_empty(&self) -> bool {
        self.files == 0
    }

    /// Path of the archive being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the central directory and flush to disk
    pub fn finish(self) -> BackupResult<usize> {
        let mut inner = self.writer.finish()?;
        inner.flush()?;
        Ok(self.files)
    }
}
