//! In-memory archive extraction.
//!
//! Turns a downloaded ZIP container into a flat list of file items with
//! inferred content types, skipping directory markers and hidden or
//! system entries.

use std::io::{Cursor, Read};

use log::{debug, warn};
use thiserror::Error;

/// Errors raised while extracting an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The container itself cannot be parsed.
    #[error("Corrupt archive: {0}")]
    Corrupt(#[from] zip::result::ZipError),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// One file yielded by extraction.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Entry name as recorded in the archive (may contain `/`).
    pub name: String,
    /// Content type inferred from the file extension.
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ExtractedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// An entry that could not be read from an otherwise valid container.
#[derive(Debug, Clone)]
pub struct EntryFailure {
    pub name: String,
    pub reason: String,
}

/// Result of extracting one archive.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Files in archive order.
    pub files: Vec<ExtractedFile>,
    /// Entries that failed to read; reported upstream, never fatal.
    pub failures: Vec<EntryFailure>,
    /// Sum of the yielded files' sizes.
    pub total_size: u64,
}

impl Extraction {
    pub fn total_files(&self) -> usize {
        self.files.len()
    }
}

/// Extracts all regular members of a ZIP archive held in memory.
///
/// Directory entries, hidden entries (any path segment starting with
/// `.`) and anything under a `__MACOSX` segment are excluded. Entries
/// that fail to read are collected in `failures`.
pub fn extract(bytes: &[u8]) -> Result<Extraction> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut extraction = Extraction::default();

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Unreadable archive entry #{}: {}", index, e);
                extraction.failures.push(EntryFailure {
                    name: format!("#{}", index),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let name = entry.name().to_string();
        if entry.is_dir() || is_excluded(&name) {
            debug!("Skipping archive entry '{}'", name);
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        if let Err(e) = entry.read_to_end(&mut data) {
            warn!("Unreadable archive entry '{}': {}", name, e);
            extraction.failures.push(EntryFailure {
                name,
                reason: e.to_string(),
            });
            continue;
        }

        extraction.total_size += data.len() as u64;
        extraction.files.push(ExtractedFile {
            mime_type: infer_mime(&name),
            name,
            data,
        });
    }

    debug!(
        "Extracted {} files ({} bytes), {} unreadable entries",
        extraction.files.len(),
        extraction.total_size,
        extraction.failures.len()
    );

    Ok(extraction)
}

/// Infers a MIME type from the file extension; unknown extensions map to
/// `application/octet-stream`.
pub fn infer_mime(name: &str) -> String {
    mime_guess::from_path(name).first_or_octet_stream().to_string()
}

/// Hidden entries and macOS resource-fork directories are excluded.
fn is_excluded(name: &str) -> bool {
    name.trim_end_matches('/')
        .split('/')
        .any(|segment| segment.starts_with('.') || segment == "__MACOSX")
}
