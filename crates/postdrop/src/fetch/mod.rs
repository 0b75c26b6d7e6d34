//! Remote-archive ingestion source.
//!
//! Streams an arbitrary remote file into memory under a byte cap and an
//! overall deadline, with optional progress observation.

pub mod download;
pub mod error;
pub mod progress;

pub use download::{ArchiveDownloader, DownloadLimits, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT};
pub use error::FetchError;
pub use progress::{DownloadProgress, LogObserver, NoopObserver, ProgressObserver};
