//! Distribution into the destination storage container.
//!
//! Uploads file items into a cloud folder, continuing past per-item
//! failures, and parses destination folder identifiers out of shared
//! links.

pub mod distributor;
pub mod error;
pub mod folder_link;
pub mod sink;

pub use distributor::{
    DistributionFailure, DistributionOutcome, DistributionResult, Distributor,
    DEFAULT_UPLOAD_CONCURRENCY,
};
pub use error::DistributeError;
pub use folder_link::extract_folder_id;
pub use sink::{HttpStorageSink, OutboundFile, StorageSink, StoredFile, DEFAULT_UPLOAD_ENDPOINT};
