//! Local scratch storage for downloaded media files.
//!
//! The store owns one flat directory (the storage root). Files are
//! identified by bare filenames; anything that looks like a path is
//! sanitized down to its final component before it touches the
//! filesystem. Nothing in here is persistent state: every file is either
//! awaiting its single delivery or waiting for the retention sweeper.

mod store;

pub use store::{DownloadStore, StorageError, StorageResult, StoredFile};
