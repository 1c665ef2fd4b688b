//! Output module for the crawl and scrape artifacts
//!
//! This module handles:
//! - Writing the canonical URL list handed from crawl to scrape
//! - Reading that list back for the scrape phase
//! - Writing listing records as a JSON document
//! - Summarizing run statistics

mod records;
pub mod stats;
mod url_list;

pub use records::write_records;
pub use stats::{format_statistics, print_statistics, RunStatistics};
pub use url_list::{read_url_list, write_url_list};

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading or writing run artifacts
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Creates the parent directory of `path` when it does not exist yet
fn ensure_parent(path: &Path) -> OutputResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| OutputError::Write {
                path: path.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}
