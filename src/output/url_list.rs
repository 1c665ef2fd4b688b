//! Plain-text URL list, one canonical URL per line

use crate::output::{ensure_parent, OutputError, OutputResult};
use crate::url::LinkSet;
use std::fs;
use std::path::Path;

/// Writes the link set in first-seen order
///
/// # Returns
///
/// * `Ok(usize)` - Number of URLs written
/// * `Err(OutputError)` - Failed to write the file
pub fn write_url_list(links: &LinkSet, path: &Path) -> OutputResult<usize> {
    ensure_parent(path)?;

    let mut contents = String::new();
    for url in links.iter() {
        contents.push_str(url.as_str());
        contents.push('\n');
    }

    fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(links.len())
}

/// Reads a URL list back, skipping blank lines
pub fn read_url_list(path: &Path) -> OutputResult<Vec<String>> {
    let contents = fs::read_to_string(path).map_err(|source| OutputError::Read {
        path: path.display().to_string(),
        source,
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
