//! JSON record document

use crate::listing::ListingRecord;
use crate::output::{ensure_parent, OutputError, OutputResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes records as a pretty-printed JSON array, in scrape order
pub fn write_records(records: &[ListingRecord], path: &Path) -> OutputResult<()> {
    ensure_parent(path)?;

    let write_error = |source| OutputError::Write {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n").map_err(write_error)?;
    writer.flush().map_err(write_error)?;
    Ok(())
}
