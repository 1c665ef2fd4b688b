//! Integration tests driving whole crawl and scrape runs against
//! synthetic sites served by `SnapshotView`

mod crawl_tests;
mod fixtures;
mod scrape_tests;
