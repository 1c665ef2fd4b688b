//! Run statistics
//!
//! Counters collected over one crawl or scrape phase and the report the
//! binary prints when that phase ends.

use std::fmt::Write;

/// Run statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    /// Keywords searched
    pub keywords: u64,

    /// Links harvested from result pages, duplicates included
    pub links_harvested: u64,

    /// Canonical URLs after deduplication
    pub unique_links: u64,

    /// URLs handed to the scrape phase
    pub urls_scraped: u64,

    /// Records written to the JSON document
    pub records_written: u64,

    /// URLs that yielded no record
    pub records_dropped: u64,

    /// Warnings emitted during the phase
    pub warnings: u64,

    /// Wall-clock duration of the phase
    pub duration_seconds: Option<f64>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for a finished crawl phase
    pub fn crawl(keywords: usize, harvested: usize, unique: usize) -> Self {
        Self {
            keywords: keywords as u64,
            links_harvested: harvested as u64,
            unique_links: unique as u64,
            ..Self::default()
        }
    }

    /// Counters for a finished (or aborted) scrape phase
    pub fn scrape(urls: usize, written: usize, dropped: usize) -> Self {
        Self {
            urls_scraped: urls as u64,
            records_written: written as u64,
            records_dropped: dropped as u64,
            ..Self::default()
        }
    }

    /// Share of harvested links that were duplicates, as a percentage
    pub fn duplicate_rate(&self) -> f64 {
        if self.links_harvested == 0 {
            return 0.0;
        }
        let duplicates = self.links_harvested.saturating_sub(self.unique_links);
        (duplicates as f64 / self.links_harvested as f64) * 100.0
    }

    /// Share of scraped URLs that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.urls_scraped == 0 {
            return 0.0;
        }
        (self.records_written as f64 / self.urls_scraped as f64) * 100.0
    }
}

/// Formats the statistics report
///
/// Crawl and scrape blocks appear only for the phases that ran.
pub fn format_statistics(stats: &RunStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Run Statistics ===\n");

    if stats.keywords > 0 {
        let _ = writeln!(out, "Crawl:");
        let _ = writeln!(out, "  Keywords searched: {}", stats.keywords);
        let _ = writeln!(out, "  Links harvested: {}", stats.links_harvested);
        let _ = writeln!(
            out,
            "  Unique listings: {} ({:.1}% duplicates)",
            stats.unique_links,
            stats.duplicate_rate()
        );
        let _ = writeln!(out);
    }

    if stats.urls_scraped > 0 {
        let _ = writeln!(out, "Scrape:");
        let _ = writeln!(out, "  URLs scraped: {}", stats.urls_scraped);
        let _ = writeln!(out, "  Records written: {}", stats.records_written);
        let _ = writeln!(out, "  Records dropped: {}", stats.records_dropped);
        let _ = writeln!(
            out,
            "  Success Rate: {:.1}% ({} / {} listings)",
            stats.success_rate(),
            stats.records_written,
            stats.urls_scraped
        );
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Warnings: {}", stats.warnings);
    if let Some(duration) = stats.duration_seconds {
        let _ = writeln!(
            out,
            "Duration: {:.1} seconds ({:.2} minutes)",
            duration,
            duration / 60.0
        );
    }
    out
}

/// Prints the statistics report to stdout
pub fn print_statistics(stats: &RunStatistics) {
    print!("{}", format_statistics(stats));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let stats = RunStatistics {
            links_harvested: 40,
            unique_links: 30,
            urls_scraped: 30,
            records_written: 27,
            records_dropped: 3,
            ..RunStatistics::new()
        };
        assert_eq!(stats.duplicate_rate(), 25.0);
        assert_eq!(stats.success_rate(), 90.0);
    }

    #[test]
    fn test_rates_zero() {
        let stats = RunStatistics::new();
        assert_eq!(stats.duplicate_rate(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_format_scrape_only() {
        let stats = RunStatistics {
            urls_scraped: 4,
            records_written: 3,
            records_dropped: 1,
            warnings: 2,
            ..RunStatistics::new()
        };

        let report = format_statistics(&stats);
        assert!(!report.contains("Crawl:"));
        assert!(report.contains("Records dropped: 1"));
        assert!(report.contains("Success Rate: 75.0% (3 / 4 listings)"));
        assert!(report.contains("Warnings: 2"));
    }

    #[test]
    fn test_format_crawl() {
        let stats = RunStatistics {
            keywords: 2,
            links_harvested: 10,
            unique_links: 8,
            duration_seconds: Some(90.0),
            ..RunStatistics::new()
        };

        let report = format_statistics(&stats);
        assert!(report.contains("Keywords searched: 2"));
        assert!(report.contains("Unique listings: 8 (20.0% duplicates)"));
        assert!(report.contains("Duration: 90.0 seconds (1.50 minutes)"));
        assert!(!report.contains("Scrape:"));
    }

    #[test]
    fn test_phase_constructors_report_their_own_block() {
        let crawl = format_statistics(&RunStatistics::crawl(3, 12, 9));
        assert!(crawl.contains("Keywords searched: 3"));
        assert!(crawl.contains("Unique listings: 9 (25.0% duplicates)"));
        assert!(!crawl.contains("Scrape:"));

        let scrape = format_statistics(&RunStatistics::scrape(9, 7, 1));
        assert!(!scrape.contains("Crawl:"));
        assert!(scrape.contains("Records written: 7"));
        assert!(scrape.contains("Records dropped: 1"));
    }
}
