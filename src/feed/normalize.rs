use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::parser::RawEntry;

/// Display value for entries without any usable date.
pub const UNKNOWN_DATE: &str = "Unknown Date";

/// Which adapter produced a record. Assigned by the adapter, never inferred
/// from feed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    /// METI official press release feed.
    #[serde(rename = "経済産業省")]
    Official,
    /// Google News keyword search feed.
    #[serde(rename = "Google News")]
    Search,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Source::Official => "経済産業省",
            Source::Search => "Google News",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A feed entry in the shape the dashboard consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsRecord {
    pub title: String,
    pub link: String,
    /// `YYYY/MM/DD`, or [`UNKNOWN_DATE`].
    pub published: String,
    pub source: Source,
    /// Raw summary text, HTML included.
    pub summary: String,
    /// Epoch seconds for ordering; 0 when the date is unknown.
    pub timestamp: i64,
}

/// Picks the date an entry is filed under: published, else updated.
pub fn resolve_date(entry: &RawEntry) -> Option<DateTime<Utc>> {
    entry.published.or(entry.updated)
}

/// Converts raw entries into records tagged with `source`.
///
/// Entries lacking a title or link are skipped. Output order matches input
/// order; sorting happens in the aggregator.
pub fn normalize(entries: Vec<RawEntry>, source: Source) -> Vec<NewsRecord> {
    let total = entries.len();
    let records: Vec<NewsRecord> = entries
        .into_iter()
        .filter_map(|entry| normalize_entry(entry, source))
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        tracing::warn!(
            source = %source,
            skipped = skipped,
            "Entries without title or link skipped"
        );
    }

    records
}

fn normalize_entry(entry: RawEntry, source: Source) -> Option<NewsRecord> {
    let date = resolve_date(&entry);

    let title = entry.title.filter(|t| !t.trim().is_empty());
    let link = entry.link.filter(|l| !l.trim().is_empty());
    let (Some(title), Some(link)) = (title, link) else {
        tracing::debug!(source = %source, "Skipping entry with missing title or link");
        return None;
    };

    let published = date
        .map(|dt| dt.format("%Y/%m/%d").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());
    let timestamp = date.map(|dt| dt.timestamp()).unwrap_or(0);
    let summary = entry.summary.or(entry.description).unwrap_or_default();

    Some(NewsRecord {
        title,
        link,
        published,
        source,
        summary,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn entry(title: &str, link: &str) -> RawEntry {
        RawEntry {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            ..RawEntry::default()
        }
    }

    #[test]
    fn test_published_date_preferred() {
        let mut e = entry("A", "https://a");
        e.published = Some(Utc.with_ymd_and_hms(2024, 1, 10, 8, 30, 0).unwrap());
        e.updated = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

        let records = normalize(vec![e], Source::Official);
        assert_eq!(records[0].published, "2024/01/10");
        assert_eq!(records[0].timestamp, 1_704_875_400);
    }

    #[test]
    fn test_updated_date_fallback() {
        let mut e = entry("A", "https://a");
        e.updated = Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

        let records = normalize(vec![e], Source::Official);
        assert_eq!(records[0].published, "2024/02/01");
        assert_eq!(records[0].timestamp, 1_706_745_600);
    }

    #[test]
    fn test_unknown_date_sentinel() {
        let records = normalize(vec![entry("A", "https://a")], Source::Search);
        assert_eq!(records[0].published, UNKNOWN_DATE);
        assert_eq!(records[0].timestamp, 0);
    }

    #[test]
    fn test_summary_precedence() {
        let mut both = entry("A", "https://a");
        both.summary = Some("<b>summary</b>".to_string());
        both.description = Some("description".to_string());

        let mut description_only = entry("B", "https://b");
        description_only.description = Some("description".to_string());

        let neither = entry("C", "https://c");

        let records = normalize(vec![both, description_only, neither], Source::Official);
        assert_eq!(records[0].summary, "<b>summary</b>");
        assert_eq!(records[1].summary, "description");
        assert_eq!(records[2].summary, "");
    }

    #[test]
    fn test_entries_missing_title_or_link_skipped() {
        let mut no_title = entry("", "https://a");
        no_title.title = None;
        let mut no_link = entry("B", "");
        no_link.link = None;
        let blank_title = entry("   ", "https://c");

        let records = normalize(
            vec![no_title, entry("Kept", "https://k"), no_link, blank_title],
            Source::Official,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Kept");
    }

    #[test]
    fn test_order_and_source_preserved() {
        let records = normalize(
            vec![entry("1", "https://1"), entry("2", "https://2"), entry("3", "https://3")],
            Source::Search,
        );
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["1", "2", "3"]);
        assert!(records.iter().all(|r| r.source == Source::Search));
    }

    #[test]
    fn test_source_labels_serialize() {
        let json = serde_json::to_string(&Source::Official).unwrap();
        assert_eq!(json, "\"経済産業省\"");
        assert_eq!(Source::Search.to_string(), "Google News");
    }

    proptest! {
        #[test]
        fn prop_structured_date_round_trips(secs in 0i64..4_102_444_800) {
            let dt = DateTime::from_timestamp(secs, 0).unwrap();
            let mut e = entry("T", "https://t");
            e.published = Some(dt);

            let records = normalize(vec![e], Source::Official);
            prop_assert_eq!(records[0].timestamp, secs);
            prop_assert_eq!(&records[0].published, &dt.format("%Y/%m/%d").to_string());
        }
    }
}
