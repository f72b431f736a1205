//! Feed retrieval and normalization.
//!
//! - [`fetcher`] - Single-attempt HTTP fetch with connect/read timeouts
//! - [`parser`] - RSS/Atom parsing via `feed-rs`, with a lenient `quick-xml`
//!   recovery pass for malformed documents
//! - [`normalize`] - Conversion of raw entries into [`NewsRecord`]s
//!
//! # Example
//!
//! ```ignore
//! use meti_news::feed::{normalize, FeedFetcher, FetchSettings, Source};
//!
//! let fetcher = FeedFetcher::new(&FetchSettings::default())?;
//! let parsed = fetcher.fetch("https://www.meti.go.jp/ml_index_release_atom.xml").await?;
//! let records = normalize(parsed.entries, Source::Official);
//! ```

mod fetcher;
mod normalize;
mod parser;

pub use fetcher::{FeedFetcher, FetchError, FetchSettings, DEFAULT_USER_AGENT};
pub use normalize::{normalize, resolve_date, NewsRecord, Source, UNKNOWN_DATE};
pub use parser::{parse_feed, ParseError, ParsedFeed, RawEntry};
