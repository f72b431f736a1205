//! Source adapters, the outcome cache and the aggregator.
//!
//! [`NewsService`] is the surface the dashboard talks to. It turns a
//! [`FilterMode`] and search text into [`SourceRequest`]s, runs them through
//! the fetch + normalize pipeline (memoized by [`FetchCache`]) and merges the
//! results newest first.

mod aggregate;
mod cache;
mod sources;

pub use aggregate::{
    merge, Aggregation, FilterMode, NewsService, ServiceSettings, SourceOutcome,
};
pub use cache::{Clock, FetchCache, ManualClock, SystemClock, DEFAULT_CAPACITY, DEFAULT_TTL};
pub use sources::{
    CacheKey, NewsSource, OfficialReleases, QuerySearch, SourceRequest, OFFICIAL_FEED_URL,
    SEARCH_FEED_URL,
};
