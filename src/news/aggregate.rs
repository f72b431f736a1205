use futures::future::join_all;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::feed::{normalize, FeedFetcher, NewsRecord, Source};

use super::cache::{Clock, FetchCache, SystemClock, DEFAULT_CAPACITY, DEFAULT_TTL};
use super::sources::{
    CacheKey, NewsSource, OfficialReleases, QuerySearch, SourceRequest, OFFICIAL_FEED_URL,
    SEARCH_FEED_URL,
};

/// Which sources a refresh should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Official releases and search results
    #[default]
    All,
    /// Official releases only
    #[serde(alias = "official_only")]
    Official,
    /// Search results only
    #[serde(alias = "search_only")]
    Search,
}

impl FilterMode {
    pub fn label(self) -> &'static str {
        match self {
            FilterMode::All => "すべて",
            FilterMode::Official => "公式情報のみ",
            FilterMode::Search => "Google Newsのみ",
        }
    }

    /// The next mode in selector order, wrapping around.
    pub fn next(self) -> Self {
        match self {
            FilterMode::All => FilterMode::Official,
            FilterMode::Official => FilterMode::Search,
            FilterMode::Search => FilterMode::All,
        }
    }

    fn includes(self, source: Source) -> bool {
        matches!(
            (self, source),
            (FilterMode::All, _)
                | (FilterMode::Official, Source::Official)
                | (FilterMode::Search, Source::Search)
        )
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one adapter invocation within a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source: Source,
    /// Search text, for search requests.
    pub query: Option<String>,
    /// Records contributed, or `None` when the source produced nothing.
    pub records: Option<usize>,
}

impl SourceOutcome {
    pub fn succeeded(&self) -> bool {
        self.records.is_some()
    }
}

/// Merged output of a refresh.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// All records, newest first.
    pub records: Vec<NewsRecord>,
    /// One entry per request, in request order.
    pub outcomes: Vec<SourceOutcome>,
}

/// Merges per-source batches into one newest-first sequence.
///
/// The sort is stable: equal timestamps keep batch order, then entry order.
pub fn merge(batches: Vec<Vec<NewsRecord>>) -> Vec<NewsRecord> {
    let mut records: Vec<NewsRecord> = batches.into_iter().flatten().collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}

/// Endpoints and cache tuning for [`NewsService`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub official_feed_url: String,
    pub search_feed_url: String,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            official_feed_url: OFFICIAL_FEED_URL.to_string(),
            search_feed_url: SEARCH_FEED_URL.to_string(),
            cache_ttl: DEFAULT_TTL,
            cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

type Outcome = Option<Vec<NewsRecord>>;

/// Composition root for the ingestion pipeline: owns the fetcher and the
/// outcome cache, and exposes the calls the presentation layer makes.
pub struct NewsService {
    fetcher: FeedFetcher,
    cache: FetchCache<CacheKey, Outcome>,
    settings: ServiceSettings,
}

impl NewsService {
    pub fn new(fetcher: FeedFetcher, settings: ServiceSettings) -> Self {
        Self::with_clock(fetcher, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        fetcher: FeedFetcher,
        settings: ServiceSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = FetchCache::with_clock(settings.cache_ttl, settings.cache_capacity, clock);
        Self {
            fetcher,
            cache,
            settings,
        }
    }

    pub fn official(&self) -> OfficialReleases {
        OfficialReleases::new(self.settings.official_feed_url.as_str())
    }

    /// `None` for a blank query.
    pub fn search(&self, query: &str) -> Option<QuerySearch> {
        QuerySearch::new(self.settings.search_feed_url.as_str(), query)
    }

    /// Builds the requests for a filter mode: official first, then search.
    /// Search is left out when the query is blank.
    pub fn requests(&self, mode: FilterMode, query: &str) -> Vec<SourceRequest> {
        let mut requests = Vec::with_capacity(2);
        if mode.includes(Source::Official) {
            requests.push(SourceRequest::Official(self.official()));
        }
        if mode.includes(Source::Search) {
            match self.search(query) {
                Some(search) => requests.push(SourceRequest::Search(search)),
                None => tracing::debug!("Blank search query, search source not invoked"),
            }
        }
        requests
    }

    /// Records from the official feed, or `None` if nothing was obtained.
    pub async fn get_official_news(&self) -> Option<Vec<NewsRecord>> {
        self.collect(&self.official()).await
    }

    /// Records for a search query, or `None` if nothing was obtained.
    /// A blank query returns `None` without touching the network.
    pub async fn get_search_news(&self, query: &str) -> Option<Vec<NewsRecord>> {
        let search = self.search(query)?;
        self.collect(&search).await
    }

    /// Runs every request concurrently and merges the results newest first.
    ///
    /// A failing source contributes zero records and never affects the
    /// others; when every source fails the result is simply empty.
    pub async fn aggregate(&self, requests: &[SourceRequest]) -> Aggregation {
        let results = join_all(
            requests
                .iter()
                .map(|request| self.collect(request.as_source())),
        )
        .await;

        let mut outcomes = Vec::with_capacity(requests.len());
        let mut batches = Vec::with_capacity(requests.len());
        for (request, result) in requests.iter().zip(results) {
            let source = request.as_source().source();
            outcomes.push(SourceOutcome {
                source,
                query: request.query().map(str::to_string),
                records: result.as_ref().map(Vec::len),
            });
            if let Some(records) = result {
                batches.push(records);
            }
        }

        let records = merge(batches);
        tracing::info!(
            sources = requests.len(),
            records = records.len(),
            "Aggregated news"
        );

        Aggregation { records, outcomes }
    }

    /// Fetch + normalize for one source, memoized per cache key.
    async fn collect(&self, source: &dyn NewsSource) -> Outcome {
        self.cache
            .get_or_fetch(source.cache_key(), || self.fetch_and_normalize(source))
            .await
    }

    async fn fetch_and_normalize(&self, source: &dyn NewsSource) -> Outcome {
        let label = source.source();
        let url = match source.feed_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(source = %label, error = %e, "Invalid feed URL");
                return None;
            }
        };

        let parsed = match self.fetcher.fetch(url.as_str()).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(source = %label, url = %url, error = %e, "Feed fetch failed");
                return None;
            }
        };

        let records = normalize(parsed.entries, label);
        if records.is_empty() {
            tracing::info!(source = %label, url = %url, "Feed yielded no records");
            return None;
        }

        tracing::debug!(source = %label, records = records.len(), "Feed normalized");
        Some(records)
    }
}
