use url::Url;

use crate::feed::Source;

/// METI "news release" Atom feed.
pub const OFFICIAL_FEED_URL: &str = "https://www.meti.go.jp/ml_index_release_atom.xml";

/// Google News RSS search endpoint.
pub const SEARCH_FEED_URL: &str = "https://news.google.com/rss/search";

/// Fixed locale parameters sent with every search: Japanese UI, Japan edition.
const SEARCH_LOCALE: [(&str, &str); 3] = [("hl", "ja"), ("gl", "JP"), ("ceid", "JP:ja")];

/// Identity of one adapter invocation, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: Source,
    pub param: String,
}

/// A feed source bound to the common fetch + normalize pipeline.
pub trait NewsSource: Send + Sync {
    /// Label attached to every record this source produces.
    fn source(&self) -> Source;

    /// Key under which this invocation's outcome is cached.
    fn cache_key(&self) -> CacheKey;

    /// Absolute URL of the feed document.
    fn feed_url(&self) -> Result<Url, url::ParseError>;
}

/// The official release feed; takes no parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficialReleases {
    url: String,
}

impl OfficialReleases {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for OfficialReleases {
    fn default() -> Self {
        Self::new(OFFICIAL_FEED_URL)
    }
}

impl NewsSource for OfficialReleases {
    fn source(&self) -> Source {
        Source::Official
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey {
            source: Source::Official,
            param: self.url.clone(),
        }
    }

    fn feed_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.url)
    }
}

/// A keyword search against the news aggregator.
///
/// Can only be built from a non-blank query, so an empty search never
/// reaches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySearch {
    base_url: String,
    query: String,
}

impl QuerySearch {
    /// Returns `None` when `query` is empty or whitespace.
    pub fn new(base_url: impl Into<String>, query: &str) -> Option<Self> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        Some(Self {
            base_url: base_url.into(),
            query: query.to_string(),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl NewsSource for QuerySearch {
    fn source(&self) -> Source {
        Source::Search
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey {
            source: Source::Search,
            param: format!("{}?q={}", self.base_url, self.query),
        }
    }

    fn feed_url(&self) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.base_url,
            std::iter::once(("q", self.query.as_str())).chain(SEARCH_LOCALE),
        )
    }
}

/// One adapter invocation requested by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRequest {
    Official(OfficialReleases),
    Search(QuerySearch),
}

impl SourceRequest {
    pub fn as_source(&self) -> &dyn NewsSource {
        match self {
            SourceRequest::Official(s) => s,
            SourceRequest::Search(s) => s,
        }
    }

    /// Search text for search requests, `None` for the official feed.
    pub fn query(&self) -> Option<&str> {
        match self {
            SourceRequest::Official(_) => None,
            SourceRequest::Search(s) => Some(s.query()),
        }
    }
}
