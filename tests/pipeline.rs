//! End-to-end tests for fetch, normalize, cache and merge against mock feeds.
//!
//! Each test starts its own wiremock server standing in for both the official
//! release feed and the news search endpoint.

use std::sync::Arc;
use std::time::Duration;

use meti_news::feed::{FeedFetcher, FetchSettings, Source, UNKNOWN_DATE};
use meti_news::news::{FilterMode, ManualClock, NewsService, ServiceSettings};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OFFICIAL_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>経済産業省 ニュースリリース</title>
  <id>urn:meti:releases</id>
  <updated>2024-01-10T09:00:00Z</updated>
  <entry>
    <title>GX推進戦略を公表しました</title>
    <id>urn:meti:1</id>
    <link rel="alternate" href="https://www.meti.go.jp/press/2024/01/20240110001/20240110001.html"/>
    <published>2024-01-10T09:00:00Z</published>
    <updated>2024-01-10T09:00:00Z</updated>
    <summary>GX推進戦略の概要</summary>
  </entry>
  <entry>
    <title>中小企業支援策について</title>
    <id>urn:meti:2</id>
    <link rel="alternate" href="https://www.meti.go.jp/press/2024/01/20240105001/20240105001.html"/>
    <published>2024-01-05T09:00:00Z</published>
    <updated>2024-01-05T09:00:00Z</updated>
  </entry>
</feed>"#;

const SEARCH_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"経済産業省" - Google ニュース</title>
    <link>https://news.google.com/</link>
    <description>Google ニュース</description>
    <item>
      <title>経済産業省、新たな補助金制度 - 日本経済新聞</title>
      <link>https://news.google.com/rss/articles/abc?oc=5</link>
      <pubDate>Mon, 08 Jan 2024 09:00:00 GMT</pubDate>
      <description>&lt;a href="https://www.nikkei.com/"&gt;経済産業省、新たな補助金制度&lt;/a&gt;</description>
    </item>
  </channel>
</rss>"#;

fn atom() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(OFFICIAL_ATOM)
        .insert_header("content-type", "application/atom+xml")
}

fn rss(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "application/rss+xml")
}

fn service_for(server: &MockServer, clock: &ManualClock) -> NewsService {
    let fetcher = FeedFetcher::new(&FetchSettings::default()).unwrap();
    let settings = ServiceSettings {
        official_feed_url: format!("{}/ml_index_release_atom.xml", server.uri()),
        search_feed_url: format!("{}/rss/search", server.uri()),
        ..ServiceSettings::default()
    };
    NewsService::with_clock(fetcher, settings, Arc::new(clock.clone()))
}

#[tokio::test]
async fn test_all_sources_merged_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ml_index_release_atom.xml"))
        .respond_with(atom())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .and(query_param("q", "経済産業省"))
        .and(query_param("hl", "ja"))
        .and(query_param("gl", "JP"))
        .and(query_param("ceid", "JP:ja"))
        .respond_with(rss(SEARCH_RSS))
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    let requests = service.requests(FilterMode::All, "経済産業省");
    let aggregation = service.aggregate(&requests).await;

    let order: Vec<(&str, Source)> = aggregation
        .records
        .iter()
        .map(|r| (r.published.as_str(), r.source))
        .collect();
    assert_eq!(
        order,
        vec![
            ("2024/01/10", Source::Official),
            ("2024/01/08", Source::Search),
            ("2024/01/05", Source::Official),
        ]
    );

    let search = &aggregation.records[1];
    assert_eq!(search.link, "https://news.google.com/rss/articles/abc?oc=5");
    assert!(search.summary.contains("経済産業省、新たな補助金制度"));
    assert_eq!(aggregation.records[2].summary, "");

    assert_eq!(aggregation.outcomes.len(), 2);
    assert_eq!(aggregation.outcomes[0].records, Some(2));
    assert_eq!(aggregation.outcomes[1].query.as_deref(), Some("経済産業省"));
}

#[tokio::test]
async fn test_official_only_skips_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ml_index_release_atom.xml"))
        .respond_with(atom())
        .mount(&server)
        .await;
    Mock::given(path("/rss/search"))
        .respond_with(rss(SEARCH_RSS))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    let requests = service.requests(FilterMode::Official, "経済産業省");
    let aggregation = service.aggregate(&requests).await;

    assert_eq!(aggregation.records.len(), 2);
    assert!(aggregation
        .records
        .iter()
        .all(|r| r.source == Source::Official));
}

#[tokio::test]
async fn test_cached_within_ttl_refetched_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ml_index_release_atom.xml"))
        .respond_with(atom())
        .mount(&server)
        .await;

    let clock = ManualClock::new();
    let service = service_for(&server, &clock);

    let first = service.get_official_news().await.unwrap();
    clock.advance(Duration::from_secs(9 * 60));
    let second = service.get_official_news().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    clock.advance(Duration::from_secs(61));
    service.get_official_news().await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_distinct_queries_cached_separately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(rss(SEARCH_RSS))
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    service.get_search_news("GX").await.unwrap();
    service.get_search_news("半導体").await.unwrap();
    service.get_search_news("GX").await.unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failure_is_cached_for_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ml_index_release_atom.xml"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    assert!(service.get_official_news().await.is_none());
    assert!(service.get_official_news().await.is_none());
}

#[tokio::test]
async fn test_blank_query_never_hits_network() {
    let server = MockServer::start().await;
    Mock::given(path("/rss/search"))
        .respond_with(rss(SEARCH_RSS))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    assert!(service.get_search_news("").await.is_none());
    assert!(service.get_search_news("   ").await.is_none());

    let requests = service.requests(FilterMode::Search, "  ");
    assert!(requests.is_empty());
    let aggregation = service.aggregate(&requests).await;
    assert!(aggregation.records.is_empty());
}

#[tokio::test]
async fn test_failing_source_does_not_block_other() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ml_index_release_atom.xml"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(rss(SEARCH_RSS))
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    let requests = service.requests(FilterMode::All, "経済産業省");
    let aggregation = service.aggregate(&requests).await;

    assert_eq!(aggregation.records.len(), 1);
    assert_eq!(aggregation.records[0].source, Source::Search);
    assert!(!aggregation.outcomes[0].succeeded());
    assert!(aggregation.outcomes[1].succeeded());
}

#[tokio::test]
async fn test_all_sources_failing_yields_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    let requests = service.requests(FilterMode::All, "経済産業省");
    let aggregation = service.aggregate(&requests).await;

    assert!(aggregation.records.is_empty());
    assert_eq!(aggregation.outcomes.len(), 2);
    assert!(aggregation.outcomes.iter().all(|o| !o.succeeded()));
}

#[tokio::test]
async fn test_empty_feed_reported_as_no_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(rss(
            r#"<rss version="2.0"><channel><title>empty</title><link>https://example.com</link><description>none</description></channel></rss>"#,
        ))
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    assert!(service.get_search_news("該当なし").await.is_none());
}

#[tokio::test]
async fn test_malformed_feed_with_entries_still_used() {
    let server = MockServer::start().await;
    let broken = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>releases</title>
  <entry>
    <title>壊れたフィードの記事</title>
    <link href="https://www.meti.go.jp/press/a.html"/>
    <updated>2024-01-10T09:00:00Z</updated>
  </entry>
  <entry>
    <title>途中で切れた記事"#;
    Mock::given(method("GET"))
        .and(path("/ml_index_release_atom.xml"))
        .respond_with(rss(broken))
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    let records = service.get_official_news().await.unwrap();

    assert_eq!(records[0].title, "壊れたフィードの記事");
    assert_eq!(records[0].published, "2024/01/10");
}

#[tokio::test]
async fn test_undated_entries_sort_last() {
    let server = MockServer::start().await;
    let undated = r#"<rss version="2.0"><channel><title>t</title><link>https://example.com</link><description>d</description>
<item><title>日付なし</title><link>https://example.com/undated</link></item>
</channel></rss>"#;
    Mock::given(method("GET"))
        .and(path("/ml_index_release_atom.xml"))
        .respond_with(atom())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(rss(undated))
        .mount(&server)
        .await;

    let service = service_for(&server, &ManualClock::new());
    let requests = service.requests(FilterMode::All, "GX");
    let aggregation = service.aggregate(&requests).await;

    let last = aggregation.records.last().unwrap();
    assert_eq!(last.title, "日付なし");
    assert_eq!(last.published, UNKNOWN_DATE);
    assert_eq!(last.timestamp, 0);
}
