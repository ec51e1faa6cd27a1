//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use crate::support::{html_page, mount_html, test_crawler_config, test_fetcher};
use docharvest::crawler::{CrawlLimits, Crawler, FetchResult};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn crawler(max_pages: usize) -> Crawler {
    crawler_with_budget(max_pages, Duration::from_secs(60))
}

fn crawler_with_budget(max_pages: usize, time_budget: Duration) -> Crawler {
    let config = test_crawler_config();
    Crawler::new(
        test_fetcher(&config),
        CrawlLimits {
            max_pages,
            time_budget,
        },
    )
}

fn gzip(body: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body).unwrap();
    encoder.finish().unwrap()
}

fn crawled_paths(pages: &[docharvest::CrawledPage]) -> Vec<String> {
    pages
        .iter()
        .map(|p| Url::parse(&p.url).unwrap().path().to_string())
        .collect()
}

#[tokio::test]
async fn test_prefix_restricts_followed_links() {
    let mock_server = MockServer::start().await;
    let base_url = Url::parse(&mock_server.uri()).unwrap();

    mount_html(
        &mock_server,
        "/",
        html_page(
            "Home",
            &[
                "/docs/a",
                "/blog/b",
                "https://elsewhere.example.com/docs/c",
                "mailto:team@example.com",
                "#top",
            ],
        ),
    )
    .await;
    mount_html(&mock_server, "/docs/a", html_page("A", &["/", "/docs/a#intro"])).await;
    mount_html(&mock_server, "/blog/b", html_page("B", &[])).await;

    let outcome = crawler(100).crawl(&base_url, Some("/docs")).await;

    assert_eq!(crawled_paths(&outcome.pages), vec!["/", "/docs/a"]);
    assert_eq!(outcome.pages[0].title.as_deref(), Some("Home"));
    assert_eq!(outcome.pages[1].title.as_deref(), Some("A"));
    assert_eq!(outcome.failed, 0);
    assert!(!outcome.timed_out);
}

#[tokio::test]
async fn test_breadth_first_order_without_prefix() {
    let mock_server = MockServer::start().await;
    let base_url = Url::parse(&mock_server.uri()).unwrap();

    mount_html(&mock_server, "/", html_page("Home", &["/one", "/two"])).await;
    mount_html(&mock_server, "/one", html_page("One", &["/one/deep"])).await;
    mount_html(&mock_server, "/two", html_page("Two", &["/one"])).await;
    mount_html(&mock_server, "/one/deep", html_page("Deep", &[])).await;

    let outcome = crawler(100).crawl(&base_url, None).await;

    assert_eq!(
        crawled_paths(&outcome.pages),
        vec!["/", "/one", "/two", "/one/deep"]
    );
}

#[tokio::test]
async fn test_max_pages_bounds_the_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = Url::parse(&mock_server.uri()).unwrap();

    let links: Vec<String> = (0..10).map(|i| format!("/docs/p{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_html(&mock_server, "/", html_page("Home", &link_refs)).await;
    for link in &links {
        mount_html(&mock_server, link, html_page("Page", &[])).await;
    }

    let outcome = crawler(3).crawl(&base_url, None).await;

    assert_eq!(outcome.pages.len(), 3);
    assert_eq!(crawled_paths(&outcome.pages), vec!["/", "/docs/p0", "/docs/p1"]);
}

#[tokio::test]
async fn test_failed_pages_are_dropped() {
    let mock_server = MockServer::start().await;
    let base_url = Url::parse(&mock_server.uri()).unwrap();

    mount_html(&mock_server, "/", html_page("Home", &["/missing", "/big", "/ok"])).await;
    mount_html(&mock_server, "/ok", html_page("Ok", &[])).await;
    mount_html(&mock_server, "/big", "x".repeat(128 * 1024)).await;
    // /missing is unmatched and answers 404

    let outcome = crawler(100).crawl(&base_url, None).await;

    assert_eq!(crawled_paths(&outcome.pages), vec!["/", "/ok"]);
    assert_eq!(outcome.failed, 2);
}

#[tokio::test]
async fn test_unreachable_base_yields_no_pages() {
    let base_url = Url::parse("http://127.0.0.1:9/").unwrap();

    let outcome = crawler(10).crawl(&base_url, None).await;

    assert!(outcome.pages.is_empty());
    assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn test_fetch_retries_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/flaky", "<p>finally</p>".to_string()).await;

    let fetcher = test_fetcher(&test_crawler_config());
    let result = fetcher.fetch(&format!("{}/flaky", mock_server.uri())).await;

    match result {
        FetchResult::Success { body, .. } => {
            assert_eq!(body, "<p>finally</p>");
        }
        other => panic!("Expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_honours_retry_after_on_429() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/limited", "ok".to_string()).await;

    let fetcher = test_fetcher(&test_crawler_config());
    let result = fetcher.fetch(&format!("{}/limited", mock_server.uri())).await;

    assert!(matches!(result, FetchResult::Success { .. }));
}

#[tokio::test]
async fn test_fetch_does_not_retry_client_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(&test_crawler_config());
    let result = fetcher.fetch(&format!("{}/gone", mock_server.uri())).await;

    assert!(matches!(result, FetchResult::HttpError { status_code: 410 }));
}

#[tokio::test]
async fn test_fetch_follows_redirects_and_reports_final_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new/", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/new/", "moved".to_string()).await;

    let fetcher = test_fetcher(&test_crawler_config());
    let result = fetcher.fetch(&format!("{}/old", mock_server.uri())).await;

    match result {
        FetchResult::Success {
            final_url, body, ..
        } => {
            assert!(final_url.ends_with("/new/"));
            assert_eq!(body, "moved");
        }
        other => panic!("Expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_time_budget_keeps_pages_collected_so_far() {
    let mock_server = MockServer::start().await;
    let base_url = Url::parse(&mock_server.uri()).unwrap();

    mount_html(&mock_server, "/", html_page("Home", &["/docs/fast", "/docs/slow"])).await;
    mount_html(&mock_server, "/docs/fast", html_page("Fast", &[])).await;
    Mock::given(method("GET"))
        .and(path("/docs/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Slow", &[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let started = Instant::now();
    let outcome = crawler_with_budget(100, Duration::from_millis(300))
        .crawl(&base_url, None)
        .await;

    assert!(outcome.timed_out);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(crawled_paths(&outcome.pages), vec!["/", "/docs/fast"]);
    assert_eq!(outcome.failed, 0);
}

#[tokio::test]
async fn test_declared_length_over_ceiling_is_too_large() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/huge", "x".repeat(65 * 1024)).await;

    let fetcher = test_fetcher(&test_crawler_config());
    let result = fetcher.fetch(&format!("{}/huge", mock_server.uri())).await;

    match result {
        FetchResult::TooLarge { size } => assert_eq!(size, 65 * 1024),
        other => panic!("Expected TooLarge, got {:?}", other),
    }
}

#[tokio::test]
async fn test_streamed_body_over_ceiling_is_too_large() {
    let mock_server = MockServer::start().await;

    // Decoded bodies carry no usable length, so only the streamed check applies
    Mock::given(method("GET"))
        .and(path("/packed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(&vec![b'x'; 256 * 1024]))
                .insert_header("content-encoding", "gzip")
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(&test_crawler_config());
    let result = fetcher.fetch(&format!("{}/packed", mock_server.uri())).await;

    match result {
        FetchResult::TooLarge { size } => assert!(size > 64 * 1024),
        other => panic!("Expected TooLarge, got {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_pages_are_dropped_and_crawl_continues() {
    let mock_server = MockServer::start().await;
    let base_url = Url::parse(&mock_server.uri()).unwrap();

    mount_html(
        &mock_server,
        "/",
        html_page("Home", &["/docs/huge", "/docs/packed", "/docs/ok"]),
    )
    .await;
    mount_html(&mock_server, "/docs/huge", "x".repeat(65 * 1024)).await;
    Mock::given(method("GET"))
        .and(path("/docs/packed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(gzip(&vec![b'x'; 256 * 1024]))
                .insert_header("content-encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/docs/ok", html_page("Ok", &[])).await;

    let outcome = crawler(100).crawl(&base_url, Some("/docs")).await;

    assert_eq!(crawled_paths(&outcome.pages), vec!["/", "/docs/ok"]);
    assert_eq!(outcome.failed, 2);
}
