//! Integration tests for the cache and sync manager
//!
//! A wiremock server plays the documentation site, a second one plays the
//! shared backend, and every test gets its own temporary cache/doc roots.

use crate::support::{html_page, mount_html, test_config, ScriptedConverter};
use chrono::{TimeZone, Utc};
use docharvest::storage::{CacheMetadata, LocalCache, CACHE_VERSION};
use docharvest::sync::{IndexOutcome, IndexRequest, PullSource};
use docharvest::{compute_doc_id, DocsetManager, HarvestError};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REMOTE_SITE: &str = "https://react.example.com/";

async fn mount_docs_site(server: &MockServer) {
    mount_html(server, "/", html_page("Home", &["/docs/a", "/docs/b", "/blog/x"])).await;
    mount_html(server, "/docs/a", html_page("A", &["/docs/b"])).await;
    mount_html(server, "/docs/b", html_page("B", &[])).await;
    mount_html(server, "/blog/x", html_page("X", &[])).await;
}

fn index_request(name: &str, url: &str, prefix: Option<&str>) -> IndexRequest {
    IndexRequest {
        name: name.to_string(),
        url: url.to_string(),
        path_prefix: prefix.map(str::to_string),
        force: false,
    }
}

fn local_cache(root: &TempDir) -> LocalCache {
    LocalCache::new(root.path().join("cache"), root.path().join("docs"))
}

/// Commits a cache entry with the given Markdown files
fn seed_local_entry(root: &TempDir, meta: &CacheMetadata, files: &[(&str, &str)]) {
    let cache = local_cache(root);
    let docs = cache.prepare_staging(&meta.doc_id).unwrap();
    for (relative, contents) in files {
        let target = docs.join(relative);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(target, contents).unwrap();
    }
    cache.commit(meta).unwrap();
}

fn metadata(doc_id: &str, name: &str, created_year: i32) -> CacheMetadata {
    CacheMetadata {
        version: CACHE_VERSION,
        doc_id: doc_id.to_string(),
        doc_name: name.to_string(),
        source_url: REMOTE_SITE.to_string(),
        path_prefix: None,
        model: "test-model".to_string(),
        created_at: Utc.with_ymd_and_hms(created_year, 1, 1, 0, 0, 0).unwrap(),
        pages_indexed: 1,
        docs_stored: 1,
    }
}

fn remote_docset(doc_id: &str, name: &str, created_at: &str) -> Value {
    json!({
        "id": doc_id,
        "name": name,
        "sourceUrl": REMOTE_SITE,
        "model": "remote-model",
        "createdAt": created_at,
        "pagesIndexed": 3,
        "docsStored": 3
    })
}

/// Mounts a remote docset with three pages, the second of which fails
async fn mount_remote_docset(backend: &MockServer, doc_id: &str, name: &str, created_at: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/docsets/{}", doc_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "docset": remote_docset(doc_id, name, created_at) })),
        )
        .mount(backend)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/docsets/{}/pages", doc_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pages": [
                { "id": 1, "pageUrl": "https://react.example.com/docs/hooks", "title": "Hooks" },
                { "id": 2, "pageUrl": "/docs/broken" },
                { "id": "three", "pageUrl": "/docs/state" }
            ]
        })))
        .mount(backend)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/docsets/{}/pages/1", doc_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": { "pageUrl": "https://react.example.com/docs/hooks", "contentMarkdown": "# Hooks" }
        })))
        .mount(backend)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/docsets/{}/pages/2", doc_id)))
        .respond_with(ResponseTemplate::new(500))
        .mount(backend)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/docsets/{}/pages/three", doc_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": { "pageUrl": "/docs/state", "contentMarkdown": "# State" }
        })))
        .mount(backend)
        .await;
}

#[tokio::test]
async fn test_index_crawls_caches_and_installs() {
    let site = MockServer::start().await;
    mount_docs_site(&site).await;
    let root = TempDir::new().unwrap();

    let converter = Arc::new(ScriptedConverter::all_docs());
    let manager =
        DocsetManager::new(&test_config(root.path(), None), Some(converter.clone())).unwrap();

    let outcome = manager
        .index(&index_request("My Docs", &site.uri(), Some("docs")))
        .await
        .unwrap();

    let IndexOutcome::Indexed {
        metadata,
        installed,
        report,
    } = outcome
    else {
        panic!("Expected a fresh index");
    };

    let expected_id = compute_doc_id("my-docs", &format!("{}/", site.uri()), Some("/docs"));
    assert_eq!(metadata.doc_id, expected_id);
    assert_eq!(metadata.doc_name, "my-docs");
    assert_eq!(metadata.path_prefix.as_deref(), Some("/docs"));
    assert_eq!(metadata.model, "test-model");
    assert_eq!(report.pages_discovered, 3);
    assert_eq!(metadata.pages_indexed, 3);
    assert_eq!(metadata.docs_stored, 3);
    assert!(!report.uploaded);

    assert_eq!(installed, root.path().join("docs").join("my-docs"));
    assert!(installed.join("index.md").is_file());
    assert!(installed.join("docs/a.md").is_file());
    assert!(installed.join("docs/b.md").is_file());
    assert!(!installed.join("blog").exists());

    let entry = root.path().join("cache").join(&expected_id);
    assert!(entry.join("metadata.json").is_file());
    assert!(!root.path().join("cache/.staging").join(&expected_id).exists());

    let listed = manager.list_local().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].doc_id, expected_id);
}

#[tokio::test]
async fn test_second_index_is_a_cache_hit() {
    let site = MockServer::start().await;
    mount_docs_site(&site).await;
    let root = TempDir::new().unwrap();

    let converter = Arc::new(ScriptedConverter::all_docs());
    let manager =
        DocsetManager::new(&test_config(root.path(), None), Some(converter.clone())).unwrap();
    let request = index_request("site", &site.uri(), Some("/docs"));

    manager.index(&request).await.unwrap();
    let calls_after_first = converter.calls().len();
    std::fs::remove_dir_all(root.path().join("docs/site")).unwrap();

    let outcome = manager.index(&request).await.unwrap();

    assert!(matches!(outcome, IndexOutcome::CacheHit { .. }));
    assert_eq!(converter.calls().len(), calls_after_first);
    assert!(root.path().join("docs/site/docs/a.md").is_file());
}

#[tokio::test]
async fn test_cache_hit_needs_no_converter() {
    let site = MockServer::start().await;
    mount_docs_site(&site).await;
    let root = TempDir::new().unwrap();
    let config = test_config(root.path(), None);
    let request = index_request("site", &site.uri(), Some("/docs"));

    let with_converter =
        DocsetManager::new(&config, Some(Arc::new(ScriptedConverter::all_docs()))).unwrap();
    with_converter.index(&request).await.unwrap();

    let without_converter = DocsetManager::new(&config, None).unwrap();
    let outcome = without_converter.index(&request).await.unwrap();
    assert!(matches!(outcome, IndexOutcome::CacheHit { .. }));

    let forced = IndexRequest {
        force: true,
        ..request
    };
    let err = without_converter.index(&forced).await.unwrap_err();
    assert!(matches!(err, HarvestError::Convert(_)));
}

#[tokio::test]
async fn test_invalid_input_is_rejected_before_crawling() {
    let root = TempDir::new().unwrap();
    let converter = Arc::new(ScriptedConverter::all_docs());
    let manager =
        DocsetManager::new(&test_config(root.path(), None), Some(converter.clone())).unwrap();

    let bad_url = manager
        .index(&index_request("ok", "ftp://example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(bad_url, HarvestError::Url(_)));

    let bad_prefix = manager
        .index(&index_request("ok", "https://example.com", Some("/docs/../etc")))
        .await
        .unwrap_err();
    assert!(matches!(bad_prefix, HarvestError::Url(_)));

    let bad_name = manager
        .index(&index_request("   ", "https://example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(bad_name, HarvestError::InvalidInput(_)));

    assert!(converter.calls().is_empty());
    assert!(converter.prefix_calls().is_empty());
}

#[tokio::test]
async fn test_unreachable_site_leaves_cache_untouched() {
    let root = TempDir::new().unwrap();
    let manager = DocsetManager::new(
        &test_config(root.path(), None),
        Some(Arc::new(ScriptedConverter::all_docs())),
    )
    .unwrap();

    let outcome = manager
        .index(&index_request("nothing", "http://127.0.0.1:9", Some("/docs")))
        .await
        .unwrap();

    assert!(!outcome.is_success());
    assert!(manager.list_local().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_docs_written_discards_staging() {
    let site = MockServer::start().await;
    mount_html(&site, "/", html_page("Home", &["/blog/x"])).await;
    mount_html(&site, "/blog/x", html_page("X", &[])).await;
    let root = TempDir::new().unwrap();

    let converter = Arc::new(ScriptedConverter::new(|_| {
        Ok(docharvest::convert::Conversion::NonDoc)
    }));
    let manager = DocsetManager::new(&test_config(root.path(), None), Some(converter)).unwrap();

    let outcome = manager
        .index(&index_request("blog", &site.uri(), Some("/")))
        .await
        .unwrap();

    let IndexOutcome::Empty { report } = outcome else {
        panic!("Expected an empty outcome");
    };
    assert_eq!(report.pages_discovered, 2);
    assert_eq!(report.docs_written, 0);
    assert!(manager.list_local().unwrap().is_empty());
    assert!(!root.path().join("docs/blog").exists());
}

#[tokio::test]
async fn test_inferred_prefix_guides_the_crawl() {
    let site = MockServer::start().await;
    mount_docs_site(&site).await;
    let root = TempDir::new().unwrap();

    let converter = Arc::new(ScriptedConverter::all_docs().with_prefix_answer("docs\nextra"));
    let manager =
        DocsetManager::new(&test_config(root.path(), None), Some(converter.clone())).unwrap();

    let outcome = manager
        .index(&index_request("site", &site.uri(), None))
        .await
        .unwrap();

    let IndexOutcome::Indexed {
        metadata, report, ..
    } = outcome
    else {
        panic!("Expected a fresh index");
    };

    let prefix_calls = converter.prefix_calls();
    assert_eq!(prefix_calls.len(), 1);
    assert!(prefix_calls[0].contains(&"/docs/a".to_string()));
    assert_eq!(report.path_prefix.as_deref(), Some("/docs"));
    assert_eq!(metadata.path_prefix.as_deref(), Some("/docs"));
    assert_eq!(report.pages_discovered, 3);
    // The id reflects the explicit prefix, which was absent
    assert_eq!(
        metadata.doc_id,
        compute_doc_id("site", &format!("{}/", site.uri()), None)
    );
}

#[tokio::test]
async fn test_index_served_from_remote_counts_written_pages() {
    let backend = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let doc_id = compute_doc_id("react", REMOTE_SITE, Some("/docs"));
    mount_remote_docset(&backend, &doc_id, "React", "2024-05-01T00:00:00Z").await;

    let converter = Arc::new(ScriptedConverter::all_docs());
    let manager = DocsetManager::new(
        &test_config(root.path(), Some(&backend.uri())),
        Some(converter.clone()),
    )
    .unwrap();

    let outcome = manager
        .index(&index_request("React", "https://react.example.com", Some("/docs")))
        .await
        .unwrap();

    let IndexOutcome::RemoteServed {
        metadata,
        installed,
    } = outcome
    else {
        panic!("Expected the shared cache to serve");
    };

    assert_eq!(metadata.doc_id, doc_id);
    assert_eq!(metadata.doc_name, "react");
    assert_eq!(metadata.docs_stored, 2);
    assert_eq!(metadata.pages_indexed, 3);
    assert!(converter.calls().is_empty());
    assert_eq!(
        std::fs::read_to_string(installed.join("docs/hooks.md")).unwrap(),
        "# Hooks"
    );
    assert!(installed.join("docs/state.md").is_file());
    assert!(!installed.join("docs/broken.md").exists());
}

#[tokio::test]
async fn test_index_uploads_after_crawl() {
    let site = MockServer::start().await;
    mount_docs_site(&site).await;
    let backend = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/docsets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&backend)
        .await;

    let manager = DocsetManager::new(
        &test_config(root.path(), Some(&backend.uri())),
        Some(Arc::new(ScriptedConverter::all_docs())),
    )
    .unwrap();

    let outcome = manager
        .index(&index_request("site", &site.uri(), Some("/docs")))
        .await
        .unwrap();

    let IndexOutcome::Indexed { report, .. } = outcome else {
        panic!("Expected a fresh index");
    };
    assert!(report.uploaded);

    let requests = backend.received_requests().await.unwrap();
    let upload = requests.iter().find(|r| r.method.to_string() == "POST").unwrap();
    let body: Value = serde_json::from_slice(&upload.body).unwrap();
    assert_eq!(body["docName"], "site");
    assert_eq!(body["docsStored"], 3);
    assert_eq!(body["pages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_failed_upload_does_not_fail_index() {
    let site = MockServer::start().await;
    mount_docs_site(&site).await;
    let backend = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/docsets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&backend)
        .await;

    let manager = DocsetManager::new(
        &test_config(root.path(), Some(&backend.uri())),
        Some(Arc::new(ScriptedConverter::all_docs())),
    )
    .unwrap();

    let outcome = manager
        .index(&index_request("site", &site.uri(), Some("/docs")))
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(manager.list_local().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pull_prefers_newer_remote_copy() {
    let backend = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let doc_id = "0123456789abcdef";
    seed_local_entry(
        &root,
        &metadata(doc_id, "react", 2023),
        &[("docs/old.md", "# Old")],
    );
    mount_remote_docset(&backend, doc_id, "React", "2024-05-01T00:00:00Z").await;

    let manager = DocsetManager::new(&test_config(root.path(), Some(&backend.uri())), None).unwrap();
    let outcome = manager.pull("React").await.unwrap();

    assert_eq!(outcome.source, PullSource::Remote);
    assert_eq!(outcome.metadata.docs_stored, 2);
    assert_eq!(outcome.files, 2);
    assert_eq!(outcome.installed, root.path().join("docs/react"));
    assert!(outcome.installed.join("docs/hooks.md").is_file());
    assert!(!outcome.installed.join("docs/old.md").exists());

    let cached = local_cache(&root).read_metadata(doc_id).unwrap().unwrap();
    assert_eq!(cached.docs_stored, 2);
    assert_eq!(cached.model, "remote-model");
}

#[tokio::test]
async fn test_pull_keeps_newer_local_copy() {
    let backend = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let doc_id = "fedcba9876543210";
    seed_local_entry(
        &root,
        &metadata(doc_id, "vue", 2030),
        &[("guide.md", "# Guide")],
    );

    Mock::given(method("GET"))
        .and(path(format!("/docsets/{}", doc_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({ "docset": remote_docset(doc_id, "vue", "2024-01-01T00:00:00Z") }),
        ))
        .mount(&backend)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/docsets/{}/pages", doc_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pages": [] })))
        .expect(0)
        .mount(&backend)
        .await;

    let manager = DocsetManager::new(&test_config(root.path(), Some(&backend.uri())), None).unwrap();
    let outcome = manager.pull(doc_id).await.unwrap();

    assert_eq!(outcome.source, PullSource::Local);
    assert_eq!(outcome.files, 1);
    assert!(root.path().join("docs/vue/guide.md").is_file());
}

#[tokio::test]
async fn test_pull_by_name_searches_remote() {
    let backend = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let doc_id = "00000000000000aa";
    Mock::given(method("GET"))
        .and(path("/docsets"))
        .and(query_param("q", "React"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docsets": [
                remote_docset(doc_id, "React", "2024-05-01T00:00:00Z"),
                remote_docset("00000000000000bb", "React Native", "2024-05-01T00:00:00Z")
            ]
        })))
        .mount(&backend)
        .await;
    mount_remote_docset(&backend, doc_id, "React", "2024-05-01T00:00:00Z").await;

    let manager = DocsetManager::new(&test_config(root.path(), Some(&backend.uri())), None).unwrap();
    let outcome = manager.pull("React").await.unwrap();

    assert_eq!(outcome.source, PullSource::Remote);
    assert_eq!(outcome.metadata.doc_id, doc_id);
    assert!(root.path().join("docs/react/docs/state.md").is_file());
}

#[tokio::test]
async fn test_pull_ambiguous_local_name() {
    let root = TempDir::new().unwrap();
    seed_local_entry(&root, &metadata("000000000000000a", "dup", 2023), &[("a.md", "# A")]);
    seed_local_entry(&root, &metadata("000000000000000b", "dup", 2024), &[("b.md", "# B")]);

    let manager = DocsetManager::new(&test_config(root.path(), None), None).unwrap();
    let err = manager.pull("dup").await.unwrap_err();

    assert!(matches!(err, HarvestError::Ambiguous { .. }));
}

#[tokio::test]
async fn test_pull_unknown_docset() {
    let root = TempDir::new().unwrap();
    let manager = DocsetManager::new(&test_config(root.path(), None), None).unwrap();

    let err = manager.pull("nope").await.unwrap_err();
    assert!(matches!(err, HarvestError::NotFound(_)));
}

#[tokio::test]
async fn test_push_uploads_local_docsets() {
    let backend = MockServer::start().await;
    let root = TempDir::new().unwrap();

    seed_local_entry(
        &root,
        &metadata("0000000000000001", "react", 2024),
        &[("index.md", "# React"), ("docs/hooks.md", "# Hooks\n\nUse them.")],
    );
    // Entry with an empty docs tree is skipped
    seed_local_entry(&root, &metadata("0000000000000002", "empty", 2024), &[]);

    Mock::given(method("POST"))
        .and(path("/docsets"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&backend)
        .await;

    let manager = DocsetManager::new(&test_config(root.path(), Some(&backend.uri())), None).unwrap();
    let report = manager.push().await.unwrap();

    assert_eq!(report.pushed, vec!["react".to_string()]);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);

    let requests = backend.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["docId"], "0000000000000001");
    let urls: Vec<&str> = body["pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["url"].as_str().unwrap())
        .collect();
    assert!(urls.contains(&"https://react.example.com/"));
    assert!(urls.contains(&"https://react.example.com/docs/hooks"));
}

#[tokio::test]
async fn test_push_without_backend_is_an_input_error() {
    let root = TempDir::new().unwrap();
    let manager = DocsetManager::new(&test_config(root.path(), None), None).unwrap();

    let err = manager.push().await.unwrap_err();
    assert!(matches!(err, HarvestError::InvalidInput(_)));
}

#[tokio::test]
async fn test_list_remote_passes_paging() {
    let backend = MockServer::start().await;
    let root = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/docsets"))
        .and(query_param("limit", "5"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docsets": [remote_docset("00000000000000cc", "Svelte", "2024-02-02T00:00:00Z")]
        })))
        .mount(&backend)
        .await;

    let manager = DocsetManager::new(&test_config(root.path(), Some(&backend.uri())), None).unwrap();
    let docsets = manager.list_remote(None, 5, 10).await.unwrap();

    assert_eq!(docsets.len(), 1);
    assert_eq!(docsets[0].name, "Svelte");
}
