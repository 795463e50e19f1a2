//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sitescrape::config::{Config, OutputFormat};
use sitescrape::crawler::crawl;
use sitescrape::output::{file_name_for, SqliteSink};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing text files into `output_dir`
fn create_test_config(output_dir: &Path, max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.max_workers = 4;
    config.crawler.request_timeout = 5;
    config.crawler.backoff_unit_ms = 1; // Very short for testing
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.directory = output_dir.display().to_string();
    config
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn page_url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

fn read_page(output_dir: &Path, url: &Url) -> Option<String> {
    std::fs::read_to_string(output_dir.join(file_name_for(url))).ok()
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <h1>Welcome</h1>
            <p>Start here.</p>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<p>First page</p><a href="/">home</a><a href="page3">three</a>"#.to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        "<ul><li>alpha</li><li>beta</li></ul>".to_string(),
    )
    .await;
    mount_page(&mock_server, "/page3", "<blockquote>deep</blockquote>".to_string()).await;

    let config = create_test_config(output.path(), 2);
    let report = crawl(config, &base_url, CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_written, 4);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(report.urls_admitted, 3);
    assert_eq!(report.levels_completed, 3);
    assert!(!report.cancelled);

    let home = read_page(output.path(), &page_url(&mock_server, "/")).expect("home page missing");
    assert!(home.starts_with(&format!("URL: {}/\nTimestamp: ", base_url)));
    assert!(home.ends_with("\n\n# Welcome\n\nStart here."));

    let page2 = read_page(output.path(), &page_url(&mock_server, "/page2")).unwrap();
    assert!(page2.ends_with("- alpha\n\n- beta"));

    let page3 = read_page(output.path(), &page_url(&mock_server, "/page3")).unwrap();
    assert!(page3.ends_with("> deep"));
}

#[tokio::test]
async fn test_out_of_scope_links_never_fetched() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<a href="/a">a</a><a href="{}/elsewhere">elsewhere</a>"#,
            other_server.uri()
        ),
    )
    .await;
    mount_page(&mock_server, "/a", "<p>a</p>".to_string()).await;

    // Same host, different port: a different netloc
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>nope</p>"))
        .expect(0)
        .mount(&other_server)
        .await;

    let config = create_test_config(output.path(), 3);
    let report = crawl(config, &mock_server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.pages_written, 2);
    assert!(read_page(output.path(), &page_url(&other_server, "/elsewhere")).is_none());
}

#[tokio::test]
async fn test_depth_bound_respected() {
    let mock_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_page(&mock_server, "/", r#"<a href="/d1">1</a>"#.to_string()).await;
    mount_page(&mock_server, "/d1", r#"<a href="/d2">2</a>"#.to_string()).await;

    Mock::given(method("GET"))
        .and(path("/d2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>too deep</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), 1);
    let report = crawl(config, &mock_server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.pages_written, 2);
    assert_eq!(report.levels_completed, 2);
    assert_eq!(report.urls_admitted, 1);
}

#[tokio::test]
async fn test_retry_after_server_errors() {
    let mock_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    // Two failures, then the real page
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", "<p>finally</p>".to_string()).await;

    let config = create_test_config(output.path(), 0);
    let report = crawl(config, &mock_server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.pages_written, 1);
    assert_eq!(report.pages_failed, 0);

    let home = read_page(output.path(), &page_url(&mock_server, "/")).unwrap();
    assert!(home.ends_with("finally"));
}

#[tokio::test]
async fn test_missing_page_gives_up_without_aborting() {
    let mock_server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/missing">gone</a><a href="/present">here</a>"#.to_string(),
    )
    .await;
    mount_page(&mock_server, "/present", "<p>present</p>".to_string()).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(output.path(), 1);
    let report = crawl(config, &mock_server.uri(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.pages_written, 2);
    assert_eq!(report.pages_failed, 1);
    assert!(read_page(output.path(), &page_url(&mock_server, "/missing")).is_none());
}

#[tokio::test]
async fn test_crawl_into_sqlite() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pages.db");

    mount_page(
        &mock_server,
        "/",
        r#"<h2>Index</h2><a href="/about">about</a>"#.to_string(),
    )
    .await;
    mount_page(&mock_server, "/about", "<p>About us</p>".to_string()).await;

    let mut config = create_test_config(dir.path(), 1);
    config.output.format = OutputFormat::Sqlite;
    config.output.database_path = db_path.display().to_string();

    let report = crawl(config, &mock_server.uri(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.pages_written, 2);

    let sink = SqliteSink::new(&db_path).unwrap();
    assert_eq!(sink.count_pages().unwrap(), 2);

    let about = sink
        .get_page(page_url(&mock_server, "/about").as_str())
        .unwrap()
        .expect("about page missing");
    assert_eq!(about.content, "About us");
}

#[tokio::test]
async fn test_invalid_seed_is_setup_error() {
    let output = tempfile::tempdir().unwrap();
    let config = create_test_config(output.path(), 1);

    let result = crawl(config, "not a url", CancellationToken::new()).await;
    assert!(result.is_err());
}
