//! Integration tests for the crawler
//!
//! These tests use wiremock to serve result pages to the built-in HTTP
//! browser and run full crawls end-to-end.

use lead_harvest::browser::HttpLauncher;
use lead_harvest::config::{load_config, Config};
use lead_harvest::crawler::{crawl, Coordinator, CrawlRequest};
use lead_harvest::output::ChannelProgressSink;
use lead_harvest::state::{CrawlFailure, CrawlStatus};
use std::io::Write;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Short waits so a crawl finishes in well under a second
const FAST_CONFIG: &str = r#"
[pacing]
min-delay-ms = 1
max-delay-ms = 5
default-delay-ms = 2
row-jitter-min-ms = 0
row-jitter-max-ms = 0
scroll-pause-ms = 0
seed = 7

[timeouts]
page-load-ms = 1000
settle-ms = 0
rows-appear-ms = 300
poll-interval-ms = 10
"#;

/// Loads the fast config through a real file, pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(FAST_CONFIG.as_bytes())
        .expect("Failed to write config");

    let mut config = load_config(file.path()).expect("Failed to load config");
    config.crawler.base_url = base_url.to_string();
    config
}

fn person_row(name: &str, email: &str, phone: &str) -> String {
    format!(
        r#"<div data-cy="person">
             <span data-cy="person-name">{}</span>
             <span data-cy="person-title">Head of Growth</span>
             <span data-cy="person-company">Initech</span>
             <a href="/#/companies/initech">Initech</a>
             <p>{} {}</p>
           </div>"#,
        name, email, phone
    )
}

fn results_page(rows: &[String], next_page: Option<u32>) -> String {
    let next = next_page
        .map(|page| format!(r#"<a data-cy="next-page" href="?page={}">Next</a>"#, page))
        .unwrap_or_else(|| r#"<button aria-label="Next" disabled>Next</button>"#.to_string());
    format!(
        "<html><body><main>{}</main><nav>{}</nav></body></html>",
        rows.join("\n"),
        next
    )
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/people"))
        .and(query_param("page", page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Two result pages: three people, then two more and a disabled "next"
async fn mount_two_pages(server: &MockServer) {
    mount_page(
        server,
        "1",
        results_page(
            &[
                person_row("Peter Gibbons", "peter@initech.com", "(512) 555-0101"),
                person_row("Samir Nagheenanajar", "samir@initech.com", ""),
                person_row("Michael Bolton", "", "+1 (512) 555-0103"),
            ],
            Some(2),
        ),
    )
    .await;
    mount_page(
        server,
        "2",
        results_page(
            &[
                person_row("Bill Lumbergh", "bill@initech.com", ""),
                person_row("Milton Waddams", "", ""),
            ],
            None,
        ),
    )
    .await;
}

#[tokio::test]
async fn test_full_crawl_across_pages() {
    let mock_server = MockServer::start().await;
    mount_two_pages(&mock_server).await;

    let base_url = mock_server.uri();
    let config = create_test_config(&base_url);
    let (sink, mut receiver) = ChannelProgressSink::channel();

    let request = CrawlRequest::new(format!("{}/people?page=1", base_url), 10);
    let outcome = crawl(config, request, &sink, CancellationToken::new())
        .await
        .expect("Crawl should run");

    assert_eq!(outcome.status, CrawlStatus::Exhausted);
    assert_eq!(outcome.pages_harvested, 2);
    assert!(!outcome.page_limit_hit);

    let names: Vec<&str> = outcome.leads.iter().map(|l| l.full_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Peter Gibbons",
            "Samir Nagheenanajar",
            "Michael Bolton",
            "Bill Lumbergh",
            "Milton Waddams"
        ]
    );

    let peter = &outcome.leads[0];
    assert_eq!(peter.first_name, "Peter");
    assert_eq!(peter.last_name, "Gibbons");
    assert_eq!(peter.email, "peter@initech.com");
    assert_eq!(peter.phone, "(512) 555-0101");
    assert_eq!(peter.job_title, "Head of Growth");
    assert_eq!(peter.company_name, "Initech");
    assert_eq!(peter.company_domain, "initech");

    assert_eq!(outcome.leads[2].phone, "+1 (512) 555-0103");
    assert_eq!(outcome.leads[4].email, "");
    assert_eq!(outcome.tally.successes, 5);
    assert_eq!(outcome.tally.errors, 0);

    let first = receiver.try_recv().expect("progress after page 1");
    assert_eq!((first.leads_so_far, first.page), (3, 1));
    let second = receiver.try_recv().expect("progress after page 2");
    assert_eq!((second.leads_so_far, second.page), (5, 2));
}

#[tokio::test]
async fn test_quota_stops_mid_list() {
    let mock_server = MockServer::start().await;
    mount_two_pages(&mock_server).await;

    let base_url = mock_server.uri();
    let config = create_test_config(&base_url);
    let launcher = HttpLauncher::new(config.http.clone(), &config.timeouts);
    let coordinator = Coordinator::new(config, launcher);
    let (sink, _receiver) = ChannelProgressSink::channel();

    let request = CrawlRequest::new(format!("{}/people?page=1", base_url), 4);
    let outcome = coordinator
        .run(request, &sink, CancellationToken::new())
        .await
        .expect("Crawl should run");

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.leads.len(), 4);
    assert_eq!(outcome.leads[3].full_name, "Bill Lumbergh");
}

#[tokio::test]
async fn test_login_redirect_is_authentication_required() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let sign_in = format!("{}/sign-in", base_url);

    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", sign_in.as_str()))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sign-in"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><form id=\"login\"></form></body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let (sink, mut receiver) = ChannelProgressSink::channel();
    let request = CrawlRequest::new(format!("{}/people?page=1", base_url), 10);
    let outcome = crawl(
        create_test_config(&base_url),
        request,
        &sink,
        CancellationToken::new(),
    )
    .await
    .expect("Crawl should run");

    match &outcome.status {
        CrawlStatus::Failed(CrawlFailure::AuthenticationRequired { location }) => {
            assert!(location.ends_with("/sign-in"), "location was {}", location);
        }
        other => panic!("Expected authentication failure, got {}", other),
    }
    assert_eq!(outcome.pages_harvested, 0);
    assert!(outcome.leads.is_empty());
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_server_error_page_is_no_results() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/people"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let (sink, _receiver) = ChannelProgressSink::channel();
    let request = CrawlRequest::new(format!("{}/people?page=1", base_url), 10);
    let outcome = crawl(
        create_test_config(&base_url),
        request,
        &sink,
        CancellationToken::new(),
    )
    .await
    .expect("Crawl should run");

    assert_eq!(outcome.status, CrawlStatus::Failed(CrawlFailure::NoResults));
    assert_eq!(outcome.pages_harvested, 1);
}

#[tokio::test]
async fn test_probe_signed_in_session() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><body><div data-cy="user-menu">Peter</div></body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url);
    let launcher = HttpLauncher::new(config.http.clone(), &config.timeouts);
    let probe = Coordinator::new(config, launcher).probe(None).await;

    assert!(probe.authenticated, "{}", probe.message);
}
