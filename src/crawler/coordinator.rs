//! Crawler coordinator - main crawl orchestration logic
//!
//! Drives one crawl from session setup to teardown:
//! - Preparing the browsing session and opening the search
//! - Failing fast when the session is not signed in
//! - Bounding the target by the discovered result total
//! - Looping harvest, quota check, pacing and pagination
//! - Reporting progress after every page

use crate::browser::{Browser, BrowserLauncher};
use crate::config::{validate, Config};
use crate::crawler::harvester::PageHarvester;
use crate::crawler::navigator::{wait_for_page_load, PaginationNavigator};
use crate::crawler::pacing::PacingController;
use crate::extract::text::first_number;
use crate::extract::{first_match, FieldExtractor, LeadRecord};
use crate::output::{ProgressEvent, ProgressSink};
use crate::session::{
    establish_session, parse_credentials, probe_authentication, validate_search_url, AuthProbe,
    SessionGuard,
};
use crate::state::{CrawlFailure, CrawlPhase, CrawlState, CrawlStatus, ExtractionTally};
use crate::{BrowserError, HarvestError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What the job layer asks for
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Search result location to crawl
    pub search_url: String,

    /// Raw credential blob, see [`crate::session::parse_credentials`]
    pub credentials: Option<String>,

    /// Upper bound on leads to collect
    pub max_results: u32,

    /// Base pacing delay; the configured default when unset
    pub base_delay: Option<Duration>,
}

impl CrawlRequest {
    pub fn new(search_url: impl Into<String>, max_results: u32) -> Self {
        Self {
            search_url: search_url.into(),
            credentials: None,
            max_results,
            base_delay: None,
        }
    }

    pub fn with_credentials(mut self, credentials: impl Into<String>) -> Self {
        self.credentials = Some(credentials.into());
        self
    }

    pub fn with_base_delay_secs(mut self, seconds: u64) -> Self {
        self.base_delay = Some(Duration::from_secs(seconds));
        self
    }
}

/// Everything a finished crawl hands back
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub status: CrawlStatus,

    /// Accepted leads in harvest order, never more than `target`
    pub leads: Vec<LeadRecord>,

    /// Quota the crawl worked toward: min(requested, discovered total)
    pub target: u32,

    pub pages_harvested: u32,

    /// True when the page cap, not the site, ended the crawl
    pub page_limit_hit: bool,

    pub tally: ExtractionTally,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl CrawlOutcome {
    fn from_state(state: CrawlState, status: CrawlStatus, page_limit_hit: bool) -> Self {
        Self {
            status,
            leads: state.leads,
            target: state.target,
            pages_harvested: state.pages_harvested,
            page_limit_hit,
            tally: state.tally,
            started_at: state.started_at,
            finished_at: Utc::now(),
        }
    }

    /// Share of rows that were read without error, in [0, 1]
    pub fn success_rate(&self) -> f64 {
        self.tally.success_rate()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<L: BrowserLauncher> {
    config: Arc<Config>,
    launcher: L,
    guard: SessionGuard,
    harvester: PageHarvester,
    navigator: PaginationNavigator,
}

impl<L: BrowserLauncher> Coordinator<L> {
    /// Creates a coordinator; every crawl launches its own browser from `launcher`
    pub fn new(config: Config, launcher: L) -> Self {
        let harvester = PageHarvester::new(
            FieldExtractor::new(config.selectors.clone()),
            config.selectors.rows.clone(),
            config.timeouts.rows_appear(),
        );
        let navigator = PaginationNavigator::new(
            config.selectors.next_page.clone(),
            config.pacing.scroll_pause(),
            config.timeouts.page_load(),
            config.timeouts.settle(),
        );

        Self {
            guard: SessionGuard::from_config(&config.auth),
            config: Arc::new(config),
            launcher,
            harvester,
            navigator,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one crawl to a terminal status
    ///
    /// Only an invalid request or configuration is returned as an error; both
    /// are rejected before a browser is launched. Every other ending,
    /// fatal ones included, is reported through [`CrawlOutcome::status`]
    /// together with whatever was collected. The browser is closed on every
    /// path once it has been launched.
    pub async fn run(
        &self,
        request: CrawlRequest,
        sink: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> Result<CrawlOutcome, HarvestError> {
        let search_url = validate_search_url(&request.search_url)?;
        if request.max_results == 0 {
            return Err(HarvestError::InvalidRequest(
                "max_results must be at least 1".to_string(),
            ));
        }
        validate(&self.config)?;

        tracing::info!(
            "Starting crawl of {} for up to {} leads",
            search_url,
            request.max_results
        );

        let mut state = CrawlState::new(request.max_results);
        let mut browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                tracing::error!("Failed to setup browser: {}", e);
                state.transition(CrawlPhase::Failed);
                let status = CrawlStatus::Failed(CrawlFailure::SessionSetup(e.to_string()));
                return Ok(self.finish(state, status, false));
            }
        };

        let (status, page_limit_hit) = self
            .drive(&mut browser, &request, search_url.as_str(), &mut state, sink, &cancel)
            .await;

        if let Err(e) = browser.close().await {
            tracing::warn!("Error closing browser: {}", e);
        }

        Ok(self.finish(state, status, page_limit_hit))
    }

    /// Checks whether a credential blob still yields a signed-in session
    pub async fn probe(&self, credentials: Option<&str>) -> AuthProbe {
        if let Err(e) = validate(&self.config) {
            return AuthProbe {
                authenticated: false,
                message: format!("Invalid configuration: {}", e),
            };
        }

        let mut browser = match self.launcher.launch().await {
            Ok(browser) => browser,
            Err(e) => {
                return AuthProbe {
                    authenticated: false,
                    message: format!("Failed to setup browser: {}", e),
                }
            }
        };

        let credentials = credentials.map(parse_credentials).unwrap_or_default();
        let probe = match establish_session(&mut browser, &credentials, &self.config.crawler).await
        {
            Ok(()) => probe_authentication(&mut browser, &self.config).await,
            Err(e) => AuthProbe {
                authenticated: false,
                message: format!("Failed to setup browser session: {}", e),
            },
        };

        if let Err(e) = browser.close().await {
            tracing::warn!("Error closing browser: {}", e);
        }
        probe
    }

    /// The state machine proper; returns the terminal status and whether
    /// the page cap was what stopped it
    async fn drive<B: Browser>(
        &self,
        browser: &mut B,
        request: &CrawlRequest,
        search_url: &str,
        state: &mut CrawlState,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> (CrawlStatus, bool) {
        let timeouts = &self.config.timeouts;

        // Init: session cookies, then the search itself
        let credentials = request
            .credentials
            .as_deref()
            .map(parse_credentials)
            .unwrap_or_default();
        if let Err(e) = establish_session(browser, &credentials, &self.config.crawler).await {
            return fail(state, CrawlFailure::SessionSetup(e.to_string()));
        }

        tracing::info!("Navigating to search URL: {}", search_url);
        if let Err(e) = browser.navigate(search_url).await {
            return fail(
                state,
                CrawlFailure::InitialNavigation {
                    url: search_url.to_string(),
                    reason: e.to_string(),
                },
            );
        }
        wait_for_page_load(browser, timeouts.page_load(), timeouts.settle()).await;

        state.transition(CrawlPhase::Authenticating);
        let location = match browser.current_location().await {
            Ok(location) => location,
            Err(e) => {
                return fail(
                    state,
                    CrawlFailure::InitialNavigation {
                        url: search_url.to_string(),
                        reason: e.to_string(),
                    },
                )
            }
        };
        if !self.guard.is_authenticated(&location) {
            return fail(state, CrawlFailure::AuthenticationRequired { location });
        }

        state.transition(CrawlPhase::DiscoveringTotal);
        let discovered = self.discover_total(browser).await;
        if discovered > 0 {
            state.target = request.max_results.min(discovered);
        }
        tracing::info!(
            "Found {} total results, will scrape {}",
            discovered,
            state.target
        );

        let mut pacing = PacingController::from_config(&self.config.pacing);
        let base_delay = pacing.bound_base(
            request
                .base_delay
                .unwrap_or_else(|| self.config.pacing.default_delay()),
        );
        let max_pages = self.config.crawler.max_pages;

        loop {
            if cancel.is_cancelled() {
                tracing::info!("Crawl cancelled before page {}", state.page);
                state.transition(CrawlPhase::Done);
                return (CrawlStatus::Cancelled, false);
            }

            state.transition(CrawlPhase::HarvestingPage);
            tracing::info!("Scraping page {}", state.page);
            let batch = self
                .harvester
                .harvest_current_page(browser, &mut state.tally, &mut pacing)
                .await;
            state.pages_harvested += 1;

            let harvested = batch.len();
            let accepted = state.accept_batch(batch);
            self.report(sink, state);

            if harvested == 0 {
                if state.page == 1 {
                    return fail(state, CrawlFailure::NoResults);
                }
                tracing::info!("No leads found on page {}, stopping", state.page);
                state.transition(CrawlPhase::Done);
                return (CrawlStatus::Exhausted, false);
            }

            tracing::info!(
                "Page {}: kept {}/{} leads, total {}/{}",
                state.page,
                accepted,
                harvested,
                state.collected(),
                state.target
            );

            if state.quota_met() {
                state.transition(CrawlPhase::Done);
                return (CrawlStatus::Completed, false);
            }

            if state.pages_harvested >= max_pages {
                tracing::warn!("Reached the {} page limit, stopping", max_pages);
                state.transition(CrawlPhase::Done);
                return (CrawlStatus::Exhausted, true);
            }

            state.transition(CrawlPhase::Pacing);
            let delay = pacing.next_delay(base_delay, state.tally.errors, state.tally.successes);
            tracing::info!("Waiting {:.2}s before next page", delay.as_secs_f64());
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    tracing::info!("Crawl cancelled during pacing delay");
                    state.transition(CrawlPhase::Done);
                    return (CrawlStatus::Cancelled, false);
                }
            }

            state.transition(CrawlPhase::Navigating);
            if !self.navigator.advance(browser).await {
                state.transition(CrawlPhase::Done);
                return (CrawlStatus::Exhausted, false);
            }
            state.page += 1;
        }
    }

    /// Best-effort size of the result set; 0 when nothing could be read
    ///
    /// Prefers a result-count indicator. Without one, the visible row count
    /// times the configured multiplier is used as a rough estimate.
    async fn discover_total<B: Browser>(&self, browser: &B) -> u32 {
        let indicator = first_match(&self.config.selectors.result_count, |selector| async move {
            let Some(element) = browser.find(selector, None).await? else {
                return Ok(None);
            };
            Ok::<_, BrowserError>(first_number(&browser.text(element).await?))
        })
        .await;

        match indicator {
            Ok(Some(total)) => return u32::try_from(total).unwrap_or(u32::MAX),
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not read result count: {}", e),
        }

        match self.harvester.locate_rows(browser).await {
            Ok(rows) => {
                let visible = u32::try_from(rows.len()).unwrap_or(u32::MAX);
                let estimate =
                    visible.saturating_mul(self.config.crawler.total_estimate_multiplier);
                tracing::debug!(
                    "No result count shown; estimating {} from {} visible rows",
                    estimate,
                    visible
                );
                estimate
            }
            Err(e) => {
                tracing::warn!("Could not estimate total results: {}", e);
                0
            }
        }
    }

    fn report(&self, sink: &dyn ProgressSink, state: &CrawlState) {
        let event = ProgressEvent::from_state(state);
        if let Err(e) = sink.report(&event) {
            tracing::warn!("Progress report failed: {}", e);
        }
    }

    fn finish(&self, state: CrawlState, status: CrawlStatus, page_limit_hit: bool) -> CrawlOutcome {
        let outcome = CrawlOutcome::from_state(state, status, page_limit_hit);

        match outcome.status.failure() {
            Some(reason) => tracing::error!("Crawl failed: {}", reason),
            None if outcome.status.is_success() => tracing::info!(
                "Crawl {}: {} leads from {} pages in {}s",
                outcome.status,
                outcome.leads.len(),
                outcome.pages_harvested,
                outcome.duration().num_seconds()
            ),
            None => tracing::warn!(
                "Crawl {} after {} pages, keeping {} leads",
                outcome.status,
                outcome.pages_harvested,
                outcome.leads.len()
            ),
        }
        tracing::info!(
            target: "lead_harvest::metrics",
            action = "crawl_completed",
            status = outcome.status.as_str(),
            leads = outcome.leads.len(),
            pages = outcome.pages_harvested,
            success_rate = outcome.success_rate(),
            page_limit_hit = outcome.page_limit_hit,
            "Crawl finished"
        );

        outcome
    }
}

fn fail(state: &mut CrawlState, reason: CrawlFailure) -> (CrawlStatus, bool) {
    state.transition(CrawlPhase::Failed);
    (CrawlStatus::Failed(reason), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::StaticSite;
    use crate::output::ChannelProgressSink;
    use crate::output::OutputError;
    use crate::BrowserResult;
    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedReceiver;

    const BASE: &str = "https://leads.example.com/";
    const SEARCH: &str = "https://leads.example.com/people?page=1";

    fn page_url(page: u32) -> String {
        format!("https://leads.example.com/people?page={}", page)
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.crawler.base_url = BASE.to_string();
        config.crawler.cookie_domain = ".example.com".to_string();
        config.pacing.seed = Some(11);
        config
    }

    /// One result page with `names` rows and an optional link to `next`
    fn results_page(names: &[&str], next: Option<u32>) -> String {
        let rows: String = names
            .iter()
            .map(|name| {
                format!(
                    r#"<div data-cy="person"><span data-cy="person-name">{}</span></div>"#,
                    name
                )
            })
            .collect();
        let next = next
            .map(|page| format!(r#"<a data-cy="next-page" href="?page={}">Next</a>"#, page))
            .unwrap_or_default();
        format!("<main>{}</main><nav>{}</nav>", rows, next)
    }

    fn names(outcome: &CrawlOutcome) -> Vec<&str> {
        outcome.leads.iter().map(|l| l.full_name.as_str()).collect()
    }

    fn drain(mut receiver: UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    async fn crawl(
        site: &StaticSite,
        config: Config,
        request: CrawlRequest,
    ) -> (CrawlOutcome, Vec<ProgressEvent>) {
        let coordinator = Coordinator::new(config, site.clone());
        let (sink, receiver) = ChannelProgressSink::channel();
        let outcome = coordinator
            .run(request, &sink, CancellationToken::new())
            .await
            .unwrap();
        (outcome, drain(receiver))
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_truncates_second_page() {
        let site = StaticSite::new()
            .page(SEARCH, results_page(&["A1", "A2", "A3"], Some(2)))
            .page(&page_url(2), results_page(&["B1", "B2", "B3", "B4"], Some(3)));

        let (outcome, events) = crawl(&site, test_config(), CrawlRequest::new(SEARCH, 5)).await;

        assert_eq!(outcome.status, CrawlStatus::Completed);
        assert_eq!(names(&outcome), vec!["A1", "A2", "A3", "B1", "B2"]);
        assert_eq!(outcome.target, 5);
        assert_eq!(outcome.pages_harvested, 2);
        assert!(!outcome.page_limit_hit);

        let progress: Vec<(u32, u32)> = events.iter().map(|e| (e.leads_so_far, e.page)).collect();
        assert_eq!(progress, vec![(3, 1), (5, 2)]);
        assert!((events[1].fraction_complete - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_redirect_fails_before_harvesting() {
        let site = StaticSite::new()
            .page("https://leads.example.com/sign-in", r#"<div data-cy="person">x</div>"#)
            .redirect(SEARCH, "https://leads.example.com/sign-in");

        let (outcome, events) = crawl(&site, test_config(), CrawlRequest::new(SEARCH, 5)).await;

        assert_eq!(
            outcome.status,
            CrawlStatus::Failed(CrawlFailure::AuthenticationRequired {
                location: "https://leads.example.com/sign-in".to_string()
            })
        );
        assert_eq!(outcome.pages_harvested, 0);
        assert!(outcome.leads.is_empty());
        assert!(events.is_empty());
        assert_eq!(
            site.visited(),
            vec!["https://leads.example.com/sign-in".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_next_control_exhausts() {
        let site = StaticSite::new()
            .page(SEARCH, results_page(&["A1", "A2"], Some(2)))
            .page(&page_url(2), results_page(&["B1"], None));

        let (outcome, events) = crawl(&site, test_config(), CrawlRequest::new(SEARCH, 10)).await;

        assert_eq!(outcome.status, CrawlStatus::Exhausted);
        assert_eq!(names(&outcome), vec!["A1", "A2", "B1"]);
        assert!(outcome.leads.len() < outcome.target as usize);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_later_page_exhausts() {
        let site = StaticSite::new()
            .page(SEARCH, results_page(&["A1"], Some(2)))
            .page(&page_url(2), "<main><p>No more people</p></main>");

        let (outcome, events) = crawl(&site, test_config(), CrawlRequest::new(SEARCH, 10)).await;

        assert_eq!(outcome.status, CrawlStatus::Exhausted);
        assert_eq!(outcome.pages_harvested, 2);
        // the empty page still reports progress
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].leads_so_far, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_first_page_is_no_results() {
        let site = StaticSite::new().page(SEARCH, "<main><p>Nothing matches</p></main>");

        let (outcome, events) = crawl(&site, test_config(), CrawlRequest::new(SEARCH, 10)).await;

        assert_eq!(outcome.status, CrawlStatus::Failed(CrawlFailure::NoResults));
        assert_eq!(outcome.pages_harvested, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].leads_so_far, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_cap_stops_endless_pagination() {
        let mut site = StaticSite::new();
        for page in 1..=10 {
            let name = format!("P{}", page);
            site = site.page(&page_url(page), results_page(&[name.as_str()], Some(page + 1)));
        }
        let mut config = test_config();
        config.crawler.max_pages = 4;

        let (outcome, _) = crawl(&site, config, CrawlRequest::new(SEARCH, 1000)).await;

        assert_eq!(outcome.status, CrawlStatus::Exhausted);
        assert!(outcome.page_limit_hit);
        assert_eq!(outcome.pages_harvested, 4);
        assert_eq!(names(&outcome), vec!["P1", "P2", "P3", "P4"]);
        // page 5 is never requested
        assert_eq!(site.visited().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_count_bounds_target() {
        let html = format!(
            r#"<header><span data-cy="results-count">2 results</span></header>{}"#,
            results_page(&["A1", "A2"], Some(2))
        );
        let site = StaticSite::new()
            .page(SEARCH, html)
            .page(&page_url(2), results_page(&["B1"], None));

        let (outcome, events) = crawl(&site, test_config(), CrawlRequest::new(SEARCH, 50)).await;

        assert_eq!(outcome.target, 2);
        assert_eq!(outcome.status, CrawlStatus::Completed);
        assert_eq!(events[0].target, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_row_estimate_bounds_target() {
        let site = StaticSite::new().page(SEARCH, results_page(&["A1", "A2"], None));
        let mut config = test_config();
        config.crawler.total_estimate_multiplier = 3;

        let (outcome, _) = crawl(&site, config, CrawlRequest::new(SEARCH, 100)).await;

        assert_eq!(outcome.target, 6);
        assert_eq!(outcome.status, CrawlStatus::Exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_page() {
        let site = StaticSite::new().page(SEARCH, results_page(&["A1"], Some(2)));
        let coordinator = Coordinator::new(test_config(), site.clone());
        let (sink, receiver) = ChannelProgressSink::channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = coordinator
            .run(CrawlRequest::new(SEARCH, 5), &sink, cancel)
            .await
            .unwrap();

        assert_eq!(outcome.status, CrawlStatus::Cancelled);
        assert_eq!(outcome.pages_harvested, 0);
        assert!(drain(receiver).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_pacing_keeps_collected() {
        let site = StaticSite::new()
            .page(SEARCH, results_page(&["A1", "A2"], Some(2)))
            .page(&page_url(2), results_page(&["B1"], None));
        let coordinator = Coordinator::new(test_config(), site.clone());
        let (sink, mut receiver) = ChannelProgressSink::channel();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            // first progress event means page 1 is done and pacing starts
            if receiver.recv().await.is_some() {
                trigger.cancel();
            }
        });

        let outcome = coordinator
            .run(CrawlRequest::new(SEARCH, 10), &sink, cancel)
            .await
            .unwrap();

        assert_eq!(outcome.status, CrawlStatus::Cancelled);
        assert_eq!(names(&outcome), vec!["A1", "A2"]);
        assert!(!site.visited().contains(&page_url(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_credentials_are_applied_before_search() {
        let site = StaticSite::new()
            .page(BASE, "<p>home</p>")
            .page(SEARCH, results_page(&["A1"], None));
        let request = CrawlRequest::new(SEARCH, 1).with_credentials("session=abc");

        let (outcome, _) = crawl(&site, test_config(), request).await;

        assert_eq!(outcome.status, CrawlStatus::Completed);
        assert_eq!(site.visited(), vec![BASE.to_string(), SEARCH.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_search_is_initial_navigation_failure() {
        let site = StaticSite::new();

        let (outcome, _) = crawl(&site, test_config(), CrawlRequest::new(SEARCH, 1)).await;

        assert!(matches!(
            outcome.status,
            CrawlStatus::Failed(CrawlFailure::InitialNavigation { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_requests_are_rejected() {
        let coordinator = Coordinator::new(test_config(), StaticSite::new());
        let (sink, _receiver) = ChannelProgressSink::channel();

        let result = coordinator
            .run(CrawlRequest::new("not a url", 5), &sink, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(HarvestError::InvalidRequest(_))));

        let result = coordinator
            .run(CrawlRequest::new(SEARCH, 0), &sink, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(HarvestError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_launch() {
        let site = StaticSite::new().page(SEARCH, results_page(&["A1"], None));
        let mut config = test_config();
        config.pacing.min_delay_ms = 5_000;
        config.pacing.max_delay_ms = 1_000;
        let coordinator = Coordinator::new(config, site.clone());
        let (sink, receiver) = ChannelProgressSink::channel();

        let result = coordinator
            .run(CrawlRequest::new(SEARCH, 5), &sink, CancellationToken::new())
            .await;

        assert!(matches!(result, Err(HarvestError::Config(_))));
        assert!(site.visited().is_empty());
        assert!(drain(receiver).is_empty());

        let probe = coordinator.probe(None).await;
        assert!(!probe.authenticated);
        assert!(probe.message.contains("min-delay-ms"), "{}", probe.message);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_next_link_exhausts() {
        // page 2 is linked but never served
        let site = StaticSite::new().page(SEARCH, results_page(&["A1", "A2"], Some(2)));

        let (outcome, events) = crawl(&site, test_config(), CrawlRequest::new(SEARCH, 10)).await;

        assert_eq!(outcome.status, CrawlStatus::Exhausted);
        assert!(!outcome.page_limit_hit);
        assert_eq!(outcome.pages_harvested, 1);
        assert_eq!(names(&outcome), vec!["A1", "A2"]);
        assert_eq!(events.len(), 1);
    }

    struct BrokenLauncher;

    #[async_trait]
    impl BrowserLauncher for BrokenLauncher {
        type Browser = crate::browser::StaticBrowser;

        async fn launch(&self) -> BrowserResult<Self::Browser> {
            Err(BrowserError::Launch("no display".to_string()))
        }
    }

    #[tokio::test]
    async fn test_launch_failure_is_session_setup_failure() {
        let coordinator = Coordinator::new(test_config(), BrokenLauncher);
        let (sink, _receiver) = ChannelProgressSink::channel();

        let outcome = coordinator
            .run(CrawlRequest::new(SEARCH, 5), &sink, CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(
            outcome.status,
            CrawlStatus::Failed(CrawlFailure::SessionSetup(_))
        ));
    }

    struct FailingSink;

    impl ProgressSink for FailingSink {
        fn report(&self, _event: &ProgressEvent) -> Result<(), OutputError> {
            Err(OutputError::Write("tracker offline".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failure_does_not_abort() {
        let site = StaticSite::new().page(SEARCH, results_page(&["A1", "A2"], None));
        let coordinator = Coordinator::new(test_config(), site);

        let outcome = coordinator
            .run(CrawlRequest::new(SEARCH, 2), &FailingSink, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, CrawlStatus::Completed);
        assert_eq!(outcome.leads.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_with_credentials() {
        let site = StaticSite::new().page(BASE, r#"<div class="user-avatar"></div>"#);
        let coordinator = Coordinator::new(test_config(), site);

        let probe = coordinator.probe(Some(r#"{"session": "abc"}"#)).await;
        assert!(probe.authenticated);
    }
}
