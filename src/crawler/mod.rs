//! Crawler module for paginated lead harvesting
//!
//! This module contains the core crawling logic, including:
//! - Harvesting every result row on the loaded page
//! - Adaptive pacing between page requests
//! - Activating the next-page control
//! - Overall crawl coordination

mod coordinator;
mod harvester;
mod navigator;
mod pacing;

pub use coordinator::{Coordinator, CrawlOutcome, CrawlRequest};
pub use harvester::PageHarvester;
pub use navigator::{is_interactable, wait_for_page_load, NavigationFailure, PaginationNavigator};
pub use pacing::{jittered_delay, pressure_delay, DelayBounds, PacingController};

use crate::browser::HttpLauncher;
use crate::config::Config;
use crate::output::ProgressSink;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl with the built-in HTTP browser
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Launch a browser and apply the request's credentials
/// 2. Open the search and check the session is signed in
/// 3. Harvest page after page until the quota or the results run out
/// 4. Close the browser and return the outcome
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `request` - What to crawl and how many leads to collect
/// * `sink` - Receives a progress event after every page
/// * `cancel` - Stops the crawl at the next page boundary
pub async fn crawl(
    config: Config,
    request: CrawlRequest,
    sink: &dyn ProgressSink,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, HarvestError> {
    let launcher = HttpLauncher::new(config.http.clone(), &config.timeouts);
    Coordinator::new(config, launcher)
        .run(request, sink, cancel)
        .await
}
