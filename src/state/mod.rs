//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: where the crawl state machine currently is
//! - `CrawlStatus` / `CrawlFailure`: how a crawl ended
//! - `CrawlState`: per-crawl counters, quota and collected leads

mod crawl_state;
mod phase;

// Re-export main types
pub use crawl_state::{CrawlState, ExtractionTally};
pub use phase::{CrawlFailure, CrawlPhase, CrawlStatus};
