/// Crawl phases and terminal outcomes
///
/// This module defines the states a crawl moves through and how it can end.
use std::fmt;
use thiserror::Error;

/// Current phase of the crawl state machine
///
/// ```text
/// Init → Authenticating → DiscoveringTotal → HarvestingPage → Pacing → Navigating → Done
///                                                  ↑___________________________|
/// ```
/// plus the terminal `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Setup =====
    /// Launching the browsing session and applying credentials
    Init,

    /// Checking that the search page is not a sign-in surface
    Authenticating,

    /// Reading (or estimating) the total result count
    DiscoveringTotal,

    // ===== Page loop =====
    /// Extracting leads from the loaded page
    HarvestingPage,

    /// Waiting before the next page request
    Pacing,

    /// Activating the next-page control
    Navigating,

    // ===== Terminal =====
    /// The loop ended; collected leads are returned
    Done,

    /// A fatal condition ended the crawl
    Failed,
}

impl CrawlPhase {
    /// Returns true if no further transitions happen from this phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        if next == Failed || next == Done {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Init, Authenticating)
                | (Authenticating, DiscoveringTotal)
                | (DiscoveringTotal, HarvestingPage)
                | (HarvestingPage, Pacing)
                | (Pacing, Navigating)
                | (Navigating, HarvestingPage)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Authenticating => "authenticating",
            Self::DiscoveringTotal => "discovering_total",
            Self::HarvestingPage => "harvesting_page",
            Self::Pacing => "pacing",
            Self::Navigating => "navigating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fatal reasons a crawl can fail with
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrawlFailure {
    #[error("Authentication required: redirected to {location}. Provide valid session cookies.")]
    AuthenticationRequired { location: String },

    #[error("No results found on the first page")]
    NoResults,

    #[error("Browser session could not be created: {0}")]
    SessionSetup(String),

    #[error("Could not open {url}: {reason}")]
    InitialNavigation { url: String, reason: String },
}

/// How a crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStatus {
    /// The quota was reached
    Completed,

    /// The result list ran out (or the page cap was hit) before the quota
    Exhausted,

    /// A fatal condition stopped the crawl
    Failed(CrawlFailure),

    /// The caller cancelled; leads collected so far are returned
    Cancelled,
}

impl CrawlStatus {
    /// Returns true for outcomes that carry usable leads
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Exhausted)
    }

    pub fn failure(&self) -> Option<&CrawlFailure> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Exhausted => "exhausted",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.as_str()),
        }
    }
}
