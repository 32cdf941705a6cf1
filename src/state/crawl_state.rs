use crate::extract::LeadRecord;
use crate::state::CrawlPhase;
use chrono::{DateTime, Utc};

/// Per-crawl extraction counters feeding the pacing controller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionTally {
    /// Rows read without a structural failure
    pub successes: u32,

    /// Rows that failed to read
    pub errors: u32,
}

impl ExtractionTally {
    pub fn record_success(&mut self) {
        self.successes = self.successes.saturating_add(1);
    }

    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }

    /// Share of rows read successfully, 0.0 when nothing was attempted
    pub fn success_rate(&self) -> f64 {
        let attempts = u64::from(self.successes) + u64::from(self.errors);
        if attempts == 0 {
            0.0
        } else {
            f64::from(self.successes) / attempts as f64
        }
    }
}

/// Mutable state of one crawl invocation
///
/// Owned by a single coordinator run and never shared between crawls.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Current phase of the state machine
    pub phase: CrawlPhase,

    /// 1-based number of the page currently loaded
    pub page: u32,

    /// Pages that went through the harvester
    pub pages_harvested: u32,

    /// Leads accepted so far, in harvest order
    pub leads: Vec<LeadRecord>,

    /// Quota for this crawl: min(requested, discovered total)
    pub target: u32,

    /// Row extraction counters
    pub tally: ExtractionTally,

    /// When the crawl started
    pub started_at: DateTime<Utc>,
}

impl CrawlState {
    /// Creates the initial state for a crawl aiming at `target` leads
    pub fn new(target: u32) -> Self {
        Self {
            phase: CrawlPhase::Init,
            page: 1,
            pages_harvested: 0,
            leads: Vec::new(),
            target,
            tally: ExtractionTally::default(),
            started_at: Utc::now(),
        }
    }

    /// Moves the state machine to `next`
    pub fn transition(&mut self, next: CrawlPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid crawl transition {} -> {}",
            self.phase,
            next
        );
        tracing::trace!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    pub fn collected(&self) -> u32 {
        u32::try_from(self.leads.len()).unwrap_or(u32::MAX)
    }

    /// Leads still needed to reach the target
    pub fn remaining(&self) -> u32 {
        self.target.saturating_sub(self.collected())
    }

    pub fn quota_met(&self) -> bool {
        self.collected() >= self.target
    }

    /// Appends a harvested batch, truncated to the remaining quota
    ///
    /// Records beyond the quota are dropped from the end of the batch, so the
    /// kept ones are the first of the page in their original order. Returns
    /// the number of records accepted.
    pub fn accept_batch(&mut self, mut batch: Vec<LeadRecord>) -> usize {
        let remaining = self.remaining() as usize;
        if batch.len() > remaining {
            tracing::debug!(
                "Truncating page batch from {} to {} leads",
                batch.len(),
                remaining
            );
            batch.truncate(remaining);
        }
        let accepted = batch.len();
        self.leads.extend(batch);
        accepted
    }

    /// Progress toward the target in [0, 1]
    pub fn fraction_complete(&self) -> f64 {
        if self.target == 0 {
            return 1.0;
        }
        (f64::from(self.collected()) / f64::from(self.target)).clamp(0.0, 1.0)
    }
}
