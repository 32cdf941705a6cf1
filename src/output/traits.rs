//! Progress events and the sink trait they are reported through

use crate::state::CrawlState;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while reporting progress or writing results
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Progress receiver is gone")]
    Disconnected,

    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Snapshot of crawl progress, emitted after every harvested page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// `leads_so_far / target`, in [0, 1]
    pub fraction_complete: f64,

    pub leads_so_far: u32,

    pub target: u32,

    /// Page the event was emitted for (1-based)
    pub page: u32,
}

impl ProgressEvent {
    pub fn from_state(state: &CrawlState) -> Self {
        Self {
            fraction_complete: state.fraction_complete(),
            leads_so_far: state.collected(),
            target: state.target,
            page: state.page,
        }
    }

    /// Whole-number percentage, as job trackers usually store it
    pub fn percent(&self) -> u8 {
        (self.fraction_complete * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Receives progress events from a running crawl
///
/// Reporting is best effort: the crawler logs a returned error and carries on.
pub trait ProgressSink: Send + Sync {
    fn report(&self, event: &ProgressEvent) -> OutputResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::LeadRecord;

    #[test]
    fn test_event_from_state() {
        let mut state = CrawlState::new(8);
        state.page = 2;
        state.accept_batch(vec![LeadRecord::default(); 2]);

        let event = ProgressEvent::from_state(&state);
        assert_eq!(event.leads_so_far, 2);
        assert_eq!(event.target, 8);
        assert_eq!(event.page, 2);
        assert!((event.fraction_complete - 0.25).abs() < f64::EPSILON);
        assert_eq!(event.percent(), 25);
    }

    #[test]
    fn test_percent_bounds() {
        let event = ProgressEvent {
            fraction_complete: 1.0,
            leads_so_far: 5,
            target: 5,
            page: 1,
        };
        assert_eq!(event.percent(), 100);
        let event = ProgressEvent {
            fraction_complete: 0.0,
            ..event
        };
        assert_eq!(event.percent(), 0);
    }
}
