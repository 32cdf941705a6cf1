//! Human-readable crawl summary

use crate::crawler::CrawlOutcome;
use std::fmt::Write;

/// Formats the outcome of a crawl for the terminal
pub fn format_summary(outcome: &CrawlOutcome) -> String {
    let mut text = String::new();
    let with_email = outcome.leads.iter().filter(|l| !l.email.is_empty()).count();
    let with_phone = outcome.leads.iter().filter(|l| !l.phone.is_empty()).count();

    let _ = writeln!(text, "=== Crawl Summary ===\n");
    let _ = writeln!(text, "Status: {}", outcome.status);
    let _ = writeln!(
        text,
        "Leads: {} of {} targeted",
        outcome.leads.len(),
        outcome.target
    );
    let _ = writeln!(text, "  With email: {}", with_email);
    let _ = writeln!(text, "  With phone: {}", with_phone);
    let _ = writeln!(text, "Pages harvested: {}", outcome.pages_harvested);
    if outcome.page_limit_hit {
        let _ = writeln!(text, "  (stopped at the page limit)");
    }
    let _ = writeln!(
        text,
        "Rows read: {} ok, {} failed ({:.1}% success)",
        outcome.tally.successes,
        outcome.tally.errors,
        outcome.success_rate() * 100.0
    );
    let _ = writeln!(text, "Started: {}", outcome.started_at.to_rfc3339());
    let _ = writeln!(
        text,
        "Finished: {} ({}s)",
        outcome.finished_at.to_rfc3339(),
        outcome.duration().num_seconds()
    );

    text
}

/// Prints [`format_summary`] to stdout
pub fn print_summary(outcome: &CrawlOutcome) {
    print!("{}", format_summary(outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::StaticSite;
    use crate::config::Config;
    use crate::crawler::{Coordinator, CrawlRequest};
    use crate::output::LogProgressSink;
    use crate::state::CrawlFailure;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_failed_crawl_summary() {
        let coordinator = Coordinator::new(Config::default(), StaticSite::new());
        let outcome = coordinator
            .run(
                CrawlRequest::new("https://leads.example.com/people", 5),
                &LogProgressSink,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(matches!(
            outcome.status.failure(),
            Some(CrawlFailure::InitialNavigation { .. })
        ));

        let text = format_summary(&outcome);
        assert!(text.contains("Status: failed: Could not open"));
        assert!(text.contains("Leads: 0 of 5 targeted"));
        assert!(text.contains("Pages harvested: 0"));
        assert!(!text.contains("page limit"));
    }
}
