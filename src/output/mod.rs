//! Output module for crawl progress and results
//!
//! This module handles:
//! - Progress events and the sinks that receive them
//! - Exporting harvested leads as JSON lines
//! - Printing a summary of a finished crawl

mod jsonl;
mod sinks;
mod summary;
mod traits;

pub use jsonl::{write_leads, write_leads_jsonl};
pub use sinks::{ChannelProgressSink, LogProgressSink};
pub use summary::{format_summary, print_summary};
pub use traits::{OutputError, OutputResult, ProgressEvent, ProgressSink};
