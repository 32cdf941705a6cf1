//! Stock progress sinks

use crate::output::traits::{OutputError, OutputResult, ProgressEvent, ProgressSink};
use tokio::sync::mpsc;

/// Writes every event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn report(&self, event: &ProgressEvent) -> OutputResult<()> {
        tracing::info!(
            "Progress: {}% ({}/{} leads, page {})",
            event.percent(),
            event.leads_so_far,
            event.target,
            event.page
        );
        Ok(())
    }
}

/// Forwards events to a channel, for a job tracker running as its own task
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }

    /// Creates a sink together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn report(&self, event: &ProgressEvent) -> OutputResult<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| OutputError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(leads: u32) -> ProgressEvent {
        ProgressEvent {
            fraction_complete: f64::from(leads) / 10.0,
            leads_so_far: leads,
            target: 10,
            page: 1,
        }
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (sink, mut receiver) = ChannelProgressSink::channel();
        sink.report(&event(1)).unwrap();
        sink.report(&event(4)).unwrap();

        assert_eq!(receiver.try_recv().unwrap().leads_so_far, 1);
        assert_eq!(receiver.try_recv().unwrap().leads_so_far, 4);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_reports_closed_receiver() {
        let (sink, receiver) = ChannelProgressSink::channel();
        drop(receiver);
        assert!(matches!(
            sink.report(&event(1)),
            Err(OutputError::Disconnected)
        ));
    }

    #[test]
    fn test_log_sink_never_fails() {
        assert!(LogProgressSink.report(&event(3)).is_ok());
    }
}
