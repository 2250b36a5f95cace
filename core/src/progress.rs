//! Progress reporting for long-running translations.
//!
//! The orchestrator emits discrete events to a caller-supplied sink. Sinks
//! are best-effort: a failing sink is logged and ignored, it must never
//! abort the translation that produced the event.

use log::warn;
use serde::Serialize;

/// Error type a sink may return; it is logged, never propagated.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Entries handled so far.
    pub current: usize,
    /// Entries in this translation run.
    pub total: usize,
    /// 0..=100.
    pub percentage: u8,
}

pub trait ProgressSink: Send {
    fn emit(&mut self, event: ProgressEvent) -> Result<(), SinkError>;
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&mut self, _event: ProgressEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressEvent) -> Result<(), SinkError> + Send,
{
    fn emit(&mut self, event: ProgressEvent) -> Result<(), SinkError> {
        self(event)
    }
}

pub(crate) fn emit_progress(sink: &mut dyn ProgressSink, event: ProgressEvent) {
    if let Err(error) = sink.emit(event) {
        warn!("failed to deliver progress event: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_sinks_receive_events() {
        let mut seen = Vec::new();
        {
            let mut sink = |event: ProgressEvent| -> Result<(), SinkError> {
                seen.push(event);
                Ok(())
            };
            emit_progress(&mut sink, ProgressEvent {
                current: 1,
                total: 2,
                percentage: 50,
            });
        }
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].percentage, 50);
    }

    #[test]
    fn sink_errors_are_swallowed() {
        let mut sink =
            |_event: ProgressEvent| -> Result<(), SinkError> { Err("sink exploded".into()) };
        // must not panic or propagate
        emit_progress(&mut sink, ProgressEvent {
            current: 0,
            total: 1,
            percentage: 0,
        });
    }

    #[test]
    fn event_serializes_camel_case() {
        let event = ProgressEvent {
            current: 3,
            total: 4,
            percentage: 75,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"current":3,"total":4,"percentage":75}"#);
    }
}
