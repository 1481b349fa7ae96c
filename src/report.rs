//! Hands finished or abandoned sessions to whoever persists them.

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::models::{CompletionRecord, SessionSummary};

const ENABLE_LOGS: bool = true;

use crate::log_error;

/// Sessions shorter than this are not worth recording when abandoned.
pub const DEFAULT_ABANDON_THRESHOLD_SECS: u64 = 60;

#[async_trait]
pub trait CompletionSink: Send + Sync {
    async fn submit(&self, record: &CompletionRecord) -> Result<()>;
}

/// Forwards records to an in-process consumer.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CompletionRecord>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CompletionRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl CompletionSink for ChannelSink {
    async fn submit(&self, record: &CompletionRecord) -> Result<()> {
        self.tx.send(record.clone()).map_err(|_| Error::SinkClosed)
    }
}

/// Only logs. Used when no API is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl CompletionSink for LogSink {
    async fn submit(&self, record: &CompletionRecord) -> Result<()> {
        info!(
            "{} session {}: {} min, completed={}",
            record.exercise_type.as_str(),
            record.session_id,
            record.duration,
            record.completed
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct CompletionReporter {
    sink: Arc<dyn CompletionSink>,
    abandon_threshold_secs: u64,
}

impl CompletionReporter {
    pub fn new(sink: Arc<dyn CompletionSink>, abandon_threshold_secs: u64) -> Self {
        Self {
            sink,
            abandon_threshold_secs,
        }
    }

    pub fn abandon_threshold_secs(&self) -> u64 {
        self.abandon_threshold_secs
    }

    /// Natural completion is always worth a record.
    pub fn completion(&self, summary: &SessionSummary) -> CompletionRecord {
        CompletionRecord::completed(summary)
    }

    /// Only sessions that ran past the threshold are recorded.
    pub fn abandonment(&self, summary: &SessionSummary) -> Option<CompletionRecord> {
        (summary.elapsed_secs > self.abandon_threshold_secs)
            .then(|| CompletionRecord::abandoned(summary))
    }

    /// Send on a background task. No retry; the outcome is returned through
    /// the handle and logged on failure.
    pub fn submit(&self, record: CompletionRecord) -> JoinHandle<Result<()>> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let result = sink.submit(&record).await;
            if let Err(e) = &result {
                log_error!(
                    "Failed to report {} session {}: {}",
                    record.exercise_type.as_str(),
                    record.session_id,
                    e
                );
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExerciseKind;
    use chrono::Utc;

    fn summary(elapsed_secs: u64) -> SessionSummary {
        SessionSummary {
            session_id: "abc".into(),
            kind: ExerciseKind::Breathing,
            pattern_key: Some("4-4-4".into()),
            target_minutes: None,
            elapsed_secs,
            started_at: Utc::now(),
        }
    }

    fn reporter() -> (CompletionReporter, mpsc::UnboundedReceiver<CompletionRecord>) {
        let (sink, rx) = ChannelSink::new();
        (
            CompletionReporter::new(Arc::new(sink), DEFAULT_ABANDON_THRESHOLD_SECS),
            rx,
        )
    }

    #[test]
    fn abandonment_respects_threshold() {
        let (reporter, _rx) = reporter();
        assert!(reporter.abandonment(&summary(0)).is_none());
        assert!(reporter.abandonment(&summary(60)).is_none());
        let record = reporter.abandonment(&summary(61)).unwrap();
        assert!(!record.completed);
        assert_eq!(record.duration, 1);
    }

    #[test]
    fn completion_is_unconditional() {
        let (reporter, _rx) = reporter();
        assert!(reporter.completion(&summary(3)).completed);
    }

    #[tokio::test]
    async fn submit_delivers_to_sink() {
        let (reporter, mut rx) = reporter();
        let record = reporter.completion(&summary(90));
        reporter.submit(record.clone()).await.unwrap().unwrap();
        assert_eq!(rx.recv().await, Some(record));
    }

    #[tokio::test]
    async fn closed_sink_surfaces_error() {
        let (reporter, rx) = reporter();
        drop(rx);
        let result = reporter.submit(reporter.completion(&summary(90))).await.unwrap();
        assert!(matches!(result, Err(Error::SinkClosed)));
    }
}
