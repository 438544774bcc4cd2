//! Progress notifications for an assessment run
//!
//! The retriever and submitter publish events; observers subscribe with an
//! unbounded channel. Publishing never blocks and a dropped observer is
//! silently pruned, so a slow or vanished consumer cannot stall a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Severity of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Info,
    Success,
    Warning,
    Error,
}

/// A single progress notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub run_id: Uuid,
    pub page: u32,
    pub total_pages: Option<u32>,
    pub patients_count: usize,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    pub timestamp: DateTime<Utc>,
}

/// Fan-out publisher owned by one run
pub struct ProgressReporter {
    run_id: Uuid,
    observers: Mutex<Vec<mpsc::UnboundedSender<ProgressEvent>>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Reporter with no observers; events are dropped.
    pub fn silent() -> Self {
        Self::new()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Register an observer and return its receiving end.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.attach(tx);
        rx
    }

    /// Register an existing sender as an observer.
    pub fn attach(&self, sender: mpsc::UnboundedSender<ProgressEvent>) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(sender);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn emit(
        &self,
        kind: ProgressKind,
        page: u32,
        total_pages: Option<u32>,
        patients_count: usize,
        message: impl Into<String>,
    ) {
        let event = ProgressEvent {
            run_id: self.run_id,
            page,
            total_pages,
            patients_count,
            message: message.into(),
            kind,
            timestamp: Utc::now(),
        };

        if let Ok(mut observers) = self.observers.lock() {
            observers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    pub fn info(&self, page: u32, total: Option<u32>, count: usize, message: impl Into<String>) {
        self.emit(ProgressKind::Info, page, total, count, message);
    }

    pub fn success(&self, page: u32, total: Option<u32>, count: usize, message: impl Into<String>) {
        self.emit(ProgressKind::Success, page, total, count, message);
    }

    pub fn warning(&self, page: u32, total: Option<u32>, count: usize, message: impl Into<String>) {
        self.emit(ProgressKind::Warning, page, total, count, message);
    }

    pub fn error(&self, page: u32, total: Option<u32>, count: usize, message: impl Into<String>) {
        self.emit(ProgressKind::Error, page, total, count, message);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain whatever is currently buffered on a receiver.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
