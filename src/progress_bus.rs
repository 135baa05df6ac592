//! Progress Bus (C10): publishes staged progress events keyed by `jobId`.
//!
//! Grounded on the shared `Arc<RwLock<HashMap<...>>>` idiom the teacher uses
//! throughout for process-wide services (`AppState`, `ProxyManager`'s
//! registry). Publish is frequent (§5), so each job gets its own
//! `tokio::sync::mpsc` channel rather than taking the map lock per event.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::core::types::ProgressEvent;

pub struct ProgressBus {
    channels: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<ProgressEvent>>>>,
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressBus {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a subscriber for `job_id`, returning the receiving end.
    pub async fn subscribe(&self, job_id: &str) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels.write().await.insert(job_id.to_string(), tx);
        rx
    }

    pub async fn unsubscribe(&self, job_id: &str) {
        self.channels.write().await.remove(job_id);
    }

    /// Publish an event; silently drops it if nobody is subscribed. Never
    /// blocks the caller — `UnboundedSender::send` is synchronous.
    pub async fn publish(&self, job_id: &str, stage: &str, progress: u64, total: u64, message: &str) {
        let percentage = if total == 0 {
            0
        } else {
            ((progress as f64 / total as f64) * 100.0).round() as u8
        };
        let event = ProgressEvent {
            job_id: job_id.to_string(),
            stage: stage.to_string(),
            progress,
            total,
            percentage,
            message: message.to_string(),
        };

        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(job_id) {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_delivers_to_subscriber() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe("job-1").await;
        bus.publish("job-1", "scraping", 1, 4, "rss done").await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.stage, "scraping");
        assert_eq!(event.percentage, 25);
    }

    #[tokio::test]
    async fn publish_without_subscriber_does_not_panic() {
        let bus = ProgressBus::new();
        bus.publish("no-subscriber", "scraping", 1, 1, "x").await;
    }

    #[tokio::test]
    async fn progress_is_monotonic_across_events() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe("job-2").await;
        bus.publish("job-2", "saving", 1, 3, "a").await;
        bus.publish("job-2", "saving", 2, 3, "b").await;
        bus.publish("job-2", "saving", 3, 3, "c").await;
        let mut last = 0;
        for _ in 0..3 {
            let e = rx.recv().await.unwrap();
            assert!(e.progress >= last);
            last = e.progress;
        }
    }
}
