use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use routeforge_core::OutcomeEvent;

use crate::store::AnalyticsStore;

/// Drain outcome events into the store on a blocking task.
///
/// The task ends once every sender is dropped; the store is handed back so
/// callers can query what was written.
pub fn spawn_recorder(
    store: AnalyticsStore,
    mut rx: mpsc::Receiver<OutcomeEvent>,
) -> JoinHandle<AnalyticsStore> {
    tokio::task::spawn_blocking(move || {
        while let Some(event) = rx.blocking_recv() {
            match store.insert(&event) {
                Ok(()) => debug!(event_id = %event.id, "Outcome recorded"),
                Err(e) => warn!(event_id = %event.id, error = %e, "Failed to record outcome"),
            }
        }
        store
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use routeforge_core::{ProviderId, TaskCategory, Usage};

    #[tokio::test]
    async fn test_recorder_drains_channel() {
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_recorder(AnalyticsStore::in_memory().unwrap(), rx);

        for ms in [10, 20, 30] {
            tx.send(OutcomeEvent::success(
                TaskCategory::Chat,
                ProviderId::OpenAi,
                "gpt-4o",
                ms,
                Usage::new(1, 1),
            ))
            .await
            .unwrap();
        }
        drop(tx);

        let store = handle.await.unwrap();
        assert_eq!(store.count().unwrap(), 3);
    }
}
