use actix_web::rt::{self, task::JoinHandle};
use std::time::Duration;

use crate::store::SharedStore;

/// Deletes expired sessions once, logging the outcome.
pub async fn purge_expired(store: &SharedStore) {
    match store.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => log::info!("purged {} expired sessions", purged),
        Err(e) => log::error!("failed to purge expired sessions: {}", e),
    }
}

/// Sweeps expired sessions now and then every `every` until the handle is aborted.
pub fn spawn_expired_purge(store: SharedStore, every: Duration) -> JoinHandle<()> {
    rt::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            purge_expired(&store).await;
        }
    })
}
