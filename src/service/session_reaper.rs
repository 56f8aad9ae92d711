use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::db::RegistryStore;

/// Periodically delete sessions past their TTL.
///
/// Reads already hide expired sessions; this only reclaims the rows.
pub fn spawn(store: RegistryStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = every.as_secs(), "session reaper started");
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match store.purge_expired_sessions(Utc::now()).await {
                Ok(0) => {}
                Ok(n) => debug!(purged = n, "expired sessions removed"),
                Err(e) => warn!(error = %e, "session sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn first_tick_purges_stale_sessions() {
        let store = RegistryStore::connect("sqlite::memory:").await.unwrap();
        store
            .create_session_at("old", "a@b.c", Utc::now() - ChronoDuration::hours(2))
            .await
            .unwrap();
        store.create_session("new", "a@b.c").await.unwrap();

        let handle = spawn(store.clone(), Duration::from_secs(3600));
        let mut remaining = -1;
        for _ in 0..50 {
            let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
                .fetch_one(store.pool())
                .await
                .unwrap();
            remaining = rec.0;
            if remaining == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert_eq!(remaining, 1);
        assert!(store.find_session("new").await.unwrap().is_some());
    }
}
