//! Background task that deletes expired portraits from the media directory.

use crate::store::AvatarStore;
use std::time::Duration;
use tokio::time::sleep;

/// Periodically removes portraits last written more than `max_age` ago.
///
/// Sleeps before the first sweep so startup is not slowed down. Runs until
/// the runtime shuts down.
pub async fn start_retention_task(store: AvatarStore, max_age: Duration, interval_seconds: u64) {
    let interval = Duration::from_secs(interval_seconds.max(1));
    tracing::info!(
        interval_seconds,
        max_age_secs = max_age.as_secs(),
        "starting portrait retention task"
    );

    loop {
        sleep(interval).await;

        match store.remove_older_than(max_age).await {
            Ok(0) => tracing::debug!("no expired portraits to delete"),
            Ok(count) => tracing::info!(count, "deleted expired portraits"),
            Err(e) => tracing::error!(error = %e, "failed to delete expired portraits"),
        }
    }
}
