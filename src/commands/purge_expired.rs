use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::{info, warn};

use crate::controllers::paste;
use crate::App;

/// Delete expired pastes once and exit.
pub async fn run(app: App) -> anyhow::Result<()> {
    let count = paste::purge_expired(&app).await?;
    info!("purged {count} expired pastes");
    Ok(())
}

/// Periodically delete expired pastes in the background.
///
/// Failures are logged and the sweep simply tries again on the next tick.
pub fn spawn_sweep(app: App, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            if let Err(error) = paste::purge_expired(&app).await {
                warn!("expiry sweep failed: {error}");
            }
        }
    })
}
