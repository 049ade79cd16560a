use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use gatehouse_core::store::CredentialStore;

/// Periodically drop expired refresh tokens and aged-out revocation
/// entries. Expiry checks on the hot paths never depend on this; the
/// sweeper only keeps the tables from growing without bound.
pub fn spawn_sweeper(store: CredentialStore, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval fires immediately; skip the startup tick.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let now = Utc::now();

            match store.refresh_tokens.purge_expired(now).await {
                Ok(purged) if purged > 0 => {
                    debug!(purged, "swept expired refresh tokens");
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "refresh token sweep failed"),
            }

            match store.revoked_tokens.purge_expired(now).await {
                Ok(purged) if purged > 0 => {
                    debug!(purged, "swept aged-out revocations");
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "revocation sweep failed"),
            }
        }
    });
}
