// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Revocation Pruner
//!
//! Background task that drops revocation entries once the revoked token can
//! no longer pass expiry validation, leeway included. From then on the entry
//! no longer changes any outcome.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::RevocationStore;

pub struct RevocationPruner {
    store: Arc<dyn RevocationStore>,
    interval: Duration,
}

impl RevocationPruner {
    pub fn new(store: Arc<dyn RevocationStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(pruner.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Revocation pruner starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Revocation pruner shutting down");
                    return;
                }
            }

            self.prune_step(Utc::now().timestamp());
        }
    }

    /// One sweep. Returns the number of entries removed.
    pub fn prune_step(&self, now: i64) -> usize {
        match self.store.prune_expired(now) {
            Ok(0) => 0,
            Ok(removed) => {
                debug!(removed, "Pruned expired revocation entries");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Revocation prune failed, will retry");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryRevocationStore;

    #[test]
    fn prune_step_removes_expired_entries() {
        let store = Arc::new(InMemoryRevocationStore::new());
        store.revoke("gone".into(), 10).unwrap();
        store.revoke("kept".into(), 1_000).unwrap();

        let pruner = RevocationPruner::new(store.clone(), Duration::from_secs(1));
        assert_eq!(pruner.prune_step(500), 1);
        assert!(store.is_revoked("kept").unwrap());
        assert!(!store.is_revoked("gone").unwrap());
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let store = Arc::new(InMemoryRevocationStore::new());
        let pruner = RevocationPruner::new(store, Duration::from_secs(3600));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(pruner.run(shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("pruner did not stop")
            .unwrap();
    }
}
