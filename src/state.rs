// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Instant;

use crate::auth::{
    AccessPolicy, IdentityResolver, IdentityStore, RevocationStore, TokenCodec, TokenVerifier,
};
use crate::config::GateConfig;
use crate::metrics::GateMetrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GateConfig>,
    pub verifier: TokenVerifier,
    pub resolver: IdentityResolver,
    pub identities: Arc<dyn IdentityStore>,
    pub revocations: Arc<dyn RevocationStore>,
    pub policy: AccessPolicy,
    pub metrics: Arc<GateMetrics>,
    pub started_at: Instant,
    codec: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(
        config: GateConfig,
        identities: Arc<dyn IdentityStore>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Result<Self, prometheus::Error> {
        let codec = Arc::new(
            TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl_secs)
                .with_leeway(config.token_leeway_secs),
        );
        let policy = AccessPolicy::new(config.environment);

        Ok(Self {
            verifier: TokenVerifier::new(codec.clone(), revocations.clone()),
            resolver: IdentityResolver::new(identities.clone()),
            identities,
            revocations,
            policy,
            metrics: Arc::new(GateMetrics::new()?),
            started_at: Instant::now(),
            config: Arc::new(config),
            codec,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}
