// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access Gate - Environment-aware auth gate for sensitive endpoints
//!
//! Guards metrics and admin endpoints behind token verification, revocation,
//! identity resolution and an access policy that knows whether the
//! deployment is restricted (staging) or open (production).
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token verifier, identity resolver, access policy, route guard
//! - `config` - Environment-driven configuration
//! - `metrics` - Prometheus counters for the gate
//! - `pruner` - Background expiry of revocation entries

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pruner;
pub mod state;
