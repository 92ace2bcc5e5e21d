// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! The access gate for sensitive endpoints.
//!
//! ## Request Flow
//!
//! 1. Credential taken from the `authToken` cookie, else `Authorization: Bearer`
//! 2. [`TokenVerifier`] checks signature, expiry and the revocation set
//! 3. [`IdentityResolver`] loads the live user record
//! 4. [`AccessPolicy`] applies the environment and role/2FA gates
//! 5. [`guard::route_guard`] forwards to the handler or returns the denial
//!
//! ## Security
//!
//! - Every lookup failure is a denial
//! - The environment class is fixed at startup and injected into the policy
//! - Tokens are revoked by SHA-256 hash, never stored in clear

pub mod claims;
pub mod environment;
pub mod error;
pub mod extractor;
pub mod guard;
pub mod identity;
pub mod policy;
pub mod revocation;
pub mod roles;
pub mod token;
pub mod totp;

pub use claims::{UserClaims, UserIdentity};
pub use environment::EnvironmentClass;
pub use error::{AuthError, StoreError};
pub use extractor::{Authenticated, CurrentToken};
pub use guard::{route_guard, PresentedToken, RouteGuard};
pub use identity::{IdentityResolver, IdentityStore, InMemoryIdentityStore};
pub use policy::{AccessDecision, AccessPolicy};
pub use revocation::{InMemoryRevocationStore, RevocationStore};
pub use roles::{Role, RouteAudience};
pub use token::{TokenCodec, TokenVerifier, DEFAULT_LEEWAY_SECS};
