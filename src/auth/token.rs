// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential encoding and verification.
//!
//! ## Verification order
//!
//! 1. Structure and HS256 signature → `InvalidToken`
//! 2. Expiry (`exp`) → `ExpiredToken`
//! 3. Revocation set lookup by token hash → `RevokedToken`
//!
//! Verification has no side effects. A revocation store that cannot answer
//! yields a denial.
//!
//! Revocation entries are kept through `exp + leeway`, the last second the
//! expiry check can still accept the token.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use uuid::Uuid;

use super::claims::UserClaims;
use super::error::AuthError;
use super::revocation::{token_hash, RevocationStore};

/// Default clock skew tolerance for expiry checks (seconds).
pub const DEFAULT_LEEWAY_SECS: u64 = 0;

/// HS256 signer/decoder for gate credentials.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenCodec {
    /// Create a codec over a shared secret. Issued tokens live `ttl_secs`.
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = DEFAULT_LEEWAY_SECS;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    /// Override the expiry leeway.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.validation.leeway = leeway_secs;
        self
    }

    /// Last Unix second at which a token with this `exp` still decodes.
    pub fn accepted_until(&self, exp: i64) -> i64 {
        let leeway = i64::try_from(self.validation.leeway).unwrap_or(i64::MAX);
        exp.saturating_add(leeway)
    }

    /// Mint a token for `user_id` valid from now for the configured TTL.
    pub fn issue(
        &self,
        user_id: &str,
    ) -> Result<(String, UserClaims), jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };
        let token = self.encode(&claims)?;
        Ok((token, claims))
    }

    /// Sign arbitrary claims.
    pub fn encode(&self, claims: &UserClaims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }

    /// Check structure, signature and expiry.
    pub fn decode(&self, token: &str) -> Result<UserClaims, AuthError> {
        decode::<UserClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }

    /// Check structure and signature only.
    ///
    /// Used when revoking: an expired token can still be put on the list.
    pub fn decode_ignoring_expiry(&self, token: &str) -> Result<UserClaims, AuthError> {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub"]);
        decode::<UserClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Token verifier: codec plus revocation lookup.
#[derive(Clone)]
pub struct TokenVerifier {
    codec: Arc<TokenCodec>,
    revocations: Arc<dyn RevocationStore>,
}

impl TokenVerifier {
    pub fn new(codec: Arc<TokenCodec>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self { codec, revocations }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Verify a raw token and return its claims.
    pub fn verify(&self, token: &str) -> Result<UserClaims, AuthError> {
        let claims = self.codec.decode(token)?;
        if self.revocations.is_revoked(&token_hash(token))? {
            return Err(AuthError::RevokedToken);
        }
        Ok(claims)
    }

    /// Put a token on the revocation list until it can no longer decode.
    ///
    /// Returns `false` if it was already revoked.
    pub fn revoke(&self, token: &str, claims: &UserClaims) -> Result<bool, AuthError> {
        let retain_until = self.codec.accepted_until(claims.exp);
        Ok(self.revocations.revoke(token_hash(token), retain_until)?)
    }
}
