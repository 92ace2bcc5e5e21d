// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Time-based one-time passwords (RFC 6238, HMAC-SHA256 variant).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Seconds per TOTP step.
pub const STEP_SECS: i64 = 30;
/// Code length.
pub const DIGITS: u32 = 6;
/// Accepted drift in steps on either side of the current one.
pub const WINDOW: i64 = 1;

/// HOTP value for a counter (RFC 4226 dynamic truncation).
fn hotp(secret: &[u8], counter: u64) -> Option<u32> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = ((u32::from(digest[offset]) & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    Some(binary % 10u32.pow(DIGITS))
}

/// Code for the step containing `unix_time`.
pub fn generate(secret: &[u8], unix_time: i64) -> Option<String> {
    let counter = u64::try_from(unix_time.div_euclid(STEP_SECS)).ok()?;
    hotp(secret, counter).map(|code| format!("{code:0width$}", width = DIGITS as usize))
}

/// Check `code` against the current step and `WINDOW` neighbours.
pub fn verify(secret: &[u8], code: &str, unix_time: i64) -> bool {
    let code = code.trim();
    if code.len() != DIGITS as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    (-WINDOW..=WINDOW).any(|drift| {
        generate(secret, unix_time + drift * STEP_SECS).is_some_and(|expected| expected == code)
    })
}
