//! Local inspection of access-token lifetimes.
//!
//! The client never verifies signatures; it only reads the `exp` claim to
//! decide whether a token is worth sending. Anything that cannot be
//! decoded counts as expired so the session layer refreshes instead of
//! sending garbage.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

/// Tokens within this much of their expiry (inclusive) are treated as
/// already expired, so a request cannot race the server-side cutoff.
pub const EXPIRY_MARGIN: Duration = Duration::seconds(30);

#[derive(Debug, Deserialize)]
struct Claims {
    exp: i64,
}

/// Reads the expiry instant from a JWT without verifying it.
///
/// Returns None when the token is not a decodable three-part JWT carrying
/// a numeric `exp` claim.
pub fn expiration(token: &str) -> Option<OffsetDateTime> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    OffsetDateTime::from_unix_timestamp(claims.exp).ok()
}

/// True if the token is expired or close enough to expiry that it should
/// not be attached to a request.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, OffsetDateTime::now_utc())
}

fn is_expired_at(token: &str, now: OffsetDateTime) -> bool {
    match expiration(token) {
        Some(exp) => exp - now <= EXPIRY_MARGIN,
        None => true,
    }
}
