//! Unverified JWT payload decoding.
//!
//! The portal only reads claims to decide which screens and commands to
//! offer; it never verifies signatures. That is deliberate: verification is
//! the backend's job, and it re-checks authorization on every request. A
//! decoded role here must never be treated as an authorization boundary.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    Viewer,
    /// Anything unrecognized. Treated as least privilege everywhere.
    #[serde(other)]
    Unknown,
}

impl Default for Role {
    fn default() -> Self {
        Role::Unknown
    }
}

impl Role {
    /// Tenant administration console (client CRUD, invitations).
    pub fn can_manage_clients(&self) -> bool {
        matches!(self, Role::Superadmin)
    }

    /// Billing, wallet and usage dashboards.
    pub fn can_view_billing(&self) -> bool {
        matches!(self, Role::Superadmin | Role::Admin | Role::Viewer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Viewer => "viewer",
            Role::Unknown => "unknown",
        }
    }
}

/// Claims read from the access token's payload segment. Derived on demand,
/// never persisted; stale the moment the underlying token rotates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedClaims {
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Decode the payload segment of a JWT without verifying the signature.
///
/// Returns `None` for anything malformed: wrong segment count, bad base64,
/// non-UTF-8 bytes, non-JSON payload. Callers must read `None` as "unknown
/// role, assume least privilege".
pub fn decode_claims(token: &str) -> Option<DecodedClaims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };

    // JWT payloads are base64url without padding, but tolerate padded input
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))
        .ok()?;

    serde_json::from_slice(&bytes).ok()
}
