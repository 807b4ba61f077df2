//! Token claims carried by signed bearer tokens.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The purpose a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Standard session token.
    #[serde(rename = "ACCESS")]
    Access,
    /// Long-lived token exchanged for fresh access tokens.
    #[serde(rename = "REFRESH")]
    Refresh,
    /// Short-lived token scoped to one named banking operation.
    #[serde(rename = "OPERATION")]
    Operation,
}

impl TokenKind {
    /// Default time-to-live for tokens of this kind.
    pub fn default_ttl(self) -> Duration {
        match self {
            TokenKind::Access => Duration::from_secs(24 * 3600),
            TokenKind::Refresh => Duration::from_secs(7 * 24 * 3600),
            TokenKind::Operation => Duration::from_secs(3600),
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenKind::Access => "ACCESS",
            TokenKind::Refresh => "REFRESH",
            TokenKind::Operation => "OPERATION",
        };
        f.write_str(s)
    }
}

/// Identity claims bound into a signed token.
///
/// Invariant: `exp > iat`; both are seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject (user id).
    pub sub: String,

    /// Account email address.
    pub email: String,

    /// Role granted to the subject (USER, ADMIN, BANK_MANAGER, ...).
    pub role: String,

    /// What the token authorizes.
    #[serde(rename = "tokenType")]
    pub token_type: TokenKind,

    /// Named banking operation this token is scoped to, for OPERATION tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    /// Issued-at, seconds since the epoch.
    pub iat: u64,

    /// Expiry, seconds since the epoch.
    pub exp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_kind_serializes_to_wire_names() {
        assert_eq!(serde_json::to_string(&TokenKind::Access).unwrap(), "\"ACCESS\"");
        assert_eq!(serde_json::to_string(&TokenKind::Refresh).unwrap(), "\"REFRESH\"");
        assert_eq!(serde_json::to_string(&TokenKind::Operation).unwrap(), "\"OPERATION\"");
    }

    #[test]
    fn default_ttls() {
        assert_eq!(TokenKind::Access.default_ttl().as_secs(), 86_400);
        assert_eq!(TokenKind::Refresh.default_ttl().as_secs(), 604_800);
        assert_eq!(TokenKind::Operation.default_ttl().as_secs(), 3_600);
    }
}
