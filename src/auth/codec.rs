//! Token signing and verification.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use thiserror::Error;

use crate::auth::claims::{AuthClaims, TokenKind};

/// Why a token was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("token expired")]
    Expired,

    #[error("token signature invalid")]
    BadSignature,

    #[error("token malformed")]
    Malformed,
}

/// Issues and validates HS512-signed bearer tokens.
///
/// Stateless apart from the derived keys; cheap to clone and share.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec from the shared signing secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        // Exact expiry: a token one second past exp must fail.
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Mint a signed token binding identity and expiry.
    ///
    /// `ttl` defaults per kind: ACCESS 24h, REFRESH 7d, OPERATION 1h.
    /// `operation` names the banking operation an OPERATION token is scoped
    /// to and is ignored for other kinds.
    pub fn issue(
        &self,
        subject: &str,
        email: &str,
        role: &str,
        kind: TokenKind,
        ttl: Option<Duration>,
        operation: Option<String>,
    ) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let ttl = ttl.unwrap_or_else(|| kind.default_ttl());

        let claims = AuthClaims {
            sub: subject.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            token_type: kind,
            operation: if kind == TokenKind::Operation { operation } else { None },
            iat: now,
            exp: now + ttl.as_secs(),
        };

        encode(&Header::new(Algorithm::HS512), &claims, &self.encoding_key)
            .map_err(|_| AuthError::Malformed)
    }

    /// Verify signature, structure and expiry; return the embedded claims.
    pub fn validate(&self, token: &str) -> Result<AuthClaims, AuthError> {
        decode::<AuthClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::BadSignature,
                _ => AuthError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("unit-test-secret")
    }

    #[test]
    fn round_trip_preserves_identity() {
        let codec = codec();
        let ttl = Duration::from_secs(1234);
        let token = codec
            .issue("user-42", "alice@bank.test", "USER", TokenKind::Access, Some(ttl), None)
            .unwrap();

        let claims = codec.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-42");
        assert_eq!(claims.email, "alice@bank.test");
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(claims.exp, claims.iat + 1234);
    }

    #[test]
    fn operation_token_carries_scope() {
        let codec = codec();
        let token = codec
            .issue(
                "user-7",
                "bob@bank.test",
                "USER",
                TokenKind::Operation,
                None,
                Some("fund-transfer".to_string()),
            )
            .unwrap();

        let claims = codec.validate(&token).unwrap();
        assert_eq!(claims.operation.as_deref(), Some("fund-transfer"));
        assert_eq!(claims.exp - claims.iat, 3_600);
    }

    #[test]
    fn operation_scope_dropped_for_access_tokens() {
        let codec = codec();
        let token = codec
            .issue(
                "user-7",
                "bob@bank.test",
                "USER",
                TokenKind::Access,
                None,
                Some("fund-transfer".to_string()),
            )
            .unwrap();

        let claims = codec.validate(&token).unwrap();
        assert!(claims.operation.is_none());
    }

    #[test]
    fn expired_token_rejected_despite_valid_signature() {
        let codec = codec();
        // Sign claims that expired an hour ago, bypassing issue().
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = AuthClaims {
            sub: "user-1".into(),
            email: "a@b.test".into(),
            role: "USER".into(),
            token_type: TokenKind::Access,
            operation: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        assert_eq!(codec.validate(&token), Err(AuthError::Expired));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = codec()
            .issue("user-1", "a@b.test", "USER", TokenKind::Access, None, None)
            .unwrap();

        let other = TokenCodec::new("a-different-secret");
        assert_eq!(other.validate(&token), Err(AuthError::BadSignature));
    }

    #[test]
    fn garbage_rejected_as_malformed() {
        assert_eq!(codec().validate("not.a.token"), Err(AuthError::Malformed));
        assert_eq!(codec().validate(""), Err(AuthError::Malformed));
    }
}
