// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 token verification against the Supabase JWT secret.
//!
//! ## Checks
//!
//! - Signature (HMAC-SHA256, shared secret)
//! - `exp` present and not in the past (leeway configurable, default 0)
//! - Audience is NOT checked; Supabase does not always set it
//!
//! Library errors are logged at debug level and collapsed into
//! [`AuthError::InvalidCredential`] so nothing about the failure leaks to
//! the client.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};

use super::{claims::SupabaseClaims, AuthError};

/// Default expiry leeway in seconds.
pub const DEFAULT_LEEWAY_SECS: u64 = 0;

/// Shared HMAC secret. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtSecret(String);

impl JwtSecret {
    /// Returns `None` for an empty secret.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        (!secret.is_empty()).then_some(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtSecret(<redacted>)")
    }
}

/// Verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// `None` means the deployment is missing `SUPABASE_JWT_SECRET`
    pub secret: Option<JwtSecret>,
    /// Seconds of clock skew tolerated on `exp`
    pub leeway_secs: u64,
}

impl VerifierConfig {
    pub fn new(secret: Option<JwtSecret>) -> Self {
        Self {
            secret,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

/// Verifies bearer credentials and returns their claims.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.validate_exp = true;
        validation.leeway = config.leeway_secs;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: config
                .secret
                .as_ref()
                .map(|secret| DecodingKey::from_secret(secret.as_bytes())),
            validation,
        }
    }

    /// Whether a secret is configured.
    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Verify signature and expiry of `token` and decode its claims.
    pub fn verify(&self, token: &str) -> Result<SupabaseClaims, AuthError> {
        let key = self.key.as_ref().ok_or_else(|| {
            tracing::error!("SUPABASE_JWT_SECRET is not configured; rejecting token");
            AuthError::ConfigError
        })?;

        decode::<SupabaseClaims>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
                _ => {
                    tracing::debug!(error = %e, "Token verification failed");
                    AuthError::InvalidCredential
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{claims_for, expired_claims, mint_token, TEST_SECRET};
    use serde_json::json;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(VerifierConfig::new(JwtSecret::new(TEST_SECRET)))
    }

    #[test]
    fn accepts_valid_token() {
        let token = mint_token(&claims_for("abc123", "a@x.com", Some("Ann")), TEST_SECRET);
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("abc123"));
        assert_eq!(claims.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn rejects_other_secret() {
        let token = mint_token(&claims_for("abc123", "a@x.com", None), "another-secret");
        assert!(matches!(
            verifier().verify(&token),
            Err(AuthError::InvalidCredential)
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let token = mint_token(&expired_claims("abc123", "a@x.com"), TEST_SECRET);
        assert!(matches!(
            verifier().verify(&token),
            Err(AuthError::ExpiredCredential)
        ));
    }

    #[test]
    fn leeway_tolerates_recent_expiry() {
        let verifier =
            TokenVerifier::new(VerifierConfig::new(JwtSecret::new(TEST_SECRET)).with_leeway(3600));
        let token = mint_token(&expired_claims("abc123", "a@x.com"), TEST_SECRET);
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            verifier().verify("not-a-jwt"),
            Err(AuthError::InvalidCredential)
        ));
    }

    #[test]
    fn rejects_token_without_exp() {
        let mut claims = claims_for("abc123", "a@x.com", None);
        claims.as_object_mut().unwrap().remove("exp");
        let token = mint_token(&claims, TEST_SECRET);
        assert!(matches!(
            verifier().verify(&token),
            Err(AuthError::InvalidCredential)
        ));
    }

    #[test]
    fn ignores_audience() {
        let mut claims = claims_for("abc123", "a@x.com", None);
        claims["aud"] = json!("some-other-app");
        let token = mint_token(&claims, TEST_SECRET);
        assert!(verifier().verify(&token).is_ok());
    }

    #[test]
    fn missing_secret_is_config_error() {
        let verifier = TokenVerifier::new(VerifierConfig::new(None));
        assert!(!verifier.is_configured());

        let token = mint_token(&claims_for("abc123", "a@x.com", None), TEST_SECRET);
        assert!(matches!(verifier.verify(&token), Err(AuthError::ConfigError)));
    }

    #[test]
    fn empty_secret_is_unset() {
        assert!(JwtSecret::new("").is_none());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = JwtSecret::new("hunter2").unwrap();
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
