// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authentication pipeline: header → verify → extract → reconcile.

use axum::http::HeaderMap;

use super::{
    claims::NormalizedIdentity,
    header::{BearerHeader, BEARER_KEYWORD},
    reconcile::UserReconciler,
    verifier::TokenVerifier,
    AuthError,
};
use crate::storage::User;

/// Bearer credential as presented by the client. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Result of a successful authentication, attached to the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub credential: Credential,
}

/// Runs the full authentication pass for a request.
#[derive(Clone)]
pub struct Authenticator {
    verifier: TokenVerifier,
    reconciler: UserReconciler,
}

impl Authenticator {
    pub fn new(verifier: TokenVerifier, reconciler: UserReconciler) -> Self {
        Self {
            verifier,
            reconciler,
        }
    }

    /// Value for the `WWW-Authenticate` header of a 401 response.
    pub fn challenge(&self) -> &'static str {
        BEARER_KEYWORD
    }

    pub fn is_configured(&self) -> bool {
        self.verifier.is_configured()
    }

    /// Authenticate a request from its headers.
    ///
    /// Returns `Ok(None)` when the request carries no credential at all.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Option<AuthenticatedUser>, AuthError> {
        let token = match BearerHeader::from_headers(headers) {
            BearerHeader::NoCredential => return Ok(None),
            BearerHeader::Malformed(reason) => {
                tracing::debug!(reason, "Rejected malformed authorization header");
                return Err(AuthError::MalformedHeader(reason));
            }
            BearerHeader::Present(token) => token,
        };

        let user = self.authenticate_token(&token)?;
        Ok(Some(AuthenticatedUser {
            user,
            credential: Credential::new(token),
        }))
    }

    /// Verify a bare token and return its local user.
    pub fn authenticate_token(&self, token: &str) -> Result<User, AuthError> {
        let result = self
            .verifier
            .verify(token)
            .and_then(|claims| NormalizedIdentity::from_claims(&claims))
            .and_then(|identity| self.reconciler.reconcile_identity(&identity));

        match &result {
            Ok(user) => tracing::debug!(user_id = %user.id, "Authenticated request"),
            Err(e) if e.is_server_fault() => {
                tracing::error!(error_code = e.error_code(), "Authentication failed on the server side")
            }
            Err(e) => tracing::warn!(error_code = e.error_code(), "Authentication rejected"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{claims_for, expired_claims, mint_token, TEST_SECRET};
    use crate::auth::verifier::{JwtSecret, VerifierConfig};
    use crate::storage::{InMemoryUserStore, NewUser, UserStore};
    use axum::http::{header::AUTHORIZATION, HeaderValue};
    use std::sync::Arc;

    fn authenticator() -> (Authenticator, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        let verifier = TokenVerifier::new(VerifierConfig::new(JwtSecret::new(TEST_SECRET)));
        (
            Authenticator::new(verifier, UserReconciler::new(store.clone())),
            store,
        )
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn anonymous_request_is_none() {
        let (auth, _store) = authenticator();
        assert!(auth.authenticate(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn valid_token_creates_user() {
        let (auth, store) = authenticator();
        let token = mint_token(&claims_for("abc123", "a@x.com", Some("Ann")), TEST_SECRET);

        let authenticated = auth.authenticate(&bearer(&token)).unwrap().unwrap();

        assert_eq!(authenticated.user.email, "a@x.com");
        assert_eq!(authenticated.user.name, "Ann");
        assert_eq!(authenticated.credential.as_str(), token);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn same_token_twice_creates_one_user() {
        let (auth, store) = authenticator();
        let token = mint_token(&claims_for("abc123", "a@x.com", Some("Ann")), TEST_SECRET);

        let first = auth.authenticate(&bearer(&token)).unwrap().unwrap();
        let second = auth.authenticate(&bearer(&token)).unwrap().unwrap();

        assert_eq!(first.user.id, second.user.id);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn unverified_email_creates_nothing() {
        let (auth, store) = authenticator();
        let mut claims = claims_for("abc123", "a@x.com", Some("Ann"));
        claims.as_object_mut().unwrap().remove("email_confirmed_at");
        let token = mint_token(&claims, TEST_SECRET);

        let err = auth.authenticate(&bearer(&token)).unwrap_err();

        assert!(matches!(err, AuthError::UnverifiedEmail));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let (auth, store) = authenticator();
        let token = mint_token(&claims_for("abc123", "a@x.com", None), "not-our-secret");

        let err = auth.authenticate(&bearer(&token)).unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredential));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn expired_token_is_rejected() {
        let (auth, _store) = authenticator();
        let token = mint_token(&expired_claims("abc123", "a@x.com"), TEST_SECRET);
        assert!(matches!(
            auth.authenticate(&bearer(&token)),
            Err(AuthError::ExpiredCredential)
        ));
    }

    #[test]
    fn malformed_header_short_circuits() {
        let (auth, _store) = authenticator();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert!(matches!(
            auth.authenticate(&headers),
            Err(AuthError::MalformedHeader(_))
        ));
    }

    #[test]
    fn existing_email_user_is_linked() {
        let (auth, store) = authenticator();
        let legacy = store
            .insert(NewUser {
                email: "a@x.com".to_string(),
                name: "Legacy".to_string(),
                external_id: None,
            })
            .unwrap();
        let token = mint_token(&claims_for("new-sub", "a@x.com", Some("Ann")), TEST_SECRET);

        let user = auth.authenticate_token(&token).unwrap();

        assert_eq!(user.id, legacy.id);
        assert_eq!(user.external_id.as_deref(), Some("new-sub"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn challenge_is_bearer() {
        let (auth, _store) = authenticator();
        assert_eq!(auth.challenge(), "Bearer");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("eyJhbGciOi");
        assert!(!format!("{credential:?}").contains("eyJ"));
    }
}
