// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::header::BEARER_KEYWORD;
use crate::storage::StoreError;

/// Authentication error type.
///
/// The `Display` text of each variant is what the client sees. Details that
/// must not leave the server (library errors, storage errors) are kept in
/// fields that only reach the logs.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No verification secret is configured
    #[error("Authentication is not configured on this server.")]
    ConfigError,

    /// A protected endpoint was called anonymously
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    /// Authorization header present but structurally wrong
    #[error("Invalid token header. {0}")]
    MalformedHeader(&'static str),

    /// Token is past its expiry
    #[error("Token has expired.")]
    ExpiredCredential,

    /// Signature or structure verification failed
    #[error("Invalid token.")]
    InvalidCredential,

    /// `sub` or `email` missing or empty
    #[error("Token missing required claims (sub, email).")]
    MissingClaims,

    /// `email_confirmed_at` missing or null
    #[error("Email not verified. Please verify your email first.")]
    UnverifiedEmail,

    /// Persisting the local user failed
    #[error("{}", reconciliation_message(.retryable))]
    ReconciliationFailed {
        /// Lost a unique-constraint race; the client may simply retry
        retryable: bool,
        #[source]
        source: StoreError,
    },
}

fn reconciliation_message(retryable: &bool) -> &'static str {
    if *retryable {
        "Failed to sync user. Please retry."
    } else {
        "Failed to sync user."
    }
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Wrap a storage failure that happened while reconciling a user.
    pub fn reconciliation(source: StoreError) -> Self {
        AuthError::ReconciliationFailed {
            retryable: source.is_conflict(),
            source,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::ConfigError => "config_error",
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::MalformedHeader(_) => "malformed_header",
            AuthError::ExpiredCredential => "expired_credential",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::MissingClaims => "missing_claims",
            AuthError::UnverifiedEmail => "unverified_email",
            AuthError::ReconciliationFailed { retryable: true, .. } => "reconciliation_conflict",
            AuthError::ReconciliationFailed { retryable: false, .. } => "reconciliation_failed",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotAuthenticated
            | AuthError::MalformedHeader(_)
            | AuthError::ExpiredCredential
            | AuthError::InvalidCredential
            | AuthError::MissingClaims
            | AuthError::UnverifiedEmail
            | AuthError::ReconciliationFailed {
                retryable: true, ..
            } => StatusCode::UNAUTHORIZED,
            AuthError::ConfigError
            | AuthError::ReconciliationFailed {
                retryable: false, ..
            } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure is the server's fault rather than the client's.
    pub fn is_server_fault(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        let mut response = (status, body).into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BEARER_KEYWORD));
        response
    }
}
