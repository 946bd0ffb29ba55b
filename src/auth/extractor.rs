// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.user is the reconciled local User
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Authenticate the request unless the middleware already did.
///
/// A successful result is cached in the request extensions.
fn resolve(parts: &mut Parts, state: &AppState) -> Result<Option<AuthenticatedUser>, AuthError> {
    if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
        return Ok(Some(user));
    }

    let user = state.auth.authenticate(&parts.headers)?;
    if let Some(user) = &user {
        parts.extensions.insert(user.clone());
    }
    Ok(user)
}

/// Extractor for authenticated users.
///
/// Rejects anonymous requests with `NotAuthenticated` and any credential
/// failure with its own error.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)?
            .map(Auth)
            .ok_or(AuthError::NotAuthenticated)
    }
}

/// Optional authentication extractor.
///
/// Anonymous requests yield `None`. A credential that is present but fails
/// verification is still rejected; bad tokens are never treated as anonymous.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state).map(OptionalAuth)
    }
}
