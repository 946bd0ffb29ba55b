// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints for the signed-in user.

use axum::Json;

use crate::auth::Auth;
use crate::models::{MessageResponse, UserResponse};

/// Get the current authenticated user.
///
/// The user is created or synced from the token claims on the first
/// authenticated request.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 500, description = "Authentication not configured or user sync failed"),
    )
)]
pub async fn current_user(Auth(user): Auth) -> Json<UserResponse> {
    Json(user.user.into())
}

/// Log out.
///
/// Sessions are held by the identity provider, so this only acknowledges the
/// request; the client discards its token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Missing, invalid or expired token"),
    )
)]
pub async fn logout(Auth(user): Auth) -> Json<MessageResponse> {
    tracing::info!(user_id = %user.user.id, "User logged out");
    Json(MessageResponse::new("Successfully logged out"))
}
