// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token minting helpers for tests.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

pub const TEST_SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

/// Claims of a valid, confirmed Supabase session expiring in an hour.
pub fn claims_for(sub: &str, email: &str, name: Option<&str>) -> Value {
    let mut claims = json!({
        "sub": sub,
        "email": email,
        "aud": "authenticated",
        "role": "authenticated",
        "email_confirmed_at": "2024-01-01T00:00:00Z",
        "iat": Utc::now().timestamp(),
        "exp": Utc::now().timestamp() + 3600,
    });
    if let Some(name) = name {
        claims["user_metadata"] = json!({ "name": name });
    }
    claims
}

/// Same as [`claims_for`] but expired ten minutes ago.
pub fn expired_claims(sub: &str, email: &str) -> Value {
    let mut claims = claims_for(sub, email, None);
    claims["exp"] = json!(Utc::now().timestamp() - 600);
    claims
}

/// Sign `claims` with HS256.
pub fn mint_token(claims: &Value, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
