// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the normalized identity derived from them.

use serde::{Deserialize, Serialize};

use super::AuthError;

/// Fallback display name when neither metadata nor email provide one.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Claims carried by a Supabase access token.
///
/// Only the fields this service reads are modeled; everything else in the
/// payload is ignored. `sub` and `email` are optional here so that their
/// absence surfaces as `MissingClaims` rather than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupabaseClaims {
    /// Subject (Supabase user ID)
    #[serde(default)]
    pub sub: Option<String>,

    /// Email address
    #[serde(default)]
    pub email: Option<String>,

    /// User-editable profile metadata
    #[serde(default)]
    pub user_metadata: Option<UserMetadata>,

    /// Set once the email address is confirmed. Only presence matters.
    #[serde(default)]
    pub email_confirmed_at: Option<serde_json::Value>,

    /// Expiration timestamp (validated by the verifier)
    #[serde(default)]
    pub exp: i64,
}

/// `user_metadata` claim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    /// Display name. Kept as a raw value since users can store anything here.
    #[serde(default)]
    pub name: Option<serde_json::Value>,
}

impl UserMetadata {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().and_then(|v| v.as_str())
    }
}

/// Identity derived from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIdentity {
    /// Identity provider subject id
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
}

impl NormalizedIdentity {
    /// Map verified claims to an identity.
    ///
    /// Rejects tokens without `sub`/`email` first, then tokens whose email
    /// has not been confirmed.
    pub fn from_claims(claims: &SupabaseClaims) -> Result<Self, AuthError> {
        let external_id = non_empty(claims.sub.as_deref());
        let email = non_empty(claims.email.as_deref());
        let metadata_name = claims.user_metadata.as_ref().and_then(UserMetadata::name);
        let name = display_name(metadata_name, email);

        let (Some(external_id), Some(email)) = (external_id, email) else {
            return Err(AuthError::MissingClaims);
        };

        let email_verified = claims
            .email_confirmed_at
            .as_ref()
            .is_some_and(|v| !v.is_null());
        if !email_verified {
            return Err(AuthError::UnverifiedEmail);
        }

        Ok(Self {
            external_id: external_id.to_string(),
            email: email.to_string(),
            name,
            email_verified,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Pick a display name: metadata name, else the email's local part, else
/// [`DEFAULT_DISPLAY_NAME`].
///
/// `from_claims` never reaches the last branch because it rejects tokens
/// without an email; it stays for callers that derive names on their own.
pub fn display_name(metadata_name: Option<&str>, email: Option<&str>) -> String {
    if let Some(name) = non_empty(metadata_name) {
        return name.to_string();
    }
    match email {
        Some(email) => email.split('@').next().unwrap_or(email).to_string(),
        None => DEFAULT_DISPLAY_NAME.to_string(),
    }
}
