// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module provides Supabase JWT authentication for the CarbonSense API.
//!
//! ## Auth Flow
//!
//! 1. Frontend authenticates the user with Supabase
//! 2. Frontend sends `Authorization: Bearer <Supabase JWT>`
//! 3. Server:
//!    - Verifies the HS256 signature with `SUPABASE_JWT_SECRET` and checks `exp`
//!    - Extracts `sub`, `email`, `user_metadata.name`, `email_confirmed_at`
//!    - Reconciles a local user (by `sub`, then by email, else creates one)
//!    - Attaches the user to the request
//!
//! ## Security
//!
//! - Unconfirmed emails are never authenticated or synced
//! - Audience is not checked
//! - Client-facing errors never include verification or storage details

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod header;
pub mod middleware;
pub mod reconcile;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use authenticator::{AuthenticatedUser, Authenticator, Credential};
pub use claims::{NormalizedIdentity, SupabaseClaims};
pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use header::{BearerHeader, BEARER_KEYWORD};
pub use reconcile::{Resolution, UserReconciler};
pub use verifier::{JwtSecret, TokenVerifier, VerifierConfig};
