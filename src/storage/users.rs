// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User records and the storage contract used by the authentication layer.
//!
//! A [`UserStore`] keeps users keyed by their internal id and enforces two
//! unique secondary keys: `email`, and `external_id` when present. Violations
//! are reported as [`StoreError::Conflict`] so callers can tell a lost
//! insert race apart from a genuine storage fault.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Internal identifier (UUID v4, immutable)
    pub id: Uuid,
    /// Email address (unique)
    pub email: String,
    /// Display name
    pub name: String,
    /// Identity provider subject id (unique when present)
    #[serde(default)]
    pub external_id: Option<String>,
    /// Whether the account is active
    pub is_active: bool,
    /// Staff accounts may reach operator tooling
    #[serde(default)]
    pub is_staff: bool,
    /// Password hash. Always `None` for users created from a token, which
    /// disables password login for them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// When the user was first created
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Whether password-based login is possible for this user.
    pub fn has_usable_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Values for a user that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub external_id: Option<String>,
}

impl NewUser {
    /// Materialize the record with a fresh id and creation time.
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            email: self.email,
            name: self.name,
            external_id: self.external_id,
            is_active: true,
            is_staff: false,
            password_hash: None,
            date_joined: Utc::now(),
        }
    }
}

/// A partial update. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub external_id: Option<String>,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.external_id.is_none()
    }

    /// Write the set fields onto `user`.
    pub fn apply(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(external_id) = &self.external_id {
            user.external_id = Some(external_id.clone());
        }
    }
}

/// Unique secondary keys of the user collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    ExternalId,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Email => write!(f, "email"),
            UniqueField::ExternalId => write!(f, "external_id"),
        }
    }
}

/// Error type for user storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique key is already held by another user.
    #[error("unique constraint violated on {0}")]
    Conflict(UniqueField),

    #[error("user not found: {0}")]
    NotFound(Uuid),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for users.
///
/// Implementations must make `insert` and `update` check the unique keys and
/// write the record in one atomic step.
pub trait UserStore: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    fn find_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>>;

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Create a user. Fails with `Conflict` if the email or external id is taken.
    fn insert(&self, new_user: NewUser) -> StoreResult<User>;

    /// Apply `patch` to the user with `id` and return the stored result.
    fn update(&self, id: Uuid, patch: &UserPatch) -> StoreResult<User>;

    fn count(&self) -> StoreResult<usize>;

    /// Cheap probe used by the readiness endpoint.
    fn health_check(&self) -> StoreResult<()> {
        self.count().map(|_| ())
    }
}
