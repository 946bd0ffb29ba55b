// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reconciliation of verified identities with local user records.
//!
//! ## Resolution Order
//!
//! First match wins:
//!
//! 1. User with this external id: sync `email` and `name` if they drifted
//! 2. User with this email: link the external id and take the new `name`
//! 3. Otherwise: create a user without a password
//!
//! The lookups and the write are not atomic. Two first logins for the same
//! identity can both reach step 3; the store rejects the second insert with a
//! conflict, and the loser runs the policy once more, which then finds the
//! winner's record in step 1.

use std::sync::Arc;

use crate::storage::{NewUser, StoreResult, User, UserPatch, UserStore};

use super::{claims::NormalizedIdentity, AuthError};

/// Which branch of the policy produced the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Found by external id (possibly with email/name updated)
    Matched(User),
    /// Found by email and linked to the external id
    Linked(User),
    /// Newly created
    Created(User),
}

impl Resolution {
    pub fn user(&self) -> &User {
        match self {
            Resolution::Matched(user) | Resolution::Linked(user) | Resolution::Created(user) => {
                user
            }
        }
    }

    pub fn into_user(self) -> User {
        match self {
            Resolution::Matched(user) | Resolution::Linked(user) | Resolution::Created(user) => {
                user
            }
        }
    }
}

/// Maps identities to persisted users.
#[derive(Clone)]
pub struct UserReconciler {
    store: Arc<dyn UserStore>,
}

impl UserReconciler {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Reconcile a verified identity and return its local user.
    pub fn reconcile_identity(&self, identity: &NormalizedIdentity) -> Result<User, AuthError> {
        self.reconcile(&identity.external_id, &identity.email, &identity.name)
    }

    /// Find, link or create the user for `external_id`.
    ///
    /// A unique-constraint conflict triggers exactly one more pass through
    /// the policy before failing.
    pub fn reconcile(&self, external_id: &str, email: &str, name: &str) -> Result<User, AuthError> {
        let resolution = match self.resolve(external_id, email, name) {
            Ok(resolution) => resolution,
            Err(e) if e.is_conflict() => {
                tracing::info!(
                    external_id = %external_id,
                    error = %e,
                    "User sync lost a write race, retrying lookup"
                );
                self.resolve(external_id, email, name).map_err(|e| {
                    tracing::warn!(external_id = %external_id, error = %e, "User sync retry failed");
                    AuthError::reconciliation(e)
                })?
            }
            Err(e) => {
                tracing::error!(external_id = %external_id, error = %e, "User sync failed");
                return Err(AuthError::reconciliation(e));
            }
        };

        Ok(resolution.into_user())
    }

    /// Run the resolution policy once.
    pub fn resolve(&self, external_id: &str, email: &str, name: &str) -> StoreResult<Resolution> {
        if let Some(user) = self.store.find_by_external_id(external_id)? {
            return self.sync_profile(user, email, name).map(Resolution::Matched);
        }

        if let Some(user) = self.store.find_by_email(email)? {
            return self.link(user, external_id, name).map(Resolution::Linked);
        }

        self.create(external_id, email, name).map(Resolution::Created)
    }

    fn sync_profile(&self, user: User, email: &str, name: &str) -> StoreResult<User> {
        if user.email == email && user.name == name {
            return Ok(user);
        }

        let updated = self
            .store
            .update(user.id, &UserPatch::new().email(email).name(name))?;
        tracing::info!(user_id = %updated.id, "Updated user profile from token claims");
        Ok(updated)
    }

    fn link(&self, user: User, external_id: &str, name: &str) -> StoreResult<User> {
        let linked = self
            .store
            .update(user.id, &UserPatch::new().external_id(external_id).name(name))?;
        tracing::info!(
            user_id = %linked.id,
            external_id = %external_id,
            "Linked existing user to external identity"
        );
        Ok(linked)
    }

    fn create(&self, external_id: &str, email: &str, name: &str) -> StoreResult<User> {
        let user = self.store.insert(NewUser {
            email: email.to_string(),
            name: name.to_string(),
            external_id: Some(external_id.to_string()),
        })?;
        tracing::info!(
            user_id = %user.id,
            external_id = %external_id,
            "Created user for external identity"
        );
        Ok(user)
    }
}
