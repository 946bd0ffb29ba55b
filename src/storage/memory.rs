// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user store.
//!
//! Same uniqueness semantics as [`UserDatabase`](super::UserDatabase); used
//! in tests and when the server runs without a data directory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::users::{NewUser, StoreError, StoreResult, UniqueField, User, UserPatch, UserStore};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_external_id: HashMap<String, Uuid>,
}

#[derive(Default)]
pub struct InMemoryUserStore {
    tables: Mutex<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("user store lock poisoned".to_string()))
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn find_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables
            .by_external_id
            .get(external_id)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.lock()?;

        if tables.by_email.contains_key(&new_user.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        if let Some(external_id) = &new_user.external_id {
            if tables.by_external_id.contains_key(external_id) {
                return Err(StoreError::Conflict(UniqueField::ExternalId));
            }
        }

        let user = new_user.into_user();
        tables.by_email.insert(user.email.clone(), user.id);
        if let Some(external_id) = &user.external_id {
            tables.by_external_id.insert(external_id.clone(), user.id);
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update(&self, id: Uuid, patch: &UserPatch) -> StoreResult<User> {
        let mut tables = self.lock()?;
        let mut user = tables
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))?;

        let new_email = patch.email.as_ref().filter(|e| **e != user.email);
        if let Some(email) = new_email {
            if tables.by_email.get(email).is_some_and(|holder| *holder != id) {
                return Err(StoreError::Conflict(UniqueField::Email));
            }
        }

        let new_external_id = patch
            .external_id
            .as_ref()
            .filter(|ext| user.external_id.as_ref() != Some(*ext));
        if let Some(external_id) = new_external_id {
            if tables
                .by_external_id
                .get(external_id)
                .is_some_and(|holder| *holder != id)
            {
                return Err(StoreError::Conflict(UniqueField::ExternalId));
            }
        }

        // All checks passed; index moves cannot fail past this point.
        if let Some(email) = new_email {
            tables.by_email.remove(&user.email);
            tables.by_email.insert(email.clone(), id);
        }
        if let Some(external_id) = new_external_id {
            if let Some(previous) = &user.external_id {
                tables.by_external_id.remove(previous);
            }
            tables.by_external_id.insert(external_id.clone(), id);
        }

        patch.apply(&mut user);
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.users.len())
    }
}
