// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized User (JSON bytes)
//! - `users_by_email`: email → user id (unique)
//! - `users_by_external_id`: identity provider subject → user id (unique)
//!
//! redb serializes write transactions, so checking an index and writing it
//! inside the same transaction is enough to enforce uniqueness.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::users::{NewUser, StoreError, StoreResult, UniqueField, User, UserPatch, UserStore};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user id → serialized User (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: email → user id.
const USERS_BY_EMAIL: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");

/// Unique index: external subject id → user id.
const USERS_BY_EXTERNAL_ID: TableDefinition<&str, &str> =
    TableDefinition::new("users_by_external_id");

/// File name of the database under the data directory.
pub const USER_DB_FILE: &str = "users.redb";

macro_rules! backend_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(err: $ty) -> Self {
                    StoreError::Backend(err.to_string())
                }
            }
        )*
    };
}

backend_error!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

// =============================================================================
// UserDatabase
// =============================================================================

/// Embedded ACID user database.
pub struct UserDatabase {
    db: Database,
}

impl UserDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("cannot create {}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(USERS_BY_EXTERNAL_ID)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open `users.redb` inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> StoreResult<Self> {
        Self::open(&data_dir.join(USER_DB_FILE))
    }

    /// Resolve a user through one of the unique index tables.
    fn find_via_index(
        &self,
        index: TableDefinition<'static, &'static str, &'static str>,
        key: &str,
    ) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(index)?;
        let user_id = match idx_table.get(key)? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => {
                tracing::warn!(user_id = %user_id, "User index points at a missing record");
                Ok(None)
            }
        }
    }
}

impl UserStore for UserDatabase {
    fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        let key = id.to_string();
        match table.get(key.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn find_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        self.find_via_index(USERS_BY_EXTERNAL_ID, external_id)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_via_index(USERS_BY_EMAIL, email)
    }

    fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let user = new_user.into_user();
        let json = serde_json::to_vec(&user)?;
        let user_id = user.id.to_string();

        // Returning early drops the transaction uncommitted, which aborts it.
        let write_txn = self.db.begin_write()?;
        {
            let mut by_email = write_txn.open_table(USERS_BY_EMAIL)?;
            if by_email.get(user.email.as_str())?.is_some() {
                return Err(StoreError::Conflict(UniqueField::Email));
            }

            let mut by_external_id = write_txn.open_table(USERS_BY_EXTERNAL_ID)?;
            if let Some(external_id) = &user.external_id {
                if by_external_id.get(external_id.as_str())?.is_some() {
                    return Err(StoreError::Conflict(UniqueField::ExternalId));
                }
                by_external_id.insert(external_id.as_str(), user_id.as_str())?;
            }

            by_email.insert(user.email.as_str(), user_id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(user_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(user)
    }

    fn update(&self, id: Uuid, patch: &UserPatch) -> StoreResult<User> {
        let user_id = id.to_string();

        let write_txn = self.db.begin_write()?;
        let user = {
            let mut users = write_txn.open_table(USERS)?;
            let stored = users.get(user_id.as_str())?.map(|v| v.value().to_vec());
            let mut user: User = match stored {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => return Err(StoreError::NotFound(id)),
            };

            if let Some(email) = patch.email.as_deref().filter(|e| *e != user.email) {
                let mut by_email = write_txn.open_table(USERS_BY_EMAIL)?;
                let holder = by_email.get(email)?.map(|v| v.value().to_string());
                if holder.is_some_and(|holder| holder != user_id) {
                    return Err(StoreError::Conflict(UniqueField::Email));
                }
                by_email.remove(user.email.as_str())?;
                by_email.insert(email, user_id.as_str())?;
            }

            if let Some(external_id) = patch
                .external_id
                .as_deref()
                .filter(|ext| user.external_id.as_deref() != Some(*ext))
            {
                let mut by_external_id = write_txn.open_table(USERS_BY_EXTERNAL_ID)?;
                let holder = by_external_id
                    .get(external_id)?
                    .map(|v| v.value().to_string());
                if holder.is_some_and(|holder| holder != user_id) {
                    return Err(StoreError::Conflict(UniqueField::ExternalId));
                }
                if let Some(previous) = &user.external_id {
                    by_external_id.remove(previous.as_str())?;
                }
                by_external_id.insert(external_id, user_id.as_str())?;
            }

            patch.apply(&mut user);
            let json = serde_json::to_vec(&user)?;
            users.insert(user_id.as_str(), json.as_slice())?;
            user
        };
        write_txn.commit()?;

        Ok(user)
    }

    fn count(&self) -> StoreResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        Ok(table.iter()?.count())
    }

    fn health_check(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
