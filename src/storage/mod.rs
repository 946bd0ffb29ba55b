// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Storage
//!
//! Persistence for the local user records that authenticated identities are
//! reconciled against.
//!
//! ## Backends
//!
//! - [`UserDatabase`]: embedded redb file `users.redb` under `DATA_DIR`
//! - [`InMemoryUserStore`]: process-local maps, lost on restart
//!
//! Both enforce unique `email` and unique `external_id` and never delete users.

pub mod memory;
pub mod user_database;
pub mod users;

pub use memory::InMemoryUserStore;
pub use user_database::UserDatabase;
pub use users::{NewUser, StoreError, StoreResult, UniqueField, User, UserPatch, UserStore};
