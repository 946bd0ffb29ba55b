// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{Authenticator, TokenVerifier, UserReconciler, VerifierConfig};
use crate::storage::{InMemoryUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub auth: Authenticator,
    pub users: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, verifier_config: VerifierConfig) -> Self {
        let auth = Authenticator::new(
            TokenVerifier::new(verifier_config),
            UserReconciler::new(users.clone()),
        );
        Self { auth, users }
    }

    /// State backed by a process-local user store.
    pub fn in_memory(verifier_config: VerifierConfig) -> Self {
        Self::new(Arc::new(InMemoryUserStore::new()), verifier_config)
    }
}
