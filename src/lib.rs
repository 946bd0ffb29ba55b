// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CarbonSense Server - Supabase-authenticated user service
//!
//! Verifies Supabase-issued access tokens and keeps a local user record in
//! step with the identity provider.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Supabase JWT verification and user reconciliation
//! - `config` - Environment configuration
//! - `storage` - User persistence (redb or in-memory)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
