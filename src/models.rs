// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Response bodies returned by the REST API. Storage records never leave the
//! server directly; handlers map them onto these types so that fields such
//! as the password hash or external subject id stay internal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::User;

/// Public view of a local user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_active: user.is_active,
            date_joined: user.date_joined,
        }
    }
}

/// Plain acknowledgement message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewUser;

    #[test]
    fn user_response_omits_internal_fields() {
        let user = NewUser {
            email: "a@x.com".to_string(),
            name: "Ann".to_string(),
            external_id: Some("abc123".to_string()),
        }
        .into_user();
        let id = user.id;

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["is_active"], true);
        assert!(json.get("external_id").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("is_staff").is_none());
    }
}
