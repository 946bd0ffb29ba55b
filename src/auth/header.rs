// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `Authorization` header parsing.

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Scheme keyword expected in the `Authorization` header. Also used as the
/// `WWW-Authenticate` challenge on 401 responses.
pub const BEARER_KEYWORD: &str = "Bearer";

/// What the `Authorization` header of a request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BearerHeader {
    /// No header, or an empty one
    NoCredential,
    /// Header present but unusable; the reason is shown to the client
    Malformed(&'static str),
    /// A bearer credential
    Present(String),
}

impl BearerHeader {
    /// Classify the `Authorization` header of a request.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers.get(AUTHORIZATION) {
            None => BearerHeader::NoCredential,
            Some(value) => match value.to_str() {
                Ok(raw) => Self::parse(raw),
                Err(_) => BearerHeader::Malformed("Header contains invalid characters."),
            },
        }
    }

    /// Classify a raw header value.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split_whitespace();

        let Some(scheme) = parts.next() else {
            return BearerHeader::NoCredential;
        };
        if !scheme.eq_ignore_ascii_case(BEARER_KEYWORD) {
            return BearerHeader::Malformed("Expected 'Bearer' scheme.");
        }

        match (parts.next(), parts.next()) {
            (None, _) => BearerHeader::Malformed("No credentials provided."),
            (Some(_), Some(_)) => {
                BearerHeader::Malformed("Token string should not contain spaces.")
            }
            (Some(token), None) => BearerHeader::Present(token.to_string()),
        }
    }
}
