/*
 * Responsibility
 * - Request から認証トークンを 1 つだけ取り出す (header / form body / query)
 * - 複数の経路から同時に渡された場合は優先順位で解決せず Conflict にする
 * - HTTP/axum の Request には依存しない (middleware 側で AuthRequest に詰め替える)
 */
use std::collections::HashMap;
use std::fmt;

use axum::http::{HeaderMap, HeaderValue, header};
use thiserror::Error;

pub const DEFAULT_TOKEN_KEY: &str = "auth_token";

/// Pre-parsed view of an incoming request.
///
/// A carrier the framework did not provide is an empty map; the locator
/// treats "absent" and "empty" the same way.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    pub headers: HeaderMap,
    pub body: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl AuthRequest {
    pub fn new(
        headers: HeaderMap,
        body: HashMap<String, String>,
        query: HashMap<String, String>,
    ) -> Self {
        Self {
            headers,
            body,
            query,
        }
    }

    pub fn with_authorization(mut self, value: HeaderValue) -> Self {
        self.headers.insert(header::AUTHORIZATION, value);
        self
    }

    pub fn with_body_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.insert(key.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Body,
    Query,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Header => write!(f, "authorization header"),
            TokenSource::Body => write!(f, "form body"),
            TokenSource::Query => write!(f, "query string"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedToken {
    pub value: String,
    pub source: TokenSource,
}

/// Why no single token could be taken from the request.
/// Every variant ends the attempt with `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("authorization header is not in `<scheme> <token>` form")]
    Malformed,
    #[error("token supplied through both the {first} and the {second}")]
    Conflict {
        first: TokenSource,
        second: TokenSource,
    },
    #[error("no token supplied")]
    NotFound,
}

/// How the `Authorization` scheme label is compared with the token key.
///
/// Both modes ignore ASCII case. `Contains` accepts any label that contains
/// the key (`X-AUTH_TOKEN-V2` matches `auth_token`); `Exact` requires the
/// whole label to equal the key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemeMatch {
    #[default]
    Contains,
    Exact,
}

impl SchemeMatch {
    pub fn matches(self, scheme: &str, key: &str) -> bool {
        match self {
            SchemeMatch::Contains => scheme
                .to_ascii_lowercase()
                .contains(&key.to_ascii_lowercase()),
            SchemeMatch::Exact => scheme.eq_ignore_ascii_case(key),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenLocator {
    token_key: String,
    scheme_match: SchemeMatch,
}

impl TokenLocator {
    pub fn new(token_key: impl Into<String>, scheme_match: SchemeMatch) -> Self {
        Self {
            token_key: token_key.into(),
            scheme_match,
        }
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    pub fn locate(&self, request: &AuthRequest) -> Result<LocatedToken, LocateError> {
        let mut found = self.header_token(&request.headers)?;

        for (source, fields) in [
            (TokenSource::Body, &request.body),
            (TokenSource::Query, &request.query),
        ] {
            let Some(value) = fields.get(&self.token_key).filter(|v| !v.is_empty()) else {
                continue;
            };

            if let Some(prev) = &found {
                return Err(LocateError::Conflict {
                    first: prev.source,
                    second: source,
                });
            }

            found = Some(LocatedToken {
                value: value.clone(),
                source,
            });
        }

        found.ok_or(LocateError::NotFound)
    }

    // `Ok(None)` covers both "no header" and "header for some other scheme".
    fn header_token(&self, headers: &HeaderMap) -> Result<Option<LocatedToken>, LocateError> {
        let Some(raw) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let value = raw.to_str().map_err(|_| LocateError::Malformed)?;

        let parts: Vec<&str> = value.split(' ').collect();
        let [scheme, credentials] = parts.as_slice() else {
            return Err(LocateError::Malformed);
        };

        if !self.scheme_match.matches(scheme, &self.token_key) || credentials.is_empty() {
            return Ok(None);
        }

        Ok(Some(LocatedToken {
            value: (*credentials).to_string(),
            source: TokenSource::Header,
        }))
    }
}

impl Default for TokenLocator {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_KEY, SchemeMatch::default())
    }
}
