/*
 * Responsibility
 * - 環境変数 AUTH_TOKENS から読み込んだ固定トークン表による TokenVerifier 実装
 * - バイナリ単体で動かすためのもの (本番では DB 等を引く verifier に差し替える)
 */
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::services::auth::verifier::{TokenVerifier, Verdict, VerifyResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticToken {
    pub user_id: Uuid,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTokensError {
    Entry(String),
    UserId(String),
    Duplicate(String),
}

impl std::fmt::Display for ParseTokensError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entry(entry) => write!(f, "expected `token=uuid[:scope]`, got `{}`", entry),
            Self::UserId(entry) => write!(f, "invalid user id in `{}`", entry),
            Self::Duplicate(token) => write!(f, "token listed twice: `{}`", token),
        }
    }
}

impl std::error::Error for ParseTokensError {}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, StaticToken>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, StaticToken>) -> Self {
        Self { tokens }
    }

    /// Parse `token=uuid[:scope]` entries separated by commas.
    pub fn parse(raw: &str) -> Result<Self, ParseTokensError> {
        let mut tokens = HashMap::new();

        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (token, rest) = entry
                .split_once('=')
                .filter(|(token, rest)| !token.is_empty() && !rest.is_empty())
                .ok_or_else(|| ParseTokensError::Entry(entry.to_string()))?;

            let (user_id, scope) = match rest.split_once(':') {
                Some((id, scope)) if !scope.is_empty() => (id, Some(scope.to_string())),
                Some((id, _)) => (id, None),
                None => (rest, None),
            };
            let user_id =
                Uuid::parse_str(user_id).map_err(|_| ParseTokensError::UserId(entry.to_string()))?;

            if tokens
                .insert(token.to_string(), StaticToken { user_id, scope })
                .is_some()
            {
                return Err(ParseTokensError::Duplicate(token.to_string()));
            }
        }

        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenVerifier<Uuid> for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> VerifyResult<Uuid> {
        let Some(entry) = self.tokens.get(token) else {
            return Ok(Verdict::Rejected);
        };

        Ok(match &entry.scope {
            Some(scope) => Verdict::accept_with_info(entry.user_id, json!({ "scope": scope })),
            None => Verdict::accept(entry.user_id),
        })
    }
}
