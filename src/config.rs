/*
 * Responsibility
 * - 環境変数の読み込み (PORT, AUTH_* など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::services::auth::{SchemeMatch, StaticTokenVerifier, StrategyConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub strategy: StrategyConfig,
    pub tokens: StaticTokenVerifier,

    pub body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(v) => parse_port(&v).ok_or(ConfigError::Invalid("PORT"))?,
            Err(_) => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let token_key = std::env::var("AUTH_TOKEN_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| StrategyConfig::default().token_key);

        let pass_request_to_verifier = match std::env::var("AUTH_PASS_REQUEST") {
            Ok(v) => parse_bool(&v).ok_or(ConfigError::Invalid("AUTH_PASS_REQUEST"))?,
            Err(_) => false,
        };

        let scheme_match = match std::env::var("AUTH_SCHEME_MATCH") {
            Ok(v) => parse_scheme_match(&v).ok_or(ConfigError::Invalid("AUTH_SCHEME_MATCH"))?,
            Err(_) => SchemeMatch::default(),
        };

        let raw_tokens =
            std::env::var("AUTH_TOKENS").map_err(|_| ConfigError::Missing("AUTH_TOKENS"))?;
        let tokens = StaticTokenVerifier::parse(&raw_tokens).map_err(|err| {
            tracing::error!(error = %err, "AUTH_TOKENS could not be parsed");
            ConfigError::Invalid("AUTH_TOKENS")
        })?;

        let body_limit_bytes = match std::env::var("BODY_LIMIT_BYTES") {
            Ok(v) => parse_body_limit(&v).ok_or(ConfigError::Invalid("BODY_LIMIT_BYTES"))?,
            Err(_) => 1024 * 1024,
        };

        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECONDS") {
            Ok(v) => parse_timeout(&v).ok_or(ConfigError::Invalid("REQUEST_TIMEOUT_SECONDS"))?,
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self {
            addr,
            app_env,
            strategy: StrategyConfig {
                token_key,
                pass_request_to_verifier,
                scheme_match,
            },
            tokens,
            body_limit_bytes,
            request_timeout,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse().ok()
}

// 0 は全リクエストを拒否してしまうので不正値扱い
fn parse_body_limit(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn parse_timeout(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .map(Duration::from_secs)
}

fn parse_scheme_match(raw: &str) -> Option<SchemeMatch> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "contains" => Some(SchemeMatch::Contains),
        "exact" => Some(SchemeMatch::Exact),
        _ => None,
    }
}
