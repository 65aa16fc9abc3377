/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (token 認証 / request-id / trace など)
 * - axum::serve() で起動
 */
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppEnv, Config};
use crate::middleware::http::{self, HttpLimits};
use crate::services::auth::Strategy;
use crate::state::AppState;
use crate::{VERSION, api};

fn init_tracing(app_env: AppEnv) {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,ember_auth=debug,tower_http=debug cargo run
    let default_filter = if app_env.is_production() {
        "info,tower_http=info"
    } else {
        "debug,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(AppEnv::from_env());
    let config = Config::from_env()?;

    tracing::info!(
        version = VERSION,
        token_key = %config.strategy.token_key,
        tokens = config.tokens.len(),
        "starting in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config);
    let limits = HttpLimits {
        body_limit_bytes: config.body_limit_bytes,
        request_timeout: config.request_timeout,
    };
    let app = build_router(state, limits);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &Config) -> AppState {
    let strategy = Strategy::with_config(config.strategy.clone(), config.tokens.clone());
    AppState::new(Arc::new(strategy), config.body_limit_bytes)
}

pub fn build_router(state: AppState, limits: HttpLimits) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    http::apply(router, limits)
}
