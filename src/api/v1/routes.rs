/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health は公開、/me は token 認証の内側
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, me::me};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health));

    let protected = Router::new().route("/me", get(me).post(me));
    let protected = middleware::auth::access::apply(protected, state);

    public.merge(protected)
}
