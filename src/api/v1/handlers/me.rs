/*
 * Responsibility
 * - GET|POST /me: 認証済みユーザーと verifier の info を返す
 * - POST は form body で token を送るクライアント用
 */
use axum::Json;

use crate::api::v1::extractors::{AuthCtx, AuthCtxExtractor};

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<AuthCtx> {
    Json(ctx)
}
