/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - 認証 strategy (設定はリクエスト間で共有・不変)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use uuid::Uuid;

use crate::services::auth::Strategy;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<Strategy<Uuid>>,
    pub body_limit_bytes: usize,
}

impl AppState {
    pub fn new(auth: Arc<Strategy<Uuid>>, body_limit_bytes: usize) -> Self {
        Self {
            auth,
            body_limit_bytes,
        }
    }
}
