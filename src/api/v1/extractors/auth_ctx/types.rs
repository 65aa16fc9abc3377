/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - token の取り出し・検証は middleware/services 側の責務
 */

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は verifier が返したユーザー
/// - `info` は verifier が付けた補足情報 (scope など)。中身は解釈せずそのまま渡す
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthCtx {
    pub user_id: Uuid,
    pub info: Option<Value>,
}

impl AuthCtx {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            info: None,
        }
    }

    pub fn with_info(mut self, info: Option<Value>) -> Self {
        self.info = info;
        self
    }
}
