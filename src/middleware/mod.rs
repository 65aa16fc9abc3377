/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: token 認証 (strategy を HTTP に繋ぐ)
 * - http: request-id / body limit / timeout / trace
 */
pub mod auth;
pub mod http;
