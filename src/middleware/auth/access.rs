//! token 認証 → AuthCtx を extensions に入れる
//!
//! - header / query / form body をそれぞれ取り出して `AuthRequest` に詰め替える
//! - strategy の結果 (Disposition) を HTTP に変換する
//!   - Success: `AuthCtx` を extensions に載せて次へ
//!   - Fail(400/401): JSON エラーで打ち切り
//!   - Error: ログに残して 500
//! - form body が上限を超えたら 413

use std::collections::HashMap;
use std::error::Error as _;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::{self, Next},
    response::Response,
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use uuid::Uuid;

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AuthRequest, DispositionSink};
use crate::state::AppState;

/// 保護したい Router に認証を掛ける。
///
/// 例：
/// ```ignore
/// let protected = Router::new().route("/me", get(me));
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    // route_layer: マッチしたルートだけに掛ける (404 は認証の手前で返す)
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();

    // form body は読み切ってしまうので、後段の handler 用に Body を作り直す
    let (form, body) = if is_form_urlencoded(&parts.headers) {
        let bytes = axum::body::to_bytes(body, state.body_limit_bytes)
            .await
            .map_err(|err| {
                tracing::warn!(error = ?err, "failed to read form body");
                if exceeds_length_limit(&err) {
                    // Content-Length 無しで上限を超えた場合も RequestBodyLimitLayer と同じ 413 にそろえる
                    AppError::PayloadTooLarge
                } else {
                    AppError::bad_request("INVALID_BODY", "request body could not be read")
                }
            })?;
        (parse_pairs(&bytes), Body::from(bytes))
    } else {
        (HashMap::new(), body)
    };

    let query = parts
        .uri
        .query()
        .map(|q| parse_pairs(q.as_bytes()))
        .unwrap_or_default();

    let auth_req = AuthRequest::new(parts.headers.clone(), form, query);
    let auth_ctx = state.auth.authenticate(&auth_req, HttpSink).await?;

    // middleware → extractor への受け渡し
    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

/// Turns a strategy outcome into either the context for the handler or an error response.
struct HttpSink;

impl DispositionSink<Uuid> for HttpSink {
    type Output = Result<AuthCtx, AppError>;

    fn on_success(self, user_id: Uuid, info: Option<Value>) -> Self::Output {
        Ok(AuthCtx::new(user_id).with_info(info))
    }

    fn on_fail(self, status: StatusCode) -> Self::Output {
        Err(AppError::from_fail_status(status))
    }

    fn on_error(self, err: anyhow::Error) -> Self::Output {
        tracing::error!(error = ?err, "token verifier failed");
        Err(AppError::Internal)
    }
}

fn is_form_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
}

fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}

// 同じ key が複数ある場合は後勝ち
fn parse_pairs(raw: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw).into_owned().collect()
}
