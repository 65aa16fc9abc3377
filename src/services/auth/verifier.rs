use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use crate::services::auth::locator::AuthRequest;

/// What a verifier decided about a token it was able to check.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<U> {
    /// The token is not valid for any user.
    Rejected,
    /// The token belongs to `user`. `info` is handed to the caller untouched.
    Accepted { user: U, info: Option<Value> },
}

impl<U> Verdict<U> {
    pub fn accept(user: U) -> Self {
        Self::Accepted { user, info: None }
    }

    pub fn accept_with_info(user: U, info: Value) -> Self {
        Self::Accepted {
            user,
            info: Some(info),
        }
    }
}

/// `Err` means the verifier could not reach a verdict (backend down, etc.).
pub type VerifyResult<U> = Result<Verdict<U>, anyhow::Error>;

/// Checks whether a located token is genuine.
///
/// Implementations own their I/O and any retry policy. The strategy calls
/// exactly one of the two methods, exactly once per request.
#[async_trait]
pub trait TokenVerifier<U>: Send + Sync
where
    U: Send + 'static,
{
    async fn verify(&self, token: &str) -> VerifyResult<U>;

    /// Called instead of [`verify`](Self::verify) when the strategy is
    /// configured to pass the request along.
    async fn verify_with_request(&self, request: &AuthRequest, token: &str) -> VerifyResult<U> {
        let _ = request;
        self.verify(token).await
    }
}

/// Adapter for `async fn(token) -> VerifyResult<U>` closures.
pub struct VerifyFn<F>(F);

pub fn verify_fn<U, F, Fut>(f: F) -> VerifyFn<F>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = VerifyResult<U>>,
{
    VerifyFn(f)
}

#[async_trait]
impl<U, F, Fut> TokenVerifier<U> for VerifyFn<F>
where
    U: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = VerifyResult<U>> + Send,
{
    async fn verify(&self, token: &str) -> VerifyResult<U> {
        (self.0)(token.to_owned()).await
    }
}

/// Adapter for `async fn(request, token) -> VerifyResult<U>` closures.
///
/// When the strategy does not pass the request, the closure sees an empty
/// [`AuthRequest`].
pub struct VerifyRequestFn<F>(F);

pub fn verify_request_fn<U, F, Fut>(f: F) -> VerifyRequestFn<F>
where
    F: Fn(AuthRequest, String) -> Fut,
    Fut: Future<Output = VerifyResult<U>>,
{
    VerifyRequestFn(f)
}

#[async_trait]
impl<U, F, Fut> TokenVerifier<U> for VerifyRequestFn<F>
where
    U: Send + 'static,
    F: Fn(AuthRequest, String) -> Fut + Send + Sync,
    Fut: Future<Output = VerifyResult<U>> + Send,
{
    async fn verify(&self, token: &str) -> VerifyResult<U> {
        (self.0)(AuthRequest::default(), token.to_owned()).await
    }

    async fn verify_with_request(&self, request: &AuthRequest, token: &str) -> VerifyResult<U> {
        (self.0)(request.clone(), token.to_owned()).await
    }
}
