use std::{fmt, sync::Arc};

use axum::http::StatusCode;
use thiserror::Error;

use crate::services::auth::disposition::{Disposition, DispositionSink};
use crate::services::auth::locator::{
    AuthRequest, DEFAULT_TOKEN_KEY, SchemeMatch, TokenLocator,
};
use crate::services::auth::verifier::{TokenVerifier, Verdict};

/// Name the strategy registers under.
pub const STRATEGY_NAME: &str = "EmberAuth";

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("EmberAuth authentication strategy requires a verify function")]
    MissingVerifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    pub token_key: String,
    pub pass_request_to_verifier: bool,
    pub scheme_match: SchemeMatch,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            pass_request_to_verifier: false,
            scheme_match: SchemeMatch::default(),
        }
    }
}

/// Token authentication strategy: locate one token, verify it once, and
/// report exactly one [`Disposition`].
pub struct Strategy<U: Send + 'static> {
    config: StrategyConfig,
    locator: TokenLocator,
    verifier: Arc<dyn TokenVerifier<U>>,
}

impl<U: Send + 'static> fmt::Debug for Strategy<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &STRATEGY_NAME)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<U> Strategy<U>
where
    U: Send + 'static,
{
    pub fn new(verifier: impl TokenVerifier<U> + 'static) -> Self {
        Self::with_config(StrategyConfig::default(), verifier)
    }

    pub fn with_config(config: StrategyConfig, verifier: impl TokenVerifier<U> + 'static) -> Self {
        Self::from_parts(config, Arc::new(verifier))
    }

    pub fn builder() -> StrategyBuilder<U> {
        StrategyBuilder::default()
    }

    fn from_parts(mut config: StrategyConfig, verifier: Arc<dyn TokenVerifier<U>>) -> Self {
        if config.token_key.is_empty() {
            config.token_key = DEFAULT_TOKEN_KEY.to_string();
        }
        let locator = TokenLocator::new(config.token_key.clone(), config.scheme_match);

        Self {
            config,
            locator,
            verifier,
        }
    }

    pub fn name(&self) -> &'static str {
        STRATEGY_NAME
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Run one authentication attempt and return its outcome.
    ///
    /// Never fails on its own: every problem ends up in the returned
    /// [`Disposition`]. If the verifier never completes, neither does this.
    pub async fn resolve(&self, request: &AuthRequest) -> Disposition<U> {
        let located = match self.locator.locate(request) {
            Ok(located) => located,
            Err(err) => {
                tracing::debug!(error = %err, "token not located");
                return Disposition::Fail(StatusCode::BAD_REQUEST);
            }
        };

        let token = located.value.as_str();
        let outcome = if self.config.pass_request_to_verifier {
            self.verifier.verify_with_request(request, token).await
        } else {
            self.verifier.verify(token).await
        };

        match outcome {
            Ok(Verdict::Accepted { user, info }) => Disposition::Success { user, info },
            Ok(Verdict::Rejected) => {
                tracing::debug!(source = %located.source, "token rejected by verifier");
                Disposition::Fail(StatusCode::UNAUTHORIZED)
            }
            Err(err) => {
                tracing::debug!(error = %err, "token verification failed");
                Disposition::Error(err)
            }
        }
    }

    /// Same as [`resolve`](Self::resolve), delivering the outcome to `sink`.
    pub async fn authenticate<S>(&self, request: &AuthRequest, sink: S) -> S::Output
    where
        S: DispositionSink<U>,
    {
        self.resolve(request).await.deliver(sink)
    }
}

/// Builder for callers that assemble a strategy from optional parts.
pub struct StrategyBuilder<U: Send + 'static> {
    config: StrategyConfig,
    verifier: Option<Arc<dyn TokenVerifier<U>>>,
}

impl<U: Send + 'static> Default for StrategyBuilder<U> {
    fn default() -> Self {
        Self {
            config: StrategyConfig::default(),
            verifier: None,
        }
    }
}

impl<U> StrategyBuilder<U>
where
    U: Send + 'static,
{
    pub fn config(mut self, config: StrategyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn token_key(mut self, token_key: impl Into<String>) -> Self {
        self.config.token_key = token_key.into();
        self
    }

    pub fn pass_request_to_verifier(mut self, enabled: bool) -> Self {
        self.config.pass_request_to_verifier = enabled;
        self
    }

    pub fn scheme_match(mut self, scheme_match: SchemeMatch) -> Self {
        self.config.scheme_match = scheme_match;
        self
    }

    pub fn verifier(mut self, verifier: impl TokenVerifier<U> + 'static) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    pub fn shared_verifier(mut self, verifier: Arc<dyn TokenVerifier<U>>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn build(self) -> Result<Strategy<U>, StrategyError> {
        let verifier = self.verifier.ok_or(StrategyError::MissingVerifier)?;
        Ok(Strategy::from_parts(self.config, verifier))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use axum::http::HeaderValue;
    use serde_json::{Value, json};

    use super::*;
    use crate::services::auth::verifier::{VerifyResult, verify_fn, verify_request_fn};

    const TOKEN: &str = "vF9dft4qmT";

    #[derive(Debug, Clone, PartialEq)]
    struct User {
        token: String,
        foo: Option<String>,
    }

    fn echo_verifier() -> impl TokenVerifier<User> {
        verify_fn(|token: String| async move {
            Ok(Verdict::accept(User { token, foo: None }))
        })
    }

    fn header(value: &'static str) -> AuthRequest {
        AuthRequest::default().with_authorization(HeaderValue::from_static(value))
    }

    fn assert_success(disposition: Disposition<User>) -> (User, Option<Value>) {
        match disposition {
            Disposition::Success { user, info } => (user, info),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn strategy_is_named_ember_auth() {
        assert_eq!(Strategy::new(echo_verifier()).name(), "EmberAuth");
    }

    #[test]
    fn builder_without_verifier_fails() {
        let err = Strategy::<User>::builder()
            .token_key("custom_key")
            .build()
            .unwrap_err();

        assert!(matches!(err, StrategyError::MissingVerifier));
        assert_eq!(
            err.to_string(),
            "EmberAuth authentication strategy requires a verify function"
        );
    }

    #[test]
    fn empty_token_key_falls_back_to_default() {
        let strategy = Strategy::builder()
            .token_key("")
            .verifier(echo_verifier())
            .build()
            .unwrap();

        assert_eq!(strategy.config().token_key, "auth_token");
    }

    #[tokio::test]
    async fn header_token_authenticates() {
        let strategy = Strategy::new(echo_verifier());

        let (user, info) = assert_success(strategy.resolve(&header("AUTH_TOKEN vF9dft4qmT")).await);

        assert_eq!(user.token, TOKEN);
        assert_eq!(info, None);
    }

    #[tokio::test]
    async fn body_and_query_tokens_authenticate() {
        let strategy = Strategy::new(echo_verifier());

        let body = AuthRequest::default().with_body_field("auth_token", TOKEN);
        assert_eq!(assert_success(strategy.resolve(&body).await).0.token, TOKEN);

        let query = AuthRequest::default().with_query_param("auth_token", TOKEN);
        assert_eq!(assert_success(strategy.resolve(&query).await).0.token, TOKEN);
    }

    #[tokio::test]
    async fn custom_key_in_query_authenticates() {
        let strategy = Strategy::builder()
            .token_key("custom_key")
            .verifier(echo_verifier())
            .build()
            .unwrap();

        let matching = AuthRequest::default().with_query_param("custom_key", TOKEN);
        assert_eq!(assert_success(strategy.resolve(&matching).await).0.token, TOKEN);

        let mismatched = AuthRequest::default().with_query_param("auth_token", TOKEN);
        assert_eq!(
            strategy.resolve(&mismatched).await.fail_status(),
            Some(StatusCode::BAD_REQUEST)
        );
    }

    #[tokio::test]
    async fn info_is_passed_through() {
        let strategy = Strategy::new(verify_fn(|token: String| async move {
            Ok(Verdict::accept_with_info(
                User { token, foo: None },
                json!({ "foo": "bar" }),
            ))
        }));

        let (_, info) = assert_success(strategy.resolve(&header("AUTH_TOKEN vF9dft4qmT")).await);

        assert_eq!(info, Some(json!({ "foo": "bar" })));
    }

    #[tokio::test]
    async fn request_is_passed_when_configured() {
        let verifier = verify_request_fn(|req: AuthRequest, token: String| async move {
            let foo = req.query.get("foo").cloned();
            Ok(Verdict::accept(User { token, foo }))
        });
        let strategy = Strategy::with_config(
            StrategyConfig {
                pass_request_to_verifier: true,
                ..StrategyConfig::default()
            },
            verifier,
        );

        let request = header("AUTH_TOKEN vF9dft4qmT").with_query_param("foo", "bar");
        let (user, _) = assert_success(strategy.resolve(&request).await);

        assert_eq!(user.token, TOKEN);
        assert_eq!(user.foo.as_deref(), Some("bar"));
    }

    #[tokio::test]
    async fn request_is_withheld_by_default() {
        let strategy = Strategy::new(verify_request_fn(
            |req: AuthRequest, token: String| async move {
                let foo = req.query.get("foo").cloned();
                Ok(Verdict::accept(User { token, foo }))
            },
        ));

        let request = header("AUTH_TOKEN vF9dft4qmT").with_query_param("foo", "bar");
        let (user, _) = assert_success(strategy.resolve(&request).await);

        assert_eq!(user.foo, None);
    }

    #[tokio::test]
    async fn rejected_token_fails_with_401() {
        let strategy = Strategy::new(verify_fn(|_token: String| async move {
            VerifyResult::<User>::Ok(Verdict::Rejected)
        }));

        assert_eq!(
            strategy.resolve(&header("AUTH_TOKEN vF9dft4qmT")).await.fail_status(),
            Some(StatusCode::UNAUTHORIZED)
        );
    }

    #[tokio::test]
    async fn verifier_error_is_propagated() {
        let strategy = Strategy::new(verify_fn(|_token: String| async move {
            VerifyResult::<User>::Err(anyhow::anyhow!("something went wrong"))
        }));

        match strategy.resolve(&header("AUTH_TOKEN vF9dft4qmT")).await {
            Disposition::Error(err) => assert_eq!(err.to_string(), "something went wrong"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn locate_failures_skip_the_verifier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let strategy = Strategy::new(verify_fn(move |token: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Verdict::accept(User { token, foo: None }))
            }
        }));

        let requests = [
            AuthRequest::default(),
            header("AUTH_TOKEN"),
            header("AUTH_TOKEN vF9dft4qmT").with_query_param("auth_token", TOKEN),
            AuthRequest::default()
                .with_body_field("auth_token", TOKEN)
                .with_query_param("auth_token", TOKEN),
        ];
        for request in &requests {
            assert_eq!(
                strategy.resolve(request).await.fail_status(),
                Some(StatusCode::BAD_REQUEST)
            );
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);

        strategy.resolve(&header("AUTH_TOKEN vF9dft4qmT")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn one_verifier_can_back_several_strategies() {
        let shared: Arc<dyn TokenVerifier<User>> = Arc::new(echo_verifier());
        let header_only = Strategy::builder()
            .shared_verifier(shared.clone())
            .build()
            .unwrap();
        let custom = Strategy::builder()
            .token_key("custom_key")
            .shared_verifier(shared)
            .build()
            .unwrap();

        assert!(
            header_only
                .resolve(&header("AUTH_TOKEN vF9dft4qmT"))
                .await
                .is_success()
        );
        assert!(
            custom
                .resolve(&AuthRequest::default().with_query_param("custom_key", TOKEN))
                .await
                .is_success()
        );
        assert!(
            !custom
                .resolve(&header("AUTH_TOKEN vF9dft4qmT"))
                .await
                .is_success()
        );
    }

    #[tokio::test]
    async fn verifier_may_complete_after_suspension() {
        let strategy = Strategy::new(verify_fn(|token: String| async move {
            tokio::task::yield_now().await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            Ok(Verdict::accept(User { token, foo: None }))
        }));

        let (user, _) = assert_success(strategy.resolve(&header("auth_token vF9dft4qmT")).await);
        assert_eq!(user.token, TOKEN);
    }

    struct StatusSink;

    impl DispositionSink<User> for StatusSink {
        type Output = StatusCode;

        fn on_success(self, _user: User, _info: Option<Value>) -> StatusCode {
            StatusCode::OK
        }

        fn on_fail(self, status: StatusCode) -> StatusCode {
            status
        }

        fn on_error(self, _err: anyhow::Error) -> StatusCode {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    #[tokio::test]
    async fn authenticate_delivers_to_the_sink() {
        let strategy = Strategy::new(echo_verifier());

        assert_eq!(
            strategy
                .authenticate(&header("AUTH_TOKEN vF9dft4qmT"), StatusSink)
                .await,
            StatusCode::OK
        );
        assert_eq!(
            strategy.authenticate(&header("AUTH_TOKEN"), StatusSink).await,
            StatusCode::BAD_REQUEST
        );
    }
}
