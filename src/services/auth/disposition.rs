/*
 * Responsibility
 * - 認証の最終結果 (Disposition) と、それを受け取る側 (DispositionSink) の契約
 * - strategy は結果を 1 回だけ sink に渡す (sink は self を消費するので 2 回目は呼べない)
 */
use axum::http::StatusCode;
use serde_json::Value;

/// Terminal outcome of one authentication attempt.
#[derive(Debug)]
pub enum Disposition<U> {
    Success { user: U, info: Option<Value> },
    /// `400` when no single token could be located, `401` when the verifier rejected it.
    Fail(StatusCode),
    /// The verifier's own error, unmodified.
    Error(anyhow::Error),
}

impl<U> Disposition<U> {
    pub fn is_success(&self) -> bool {
        matches!(self, Disposition::Success { .. })
    }

    pub fn fail_status(&self) -> Option<StatusCode> {
        match self {
            Disposition::Fail(status) => Some(*status),
            _ => None,
        }
    }

    /// Hand the outcome to `sink`, calling exactly one of its hooks.
    pub fn deliver<S>(self, sink: S) -> S::Output
    where
        S: DispositionSink<U>,
    {
        match self {
            Disposition::Success { user, info } => sink.on_success(user, info),
            Disposition::Fail(status) => sink.on_fail(status),
            Disposition::Error(err) => sink.on_error(err),
        }
    }
}

/// Receiver of a [`Disposition`], typically the host framework's glue.
pub trait DispositionSink<U> {
    type Output;

    fn on_success(self, user: U, info: Option<Value>) -> Self::Output;
    fn on_fail(self, status: StatusCode) -> Self::Output;
    fn on_error(self, err: anyhow::Error) -> Self::Output;
}
