pub mod disposition;
pub mod locator;
pub mod static_tokens;
pub mod strategy;
pub mod verifier;

pub use disposition::{Disposition, DispositionSink};
pub use locator::{AuthRequest, LocateError, LocatedToken, SchemeMatch, TokenLocator, TokenSource};
pub use static_tokens::StaticTokenVerifier;
pub use strategy::{STRATEGY_NAME, Strategy, StrategyBuilder, StrategyConfig, StrategyError};
pub use verifier::{TokenVerifier, Verdict, VerifyResult, verify_fn, verify_request_fn};
