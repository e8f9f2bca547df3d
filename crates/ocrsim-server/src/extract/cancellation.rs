//! Cancellation signal of the current request.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use derive_more::{Deref, From};
use tokio_util::sync::CancellationToken;

/// Cancellation signal of the current request.
///
/// The request deadline middleware stores a token in the request extensions
/// that fires when the deadline elapses or the client goes away. Without that
/// middleware, a fresh token that never fires is extracted.
#[must_use]
#[derive(Debug, Clone, Default, Deref, From)]
pub struct RequestCancellation(pub CancellationToken);

impl RequestCancellation {
    /// Creates a new instance of [`RequestCancellation`].
    #[inline]
    pub fn new(token: CancellationToken) -> Self {
        Self(token)
    }

    /// Returns the inner token.
    #[inline]
    pub fn into_inner(self) -> CancellationToken {
        self.0
    }
}

impl<S> FromRequestParts<S> for RequestCancellation
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cancellation = parts
            .extensions
            .get::<RequestCancellation>()
            .cloned()
            .unwrap_or_default();

        Ok(cancellation)
    }
}
