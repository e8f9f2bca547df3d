//! Validated JSON extractor with automatic validation.

use axum::extract::{FromRequest, Json as AxumJson, Request};
use derive_more::{Deref, DerefMut, From};

use super::Payload;
use crate::handler::Error;

/// JSON extractor that deserializes and validates a [`Payload`].
///
/// Both decoding and validation failures are rejected with the error the
/// payload type chooses, so every route keeps its own error body.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Creates a new instance of [`ValidateJson`].
    #[inline]
    pub fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: Payload + 'static,
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AxumJson(data) = <AxumJson<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map_err(T::malformed)?;

        data.validate().map_err(T::invalid)?;
        Ok(Self::new(data))
    }
}
