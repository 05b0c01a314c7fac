//! Errors surfaced by the HTTP handlers.
//!
//! The dispatcher itself cannot fail; the only reportable error is failing to
//! encode the response envelope. It maps to `418 I'm a teapot` with an empty
//! body so clients get a fixed, non-descriptive signal.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The envelope could not be serialized to JSON.
    #[error("Failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Encode(_) => StatusCode::IM_A_TEAPOT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[cfg(feature = "tracing")]
        tracing::error!("{self}");

        self.status().into_response()
    }
}
