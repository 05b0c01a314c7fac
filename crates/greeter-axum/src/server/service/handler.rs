//! HTTP handlers for the two dispatch variants.
//!
//! ## Routes
//!
//! - `GET /` - [`handle_sequential`]: one worker on the request task.
//! - `GET /workers` - [`handle_concurrent`]: [`NUM_WORKERS`] spawned workers.
//!
//! Both respond with a JSON [`Envelope`]. Encoding failures become
//! [`ApiError::Encode`].

use crate::server::{
    config::ServerConfig,
    error::ApiError,
    telemetry::{
        Variant, increment_encode_errors, increment_greetings, increment_requests,
        record_dispatch_duration,
    },
};
use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use greeter::{Dispatcher, Envelope, NAMES, NUM_WORKERS};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state for every request: the batch to process and how long each
/// item takes.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    names: Arc<[String]>,
}

impl AppState {
    /// State serving the fixed batch of [`NAMES`].
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_names(Dispatcher::new(config.work_delay), NAMES)
    }

    pub fn with_names<I, S>(dispatcher: Dispatcher, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dispatcher,
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_sequential))
        .route("/workers", get(handle_concurrent))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Processes the batch with a single worker on the calling task.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(variant = Variant::Sequential.as_str())))]
pub async fn handle_sequential(State(state): State<AppState>) -> Result<Response, ApiError> {
    increment_requests(Variant::Sequential);
    let envelope = state.dispatcher.sequential(&state.names[..]).await;
    respond(Variant::Sequential, &envelope)
}

/// Processes the batch across [`NUM_WORKERS`] concurrent workers.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(variant = Variant::Concurrent.as_str())))]
pub async fn handle_concurrent(State(state): State<AppState>) -> Result<Response, ApiError> {
    increment_requests(Variant::Concurrent);
    let envelope = state
        .dispatcher
        .concurrent(&state.names[..], NUM_WORKERS)
        .await;
    respond(Variant::Concurrent, &envelope)
}

fn respond(variant: Variant, envelope: &Envelope) -> Result<Response, ApiError> {
    increment_greetings(variant, envelope.greetings.len() as u64);
    record_dispatch_duration(variant, envelope.elapsed_seconds * 1_000.0);

    let body =
        serde_json::to_vec(envelope).inspect_err(|_| increment_encode_errors(variant))?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Served {} greetings in {:.3}s",
        envelope.greetings.len(),
        envelope.elapsed_seconds
    );

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use core::time::Duration;
    use std::collections::BTreeSet;
    use tower::ServiceExt;

    fn app(names: &[&str]) -> Router {
        router(AppState::with_names(
            Dispatcher::new(Duration::from_secs(1)),
            names.iter().copied(),
        ))
    }

    async fn get_envelope(app: Router, uri: &str) -> Envelope {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn root_runs_sequentially() {
        let envelope = get_envelope(app(&NAMES), "/").await;

        assert_eq!(envelope.greetings.len(), NAMES.len());
        assert_eq!(envelope.greetings[0], "Hello Maia from worker number 1");
        assert_eq!(envelope.greetings[7], "Hello Jason from worker number 1");
        assert!(envelope.elapsed_seconds >= 8.0, "{}", envelope.elapsed_seconds);
    }

    #[tokio::test(start_paused = true)]
    async fn workers_route_fans_out() {
        let envelope = get_envelope(app(&NAMES), "/workers").await;

        assert_eq!(envelope.greetings.len(), NAMES.len());
        let ids: BTreeSet<&str> = envelope
            .greetings
            .iter()
            .filter_map(|g| g.rsplit_once(' ').map(|(_, id)| id))
            .collect();
        assert_eq!(ids, ["0", "1", "2", "3", "4"].into_iter().collect());
        assert!(envelope.elapsed_seconds >= 2.0, "{}", envelope.elapsed_seconds);
        assert!(envelope.elapsed_seconds < 3.0, "{}", envelope.elapsed_seconds);
    }

    #[tokio::test(start_paused = true)]
    async fn injected_batch_is_served() {
        let envelope = get_envelope(app(&["Maia", "Reegan", "Kelly"]), "/workers").await;

        assert_eq!(envelope.greetings.len(), 3);
        for g in &envelope.greetings {
            assert!(g.starts_with("Hello "), "{g}");
            assert!(g.contains(" from worker number "), "{g}");
        }
    }

    #[tokio::test]
    async fn empty_batch_yields_empty_greetings() {
        let envelope = get_envelope(app(&[]), "/").await;
        assert!(envelope.greetings.is_empty());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = app(&NAMES)
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn variant_labels() {
        assert_eq!(Variant::Sequential.as_str(), "sequential");
        assert_eq!(Variant::Concurrent.as_str(), "concurrent");
    }
}
