//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mythos_core::clock::Clock;
use mythos_core::rng::DeterministicRng;
use mythos_session::application::controller::ControllerConfig;
use mythos_session::application::narrator::Narrator;
use mythos_test_support::{FixedClock, SequenceRng, fixed_instant};
use tower::ServiceExt;

use mythos_api::routes;
use mythos_api::state::AppState;

/// Dice that roll STR 10, CON 12, POW 10, DEX 11, APP 9, SIZ 14, INT 13 and
/// EDU 15, in the order abilities are generated.
pub const ABILITY_DICE: [u32; 22] = [
    3, 3, 4, // STR
    4, 4, 4, // CON
    3, 3, 4, // POW
    4, 4, 3, // DEX
    3, 3, 3, // APP
    4, 4, // SIZ
    3, 4, // INT
    4, 4, 4, // EDU
];

/// Build the full app router with deterministic clock and dice. Every
/// session draws `ABILITY_DICE` followed by `check_rolls`. Uses the same
/// route structure as `main.rs`.
pub fn build_test_app(narrator: Arc<dyn Narrator>, check_rolls: &[u32]) -> Router {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(fixed_instant()));
    let values: Vec<u32> = ABILITY_DICE.iter().chain(check_rolls).copied().collect();
    let rng_factory = Arc::new(move || -> Box<dyn DeterministicRng> {
        Box::new(SequenceRng::new(values.clone()))
    });
    let app_state = AppState::new(narrator, clock, rng_factory, ControllerConfig::default());

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/sessions", routes::session::router())
        .with_state(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
