use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::api::DownstreamClient;
use crate::config::ErrorMode;
use crate::db::RegistryStore;
use crate::handlers::pet;

/// Largest JSON body accepted from the gateway.
pub const BODY_LIMIT: usize = 100 * 1024;

#[derive(Clone)]
pub struct RelayState {
    pub downstream: DownstreamClient,
    pub store: RegistryStore,
    pub error_mode: ErrorMode,
}

impl RelayState {
    pub fn new(downstream: DownstreamClient, store: RegistryStore, error_mode: ErrorMode) -> Self {
        Self {
            downstream,
            store,
            error_mode,
        }
    }
}

pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(pet::index))
        .route("/health", get(pet::health))
        .route("/foodeat", post(pet::food_eat))
        .route("/foodleft", post(pet::echo_telemetry))
        .route("/waterdrink", post(pet::echo_telemetry))
        .route("/waterlack", post(pet::echo_telemetry))
        .route("/getAccessToken", post(pet::get_access_token))
        .route("/getSession", post(pet::get_session))
        .route("/getModule", post(pet::get_module))
        .route("/setModule", post(pet::set_module))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
