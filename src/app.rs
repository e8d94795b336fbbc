//! Shared handler state and HTTP router.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers,
    middleware,
    services::{notification_dispatcher::NotificationDispatcher, registrar::Registrar},
    store::{HealthProbe, InvitationStore, KioskStore, NotificationStore, VisitorStore},
};

/// State shared with every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub registrar: Registrar,
    pub visitors: Arc<dyn VisitorStore>,
    pub kiosks: Arc<dyn KioskStore>,
    pub health: Arc<dyn HealthProbe>,
}

impl AppState {
    pub fn new(
        registrar: Registrar,
        visitors: Arc<dyn VisitorStore>,
        kiosks: Arc<dyn KioskStore>,
        health: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            registrar,
            visitors,
            kiosks,
            health,
        }
    }

    /// Wire every component to a single backend.
    pub fn from_store<S>(store: Arc<S>, notification_timeout: Duration) -> Self
    where
        S: InvitationStore + VisitorStore + NotificationStore + KioskStore + HealthProbe + 'static,
    {
        let dispatcher = NotificationDispatcher::new(store.clone(), notification_timeout);
        let registrar = Registrar::new(store.clone(), store.clone(), dispatcher);

        Self::new(registrar, store.clone(), store.clone(), store)
    }
}

/// Build the HTTP router.
///
/// # Routes
///
/// - `GET /health` (public)
/// - `POST /api/v1/check-in/scan`
/// - `POST /api/v1/check-in/register`
/// - `GET /api/v1/visitors/{id}`
pub fn router(state: AppState) -> Router {
    // Every kiosk route requires a registered kiosk key
    let kiosk_routes = Router::new()
        .route(
            "/api/v1/check-in/scan",
            post(handlers::check_in::scan_code),
        )
        .route(
            "/api/v1/check-in/register",
            post(handlers::check_in::register_visitor),
        )
        .route(
            "/api/v1/visitors/{id}",
            get(handlers::visitors::get_visitor),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::kiosk_auth,
        ));

    // The kiosk front end is served from its own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(kiosk_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
