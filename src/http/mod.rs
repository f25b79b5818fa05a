//! HTTP and WebSocket surface. Every route lives under `/api`.

pub mod admin;
pub mod auth;
pub mod extract;
pub mod menu;
pub mod orders;
pub mod payment;
pub mod state;
pub mod ws;

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use extract::{Admin, ApiJson, Authenticated};
pub use state::AppState;

pub fn router(state: AppState, client_url: &str) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(menu::routes())
        .merge(orders::routes())
        .merge(admin::routes())
        .merge(payment::routes())
        .merge(ws::routes());

    Router::new()
        .nest("/api", api)
        .layer(cors(client_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors(client_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    match HeaderValue::from_str(client_url) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(client_url, "CLIENT_URL is not a valid origin, allowing any origin");
            cors.allow_origin(Any)
        }
    }
}
