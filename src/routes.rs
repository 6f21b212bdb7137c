//! HTTP routes
//!
//! The bundled chat page at `/` and the WebSocket endpoint at `/ws`, both on
//! the same port.

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;
use crate::handler::ws_upgrade;

/// The bundled chat page
pub const INDEX_HTML: &str = include_str!("../static/index.html");

/// Build the Axum router with all routes.
pub fn build_router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/ws", get(ws_upgrade))
        .with_state(dispatcher)
        .layer(TraceLayer::new_for_http())
}

/// GET / - the chat page
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
