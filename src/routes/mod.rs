pub mod auth;
pub mod dashboard;
pub mod public;

use axum::{middleware, routing::get, Router};
use tower_http::services::ServeDir;

use crate::{auth::session_guard, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .nest("/dashboard", dashboard::router())
        .route(
            "/api/auth/*action",
            get(auth::delegate).post(auth::delegate),
        )
        .nest_service("/static", ServeDir::new("static"))
        .layer(middleware::from_fn(session_guard))
        .with_state(state)
}
