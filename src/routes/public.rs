use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{extract::Query, response::IntoResponse, routing::get, Router};
use serde::Deserialize;

use crate::{auth::CurrentUser, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/signin", get(signin_form))
}

#[derive(Template)]
#[template(path = "landing.html")]
struct LandingTemplate {
    logged_in: bool,
}

async fn landing(current: CurrentUser) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(LandingTemplate {
        logged_in: current.0.is_some(),
    })
}

#[derive(Deserialize)]
struct SigninQuery {
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "auth/signin.html")]
struct SigninTemplate {
    show_error: bool,
}

async fn signin_form(Query(query): Query<SigninQuery>) -> impl IntoResponse {
    AskamaTemplateResponse::into_response(SigninTemplate {
        show_error: query.error.is_some(),
    })
}
