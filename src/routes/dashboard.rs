use askama::Template;
use askama_axum::IntoResponse as AskamaTemplateResponse;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use chrono::Utc;

use crate::{
    activity,
    auth::{CurrentUser, SessionUser, SIGNIN_PATH},
    error::AppError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(show))
}

#[derive(Template)]
#[template(path = "user/dashboard.html")]
struct DashboardTemplate {
    display_name: String,
    email: String,
    initial: String,
    image: Option<String>,
    member_since: String,
    last_login: String,
    active_sessions: i64,
}

async fn show(State(state): State<AppState>, current: CurrentUser) -> Result<Response, AppError> {
    // The guard already bounced cookie-less requests; this re-checks the
    // session against the database before any data is fetched.
    let Some(user) = current.0 else {
        return Ok(Redirect::to(SIGNIN_PATH).into_response());
    };

    let SessionUser {
        id,
        name,
        email,
        image,
    } = user;

    // An empty id simply yields the placeholder activity values.
    let activity = activity::user_activity(&state.db, &id, Utc::now()).await;

    let initial = name
        .as_deref()
        .and_then(|name| name.chars().next())
        .unwrap_or('U')
        .to_uppercase()
        .to_string();

    Ok(AskamaTemplateResponse::into_response(DashboardTemplate {
        display_name: name.unwrap_or_else(|| "User".to_string()),
        email: email.unwrap_or_else(|| "No email".to_string()),
        initial,
        image,
        member_since: activity.member_since,
        last_login: activity.last_login,
        active_sessions: activity.active_sessions,
    }))
}
