use axum::{
    extract::{Path, Request, State},
    response::Response,
};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth, error::AppError, state::AppState};

/// Both method registrations on the auth callback path point here; the
/// session provider owns everything past this delegation.
pub async fn delegate(
    State(state): State<AppState>,
    Path(action): Path<String>,
    jar: PrivateCookieJar,
    request: Request,
) -> Result<Response, AppError> {
    auth::handle(&state, &action, jar, request).await
}
