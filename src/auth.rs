use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    PrivateCookieJar,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{session::Session, user::User},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "portal_session";
pub const PROTECTED_PREFIX: &str = "/dashboard";
pub const SIGNIN_PATH: &str = "/signin";

/// Sessions are issued with a fixed lifetime. The activity view subtracts the
/// same constant from a session's expiry to approximate its login instant.
pub const SESSION_TTL_DAYS: i64 = 30;

/// User fields carried by a validated session, as the dashboard consumes them.
#[derive(Debug, Clone, FromRow)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };
        let user = session_user(&state.db, cookie.value(), Utc::now()).await?;
        Ok(Self(user))
    }
}

/// Guard predicate: a request needs to be bounced to sign-in when it targets
/// the protected prefix without any session cookie attached. Presence only;
/// the dashboard handler re-validates against the database.
pub fn requires_signin(path: &str, has_session_cookie: bool) -> bool {
    path.starts_with(PROTECTED_PREFIX) && !has_session_cookie
}

pub async fn session_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    if requires_signin(request.uri().path(), jar.get(SESSION_COOKIE).is_some()) {
        return Redirect::temporary(SIGNIN_PATH).into_response();
    }
    next.run(request).await
}

#[derive(Deserialize)]
pub struct SigninForm {
    pub email: String,
    pub password: String,
    pub callback_url: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct SignoutForm {
    pub callback_url: Option<String>,
}

/// Shared handler behind both method registrations on `/api/auth/*action`.
pub async fn handle(
    state: &AppState,
    action: &str,
    jar: PrivateCookieJar,
    request: Request,
) -> Result<Response, AppError> {
    match (request.method().clone(), action) {
        (Method::POST, "signin") => {
            let Form(form) = Form::<SigninForm>::from_request(request, &())
                .await
                .map_err(|err| AppError::BadRequest(err.to_string()))?;
            signin(state, jar, form).await
        }
        (Method::GET, "signin") => Ok(Redirect::to(SIGNIN_PATH).into_response()),
        (Method::POST, "signout") => {
            let form = Form::<SignoutForm>::from_request(request, &())
                .await
                .map(|Form(form)| form)
                .unwrap_or_default();
            signout(state, jar, form).await
        }
        (Method::GET, "signout") => Ok(Redirect::to("/").into_response()),
        _ => Err(AppError::NotFound),
    }
}

async fn signin(
    state: &AppState,
    jar: PrivateCookieJar,
    form: SigninForm,
) -> Result<Response, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, image, email_verified, password_hash
         FROM users WHERE email = ?",
    )
    .bind(&form.email)
    .fetch_optional(&state.db)
    .await?;

    let Some(user) = user else {
        return Ok(Redirect::to("/signin?error=credentials").into_response());
    };
    if !verify_password(user.password_hash.as_deref(), &form.password) {
        return Ok(Redirect::to("/signin?error=credentials").into_response());
    }

    let token = create_session(&state.db, &user.id, Utc::now()).await?;
    let target = form
        .callback_url
        .unwrap_or_else(|| PROTECTED_PREFIX.to_string());
    Ok((apply_session_cookie(jar, &token), Redirect::to(&target)).into_response())
}

async fn signout(
    state: &AppState,
    jar: PrivateCookieJar,
    form: SignoutForm,
) -> Result<Response, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        destroy_session(&state.db, cookie.value()).await?;
    }
    let target = form.callback_url.unwrap_or_else(|| "/".to_string());
    Ok((clear_session_cookie(jar), Redirect::to(&target)).into_response())
}

pub async fn create_session(
    db: &DbPool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let session = Session {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        expires: now + Duration::days(SESSION_TTL_DAYS),
    };
    sqlx::query("INSERT INTO sessions (id, user_id, expires) VALUES (?, ?, ?)")
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.expires)
        .execute(db)
        .await?;
    Ok(session.id)
}

pub async fn destroy_session(db: &DbPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}

/// Looks up an unexpired session and the user it belongs to.
pub async fn session_user(
    db: &DbPool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<SessionUser>, AppError> {
    let user = sqlx::query_as::<_, SessionUser>(
        "SELECT u.id, u.name, u.email, u.image
         FROM sessions s
         JOIN users u ON u.id = s.user_id
         WHERE s.id = ? AND s.expires > ?",
    )
    .bind(token)
    .bind(now)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub fn apply_session_cookie(jar: PrivateCookieJar, token: &str) -> PrivateCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    jar.remove(cookie)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AppError::Other(anyhow::anyhow!("hash password: {err}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(stored: Option<&str>, password: &str) -> bool {
    let Some(stored) = stored else {
        return false;
    };
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
