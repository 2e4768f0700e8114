use chrono::{DateTime, Duration, Local, Utc};
use sqlx::FromRow;
use tracing::error;

use crate::{auth::SESSION_TTL_DAYS, db::DbPool, error::AppError};

/// Display values derived per render for the dashboard's activity panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActivity {
    pub last_login: String,
    pub member_since: String,
    pub active_sessions: i64,
}

#[derive(Debug, FromRow)]
struct UserActivityRow {
    email_verified: Option<DateTime<Utc>>,
    latest_expires: Option<DateTime<Utc>>,
}

/// Fetches the activity triple for a user. A failing query never surfaces to
/// the page; it is logged and replaced by the fixed placeholder triple.
pub async fn user_activity(db: &DbPool, user_id: &str, now: DateTime<Utc>) -> UserActivity {
    match fetch_activity(db, user_id, now).await {
        Ok(activity) => activity,
        Err(err) => {
            error!("failed to load user activity: {err}");
            UserActivity {
                last_login: "Indisponível".to_string(),
                member_since: format_date(now),
                active_sessions: 0,
            }
        }
    }
}

async fn fetch_activity(
    db: &DbPool,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<UserActivity, AppError> {
    let user = sqlx::query_as::<_, UserActivityRow>(
        "SELECT u.email_verified,
                (SELECT s.expires FROM sessions s
                 WHERE s.user_id = u.id
                 ORDER BY s.expires DESC LIMIT 1) AS latest_expires
         FROM users u
         WHERE u.id = ?",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    let active_sessions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = ? AND expires > ?")
            .bind(user_id)
            .bind(now)
            .fetch_one(db)
            .await?;

    // No login instant is persisted anywhere; a session's expiry minus the
    // fixed session lifetime stands in for it.
    let last_login = user
        .as_ref()
        .and_then(|row| row.latest_expires)
        .map(|expires| format_date(expires - Duration::days(SESSION_TTL_DAYS)))
        .unwrap_or_else(|| "Nunca".to_string());

    let member_since = user
        .and_then(|row| row.email_verified)
        .map(format_date)
        .unwrap_or_else(|| format_date(now));

    Ok(UserActivity {
        last_login,
        member_since,
        active_sessions,
    })
}

pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%d/%m/%Y").to_string()
}
