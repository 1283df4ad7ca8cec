use base64::{Engine, prelude::BASE64_STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use sqlx::{Pool, Row, Sqlite};

use crate::database::operations::{self, CourseRole};

/// The envelope handed to clients after login. The raw session id never
/// leaves the server unencoded, and only its hash is stored.
#[derive(Debug, Serialize, Deserialize)]
pub struct Session {
    session_base: String,
}

impl Session {
    pub fn new(token: impl AsRef<[u8]>) -> Self {
        let base = BASE64_STANDARD.encode(token);
        Self { session_base: base }
    }
}

/// Resolves a client token to the user behind it, if the session exists and
/// has not expired. A token that does not decode reads as no session.
pub async fn session_user_id(
    pool: &Pool<Sqlite>,
    token: impl AsRef<[u8]>,
) -> Result<Option<i64>, String> {
    let Ok(session_id) = BASE64_STANDARD.decode(token.as_ref()) else {
        return Ok(None);
    };
    let session_hash = Sha512::digest(session_id).to_vec();

    let row = match sqlx::query(
        "SELECT user_id, expiration FROM user_session WHERE session_hash = $1;",
    )
    .bind(session_hash)
    .fetch_optional(pool)
    .await
    {
        Ok(r) => r,
        Err(e) => {
            return Err(format!("An error occured querying the database: {e}"));
        }
    };

    let Some(row) = row else {
        return Ok(None);
    };

    let now = chrono::Utc::now();
    let expiration: DateTime<Utc> = row.get("expiration");

    if now > expiration {
        return Ok(None);
    }

    Ok(Some(row.get("user_id")))
}

pub async fn session_exists_and_valid(
    pool: &Pool<Sqlite>,
    token: impl AsRef<[u8]>,
) -> Result<bool, String> {
    Ok(session_user_id(pool, token).await?.is_some())
}

pub async fn session_is_admin(
    pool: &Pool<Sqlite>,
    token: impl AsRef<[u8]>,
) -> Result<bool, String> {
    let Some(user_id) = session_user_id(pool, token).await? else {
        return Ok(false);
    };

    let Ok(row) = sqlx::query("SELECT is_admin FROM users WHERE id = $1;")
        .bind(user_id)
        .fetch_one(pool)
        .await
    else {
        return Err(format!("User ID missing from users table: {user_id}"));
    };

    Ok(row.get("is_admin"))
}

pub async fn session_role_in_course(
    pool: &Pool<Sqlite>,
    course_id: i64,
    token: impl AsRef<[u8]>,
) -> Result<Option<CourseRole>, String> {
    let Some(user_id) = session_user_id(pool, token).await? else {
        return Ok(None);
    };

    operations::user_role_in_course(pool, user_id, course_id).await
}

pub async fn session_is_student(
    pool: &Pool<Sqlite>,
    course_id: i64,
    token: impl AsRef<[u8]>,
) -> Result<bool, String> {
    Ok(matches!(
        session_role_in_course(pool, course_id, token).await?,
        Some(CourseRole::Student)
    ))
}

pub async fn session_is_teacher(
    pool: &Pool<Sqlite>,
    course_id: i64,
    token: impl AsRef<[u8]>,
) -> Result<bool, String> {
    Ok(matches!(
        session_role_in_course(pool, course_id, token).await?,
        Some(CourseRole::Teacher)
    ))
}
