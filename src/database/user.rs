use sha2::{Digest, Sha512};
use sqlx::{Pool, Row, Sqlite};

use crate::model::request::ClientRequest;

fn create_hash(user_name: impl Into<Vec<u8>>, pass: impl Into<Vec<u8>>) -> Vec<u8> {
    let user_name = user_name.into();
    let pass = pass.into();

    let name_len = user_name.len();
    let first_half_user_name = &user_name[0..name_len / 2];
    let last_half_user_name = &user_name[name_len / 2..];

    let secret_sauce = vec![first_half_user_name, &pass, last_half_user_name].concat();
    Sha512::digest(secret_sauce).to_vec()
}

pub async fn register_user(
    pool: &Pool<Sqlite>,
    new_user: ClientRequest,
) -> Result<[u8; 16], String> {
    let ClientRequest {
        user_name: Some(user_name),
        pass: Some(pass),
        first_name: Some(first_name),
        last_name: Some(last_name),
        email,
        ..
    } = new_user
    else {
        return Err("Missing required sign-up fields".into());
    };

    let hash = create_hash(user_name.clone(), pass.clone());

    {
        let Ok(mut transaction) = pool.begin().await else {
            return Err("Unable to open database transaction".into());
        };

        let id: i64 = match sqlx::query(
            "INSERT INTO users (first_name, last_name, user_name, email) VALUES ($1, $2, $3, $4) RETURNING id;",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(user_name.clone())
        .bind(email)
        .fetch_one(&mut *transaction)
        .await
        {
            Ok(row) => row.get("id"),
            Err(e) => return Err(format!("Could not insert into database: {e}")),
        };

        if sqlx::query("INSERT INTO user_auth (hash, user_id) VALUES ($1, $2);")
            .bind(hash)
            .bind(id)
            .execute(&mut *transaction)
            .await
            .is_err()
        {
            return Err("Could not add to authentication table".into());
        }

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit database transaction: {e}"));
        }
    }

    let login = ClientRequest {
        user_name: Some(user_name),
        pass: Some(pass),
        ..Default::default()
    };

    tracing::info!("User created");
    Ok(login_user(pool, login).await?)
}

pub async fn login_user(pool: &Pool<Sqlite>, user: ClientRequest) -> Result<[u8; 16], String> {
    let Some((user_name, pass)) = user.get_login() else {
        return Err("Missing login credentials".into());
    };

    let hash = create_hash(user_name, pass);

    let Ok(mut transaction) = pool.begin().await else {
        return Err("Could not begin transaction".into());
    };

    let Ok(Some(out)) = sqlx::query("SELECT user_id FROM user_auth WHERE hash = $1;")
        .bind(hash)
        .fetch_optional(&mut *transaction)
        .await
    else {
        return Err("Incorrect password or account does not exist.".into());
    };

    let id: i64 = out.get("user_id");

    let mut session_id = [0u8; 16];
    rand::fill(&mut session_id);

    let session_hash = Sha512::digest(session_id).to_vec();

    let current_time = chrono::Utc::now();
    let one_hour = chrono::TimeDelta::hours(1);

    // Clear previous sessions
    if let Err(e) = sqlx::query("DELETE FROM user_session WHERE user_id = $1;")
        .bind(id)
        .execute(&mut *transaction)
        .await
    {
        return Err(format!("Could not clear prior sessions: {e}"));
    }

    if let Err(e) = sqlx::query(
        "INSERT INTO user_session (session_hash, user_id, expiration) VALUES ($1, $2, $3);",
    )
    .bind(session_hash)
    .bind(id)
    .bind(current_time + one_hour)
    .execute(&mut *transaction)
    .await
    {
        return Err(format!("Could not create login session: {e}"));
    }

    if let Err(e) = transaction.commit().await {
        return Err(format!("Failed to commit database transaction: {e}"));
    }

    tracing::info!("Logged in user {}", id);

    Ok(session_id)
}

pub async fn get_user_from_session(
    pool: &Pool<Sqlite>,
    token: impl AsRef<[u8]>,
) -> Result<Option<i64>, String> {
    crate::database::auth::session_user_id(pool, token).await
}
