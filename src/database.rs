use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

pub mod auth;
pub mod operations;
pub mod todo;
pub mod user;

pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, String> {
    // An in-memory database exists per connection, so the pool must not
    // grow past one of them.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 10 };

    match SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
    {
        Ok(p) => Ok(p),
        Err(e) => Err(format!("{e}")),
    }
}

pub async fn init_database(pool: &Pool<Sqlite>) -> Result<(), String> {
    if let Ok(mut transaction) = pool.begin().await {
        if let Err(e) = sqlx::query(
            "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            user_name TEXT NOT NULL UNIQUE,
            email TEXT,
            is_admin BOOLEAN NOT NULL DEFAULT FALSE
        );",
        )
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Failed to create user table: {e}"));
        };

        // Create the authentication table
        if let Err(e) = sqlx::query(
            "CREATE TABLE IF NOT EXISTS user_auth (
            hash BLOB PRIMARY KEY,
            user_id INTEGER REFERENCES users (id)
        );",
        )
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not create auth table: {e}"));
        }

        // Create the session table
        if let Err(e) = sqlx::query(
            "CREATE TABLE IF NOT EXISTS user_session(
            session_hash BLOB PRIMARY KEY,
            user_id INTEGER REFERENCES users (id),
            expiration TIMESTAMP NOT NULL
        );",
        )
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not create session table: {e}"));
        }

        // Create a table for the courses
        if let Err(e) = sqlx::query(
            "CREATE TABLE IF NOT EXISTS courses(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_name TEXT NOT NULL
        );",
        )
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not create table courses: {e}"));
        }

        // Create a table for the user-course associations
        if let Err(e) = sqlx::query(
            "CREATE TABLE IF NOT EXISTS enrollments (
            user_id INTEGER REFERENCES users (id) ON UPDATE CASCADE ON DELETE CASCADE,
            course_id INTEGER REFERENCES courses (id) ON UPDATE CASCADE ON DELETE CASCADE,
            role TEXT NOT NULL,
            CONSTRAINT enrollments_pkey PRIMARY KEY (user_id, course_id)
        );",
        )
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not create association table: {e}"));
        }

        if let Err(e) = sqlx::query(
            "CREATE TABLE IF NOT EXISTS assignments(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id INTEGER REFERENCES courses (id),
            title TEXT NOT NULL,
            description TEXT,
            due_at TIMESTAMP,
            points_possible REAL,
            submission_types TEXT NOT NULL DEFAULT 'online_text_entry',
            muted BOOLEAN NOT NULL DEFAULT FALSE
        );",
        )
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not create assignments table: {e}"));
        }

        // One submission per student per assignment. A NULL grade marks a
        // submission that still needs grading.
        if let Err(e) = sqlx::query(
            "CREATE TABLE IF NOT EXISTS submissions(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            assignment_id INTEGER REFERENCES assignments (id),
            user_id INTEGER REFERENCES users (id),
            body TEXT,
            submitted_at TIMESTAMP NOT NULL,
            grade REAL,
            UNIQUE (assignment_id, user_id)
        );",
        )
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not create submissions table: {e}"));
        }

        // Dismissed to-do items. A permanent marker suppresses its item for
        // good; a temporary one carries the fingerprint it was taken against
        // and lapses when the fingerprint moves.
        if let Err(e) = sqlx::query(
            "CREATE TABLE IF NOT EXISTS todo_ignores(
            user_id INTEGER REFERENCES users (id),
            asset_string TEXT NOT NULL,
            purpose TEXT NOT NULL,
            permanent BOOLEAN NOT NULL,
            fingerprint INTEGER,
            created_at TIMESTAMP NOT NULL,
            CONSTRAINT todo_ignores_pkey PRIMARY KEY (user_id, asset_string, purpose)
        );",
        )
        .execute(&mut *transaction)
        .await
        {
            return Err(format!("Could not create ignore table: {e}"));
        }

        if let Err(e) = transaction.commit().await {
            return Err(format!("Could not commit table-creation transaction: {e}"));
        };
    }

    Ok(())
}
