use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseRole {
    Student,
    Teacher,
}

impl CourseRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseRole::Student => "student",
            CourseRole::Teacher => "teacher",
        }
    }
}

pub async fn create_course(pool: &Pool<Sqlite>, course_name: String) -> Result<i64, String> {
    match sqlx::query("INSERT INTO courses (course_name) VALUES ($1) RETURNING id;")
        .bind(course_name)
        .fetch_one(pool)
        .await
    {
        Ok(row) => Ok(row.get("id")),
        Err(e) => Err(format!("Unable to add new course: {e}")),
    }
}

pub async fn enroll_user(
    pool: &Pool<Sqlite>,
    user_id: i64,
    course_id: i64,
    role: CourseRole,
) -> Result<(), String> {
    if let Err(e) = sqlx::query(
        "INSERT INTO enrollments (user_id, course_id, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, course_id) DO UPDATE SET role = excluded.role;",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(role.as_str())
    .execute(pool)
    .await
    {
        return Err(format!("Unable to add to enrollments table: {e}"));
    }

    Ok(())
}

/// Enrolls a user by username. Returns false when no such user exists.
pub async fn enroll_by_user_name(
    pool: &Pool<Sqlite>,
    user_name: &str,
    course_id: i64,
    role: CourseRole,
) -> Result<bool, String> {
    let result = match sqlx::query(
        "INSERT INTO enrollments (user_id, course_id, role)
        SELECT id, $1, $2 FROM users
        WHERE user_name = $3
        ON CONFLICT (user_id, course_id) DO UPDATE SET role = excluded.role;",
    )
    .bind(course_id)
    .bind(role.as_str())
    .bind(user_name)
    .execute(pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return Err(format!("Unable to add to enrollments table: {e}")),
    };

    Ok(result.rows_affected() > 0)
}

pub async fn set_admin(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), String> {
    if let Err(e) = sqlx::query("UPDATE users SET is_admin = TRUE WHERE id = $1;")
        .bind(user_id)
        .execute(pool)
        .await
    {
        return Err(format!("Unable to promote user: {e}"));
    }

    Ok(())
}

pub async fn user_id_by_name(
    pool: &Pool<Sqlite>,
    user_name: &str,
) -> Result<Option<i64>, String> {
    match sqlx::query("SELECT id FROM users WHERE user_name = $1;")
        .bind(user_name)
        .fetch_optional(pool)
        .await
    {
        Ok(row) => Ok(row.map(|r| r.get("id"))),
        Err(e) => Err(format!("{e}")),
    }
}

pub async fn user_role_in_course(
    pool: &Pool<Sqlite>,
    user_id: i64,
    course_id: i64,
) -> Result<Option<CourseRole>, String> {
    let row = match sqlx::query(
        "SELECT role FROM enrollments WHERE user_id = $1 AND course_id = $2;",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return Err(format!("An unexpected error occured: {e}")),
    };

    let Some(row) = row else {
        return Ok(None);
    };

    let role: String = row.get("role");
    let role = match role.as_str() {
        "teacher" => CourseRole::Teacher,
        _ => CourseRole::Student,
    };

    Ok(Some(role))
}

pub async fn add_assignment(
    pool: &Pool<Sqlite>,
    course_id: i64,
    title: String,
    description: Option<String>,
    due_at: Option<DateTime<Utc>>,
    points_possible: Option<f64>,
    submission_types: Vec<String>,
) -> Result<i64, String> {
    let submission_types = submission_types.join(",");

    match sqlx::query(
        "INSERT INTO assignments (course_id, title, description, due_at, points_possible, submission_types)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id;",
    )
    .bind(course_id)
    .bind(title)
    .bind(description)
    .bind(due_at)
    .bind(points_possible)
    .bind(submission_types)
    .fetch_one(pool)
    .await
    {
        Ok(row) => Ok(row.get("id")),
        Err(e) => Err(format!("{e}")),
    }
}

pub async fn assignment_course(
    pool: &Pool<Sqlite>,
    assignment_id: i64,
) -> Result<Option<i64>, String> {
    match sqlx::query("SELECT course_id FROM assignments WHERE id = $1;")
        .bind(assignment_id)
        .fetch_optional(pool)
        .await
    {
        Ok(row) => Ok(row.map(|r| r.get("course_id"))),
        Err(e) => Err(format!("{e}")),
    }
}

/// Records a submission. Resubmitting replaces the previous attempt and
/// sends it back to the grading queue.
pub async fn submit_homework(
    pool: &Pool<Sqlite>,
    assignment_id: i64,
    user_id: i64,
    body: Option<String>,
) -> Result<(), String> {
    if let Err(e) = sqlx::query(
        "INSERT INTO submissions (assignment_id, user_id, body, submitted_at, grade)
        VALUES ($1, $2, $3, $4, NULL)
        ON CONFLICT (assignment_id, user_id)
        DO UPDATE SET body = excluded.body, submitted_at = excluded.submitted_at, grade = NULL;",
    )
    .bind(assignment_id)
    .bind(user_id)
    .bind(body)
    .bind(Utc::now())
    .execute(pool)
    .await
    {
        return Err(format!("{e}"));
    }

    Ok(())
}

/// Returns false when the student has no submission to grade.
pub async fn grade_submission(
    pool: &Pool<Sqlite>,
    assignment_id: i64,
    user_id: i64,
    grade: f64,
) -> Result<bool, String> {
    let result = match sqlx::query(
        "UPDATE submissions SET grade = $1 WHERE assignment_id = $2 AND user_id = $3;",
    )
    .bind(grade)
    .bind(assignment_id)
    .bind(user_id)
    .execute(pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return Err(format!("{e}")),
    };

    Ok(result.rows_affected() > 0)
}
