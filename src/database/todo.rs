use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

use crate::model::assignment_summary::AssignmentSummary;
use crate::model::todo_item::{self, TodoItem};

struct IgnoreMarker {
    permanent: bool,
    fingerprint: Option<i64>,
}

/// Computes the outstanding to-do items for a user: assignments they still
/// have to turn in as a student, and assignments with ungraded submissions
/// in courses they teach. Items covered by a live dismissal are dropped, and
/// an optional course scope restricts the result to that course.
pub async fn list_todo_items(
    pool: &Pool<Sqlite>,
    user_id: i64,
    course_scope: Option<i64>,
    base_url: &str,
) -> Result<Vec<TodoItem>, String> {
    let markers = ignore_markers(pool, user_id).await?;

    let submitting_rows = match sqlx::query(
        "SELECT a.id, a.course_id, a.title, a.description, a.due_at, a.points_possible, a.submission_types, a.muted
        FROM assignments a
        JOIN enrollments e ON e.course_id = a.course_id AND e.user_id = $1 AND e.role = 'student'
        WHERE NOT EXISTS (SELECT 1 FROM submissions s WHERE s.assignment_id = a.id AND s.user_id = $1)
        ORDER BY a.id ASC;",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return Err(format!("{e}")),
    };

    let grading_rows = match sqlx::query(
        "SELECT a.id, a.course_id, a.title, a.description, a.due_at, a.points_possible, a.submission_types, a.muted,
            COUNT(s.id) AS needs_grading
        FROM assignments a
        JOIN enrollments e ON e.course_id = a.course_id AND e.user_id = $1 AND e.role = 'teacher'
        JOIN submissions s ON s.assignment_id = a.id AND s.grade IS NULL
        GROUP BY a.id
        ORDER BY a.id ASC;",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return Err(format!("{e}")),
    };

    let now = Utc::now();
    let mut items = vec![];

    for row in &submitting_rows {
        // Only work that is still due and actually collected through the
        // platform belongs on the list.
        let due_at: Option<DateTime<Utc>> = row.get("due_at");
        let Some(due_at) = due_at else {
            continue;
        };
        if due_at <= now {
            continue;
        }

        let summary = summary_from_row(row, None, base_url);
        if !expects_submission(&summary.submission_types) {
            continue;
        }
        if course_scope.is_some_and(|course_id| course_id != summary.course_id) {
            continue;
        }

        // A submitting candidate has no submission of its own yet, so the
        // current fingerprint is always zero.
        if is_ignored(&markers, summary.id, "submitting", 0) {
            continue;
        }

        items.push(TodoItem::submitting(summary, base_url));
    }

    for row in &grading_rows {
        let needs_grading: i64 = row.get("needs_grading");
        let summary = summary_from_row(row, Some(needs_grading), base_url);

        if course_scope.is_some_and(|course_id| course_id != summary.course_id) {
            continue;
        }
        if is_ignored(&markers, summary.id, "grading", needs_grading) {
            continue;
        }

        items.push(TodoItem::grading(summary, needs_grading, base_url));
    }

    items.sort_by_key(|item| item.assignment.id);

    Ok(items)
}

/// The staleness token a temporary dismissal is pinned to: the ungraded
/// submission count for grading items, the caller's own submission count
/// for submitting items.
pub async fn current_fingerprint(
    pool: &Pool<Sqlite>,
    user_id: i64,
    assignment_id: i64,
    purpose: &str,
) -> Result<i64, String> {
    if purpose == "grading" {
        return needs_grading_count(pool, assignment_id).await;
    }

    match sqlx::query(
        "SELECT COUNT(*) AS n FROM submissions WHERE assignment_id = $1 AND user_id = $2;",
    )
    .bind(assignment_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    {
        Ok(row) => Ok(row.get("n")),
        Err(e) => Err(format!("{e}")),
    }
}

pub async fn needs_grading_count(
    pool: &Pool<Sqlite>,
    assignment_id: i64,
) -> Result<i64, String> {
    match sqlx::query(
        "SELECT COUNT(*) AS n FROM submissions WHERE assignment_id = $1 AND grade IS NULL;",
    )
    .bind(assignment_id)
    .fetch_one(pool)
    .await
    {
        Ok(row) => Ok(row.get("n")),
        Err(e) => Err(format!("{e}")),
    }
}

/// Writes a dismissal marker. Repeating the call replaces the marker, so
/// dismissing twice has no further effect beyond refreshing the fingerprint.
pub async fn set_ignore(
    pool: &Pool<Sqlite>,
    user_id: i64,
    asset_string: &str,
    purpose: &str,
    permanent: bool,
    fingerprint: Option<i64>,
) -> Result<(), String> {
    if let Err(e) = sqlx::query(
        "INSERT INTO todo_ignores (user_id, asset_string, purpose, permanent, fingerprint, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, asset_string, purpose)
        DO UPDATE SET permanent = excluded.permanent, fingerprint = excluded.fingerprint;",
    )
    .bind(user_id)
    .bind(asset_string)
    .bind(purpose)
    .bind(permanent)
    .bind(fingerprint)
    .bind(Utc::now())
    .execute(pool)
    .await
    {
        return Err(format!("{e}"));
    }

    Ok(())
}

async fn ignore_markers(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<HashMap<(String, String), IgnoreMarker>, String> {
    let rows = match sqlx::query(
        "SELECT asset_string, purpose, permanent, fingerprint FROM todo_ignores WHERE user_id = $1;",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    {
        Ok(r) => r,
        Err(e) => return Err(format!("{e}")),
    };

    let mut markers = HashMap::new();
    for row in rows {
        let asset_string: String = row.get("asset_string");
        let purpose: String = row.get("purpose");
        let permanent: bool = row.get("permanent");
        let fingerprint: Option<i64> = row.get("fingerprint");

        markers.insert((asset_string, purpose), IgnoreMarker { permanent, fingerprint });
    }

    Ok(markers)
}

fn is_ignored(
    markers: &HashMap<(String, String), IgnoreMarker>,
    assignment_id: i64,
    purpose: &str,
    current_fingerprint: i64,
) -> bool {
    let key = (todo_item::asset_string(assignment_id), purpose.to_owned());
    match markers.get(&key) {
        Some(marker) if marker.permanent => true,
        // A temporary marker only holds while the state it was taken
        // against is unchanged.
        Some(marker) => marker.fingerprint == Some(current_fingerprint),
        None => false,
    }
}

fn summary_from_row(row: &SqliteRow, needs_grading: Option<i64>, base_url: &str) -> AssignmentSummary {
    let id: i64 = row.get("id");
    let course_id: i64 = row.get("course_id");
    let title: String = row.get("title");
    let description: Option<String> = row.get("description");
    let due_at: Option<DateTime<Utc>> = row.get("due_at");
    let points_possible: Option<f64> = row.get("points_possible");
    let submission_types: String = row.get("submission_types");
    let muted: bool = row.get("muted");

    AssignmentSummary {
        html_url: AssignmentSummary::action_url(base_url, course_id, id),
        id,
        course_id,
        name: title,
        description,
        muted,
        points_possible,
        needs_grading_count: needs_grading,
        submission_types: submission_types
            .split(',')
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect(),
        due_at: due_at.map(|d| d.to_rfc3339()),
    }
}

/// Whether the assignment collects work through the platform at all.
fn expects_submission(submission_types: &[String]) -> bool {
    submission_types
        .iter()
        .any(|t| t != "none" && t != "on_paper")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_map(permanent: bool, fingerprint: Option<i64>) -> HashMap<(String, String), IgnoreMarker> {
        let mut markers = HashMap::new();
        markers.insert(
            ("assignment_7".to_owned(), "grading".to_owned()),
            IgnoreMarker { permanent, fingerprint },
        );
        markers
    }

    #[test]
    fn permanent_markers_always_suppress() {
        let markers = marker_map(true, None);
        assert!(is_ignored(&markers, 7, "grading", 1));
        assert!(is_ignored(&markers, 7, "grading", 99));
    }

    #[test]
    fn temporary_markers_lapse_when_the_fingerprint_moves() {
        let markers = marker_map(false, Some(1));
        assert!(is_ignored(&markers, 7, "grading", 1));
        assert!(!is_ignored(&markers, 7, "grading", 2));
    }

    #[test]
    fn markers_only_cover_their_own_purpose() {
        let markers = marker_map(true, None);
        assert!(!is_ignored(&markers, 7, "submitting", 0));
        assert!(!is_ignored(&markers, 8, "grading", 1));
    }

    #[test]
    fn paper_only_assignments_expect_no_submission() {
        let types = |list: &[&str]| list.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        assert!(expects_submission(&types(&["online_text_entry"])));
        assert!(expects_submission(&types(&["on_paper", "online_upload"])));
        assert!(!expects_submission(&types(&["on_paper"])));
        assert!(!expects_submission(&types(&["none"])));
    }
}
