use serde::{Deserialize, Serialize};

/// The assignment embedded in a to-do item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub muted: bool,
    pub points_possible: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_grading_count: Option<i64>,
    pub submission_types: Vec<String>,
    pub due_at: Option<String>,
    pub html_url: String,
}

impl AssignmentSummary {
    pub fn action_url(base_url: &str, course_id: i64, assignment_id: i64) -> String {
        format!("{base_url}/courses/{course_id}/assignments/{assignment_id}")
    }
}
