use serde::{Deserialize, Serialize};

use crate::model::assignment_summary::AssignmentSummary;

/// One outstanding action item. Never persisted; recomputed per request.
#[derive(Debug, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub assignment: AssignmentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_grading_count: Option<i64>,
    pub ignore: String,
    pub ignore_permanently: String,
    pub html_url: String,
    pub context_type: String,
    pub course_id: i64,
}

impl TodoItem {
    /// An assignment the user still has to turn in. The action link jumps
    /// straight to the submission form.
    pub fn submitting(assignment: AssignmentSummary, base_url: &str) -> Self {
        let html_url = format!("{}#submit", assignment.html_url);
        Self::build("submitting", assignment, None, html_url, base_url)
    }

    /// An assignment with submissions waiting on the user to grade them.
    pub fn grading(
        assignment: AssignmentSummary,
        needs_grading_count: i64,
        base_url: &str,
    ) -> Self {
        let html_url = format!(
            "{}/courses/{}/gradebook/speed_grader?assignment_id={}",
            base_url, assignment.course_id, assignment.id
        );
        Self::build(
            "grading",
            assignment,
            Some(needs_grading_count),
            html_url,
            base_url,
        )
    }

    fn build(
        item_type: &str,
        assignment: AssignmentSummary,
        needs_grading_count: Option<i64>,
        html_url: String,
        base_url: &str,
    ) -> Self {
        let asset = asset_string(assignment.id);

        Self {
            item_type: item_type.into(),
            course_id: assignment.course_id,
            ignore: ignore_url(base_url, &asset, item_type, false),
            ignore_permanently: ignore_url(base_url, &asset, item_type, true),
            context_type: "Course".into(),
            needs_grading_count,
            html_url,
            assignment,
        }
    }
}

pub fn asset_string(assignment_id: i64) -> String {
    format!("assignment_{assignment_id}")
}

/// Parses an `assignment_{id}` asset string back into the assignment id.
pub fn parse_asset_string(asset: &str) -> Option<i64> {
    asset.strip_prefix("assignment_")?.parse().ok()
}

pub fn ignore_url(base_url: &str, asset: &str, purpose: &str, permanent: bool) -> String {
    format!(
        "{}/api/v1/users/self/todo/{}/{}?permanent={}",
        base_url,
        asset,
        purpose,
        if permanent { 1 } else { 0 }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_strings_round_trip() {
        assert_eq!(parse_asset_string(&asset_string(42)), Some(42));
    }

    #[test]
    fn rejects_foreign_asset_strings() {
        assert_eq!(parse_asset_string("quiz_42"), None);
        assert_eq!(parse_asset_string("assignment_"), None);
        assert_eq!(parse_asset_string("assignment_forty"), None);
    }

    #[test]
    fn dismissal_urls_carry_the_permanence_flag() {
        let url = ignore_url("http://x.test", "assignment_3", "grading", true);
        assert_eq!(
            url,
            "http://x.test/api/v1/users/self/todo/assignment_3/grading?permanent=1"
        );
    }
}
