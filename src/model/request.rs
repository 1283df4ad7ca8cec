use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientRequest {
    // Login / sign up
    pub user_name: Option<String>,
    pub pass: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,

    // Course management
    pub course_name: Option<String>,
    pub student_user_name: Option<String>,
    pub teacher_user_name: Option<String>,

    // New assignment
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_at: Option<String>,
    pub points_possible: Option<f64>,
    pub submission_types: Option<Vec<String>>,

    // Submission / grading
    pub body: Option<String>,
    pub grade: Option<f64>,
}

impl ClientRequest {
    /// Returns (user_name, pass)
    pub fn get_login(&self) -> Option<(String, String)> {
        if let (Some(user_name), Some(pass)) = (self.user_name.clone(), self.pass.clone()) {
            Some((user_name, pass))
        } else {
            None
        }
    }
}
