use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{Response, StatusCode},
};
use chrono::{DateTime, Utc};

use crate::{
    AppState, OK_JSON,
    database::{self, operations::CourseRole},
    model::request::ClientRequest,
};

pub async fn add_student(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    Json(client_req): Json<ClientRequest>,
) -> Response<Body> {
    enroll(state, path_params, client_req.student_user_name, CourseRole::Student).await
}

pub async fn add_teacher(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    Json(client_req): Json<ClientRequest>,
) -> Response<Body> {
    enroll(state, path_params, client_req.teacher_user_name, CourseRole::Teacher).await
}

async fn enroll(
    state: AppState,
    path_params: Vec<String>,
    user_name: Option<String>,
    role: CourseRole,
) -> Response<Body> {
    let [course_id, ..] = &path_params[..] else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    let Ok(course_id) = course_id.parse::<i64>() else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    let Some(user_name) = user_name else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    match database::operations::enroll_by_user_name(&state.pool, &user_name, course_id, role).await
    {
        Ok(true) => Response::builder()
            .status(StatusCode::OK)
            .body(OK_JSON.into())
            .unwrap(),
        Ok(false) => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body("No such user.".into())
            .unwrap(),
        Err(e) => {
            tracing::error!("Could not enroll user: {e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Error.".into())
                .unwrap()
        }
    }
}

pub async fn add_assignment(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    Json(client_req): Json<ClientRequest>,
) -> Response<Body> {
    let [course_id, ..] = &path_params[..] else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    let Ok(course_id) = course_id.parse::<i64>() else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    let ClientRequest {
        title: Some(title),
        description,
        due_at,
        points_possible,
        submission_types,
        ..
    } = client_req
    else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Missing required field title.".into())
            .unwrap();
    };

    let due_at = match due_at {
        Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
            Ok(d) => Some(d.with_timezone(&Utc)),
            Err(_) => {
                return Response::builder()
                    .status(StatusCode::BAD_REQUEST)
                    .body("Bad due_at timestamp.".into())
                    .unwrap();
            }
        },
        None => None,
    };

    let submission_types =
        submission_types.unwrap_or_else(|| vec!["online_text_entry".to_owned()]);

    match database::operations::add_assignment(
        &state.pool,
        course_id,
        title,
        description,
        due_at,
        points_possible,
        submission_types,
    )
    .await
    {
        Ok(assignment_id) => Response::builder()
            .status(StatusCode::OK)
            .body(format!(r#"{{ "assignment_id": {assignment_id} }}"#).into())
            .unwrap(),
        Err(e) => {
            tracing::error!("Could not add assignment: {e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Error.".into())
                .unwrap()
        }
    }
}

/// Records a grade for one student's submission, clearing it from the
/// grading queue
pub async fn grade_submission(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    Json(client_req): Json<ClientRequest>,
) -> Response<Body> {
    let [course_id, assignment_id] = &path_params[..] else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    let (Ok(course_id), Ok(assignment_id)) =
        (course_id.parse::<i64>(), assignment_id.parse::<i64>())
    else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    let ClientRequest {
        student_user_name: Some(student_user_name),
        grade: Some(grade),
        ..
    } = client_req
    else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Missing required fields student_user_name or grade.".into())
            .unwrap();
    };

    // The assignment has to sit in the course the auth layer vetted.
    match database::operations::assignment_course(&state.pool, assignment_id).await {
        Ok(Some(c)) if c == course_id => {}
        Ok(_) => {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body("Not Found.".into())
                .unwrap();
        }
        Err(e) => {
            tracing::error!("{e}");
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap();
        }
    }

    let student_id = match database::operations::user_id_by_name(&state.pool, &student_user_name)
        .await
    {
        Ok(Some(id)) => id,
        Ok(None) => {
            return Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body("No such user.".into())
                .unwrap();
        }
        Err(e) => {
            tracing::error!("{e}");
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap();
        }
    };

    match database::operations::grade_submission(&state.pool, assignment_id, student_id, grade)
        .await
    {
        Ok(true) => Response::builder()
            .status(StatusCode::OK)
            .body(OK_JSON.into())
            .unwrap(),
        Ok(false) => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body("No submission to grade.".into())
            .unwrap(),
        Err(e) => {
            tracing::error!("{e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap()
        }
    }
}
