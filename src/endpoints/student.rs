use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{Response, StatusCode, request::Parts},
};

use crate::{
    AppState, OK_JSON, database,
    endpoints::session_user,
    model::{api_error::ApiError, request::ClientRequest},
};

/// Records the caller's submission for an assignment
///
/// Resubmitting replaces the previous attempt and returns it to the grading queue.
pub async fn submit_assignment(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    parts: Parts,
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

    let user_id = match session_user(&state, &parts).await {
        Ok(Some(id)) => id,
        Ok(None) => return ApiError::invalid_token(),
        Err(e) => {
            tracing::error!("{e}");
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap();
        }
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

    if let Err(e) =
        database::operations::submit_homework(&state.pool, assignment_id, user_id, client_req.body)
            .await
    {
        tracing::error!("{e}");
        return Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body("Internal Server Error.".into())
            .unwrap();
    }

    Response::builder()
        .status(StatusCode::OK)
        .body(OK_JSON.into())
        .unwrap()
}
