//! The to-do endpoints: listing outstanding work and dismissing items.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Response, StatusCode, request::Parts},
};
use serde::Deserialize;

use crate::{
    AppState, OK_JSON, database,
    endpoints::session_user,
    model::{api_error::ApiError, todo_item},
};

#[derive(Debug, Deserialize)]
pub struct IgnoreParams {
    permanent: Option<u8>,
}

/// Lists every outstanding to-do item for the calling user across all of
/// their courses
///
/// Determines the user from the Authorization header, so it accepts a `Parts` parameter
pub async fn user_todo(State(state): State<AppState>, parts: Parts) -> Response<Body> {
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

    list_response(&state, user_id, None).await
}

/// Lists the outstanding to-do items scoped to one course
pub async fn course_todo(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    parts: Parts,
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

    list_response(&state, user_id, Some(course_id)).await
}

/// Dismisses one to-do item for the calling user
///
/// With `permanent=1` the item never comes back; otherwise it stays hidden
/// until the state behind it changes.
pub async fn ignore_item(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    Query(params): Query<IgnoreParams>,
    parts: Parts,
) -> Response<Body> {
    let [asset, purpose] = &path_params[..] else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    let Some(assignment_id) = todo_item::parse_asset_string(asset) else {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    };

    if purpose != "submitting" && purpose != "grading" {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body("Bad Request.".into())
            .unwrap();
    }

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

    // The caller has to be enrolled in the course the assignment belongs to.
    let course_id = match database::operations::assignment_course(&state.pool, assignment_id).await
    {
        Ok(Some(c)) => c,
        Ok(None) => {
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
    };

    match database::operations::user_role_in_course(&state.pool, user_id, course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return ApiError::not_authorized(),
        Err(e) => {
            tracing::error!("{e}");
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap();
        }
    }

    let permanent = params.permanent == Some(1);

    let fingerprint = if permanent {
        None
    } else {
        match database::todo::current_fingerprint(&state.pool, user_id, assignment_id, purpose)
            .await
        {
            Ok(f) => Some(f),
            Err(e) => {
                tracing::error!("{e}");
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body("Internal Server Error.".into())
                    .unwrap();
            }
        }
    };

    if let Err(e) =
        database::todo::set_ignore(&state.pool, user_id, asset, purpose, permanent, fingerprint)
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

async fn list_response(state: &AppState, user_id: i64, scope: Option<i64>) -> Response<Body> {
    match database::todo::list_todo_items(&state.pool, user_id, scope, &state.public_url).await {
        Ok(items) => {
            let items_json = serde_json::to_string(&items).unwrap();
            Response::builder()
                .status(StatusCode::OK)
                .body(items_json.into())
                .unwrap()
        }
        Err(e) => {
            tracing::error!("{e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap()
        }
    }
}
