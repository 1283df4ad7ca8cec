//! Contains the middleware security functions. Each layer checks for a different level of security, as denoted by the function

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    database::auth::{
        session_exists_and_valid, session_is_admin, session_is_student, session_is_teacher,
    },
    model::api_error::ApiError,
};

/// Checks to see that the request carries a valid, unexpired session.
///
/// Also stamps the caller's roles onto the response, which the frontend
/// uses to decide what to display.
pub async fn require_session(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let (parts, body) = request.into_parts();

    let Some(auth_header) = parts.headers.get(&AUTHORIZATION) else {
        return ApiError::invalid_token();
    };

    let token = auth_header
        .as_bytes()
        .iter()
        .map(|c| *c as char)
        .collect::<String>();

    match session_exists_and_valid(&state.pool, &token).await {
        Ok(true) => {
            let req = Request::from_parts(parts, body);
            let mut resp = next.run(req).await;

            let is_admin = session_is_admin(&state.pool, &token).await.unwrap_or(false);
            let (is_teacher, is_student) =
                if let Some(course_id) = path_params.first().and_then(|p| p.parse::<i64>().ok()) {
                    (
                        session_is_teacher(&state.pool, course_id, &token)
                            .await
                            .unwrap_or(false),
                        session_is_student(&state.pool, course_id, &token)
                            .await
                            .unwrap_or(false),
                    )
                } else {
                    (false, false)
                };

            resp.headers_mut().insert(
                "admin",
                HeaderValue::from_str(&is_admin.to_string()).unwrap(),
            );
            resp.headers_mut().insert(
                "teacher",
                HeaderValue::from_str(&is_teacher.to_string()).unwrap(),
            );
            resp.headers_mut().insert(
                "student",
                HeaderValue::from_str(&is_student.to_string()).unwrap(),
            );

            resp
        }
        Ok(false) => ApiError::invalid_token(),
        Err(e) => {
            tracing::error!("{e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap()
        }
    }
}

/// Checks that the caller is enrolled, in either role, in the course named
/// by the leading path parameter.
/// If no course parameter is present, fall through (for admin-related endpoints).
pub async fn require_course_member(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let (parts, body) = request.into_parts();

    let Some(auth_header) = parts.headers.get(&AUTHORIZATION) else {
        return ApiError::invalid_token();
    };

    let token = auth_header
        .as_bytes()
        .iter()
        .map(|c| *c as char)
        .collect::<String>();

    if let Some(course_id) = path_params.first().and_then(|p| p.parse::<i64>().ok()) {
        let is_auth = match session_is_student(&state.pool, course_id, &token).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!("{e}");
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body("Internal Server Error.".into())
                    .unwrap();
            }
        };

        let is_auth = is_auth
            || match session_is_teacher(&state.pool, course_id, &token).await {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("{e}");
                    return Response::builder()
                        .status(StatusCode::INTERNAL_SERVER_ERROR)
                        .body("Internal Server Error.".into())
                        .unwrap();
                }
            };

        let req = Request::from_parts(parts, body);

        if is_auth {
            next.run(req).await
        } else {
            ApiError::not_authorized()
        }
    } else {
        admin_fall_through(&state, &token, parts, body, next).await
    }
}

/// Checks that the caller teaches the course named by the leading path
/// parameter.
/// If no course parameter is present, fall through (for admin-related endpoints).
pub async fn require_course_teacher(
    State(state): State<AppState>,
    Path(path_params): Path<Vec<String>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let (parts, body) = request.into_parts();

    let Some(auth_header) = parts.headers.get(&AUTHORIZATION) else {
        return ApiError::invalid_token();
    };

    let token = auth_header
        .as_bytes()
        .iter()
        .map(|c| *c as char)
        .collect::<String>();

    if let Some(course_id) = path_params.first().and_then(|p| p.parse::<i64>().ok()) {
        let is_auth = match session_is_teacher(&state.pool, course_id, &token).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!("{e}");
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body("Internal Server Error.".into())
                    .unwrap();
            }
        };

        let req = Request::from_parts(parts, body);

        if is_auth {
            next.run(req).await
        } else {
            ApiError::not_authorized()
        }
    } else {
        admin_fall_through(&state, &token, parts, body, next).await
    }
}

/// Checks that the caller is an admin.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let Some(auth_header) = request.headers().get(&AUTHORIZATION) else {
        return ApiError::invalid_token();
    };

    let token = auth_header
        .as_bytes()
        .iter()
        .map(|c| *c as char)
        .collect::<String>();

    match session_is_admin(&state.pool, token).await {
        Ok(true) => next.run(request).await,
        Ok(false) => ApiError::not_authorized(),
        Err(e) => {
            tracing::error!("{e}");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap()
        }
    }
}

async fn admin_fall_through(
    state: &AppState,
    token: &str,
    parts: axum::http::request::Parts,
    body: Body,
    next: Next,
) -> Response<Body> {
    let is_auth = match session_is_admin(&state.pool, token).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("{e}");
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body("Internal Server Error.".into())
                .unwrap();
        }
    };

    if is_auth {
        let req = Request::from_parts(parts, body);
        next.run(req).await
    } else {
        ApiError::not_authorized()
    }
}
