use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use sqlx::{Pool, Sqlite};

pub mod config;
pub mod database;
pub mod endpoints;
pub mod model;
pub mod security;

pub const OK_JSON: &'static str = r#"{ "message": "OK" }"#;

/// Handles shared by every request: the connection pool and the public base
/// URL used when rendering action and dismissal links.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Sqlite>,
    pub public_url: String,
}

/// Builds the full application router.
///
/// Each layer acts as a layer of an onion, with the ones added first
/// acting as the centre of the onion, and the ones added last acting
/// as the outer layers. Every authenticated route passes the session
/// layer before its own privilege check.
pub fn app(state: AppState) -> Router {
    let router: Router<AppState> = Router::new();

    // Add admin layer
    let router = router
        .route(
            "/api/admin/create_course",
            post(endpoints::admin::create_course),
        )
        .layer(from_fn_with_state(state.clone(), security::require_admin));

    // The course-teacher layer
    // All endpoints in this layer require a course_id path parameter and are
    // accessible by teachers of that course.
    let router = router
        .route(
            "/api/instructor/{course_id}/add_student",
            put(endpoints::instructor::add_student),
        )
        .route(
            "/api/instructor/{course_id}/add_teacher",
            put(endpoints::instructor::add_teacher),
        )
        .route(
            "/api/instructor/{course_id}/add_assignment",
            post(endpoints::instructor::add_assignment),
        )
        .route(
            "/api/instructor/{course_id}/{assignment_id}/grade",
            put(endpoints::instructor::grade_submission),
        )
        .layer(from_fn_with_state(
            state.clone(),
            security::require_course_teacher,
        ));

    // The course-member layer
    // These endpoints require a course_id path parameter and are accessible
    // by anyone enrolled in that course, in either role.
    let router = router
        .route(
            "/api/student/{course_id}/{assignment_id}/submit",
            post(endpoints::student::submit_assignment),
        )
        .route(
            "/api/v1/courses/{course_id}/todo",
            get(endpoints::todo::course_todo),
        )
        .layer(from_fn_with_state(
            state.clone(),
            security::require_course_member,
        ));

    // The session layer
    // These endpoints are accessible by all authenticated users. The ignore
    // endpoint does its own per-asset authorization.
    let router = router
        .route("/api/v1/users/self/todo", get(endpoints::todo::user_todo))
        .route(
            "/api/v1/users/self/todo/{asset_string}/{purpose}",
            delete(endpoints::todo::ignore_item),
        )
        .layer(from_fn_with_state(state.clone(), security::require_session));

    // Public endpoints
    router
        .route("/api/login", post(endpoints::login))
        .route("/api/signup", post(endpoints::signup))
        .with_state(state)
}
