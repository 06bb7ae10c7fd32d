// src/routes.rs

use axum::{
    Router,
    http::{HeaderName, Method},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::SUBJECTS_PATH,
    handlers::{
        admin, auth,
        exam::{self, EXAM_TOKEN_HEADER},
        student,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, student, exam, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (database pool, config, exam engine).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(EXAM_TOKEN_HEADER),
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/admin/login", post(auth::admin_login));

    // Auth first, then the role check
    let student_layers = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(student_middleware));

    let student_routes = Router::new()
        .route("/api/grades", get(student::grade_choices))
        .route(SUBJECTS_PATH, get(student::list_subjects))
        .route("/api/student/dashboard", get(student::dashboard))
        .layer(student_layers.clone());

    let exam_routes = Router::new()
        .route("/start/{subject_id}", post(exam::start_exam))
        .route("/current", get(exam::current_question))
        .route("/jump", get(exam::jump_to_index))
        .route("/answer", post(exam::submit_answer))
        .route("/finish", post(exam::finish_exam))
        .route("/result/{id}", get(exam::get_result))
        .layer(student_layers);

    let admin_routes = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/grade-keys", get(admin::list_grade_keys))
        .route(
            "/subjects",
            get(admin::list_subjects).post(admin::create_subject),
        )
        .route(
            "/subjects/{id}",
            put(admin::update_subject).delete(admin::delete_subject),
        )
        .route(
            "/subjects/{id}/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route("/questions/import", post(admin::import_questions))
        .route(
            "/questions/{id}",
            get(admin::get_question)
                .put(admin::update_question)
                .delete(admin::delete_question),
        )
        .route("/students", get(admin::list_students))
        .route("/students/{id}", delete(admin::delete_student))
        .route("/results", get(admin::list_results))
        .route("/results/{id}", delete(admin::delete_result))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(student_routes)
        .nest("/api/exam", exam_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
