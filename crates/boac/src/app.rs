use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, post},
    Router,
};
use boac_auth::auth_routes;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::{
        cohorts::{
            all_cohorts, create_cohort, delete_cohort, get_cohort, get_students_per_filters,
            my_cohorts, update_cohort,
        },
        curated::{
            add_students, all_curated_groups, create_curated_group, delete_curated_group,
            download_csv, get_curated_group, my_curated_groups, remove_student,
            rename_curated_group,
        },
        frontend::{api_not_found, front_end_route},
        health::{healthz, livez},
        note_templates::{
            create_note_template, delete_note_template, get_note_template, my_note_templates,
        },
        notes::{
            add_attachments, create_notes, delete_note, download_attachment, download_for_sid,
            get_note, mark_read, remove_attachment, update_note,
        },
        profile::my_profile,
        students::{get_student_by_sid, get_student_by_uid, list_team_groups},
        topics::{
            all_topics, create_topic, delete_topic, topics_for_appointments, topics_for_notes,
            undelete_topic, update_topic, usage_statistics,
        },
    },
    state::AppState,
};

/// CORS for API routes. In development the Vue dev server may call the API
/// with the session cookie.
fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let dev_origin = config
        .vue_localhost_base_url
        .as_deref()
        .filter(|_| config.is_development())
        .and_then(|url| HeaderValue::from_str(url.trim_end_matches('/')).ok());
    match dev_origin {
        Some(origin) => cors.allow_origin(origin).allow_credentials(true),
        None => cors.allow_origin(Any),
    }
}

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let api_routes = Router::new()
        .merge(auth_routes())
        .route("/profile/my", get(my_profile))
        // Students
        .route("/student/by_sid/{sid}", get(get_student_by_sid))
        .route("/student/by_uid/{uid}", get(get_student_by_uid))
        .route("/team_groups/all", get(list_team_groups))
        // Cohorts
        .route("/cohorts/my", get(my_cohorts))
        .route("/cohorts/all", get(all_cohorts))
        .route("/cohort/{id}", get(get_cohort))
        .route("/cohort/create", post(create_cohort))
        .route("/cohort/update", post(update_cohort))
        .route("/cohort/delete/{id}", delete(delete_cohort))
        .route("/cohort/get_students_per_filters", post(get_students_per_filters))
        // Curated groups
        .route("/curated_group/create", post(create_curated_group))
        .route("/curated_group/{id}", get(get_curated_group))
        .route("/curated_group/students/add", post(add_students))
        .route("/curated_group/{id}/remove_student/{sid}", delete(remove_student))
        .route("/curated_group/rename", post(rename_curated_group))
        .route("/curated_group/delete/{id}", delete(delete_curated_group))
        .route("/curated_group/{id}/download_csv", post(download_csv))
        .route("/curated_groups/my", get(my_curated_groups))
        .route("/curated_groups/all", get(all_curated_groups))
        // Notes
        .route("/note/{id}", get(get_note))
        .route("/notes/create", post(create_notes))
        .route("/notes/update", post(update_note))
        .route("/notes/delete/{id}", delete(delete_note))
        .route("/notes/{id}/mark_read", post(mark_read))
        .route("/notes/{id}/attachments", post(add_attachments))
        .route("/notes/{id}/attachment/{attachment_id}", delete(remove_attachment))
        .route("/notes/attachment/{id}", get(download_attachment))
        .route("/notes/download_for_sid/{sid}", get(download_for_sid))
        // Note templates
        .route("/note_template/create", post(create_note_template))
        .route("/note_template/{id}", get(get_note_template))
        .route("/note_template/delete/{id}", delete(delete_note_template))
        .route("/note_templates/my", get(my_note_templates))
        // Topics
        .route("/topics/all", get(all_topics))
        .route("/topics/for_notes", get(topics_for_notes))
        .route("/topics/for_appointments", get(topics_for_appointments))
        .route("/topics/usage_statistics", get(usage_statistics))
        .route("/topic/create", post(create_topic))
        .route("/topic/update", post(update_topic))
        .route("/topic/delete/{id}", delete(delete_topic))
        .route("/topic/undelete", post(undelete_topic))
        .fallback(api_not_found)
        .layer(middleware::from_fn(crate::middleware::log_api_request))
        .layer(cors_layer(&config));

    Router::new()
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .nest("/api", api_routes)
        .fallback(front_end_route)
        .layer(DefaultBodyLimit::max(config.request_body_limit()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .with_state(state)
}
