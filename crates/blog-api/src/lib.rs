use axum::{
    extract::DefaultBodyLimit,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use blog_core::AppState;
use serde_json::json;

pub mod error;
pub mod extract;
pub mod routes;

/// Headroom for multipart boundaries and part headers on top of the file itself.
pub const MULTIPART_OVERHEAD: u64 = 64 * 1024;

pub fn build_router(allowed_origins: &[String], max_upload_size: u64) -> Router<AppState> {
    let cors = build_cors_layer(allowed_origins);
    let body_limit = usize::try_from(max_upload_size.saturating_add(MULTIPART_OVERHEAD))
        .unwrap_or(usize::MAX);

    Router::new()
        // Health
        .route("/health", get(health))
        // Posts
        .route(
            "/api/posts",
            get(routes::posts::list_posts).post(routes::posts::create_post),
        )
        .route(
            "/api/posts/{post_id}",
            get(routes::posts::get_post)
                .put(routes::posts::replace_post)
                .patch(routes::posts::patch_post)
                .delete(routes::posts::delete_post),
        )
        // Users
        .route("/api/users", post(routes::users::create_user))
        .route(
            "/api/users/{user_id}",
            get(routes::users::get_user).patch(routes::users::update_user),
        )
        .route(
            "/api/users/{user_id}/posts",
            get(routes::users::get_user_posts),
        )
        .route(
            "/api/users/{user_id}/profile-picture",
            post(routes::users::upload_profile_picture),
        )
        // Middleware layers
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn build_cors_layer(allowed_origins: &[String]) -> tower_http::cors::CorsLayer {
    use tower_http::cors::{AllowOrigin, Any};

    let methods = [Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

    if allowed_origins.is_empty() {
        // Development mode: no restrictions.
        return tower_http::cors::CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let parsed: Vec<axum::http::HeaderValue> = allowed_origins
        .iter()
        .map(|o| o.trim_end_matches('/'))
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    tower_http::cors::CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(methods)
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "blog" })),
    )
}
