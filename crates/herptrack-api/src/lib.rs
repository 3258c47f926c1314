pub mod animals;
pub mod auth;
pub mod error;
pub mod feedings;
pub mod middleware;
pub mod validate;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use herptrack_db::Database;
use herptrack_schedule::Clock;

pub use error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub clock: Arc<dyn Clock>,
}

/// Assemble the full API router. Lives outside the binary so tests can
/// drive the service in-process.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route(
            "/animals",
            get(animals::get_animals).post(animals::create_animal),
        )
        .route(
            "/animals/upcoming-feedings",
            get(animals::upcoming_feedings),
        )
        .route(
            "/animals/{id}",
            get(animals::get_animal)
                .put(animals::update_animal)
                .delete(animals::delete_animal),
        )
        .route(
            "/animals/{id}/weight-history",
            get(animals::get_weight_history),
        )
        .route(
            "/animals/{id}/feeding-history",
            get(animals::get_feeding_history),
        )
        .route(
            "/feedings",
            get(feedings::get_feedings).post(feedings::create_feeding),
        )
        .route("/feedings/{id}", delete(feedings::delete_feeding))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
