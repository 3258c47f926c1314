use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use herptrack_types::api::{Claims, CreateFeedingRequest, FeedingHistoryDto};

use crate::error::join_error;
use crate::{ApiError, AppState, validate};

#[derive(Debug, Deserialize)]
pub struct FeedingQuery {
    pub animal_id: Option<Uuid>,
}

pub async fn get_feedings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<FeedingQuery>,
) -> Result<Json<Vec<FeedingHistoryDto>>, ApiError> {
    let user_id = claims.sub;
    let db = state.clone();
    let events =
        tokio::task::spawn_blocking(move || db.db.list_feedings(user_id, query.animal_id))
            .await
            .map_err(join_error)??;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// Record one feeding. The store inserts the event and advances the
/// animal's last-feeding pointer in a single transaction.
pub async fn create_feeding(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateFeedingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(notes) = req.notes.as_deref() {
        validate::notes(notes)?;
    }

    let now = state.clock.now();
    let user_id = claims.sub;
    let db = state.clone();
    let event = tokio::task::spawn_blocking(move || {
        db.db.record_feeding(
            user_id,
            req.animal_id,
            req.feeding_date,
            req.notes.as_deref(),
            now,
        )
    })
    .await
    .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(FeedingHistoryDto::from(event))))
}

pub async fn delete_feeding(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(feeding_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = claims.sub;
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_feeding(user_id, feeding_id))
        .await
        .map_err(join_error)??;

    Ok(StatusCode::NO_CONTENT)
}
