use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use herptrack_db::models::{AnimalPatch, NewAnimal};
use herptrack_schedule::build_feeding_queue;
use herptrack_types::api::{
    AnimalDto, Claims, CreateAnimalRequest, FeedingHistoryDto, UpdateAnimalRequest,
    WeightHistoryDto,
};

use crate::error::join_error;
use crate::{ApiError, AppState, validate};

#[derive(Debug, Deserialize)]
pub struct AnimalQuery {
    /// Substring match against name or breed.
    pub search: Option<String>,
}

pub async fn get_animals(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<AnimalQuery>,
) -> Result<Json<Vec<AnimalDto>>, ApiError> {
    let now = state.clock.now();
    let user_id = claims.sub;

    let db = state.clone();
    let animals =
        tokio::task::spawn_blocking(move || db.db.list_animals(user_id, query.search.as_deref()))
            .await
            .map_err(join_error)??;

    Ok(Json(
        animals
            .into_iter()
            .map(|animal| AnimalDto::from_model(animal, now))
            .collect(),
    ))
}

pub async fn get_animal(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(animal_id): Path<Uuid>,
) -> Result<Json<AnimalDto>, ApiError> {
    let now = state.clock.now();
    let user_id = claims.sub;

    let db = state.clone();
    let animal = tokio::task::spawn_blocking(move || db.db.get_animal(user_id, animal_id))
        .await
        .map_err(join_error)??
        .ok_or(ApiError::NotFound("animal"))?;

    Ok(Json(AnimalDto::from_model(animal, now)))
}

pub async fn create_animal(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAnimalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = validate::animal_name(&req.name)?;
    if let Some(breed) = req.breed.as_deref() {
        validate::label("breed", breed)?;
    }
    if let Some(morph) = req.morph.as_deref() {
        validate::label("morph", morph)?;
    }
    if let Some(weight) = req.weight {
        validate::weight(weight)?;
    }
    let feeding_frequency_days = req.feeding_frequency_days.unwrap_or(7);
    validate::feeding_frequency(feeding_frequency_days)?;

    let new = NewAnimal {
        name,
        breed: req.breed,
        morph: req.morph,
        weight: req.weight,
        last_feeding_date: req.last_feeding_date,
        feeding_frequency_days,
    };

    let now = state.clock.now();
    let user_id = claims.sub;
    let db = state.clone();
    let animal = tokio::task::spawn_blocking(move || db.db.create_animal(user_id, new, now))
        .await
        .map_err(join_error)??;

    Ok((
        StatusCode::CREATED,
        Json(AnimalDto::from_model(animal, now)),
    ))
}

pub async fn update_animal(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(animal_id): Path<Uuid>,
    Json(req): Json<UpdateAnimalRequest>,
) -> Result<Json<AnimalDto>, ApiError> {
    let name = req.name.as_deref().map(validate::animal_name).transpose()?;
    if let Some(breed) = req.breed.as_deref() {
        validate::label("breed", breed)?;
    }
    if let Some(morph) = req.morph.as_deref() {
        validate::label("morph", morph)?;
    }
    if let Some(weight) = req.weight {
        validate::weight(weight)?;
    }
    if let Some(days) = req.feeding_frequency_days {
        validate::feeding_frequency(days)?;
    }

    let patch = AnimalPatch {
        name,
        breed: req.breed,
        morph: req.morph,
        weight: req.weight,
        last_feeding_date: req.last_feeding_date,
        feeding_frequency_days: req.feeding_frequency_days,
    };

    let now = state.clock.now();
    let user_id = claims.sub;
    let db = state.clone();
    let animal =
        tokio::task::spawn_blocking(move || db.db.update_animal(user_id, animal_id, patch, now))
            .await
            .map_err(join_error)??;

    Ok(Json(AnimalDto::from_model(animal, now)))
}

pub async fn delete_animal(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(animal_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = claims.sub;
    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.delete_animal(user_id, animal_id))
        .await
        .map_err(join_error)??;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_weight_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(animal_id): Path<Uuid>,
) -> Result<Json<Vec<WeightHistoryDto>>, ApiError> {
    let user_id = claims.sub;
    let db = state.clone();
    let entries = tokio::task::spawn_blocking(move || db.db.weight_history(user_id, animal_id))
        .await
        .map_err(join_error)??;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub async fn get_feeding_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(animal_id): Path<Uuid>,
) -> Result<Json<Vec<FeedingHistoryDto>>, ApiError> {
    let user_id = claims.sub;
    let db = state.clone();
    let events =
        tokio::task::spawn_blocking(move || db.db.feeding_history_for_animal(user_id, animal_id))
            .await
            .map_err(join_error)??;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// The prioritized "needs attention" view: every animal at queue priority
/// >= 1 (never-fed animals included), most urgent first, recomputed on each
/// request from the stored schedule data.
pub async fn upcoming_feedings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AnimalDto>>, ApiError> {
    let now = state.clock.now();
    let user_id = claims.sub;

    let db = state.clone();
    let animals = tokio::task::spawn_blocking(move || db.db.list_animals(user_id, None))
        .await
        .map_err(join_error)??;

    let queue = build_feeding_queue(animals, now);

    Ok(Json(
        queue
            .into_iter()
            .map(|entry| AnimalDto::with_status(entry.subject, entry.status))
            .collect(),
    ))
}
