use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use repertoire_core::{
    CatalogStats, Recording, RecordingId, RecordingQuery, RecordingType, DEFAULT_LIMIT,
};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

/// The fields of a recording shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub id: Option<RecordingId>,
    pub title: String,
    pub catalog_number: Option<String>,
    pub release_year: Option<i32>,
    pub recording_type: RecordingType,
    pub in_library: bool,
    pub cover_url: Option<String>,
}

impl From<Recording> for RecordingSummary {
    fn from(recording: Recording) -> Self {
        Self {
            id: recording.id,
            title: recording.title,
            catalog_number: recording.catalog_number,
            release_year: recording.release_year,
            recording_type: recording.recording_type,
            in_library: recording.in_library,
            cover_url: recording.cover_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    composer: Option<String>,
    work: Option<String>,
    label: Option<String>,
    /// "true" or "false"; any other value is ignored.
    library: Option<String>,
    limit: Option<usize>,
}

impl From<ListParams> for RecordingQuery {
    fn from(params: ListParams) -> Self {
        Self {
            composer: params.composer.filter(|s| !s.is_empty()),
            work: params.work.filter(|s| !s.is_empty()),
            label: params.label.filter(|s| !s.is_empty()),
            in_library: match params.library.as_deref() {
                Some("true") => Some(true),
                Some("false") => Some(false),
                _ => None,
            },
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        }
    }
}

pub(crate) async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub(crate) async fn list_recordings(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RecordingSummary>>, ApiError> {
    let query = RecordingQuery::from(params);
    let recordings = state.with_db(move |db| db.get_recordings(&query)).await?;
    Ok(Json(recordings.into_iter().map(RecordingSummary::from).collect()))
}

pub(crate) async fn get_recording(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Recording>, ApiError> {
    let id = RecordingId::new(id);
    state
        .with_db(move |db| db.get_recording(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

pub(crate) async fn create_recording(
    State(state): State<AppState>,
    Json(recording): Json<Recording>,
) -> Result<(StatusCode, Json<Recording>), ApiError> {
    let created = state.with_db(move |db| db.add_recording(recording)).await?;
    log::info!("Added recording {:?} ({:?})", created.title, created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn get_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, ApiError> {
    Ok(Json(state.with_db(|db| db.stats()).await?))
}
