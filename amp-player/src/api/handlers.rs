//! HTTP request handlers
//!
//! Volumes cross the API on a 0-100 scale and are stored as 0.0-1.0.

use crate::api::server::AppContext;
use crate::controller::{PlaybackStatus, PlaylistSnapshot};
use crate::error::Error;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<StatusResponse>)>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    /// 0-100 user-facing scale
    volume: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    volume: u8, // 0-100 user-facing scale
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    volume: u8,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    position_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    track_number: u32,
}

#[derive(Debug, Serialize)]
pub struct SkipResponse {
    status: String,
    now_playing: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AddFilesRequest {
    paths: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct AddFolderRequest {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct AddStreamRequest {
    uri: String,
    title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddedResponse {
    track_numbers: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    from: u32,
    to: u32,
}

#[derive(Debug, Deserialize)]
pub struct SwapRequest {
    a: u32,
    b: u32,
}

#[derive(Debug, Serialize)]
pub struct ShuffleResponse {
    /// `mapping[old - 1]` is the new track number
    mapping: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    count: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveRequest {
    path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    path: PathBuf,
}

// ============================================================================
// Error mapping
// ============================================================================

fn status_code_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound(_) | Error::Common(amp_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::InvalidPlaylist(_)
        | Error::Playlist(_)
        | Error::Metadata(_)
        | Error::Common(amp_common::Error::InvalidInput(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::StreamOpen { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(operation: &str, err: Error) -> (StatusCode, Json<StatusResponse>) {
    error!("{} failed: {}", operation, err);
    (
        status_code_for(&err),
        Json(StatusResponse {
            status: format!("error: {}", err),
        }),
    )
}

fn to_volume(user: u8) -> f32 {
    f32::from(user.min(100)) / 100.0
}

fn from_volume(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "amp-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback/state
pub async fn get_playback_state(State(ctx): State<AppContext>) -> Json<PlaybackStatus> {
    Json(ctx.controller.status())
}

/// POST /playback/play - optional body `{ "volume": 0-100 }`
pub async fn play(
    State(ctx): State<AppContext>,
    body: Option<Json<PlayRequest>>,
) -> ApiResult<StatusResponse> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    ctx.controller
        .play(request.volume.map(to_volume))
        .await
        .map_err(|e| api_error("Play", e))?;
    info!("Play command succeeded");
    Ok(StatusResponse::ok())
}

pub async fn pause(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.controller.pause().await.map_err(|e| api_error("Pause", e))?;
    info!("Pause command succeeded");
    Ok(StatusResponse::ok())
}

pub async fn stop(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.controller.stop().await.map_err(|e| api_error("Stop", e))?;
    info!("Stop command succeeded");
    Ok(StatusResponse::ok())
}

/// POST /playback/next
pub async fn skip_next(State(ctx): State<AppContext>) -> ApiResult<SkipResponse> {
    ctx.controller.next().await.map_err(|e| api_error("Next", e))?;
    Ok(Json(SkipResponse {
        status: "ok".to_string(),
        now_playing: ctx.controller.now_playing(),
    }))
}

/// POST /playback/previous
pub async fn skip_previous(State(ctx): State<AppContext>) -> ApiResult<SkipResponse> {
    ctx.controller
        .previous()
        .await
        .map_err(|e| api_error("Previous", e))?;
    Ok(Json(SkipResponse {
        status: "ok".to_string(),
        now_playing: ctx.controller.now_playing(),
    }))
}

/// POST /playback/seek - `{ "position_ms": u64 }`
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<StatusResponse> {
    ctx.controller
        .seek(Duration::from_millis(req.position_ms))
        .await
        .map_err(|e| api_error("Seek", e))?;
    Ok(StatusResponse::ok())
}

/// POST /playback/select - `{ "track_number": u32 }`
pub async fn select(
    State(ctx): State<AppContext>,
    Json(req): Json<SelectRequest>,
) -> ApiResult<StatusResponse> {
    ctx.controller
        .select(req.track_number)
        .await
        .map_err(|e| api_error("Select", e))?;
    Ok(StatusResponse::ok())
}

// ============================================================================
// Volume Endpoints
// ============================================================================

pub async fn get_volume(State(ctx): State<AppContext>) -> Json<VolumeResponse> {
    Json(VolumeResponse {
        volume: from_volume(ctx.controller.engine().volume()),
    })
}

pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> ApiResult<VolumeResponse> {
    ctx.controller
        .set_volume(to_volume(req.volume))
        .await
        .map_err(|e| api_error("Set volume", e))?;
    Ok(Json(VolumeResponse {
        volume: from_volume(ctx.controller.engine().volume()),
    }))
}

// ============================================================================
// Playlist Endpoints
// ============================================================================

/// GET /playlist
pub async fn get_playlist(State(ctx): State<AppContext>) -> Json<PlaylistSnapshot> {
    Json(ctx.controller.snapshot().await)
}

/// POST /playlist/files - `{ "paths": [...] }`
pub async fn add_files(
    State(ctx): State<AppContext>,
    Json(req): Json<AddFilesRequest>,
) -> ApiResult<AddedResponse> {
    let mut track_numbers = Vec::with_capacity(req.paths.len());
    for path in &req.paths {
        let number = ctx
            .controller
            .add_file(path)
            .await
            .map_err(|e| api_error("Add file", e))?;
        track_numbers.push(number);
    }
    Ok(Json(AddedResponse { track_numbers }))
}

/// POST /playlist/folder - `{ "path": "..." }`
pub async fn add_folder(
    State(ctx): State<AppContext>,
    Json(req): Json<AddFolderRequest>,
) -> ApiResult<AddedResponse> {
    let track_numbers = ctx
        .controller
        .add_folder(&req.path)
        .await
        .map_err(|e| api_error("Add folder", e))?;
    Ok(Json(AddedResponse { track_numbers }))
}

/// POST /playlist/stream - `{ "uri": "...", "title": "..." }`
pub async fn add_stream(
    State(ctx): State<AppContext>,
    Json(req): Json<AddStreamRequest>,
) -> ApiResult<AddedResponse> {
    let number = ctx
        .controller
        .add_stream(&req.uri, req.title)
        .await
        .map_err(|e| api_error("Add stream", e))?;
    Ok(Json(AddedResponse {
        track_numbers: vec![number],
    }))
}

/// DELETE /playlist/:track_number
pub async fn remove_item(
    State(ctx): State<AppContext>,
    Path(track_number): Path<u32>,
) -> ApiResult<StatusResponse> {
    ctx.controller
        .remove(track_number)
        .await
        .map_err(|e| api_error("Remove", e))?;
    Ok(StatusResponse::ok())
}

pub async fn move_item(
    State(ctx): State<AppContext>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<StatusResponse> {
    ctx.controller
        .move_item(req.from, req.to)
        .await
        .map_err(|e| api_error("Move", e))?;
    Ok(StatusResponse::ok())
}

pub async fn swap_items(
    State(ctx): State<AppContext>,
    Json(req): Json<SwapRequest>,
) -> ApiResult<StatusResponse> {
    ctx.controller
        .swap(req.a, req.b)
        .await
        .map_err(|e| api_error("Swap", e))?;
    Ok(StatusResponse::ok())
}

pub async fn shuffle(State(ctx): State<AppContext>) -> Json<ShuffleResponse> {
    Json(ShuffleResponse {
        mapping: ctx.controller.shuffle().await,
    })
}

pub async fn clear_playlist(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.controller.clear().await.map_err(|e| api_error("Clear", e))?;
    Ok(StatusResponse::ok())
}

pub async fn new_playlist(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.controller
        .new_playlist()
        .await
        .map_err(|e| api_error("New playlist", e))?;
    Ok(StatusResponse::ok())
}

/// POST /playlist/load - `{ "path": "..." }`
pub async fn load_playlist(
    State(ctx): State<AppContext>,
    Json(req): Json<LoadRequest>,
) -> ApiResult<LoadResponse> {
    let count = ctx
        .controller
        .load_playlist(&req.path)
        .await
        .map_err(|e| api_error("Load playlist", e))?;
    Ok(Json(LoadResponse { count }))
}

/// POST /playlist/save - optional body `{ "path": "..." }` (save as)
pub async fn save_playlist(
    State(ctx): State<AppContext>,
    body: Option<Json<SaveRequest>>,
) -> ApiResult<SaveResponse> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let path = ctx
        .controller
        .save_playlist(request.path.as_deref())
        .await
        .map_err(|e| api_error("Save playlist", e))?;
    Ok(Json(SaveResponse { path }))
}
