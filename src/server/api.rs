use super::error::{ApiError, Result};
use super::state::AppState;
use crate::bucket::AUDIO_EXTENSIONS;
use crate::guard::resolve_request;
use crate::library::{SUMMARY_FILE_CAP, summarize};
use crate::lyrics::load_sidecar_lines;
use crate::model::{LibrarySummary, Track};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, Request, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::path::PathBuf;
use tower::ServiceExt;
use tower_http::services::ServeFile;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub config_path: Option<PathBuf>,
    pub config_exists: bool,
    pub config_music_directory: Option<String>,
    pub env_music_dir: Option<String>,
    pub music_dir_effective: String,
    pub music_dir_exists: bool,
    pub supported_audio: Vec<String>,
    pub counts: Option<LibrarySummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MusicDirectoryRequest {
    #[serde(default)]
    pub music_directory: Option<String>,
    #[serde(default, rename = "musicDirectory")]
    pub music_directory_camel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PathRequest {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayQuery {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LyricsQuery {
    pub song_path: Option<String>,
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))
}

/// Bodies that are missing or not the expected JSON read as the default.
fn lenient_json<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_default()
}

fn effective_dir(state: &AppState) -> String {
    state
        .config
        .current()
        .root()
        .map(|root| root.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// GET /api/files
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<Track>>> {
    let config = state.config.current();
    let scanner = state.scanner.clone();
    let tracks = run_blocking(move || {
        config
            .root()
            .map(|root| scanner.scan(root))
            .unwrap_or_default()
    })
    .await?;
    Ok(Json(tracks))
}

/// GET /api/status
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusReport>> {
    let store = state.config.clone();
    let report = run_blocking(move || {
        let config = store.current();
        let counts = config
            .root()
            .and_then(|root| summarize(root, SUMMARY_FILE_CAP));
        StatusReport {
            config_path: store.path().map(PathBuf::from),
            config_exists: store.path().is_some_and(|path| path.exists()),
            config_music_directory: store.stored_music_directory(),
            env_music_dir: store.env_music_dir(),
            music_dir_effective: config
                .root()
                .map(|root| root.to_string_lossy().into_owned())
                .unwrap_or_default(),
            music_dir_exists: config.root_exists(),
            supported_audio: AUDIO_EXTENSIONS.iter().map(|ext| format!(".{ext}")).collect(),
            counts,
        }
    })
    .await?;
    Ok(Json(report))
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "config_path": state.config.path().map(|path| path.to_string_lossy().into_owned()),
        "music_directory": state.config.stored_music_directory().unwrap_or_default(),
        "music_dir_effective": effective_dir(&state),
    }))
}

/// POST /api/config/music_directory
pub async fn set_music_directory(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>> {
    let request: MusicDirectoryRequest = lenient_json(&body);
    let raw = request.music_directory.or(request.music_directory_camel);

    let store = state.config.clone();
    let updated = run_blocking(move || store.set_music_directory(raw.as_deref())).await??;

    Ok(Json(json!({
        "ok": true,
        "music_directory": updated.music_directory,
        "music_dir_effective": effective_dir(&state),
    })))
}

/// GET /api/play?path=
pub async fn play_file(
    State(state): State<AppState>,
    Query(query): Query<PlayQuery>,
    request: Request,
) -> Result<Response> {
    let config = state.config.current();
    let path = resolve_request(query.path.as_deref().unwrap_or_default(), config.root())?;

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.into_response())
}

/// GET /api/favorites
pub async fn list_favorites(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let favorites = state.favorites.clone();
    let list = run_blocking(move || favorites.list()).await?;
    Ok(Json(list))
}

/// POST /api/favorites
pub async fn add_favorite(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let entry = checked_favorite_path(&state, &body)?;
    let favorites = state.favorites.clone();
    let list = run_blocking(move || favorites.add(&entry)).await??;
    Ok(Json(json!({ "status": "added", "favorites": list })))
}

/// DELETE /api/favorites
pub async fn remove_favorite(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let entry = checked_favorite_path(&state, &body)?;
    let favorites = state.favorites.clone();
    let list = run_blocking(move || favorites.remove(&entry)).await??;
    Ok(Json(json!({ "status": "removed", "favorites": list })))
}

fn checked_favorite_path(state: &AppState, body: &Bytes) -> Result<String> {
    let request: PathRequest = lenient_json(body);
    let Some(entry) = request.path.filter(|path| !path.is_empty()) else {
        return Err(ApiError::BadRequest("No path provided"));
    };
    let config = state.config.current();
    resolve_request(&entry, config.root())?;
    Ok(entry)
}

/// GET /api/lyrics?song_path=
///
/// Read failures are reported in the body with a 200 status.
pub async fn lyrics(
    State(state): State<AppState>,
    Query(query): Query<LyricsQuery>,
) -> Result<Json<Value>> {
    let Some(song_path) = query.song_path.filter(|path| !path.is_empty()) else {
        return Err(ApiError::BadRequest("No song path"));
    };
    let config = state.config.current();
    let song = resolve_request(&song_path, config.root())?;

    let body = match run_blocking(move || load_sidecar_lines(&song)).await? {
        Ok(lines) => json!({ "lyrics": lines }),
        Err(err) => json!({ "error": err.root_cause().to_string() }),
    };
    Ok(Json(body))
}
