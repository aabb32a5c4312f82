//! HTTP facade over the library scanner, path guard and the two JSON stores.

pub mod api;
pub mod error;
pub mod state;

use crate::config::{ConfigStore, ServerSettings};
use crate::favorites::FavoritesStore;
use crate::library::Scanner;
use axum::{
    Router,
    routing::{get, post},
};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use state::AppState;

pub fn create_router(app_state: AppState, ui_dir: &Path) -> Router {
    let api_routes = Router::new()
        .route("/files", get(api::list_files))
        .route("/status", get(api::status))
        .route("/config", get(api::get_config))
        .route("/config/music_directory", post(api::set_music_directory))
        .route("/play", get(api::play_file))
        .route(
            "/favorites",
            get(api::list_favorites)
                .post(api::add_favorite)
                .delete(api::remove_favorite),
        )
        .route("/lyrics", get(api::lyrics));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(ui_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub fn build_state(settings: &ServerSettings) -> AppState {
    AppState::new(
        ConfigStore::open(settings.config_path.clone(), settings.env_music_dir.clone()),
        FavoritesStore::new(&settings.favorites_file),
        Scanner::default(),
    )
}

pub async fn serve(settings: ServerSettings) -> anyhow::Result<()> {
    let app = create_router(build_state(&settings), &settings.ui_dir);

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!("UI directory: {}", settings.ui_dir.display());
    tracing::info!("Favorites file: {}", settings.favorites_file.display());

    axum::serve(listener, app).await?;
    Ok(())
}
