use crate::config::ConfigStore;
use crate::favorites::FavoritesStore;
use crate::library::Scanner;
use std::sync::Arc;

/// Shared by every handler. The stores serialize their own writes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub favorites: Arc<FavoritesStore>,
    pub scanner: Arc<Scanner>,
}

impl AppState {
    pub fn new(config: ConfigStore, favorites: FavoritesStore, scanner: Scanner) -> Self {
        Self {
            config: Arc::new(config),
            favorites: Arc::new(favorites),
            scanner: Arc::new(scanner),
        }
    }
}
