pub mod association;
pub mod bucket;
pub mod config;
pub mod favorites;
pub mod guard;
pub mod library;
pub mod lyrics;
pub mod metadata;
pub mod model;
pub mod server;

pub use guard::is_safe_child;
pub use library::scan;
pub use metadata::read_metadata;
