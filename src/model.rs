use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const UNKNOWN_ARTIST: &str = "unknown artist";
pub const UNKNOWN_ALBUM: &str = "unknown album";

/// One audio file in the library together with its resolved cover, lyric and
/// tag associations. Rebuilt from the filesystem on every scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Track {
    pub name: String,
    pub path: PathBuf,
    /// Lowercase extension with its leading dot, e.g. `.flac`.
    #[serde(rename = "type")]
    pub kind: String,
    pub parent: PathBuf,
    pub cover_path: Option<PathBuf>,
    pub lrc_path: Option<PathBuf>,
    pub artist: String,
    pub album: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    pub artist: String,
    pub album: String,
}

impl Default for TrackTags {
    fn default() -> Self {
        Self {
            artist: String::from(UNKNOWN_ARTIST),
            album: String::from(UNKNOWN_ALBUM),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySummary {
    pub total_files_scanned: usize,
    pub audio_by_ext: BTreeMap<String, usize>,
}
