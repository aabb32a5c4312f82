use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `<track without extension>.lrc` next to the track.
pub fn sidecar_lrc_path(track_path: &Path) -> PathBuf {
    track_path.with_extension("lrc")
}

/// Non-blank lines of the sidecar lyric file, verbatim. `\n`, `\r\n` and a
/// bare `\r` all end a line. Timestamps are left for the client. A missing
/// sidecar is an empty list.
pub fn load_sidecar_lines(track_path: &Path) -> Result<Vec<String>> {
    let lrc_path = sidecar_lrc_path(track_path);
    if !lrc_path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(&lrc_path)
        .with_context(|| format!("failed to read lyrics file {}", lrc_path.display()))?;
    Ok(raw
        .split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty())
        .map(ToOwned::to_owned)
        .collect())
}
