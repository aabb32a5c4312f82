use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("File not found")]
    NotFound,
    #[error("Forbidden")]
    Forbidden,
}

/// True when `candidate` resolves to `base_dir` itself or to something below
/// it. Both sides are canonicalized first; any failure to do so is a `false`.
pub fn is_safe_child(candidate: &Path, base_dir: &Path) -> bool {
    if candidate.as_os_str().is_empty() || base_dir.as_os_str().is_empty() {
        return false;
    }
    let (Some(candidate), Some(base)) = (canonical(candidate), canonical(base_dir)) else {
        return false;
    };
    // Component-wise, so `/music2` is not under `/music`.
    candidate.starts_with(&base)
}

/// Validates a caller-supplied path against the media root. A path that does
/// not exist is `NotFound` before containment is considered.
pub fn resolve_request(raw: &str, media_root: Option<&Path>) -> Result<PathBuf, AccessError> {
    let candidate = PathBuf::from(raw);
    if raw.is_empty() || !candidate.exists() {
        return Err(AccessError::NotFound);
    }

    let Some(root) = media_root else {
        return Err(AccessError::Forbidden);
    };
    if !is_safe_child(&candidate, root) {
        tracing::debug!(
            "rejecting {} outside media root {}",
            candidate.display(),
            root.display()
        );
        return Err(AccessError::Forbidden);
    }
    Ok(candidate)
}

fn canonical(path: &Path) -> Option<PathBuf> {
    fs::canonicalize(path)
        .ok()
        .map(|resolved| strip_windows_verbatim_prefix(&resolved))
}

pub fn strip_windows_verbatim_prefix(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();

    if let Some(trimmed) = raw.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{trimmed}"));
    }

    if let Some(trimmed) = raw.strip_prefix(r"\\?\") {
        return PathBuf::from(trimmed);
    }

    path.to_path_buf()
}
