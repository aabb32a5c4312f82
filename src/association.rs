use crate::bucket::{DirectoryBucket, LYRIC_EXTENSION, stem_of};
use std::path::PathBuf;

const COVER_HINTS: &[&str] = &["cover", "folder", "front"];

/// Directory-level cover: the first sorted image whose name carries a cover
/// hint, otherwise the first sorted image.
pub fn default_cover(bucket: &DirectoryBucket) -> Option<PathBuf> {
    bucket
        .images
        .iter()
        .find(|image| {
            let lower = image.to_lowercase();
            COVER_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .or_else(|| bucket.images.first())
        .map(|image| bucket.dir.join(image))
}

/// Image sharing the track's base name (case-insensitive), else the default.
pub fn cover_for(
    bucket: &DirectoryBucket,
    audio_stem: &str,
    default_cover: Option<&PathBuf>,
) -> Option<PathBuf> {
    bucket
        .images
        .iter()
        .find(|image| same_stem(image, audio_stem))
        .map(|image| bucket.dir.join(image))
        .or_else(|| default_cover.cloned())
}

/// A literal `<stem>.lrc` sibling on disk wins; otherwise the bucket's lyric
/// files are searched for a case-insensitive base-name match.
pub fn lyric_for(bucket: &DirectoryBucket, audio_stem: &str) -> Option<PathBuf> {
    let literal = bucket.dir.join(format!("{audio_stem}.{LYRIC_EXTENSION}"));
    if literal.exists() {
        return Some(literal);
    }

    bucket
        .lyrics
        .iter()
        .find(|lyric| same_stem(lyric, audio_stem))
        .map(|lyric| bucket.dir.join(lyric))
}

fn same_stem(file_name: &str, audio_stem: &str) -> bool {
    stem_of(file_name).to_lowercase() == audio_stem.to_lowercase()
}
