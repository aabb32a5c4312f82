use crate::association::{cover_for, default_cover, lyric_for};
use crate::bucket::{
    AUDIO_EXTENSIONS, DirectoryBucket, dotted_extension, group_listings, is_listed_file, stem_of,
    walk_listings,
};
use crate::metadata::MetadataReader;
use crate::model::{LibrarySummary, Track};
use std::path::Path;
use walkdir::WalkDir;

pub const SUMMARY_FILE_CAP: usize = 20_000;

/// Walks a media root and turns every supported audio file into a [`Track`].
pub struct Scanner {
    metadata: MetadataReader,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(MetadataReader::default())
    }
}

impl Scanner {
    pub fn new(metadata: MetadataReader) -> Self {
        Self { metadata }
    }

    /// Tracks in walk order by directory, sorted by file name within one.
    /// An empty or missing root, or one that is not a directory, gives an
    /// empty list.
    pub fn scan(&self, root: &Path) -> Vec<Track> {
        if !is_usable_root(root) {
            return Vec::new();
        }

        let buckets = group_listings(walk_listings(root));
        let mut tracks = Vec::new();
        for bucket in &buckets {
            self.emit_bucket(bucket, &mut tracks);
        }

        tracing::debug!(
            "scanned {} directories under {}, {} tracks",
            buckets.len(),
            root.display(),
            tracks.len()
        );
        tracks
    }

    fn emit_bucket(&self, bucket: &DirectoryBucket, out: &mut Vec<Track>) {
        if bucket.audio.is_empty() {
            return;
        }

        let default = default_cover(bucket);
        for name in &bucket.audio {
            let stem = stem_of(name);
            let path = bucket.dir.join(name);
            let tags = self.metadata.read(&path);

            out.push(Track {
                name: name.clone(),
                kind: dotted_extension(name),
                parent: bucket.dir.clone(),
                cover_path: cover_for(bucket, stem, default.as_ref()),
                lrc_path: lyric_for(bucket, stem),
                artist: tags.artist,
                album: tags.album,
                path,
            });
        }
    }
}

/// Scans with the default tag reader chain.
pub fn scan(root: &Path) -> Vec<Track> {
    Scanner::default().scan(root)
}

/// Counts files under `root`, stopping once `cap` files have been seen, and
/// tallies supported audio extensions. `None` when the root is unusable.
pub fn summarize(root: &Path, cap: usize) -> Option<LibrarySummary> {
    if !is_usable_root(root) {
        return None;
    }

    let mut summary = LibrarySummary {
        total_files_scanned: 0,
        audio_by_ext: AUDIO_EXTENSIONS
            .iter()
            .map(|ext| (format!(".{ext}"), 0))
            .collect(),
    };

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if summary.total_files_scanned >= cap {
            break;
        }
        if !is_listed_file(&entry) {
            continue;
        }

        summary.total_files_scanned += 1;
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some(count) = summary.audio_by_ext.get_mut(&dotted_extension(name)) {
            *count += 1;
        }
    }

    Some(summary)
}

fn is_usable_root(root: &Path) -> bool {
    !root.as_os_str().is_empty() && root.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn scan_filters_non_audio_files() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("a.mp3"), b"x").expect("write mp3");
        fs::write(dir.path().join("b.txt"), b"x").expect("write txt");

        let tracks = scan(dir.path());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "a.mp3");
        assert_eq!(tracks[0].kind, ".mp3");
        assert_eq!(tracks[0].parent, dir.path());
        assert_eq!(tracks[0].artist, "unknown artist");
        assert_eq!(tracks[0].album, "unknown album");
        assert_eq!(tracks[0].cover_path, None);
        assert_eq!(tracks[0].lrc_path, None);
    }

    #[test]
    fn only_non_audio_files_gives_empty_scan() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("cover.jpg"), b"x").expect("write jpg");
        fs::write(dir.path().join("a.lrc"), b"x").expect("write lrc");
        assert!(scan(dir.path()).is_empty());
    }

    #[test]
    fn missing_and_empty_roots_give_empty_scan() {
        assert!(scan(Path::new("/definitely/not/a/music/root")).is_empty());
        assert!(scan(Path::new("")).is_empty());
    }

    #[test]
    fn file_as_root_gives_empty_scan_and_no_summary() {
        let dir = tempdir().expect("tempdir");
        let song = dir.path().join("song.mp3");
        fs::write(&song, b"x").expect("write mp3");

        assert!(scan(&song).is_empty());
        assert_eq!(summarize(&song, SUMMARY_FILE_CAP), None);
    }

    #[test]
    fn tracks_in_a_directory_are_sorted() {
        let dir = tempdir().expect("tempdir");
        for name in ["c.ogg", "a.flac", "B.mp3"] {
            fs::write(dir.path().join(name), b"x").expect("write audio");
        }
        let names: Vec<_> = scan(dir.path()).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["B.mp3", "a.flac", "c.ogg"]);
    }

    #[test]
    fn associations_are_resolved_per_track() {
        let dir = tempdir().expect("tempdir");
        let album = dir.path().join("album");
        fs::create_dir_all(&album).expect("mkdir");
        for name in ["01.mp3", "02.mp3", "folder.jpg", "02.PNG", "01.lrc", "other.lrc"] {
            fs::write(album.join(name), b"x").expect("write file");
        }

        let tracks = scan(dir.path());
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].cover_path, Some(album.join("folder.jpg")));
        assert_eq!(tracks[0].lrc_path, Some(album.join("01.lrc")));
        assert_eq!(tracks[1].cover_path, Some(album.join("02.PNG")));
        assert_eq!(tracks[1].lrc_path, None);
    }

    #[test]
    fn summary_counts_audio_by_extension() {
        let dir = tempdir().expect("tempdir");
        for name in ["a.mp3", "b.MP3", "c.flac", "d.txt"] {
            fs::write(dir.path().join(name), b"x").expect("write file");
        }

        let summary = summarize(dir.path(), SUMMARY_FILE_CAP).expect("summary");
        assert_eq!(summary.total_files_scanned, 4);
        assert_eq!(summary.audio_by_ext[".mp3"], 2);
        assert_eq!(summary.audio_by_ext[".flac"], 1);
        assert_eq!(summary.audio_by_ext[".wma"], 0);
    }

    #[test]
    fn summary_stops_at_cap() {
        let dir = tempdir().expect("tempdir");
        for idx in 0..10 {
            fs::write(dir.path().join(format!("{idx}.mp3")), b"x").expect("write file");
        }

        let summary = summarize(dir.path(), 3).expect("summary");
        assert_eq!(summary.total_files_scanned, 3);
        assert_eq!(summary.audio_by_ext[".mp3"], 3);
    }

    #[test]
    fn summary_is_none_for_missing_root() {
        assert_eq!(summarize(&PathBuf::from("/no/such/root"), 10), None);
    }
}
