use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "wav", "aac", "m4a", "ogg", "opus", "ape", "wma",
];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg"];
pub const LYRIC_EXTENSION: &str = "lrc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Audio,
    Image,
    Lyric,
}

impl FileKind {
    pub fn classify(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension().and_then(OsStr::to_str)?;
        if AUDIO_EXTENSIONS
            .iter()
            .any(|supported| ext.eq_ignore_ascii_case(supported))
        {
            return Some(Self::Audio);
        }
        if IMAGE_EXTENSIONS
            .iter()
            .any(|supported| ext.eq_ignore_ascii_case(supported))
        {
            return Some(Self::Image);
        }
        ext.eq_ignore_ascii_case(LYRIC_EXTENSION).then_some(Self::Lyric)
    }
}

/// Files of one directory, split by kind. Audio and image names are kept
/// sorted; lyric names stay in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryBucket {
    pub dir: PathBuf,
    pub audio: Vec<String>,
    pub images: Vec<String>,
    pub lyrics: Vec<String>,
}

impl DirectoryBucket {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn from_names<I, S>(dir: impl Into<PathBuf>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut bucket = Self::new(dir);
        for name in names {
            bucket.insert(name.into());
        }
        bucket.sort();
        bucket
    }

    fn insert(&mut self, name: String) {
        match FileKind::classify(&name) {
            Some(FileKind::Audio) => self.audio.push(name),
            Some(FileKind::Image) => self.images.push(name),
            Some(FileKind::Lyric) => self.lyrics.push(name),
            None => {}
        }
    }

    fn sort(&mut self) {
        self.audio.sort();
        self.images.sort();
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty() && self.images.is_empty() && self.lyrics.is_empty()
    }
}

/// One directory of a recursive listing and the plain file names directly in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub dir: PathBuf,
    pub file_names: Vec<String>,
}

/// Groups a listing into buckets, one per directory, preserving the order in
/// which directories first appear. Repeated directories are merged.
pub fn group_listings<I>(listings: I) -> Vec<DirectoryBucket>
where
    I: IntoIterator<Item = DirectoryListing>,
{
    let mut buckets: Vec<DirectoryBucket> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for listing in listings {
        let slot = *index.entry(listing.dir.clone()).or_insert_with(|| {
            buckets.push(DirectoryBucket::new(listing.dir.clone()));
            buckets.len() - 1
        });
        let bucket = &mut buckets[slot];
        for name in listing.file_names {
            bucket.insert(name);
        }
    }

    for bucket in &mut buckets {
        bucket.sort();
    }
    buckets
}

/// Recursively lists `root` without following symlinks. Unreadable entries
/// and subtrees are skipped, as is anything whose path is not valid UTF-8.
pub fn walk_listings(root: &Path) -> Vec<DirectoryListing> {
    let mut listings: Vec<DirectoryListing> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    let mut walker = WalkDir::new(root).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };

        let path = entry.path();
        if path.to_str().is_none() {
            tracing::debug!("skipping non UTF-8 path {}", path.display());
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        if entry.file_type().is_dir() {
            index.entry(path.to_path_buf()).or_insert_with(|| {
                listings.push(DirectoryListing {
                    dir: path.to_path_buf(),
                    file_names: Vec::new(),
                });
                listings.len() - 1
            });
            continue;
        }
        if !is_listed_file(&entry) {
            continue;
        }

        let (Some(parent), Some(name)) = (path.parent(), entry.file_name().to_str()) else {
            continue;
        };
        let slot = *index.entry(parent.to_path_buf()).or_insert_with(|| {
            listings.push(DirectoryListing {
                dir: parent.to_path_buf(),
                file_names: Vec::new(),
            });
            listings.len() - 1
        });
        listings[slot].file_names.push(name.to_string());
    }

    listings
}

/// Every non-directory entry counts as a file, dangling symlinks included.
/// A symlink to a directory is neither descended nor listed.
pub(crate) fn is_listed_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_dir() {
        return false;
    }
    !(entry.path_is_symlink() && entry.path().is_dir())
}

/// Base name with the final extension removed.
pub fn stem_of(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(file_name)
}

/// Lowercase extension including the leading dot, or an empty string.
pub fn dotted_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(FileKind::classify("Song.MP3"), Some(FileKind::Audio));
        assert_eq!(FileKind::classify("b.Opus"), Some(FileKind::Audio));
        assert_eq!(FileKind::classify("Cover.JPEG"), Some(FileKind::Image));
        assert_eq!(FileKind::classify("a.LRC"), Some(FileKind::Lyric));
        assert_eq!(FileKind::classify("notes.txt"), None);
        assert_eq!(FileKind::classify("cover.gif"), None);
        assert_eq!(FileKind::classify("noext"), None);
    }

    #[test]
    fn hidden_file_with_only_a_dot_prefix_has_no_extension() {
        assert_eq!(FileKind::classify(".mp3"), None);
        assert_eq!(dotted_extension(".mp3"), "");
    }

    #[test]
    fn bucket_sorts_audio_and_images() {
        let bucket = DirectoryBucket::from_names(
            "/music/a",
            ["b.mp3", "a.flac", "z.png", "c.jpg", "x.lrc", "readme.md"],
        );
        assert_eq!(bucket.audio, vec!["a.flac", "b.mp3"]);
        assert_eq!(bucket.images, vec!["c.jpg", "z.png"]);
        assert_eq!(bucket.lyrics, vec!["x.lrc"]);
    }

    #[test]
    fn grouping_keeps_first_seen_directory_order() {
        let buckets = group_listings(vec![
            DirectoryListing {
                dir: PathBuf::from("/m"),
                file_names: vec![String::from("notes.txt")],
            },
            DirectoryListing {
                dir: PathBuf::from("/m/b"),
                file_names: vec![String::from("2.mp3")],
            },
            DirectoryListing {
                dir: PathBuf::from("/m/a"),
                file_names: vec![String::from("1.mp3")],
            },
            DirectoryListing {
                dir: PathBuf::from("/m/b"),
                file_names: vec![String::from("1.mp3")],
            },
        ]);

        let dirs: Vec<_> = buckets.iter().map(|b| b.dir.clone()).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/m"),
                PathBuf::from("/m/b"),
                PathBuf::from("/m/a")
            ]
        );
        assert!(buckets[0].is_empty());
        assert_eq!(buckets[1].audio, vec!["1.mp3", "2.mp3"]);
    }

    #[test]
    fn walk_includes_directories_without_files() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("empty")).expect("mkdir empty");
        fs::create_dir_all(dir.path().join("album")).expect("mkdir album");
        fs::write(dir.path().join("album").join("a.mp3"), b"x").expect("write mp3");

        let listings = walk_listings(dir.path());
        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].dir, dir.path());
        assert!(
            listings
                .iter()
                .any(|l| l.dir.ends_with("empty") && l.file_names.is_empty())
        );
        assert!(
            listings
                .iter()
                .any(|l| l.dir.ends_with("album") && l.file_names == vec![String::from("a.mp3")])
        );
    }

    #[cfg(unix)]
    #[test]
    fn walk_skips_directories_with_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().expect("tempdir");
        let bad = dir.path().join(OsStr::from_bytes(b"bad\xffdir"));
        fs::create_dir_all(bad.join("inner")).expect("mkdir bad");
        fs::write(bad.join("a.mp3"), b"x").expect("write nested mp3");
        fs::write(bad.join("inner").join("b.mp3"), b"x").expect("write deep mp3");
        fs::write(dir.path().join("ok.mp3"), b"x").expect("write mp3");
        fs::write(dir.path().join(OsStr::from_bytes(b"n\xfe.mp3")), b"x").expect("write bad name");

        let listings = walk_listings(dir.path());
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].file_names, vec![String::from("ok.mp3")]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlinks_are_listed_and_directory_links_are_not() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().expect("tempdir");
        let album = dir.path().join("album");
        fs::create_dir_all(&album).expect("mkdir album");
        fs::write(album.join("real.mp3"), b"x").expect("write mp3");
        symlink(dir.path().join("gone.mp3"), dir.path().join("dangling.mp3")).expect("link file");
        symlink(&album, dir.path().join("linked")).expect("link dir");

        let listings = walk_listings(dir.path());
        let root = listings
            .iter()
            .find(|l| l.dir == dir.path())
            .expect("root listing");
        assert_eq!(root.file_names, vec![String::from("dangling.mp3")]);
        assert!(listings.iter().all(|l| !l.dir.ends_with("linked")));
    }

    #[test]
    fn stem_and_extension_follow_last_dot() {
        assert_eq!(stem_of("live.2020.flac"), "live.2020");
        assert_eq!(dotted_extension("live.2020.FLAC"), ".flac");
        assert_eq!(stem_of("plain"), "plain");
    }

    proptest::proptest! {
        #[test]
        fn every_kept_name_has_a_known_extension(
            names in proptest::collection::vec(
                "[a-zA-Z]{1,6}\\.(mp3|FLAC|jpg|Png|lrc|txt|gif|m4a)",
                0..40,
            )
        ) {
            let bucket = DirectoryBucket::from_names("/m", names.clone());
            let kept = bucket.audio.len() + bucket.images.len() + bucket.lyrics.len();
            let expected = names.iter().filter(|name| FileKind::classify(name).is_some()).count();
            proptest::prop_assert_eq!(kept, expected);
            proptest::prop_assert!(bucket.audio.windows(2).all(|w| w[0] <= w[1]));
            proptest::prop_assert!(bucket.images.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
