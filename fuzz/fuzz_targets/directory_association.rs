#![no_main]

use libfuzzer_sys::fuzz_target;
use tune_shelf::association::{cover_for, default_cover, lyric_for};
use tune_shelf::bucket::{DirectoryBucket, stem_of};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let names: Vec<&str> = text
        .split('\n')
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .collect();
    let bucket = DirectoryBucket::from_names("/nonexistent/tune-shelf-fuzz", names);

    let fallback = default_cover(&bucket);
    if let Some(cover) = &fallback {
        assert!(cover.starts_with(&bucket.dir));
    }
    for audio in &bucket.audio {
        let stem = stem_of(audio);
        if let Some(cover) = cover_for(&bucket, stem, fallback.as_ref()) {
            assert!(cover.starts_with(&bucket.dir));
        }
        if let Some(lyric) = lyric_for(&bucket, stem) {
            assert!(lyric_is_listed(&bucket, &lyric));
        }
    }
});

fn lyric_is_listed(bucket: &DirectoryBucket, path: &std::path::Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| bucket.lyrics.iter().any(|lyric| lyric == name))
}
