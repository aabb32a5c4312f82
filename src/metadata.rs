use crate::model::{TrackTags, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, TagType};
use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::{MetadataOptions, MetadataRevision, StandardTagKey};
use symphonia::core::probe::Hint;
use symphonia::default::get_probe;

const ARTIST_KEYS: &[&str] = &["artist", "tpe1", "author"];
const ALBUM_KEYS: &[&str] = &["album", "talb", "wm/albumtitle"];

/// Tag values keyed by lowercase names, in the order a reader found them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: Vec<(String, String)>,
}

impl TagSet {
    pub fn push(&mut self, key: &str, value: &str) {
        let trimmed = value.trim_matches('\0').trim();
        if trimmed.is_empty() {
            return;
        }
        self.entries.push((key.to_ascii_lowercase(), trimmed.to_string()));
    }

    /// Value of the first key in `keys` that is present.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| {
            self.entries
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One stage of the tag-reading fallback chain. `None` hands the file to the
/// next reader.
pub trait TagReader: Send + Sync {
    fn name(&self) -> &'static str;
    fn read(&self, path: &Path) -> Option<TagSet>;
}

/// Format-aware reader: ID3v2 for mp3, the primary tag otherwise.
pub struct LoftyReader;

impl TagReader for LoftyReader {
    fn name(&self) -> &'static str {
        "lofty"
    }

    fn read(&self, path: &Path) -> Option<TagSet> {
        let tagged_file = Probe::open(path).and_then(|probe| probe.read()).ok()?;
        let tag = preferred_tag_type_for_path(path)
            .and_then(|tag_type| tagged_file.tag(tag_type))
            .or_else(|| tagged_file.primary_tag())
            .or_else(|| tagged_file.first_tag())?;

        let mut tags = TagSet::default();
        if let Some(artist) = tag.artist() {
            tags.push("artist", &artist);
        }
        if let Some(album) = tag.album() {
            tags.push("album", &album);
        }
        Some(tags)
    }
}

/// Generic container probe; also exposes raw frame keys such as `TPE1`.
pub struct SymphoniaReader;

impl TagReader for SymphoniaReader {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn read(&self, path: &Path) -> Option<TagSet> {
        let file = File::open(path).ok()?;
        let source = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(OsStr::to_str) {
            hint.with_extension(extension);
        }

        let mut probed = get_probe()
            .format(
                &hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .ok()?;

        let mut tags = TagSet::default();
        let mut collect = |revision: &MetadataRevision| {
            for tag in revision.tags() {
                let value = tag.value.to_string();
                match tag.std_key {
                    Some(StandardTagKey::Artist) => tags.push("artist", &value),
                    Some(StandardTagKey::Album) => tags.push("album", &value),
                    _ => {}
                }
                tags.push(&tag.key, &value);
            }
        };

        // Tags found while probing (e.g. a leading ID3 block) live outside the
        // container's own metadata log.
        if let Some(metadata) = probed.metadata.get()
            && let Some(revision) = metadata.current()
        {
            collect(revision);
        }
        let metadata = probed.format.metadata();
        if let Some(revision) = metadata.current() {
            collect(revision);
        }

        Some(tags)
    }
}

/// Last resort: walks ID3v2 text frames straight from the file header.
pub struct Id3FrameReader;

impl TagReader for Id3FrameReader {
    fn name(&self) -> &'static str {
        "id3-frames"
    }

    fn read(&self, path: &Path) -> Option<TagSet> {
        let mut file = File::open(path).ok()?;
        let mut header = [0u8; 10];
        file.read_exact(&mut header).ok()?;
        if !header.starts_with(b"ID3") {
            return None;
        }
        let major_version = header[3];
        let size = synchsafe(&header[6..10]);
        let mut tag_bytes = Vec::new();
        file.take(size as u64).read_to_end(&mut tag_bytes).ok()?;
        if tag_bytes.len() < size {
            return None;
        }

        let mut tags = TagSet::default();
        for (frame_id, payload) in Id3Frames::new(&tag_bytes, major_version) {
            let key = match frame_id {
                "TPE1" | "TP1" => "tpe1",
                "TALB" | "TAL" => "talb",
                _ => continue,
            };
            tags.push(key, &decode_id3_text(payload));
        }
        Some(tags)
    }
}

/// Ordered chain of [`TagReader`]s. The first reader that yields any tags
/// decides both fields.
pub struct MetadataReader {
    chain: Vec<Box<dyn TagReader>>,
}

impl Default for MetadataReader {
    fn default() -> Self {
        Self::with_chain(vec![
            Box::new(LoftyReader),
            Box::new(SymphoniaReader),
            Box::new(Id3FrameReader),
        ])
    }
}

impl MetadataReader {
    pub fn with_chain(chain: Vec<Box<dyn TagReader>>) -> Self {
        Self { chain }
    }

    pub fn read(&self, path: &Path) -> TrackTags {
        let Some(tags) = self.first_tags(path) else {
            return TrackTags::default();
        };

        TrackTags {
            artist: tags
                .first_of(ARTIST_KEYS)
                .unwrap_or(UNKNOWN_ARTIST)
                .to_string(),
            album: tags
                .first_of(ALBUM_KEYS)
                .unwrap_or(UNKNOWN_ALBUM)
                .to_string(),
        }
    }

    fn first_tags(&self, path: &Path) -> Option<TagSet> {
        self.chain.iter().find_map(|reader| {
            // Tag parsers can panic on malformed input.
            let attempt = panic::catch_unwind(AssertUnwindSafe(|| reader.read(path)));
            match attempt {
                Ok(Some(tags)) if !tags.is_empty() => Some(tags),
                Ok(_) => {
                    tracing::trace!("{} found no tags in {}", reader.name(), path.display());
                    None
                }
                Err(_) => {
                    tracing::debug!("{} panicked reading {}", reader.name(), path.display());
                    None
                }
            }
        })
    }
}

/// Reads (artist, album) with the default reader chain. Never fails.
pub fn read_metadata(path: &Path) -> TrackTags {
    MetadataReader::default().read(path)
}

fn preferred_tag_type_for_path(path: &Path) -> Option<TagType> {
    let ext = path.extension().and_then(OsStr::to_str)?;
    if ext.eq_ignore_ascii_case("mp3") {
        return Some(TagType::Id3v2);
    }
    if ext.eq_ignore_ascii_case("flac")
        || ext.eq_ignore_ascii_case("ogg")
        || ext.eq_ignore_ascii_case("opus")
    {
        return Some(TagType::VorbisComments);
    }
    if ext.eq_ignore_ascii_case("m4a") {
        return Some(TagType::Mp4Ilst);
    }
    None
}

fn synchsafe(bytes: &[u8]) -> usize {
    (((bytes[0] as u32) & 0x7f) << 21
        | ((bytes[1] as u32) & 0x7f) << 14
        | ((bytes[2] as u32) & 0x7f) << 7
        | ((bytes[3] as u32) & 0x7f)) as usize
}

/// Iterator over `(frame id, payload)` pairs of an ID3v2 tag body.
struct Id3Frames<'a> {
    bytes: &'a [u8],
    major_version: u8,
    pos: usize,
}

impl<'a> Id3Frames<'a> {
    fn new(bytes: &'a [u8], major_version: u8) -> Self {
        Self {
            bytes,
            major_version,
            pos: 0,
        }
    }
}

impl<'a> Iterator for Id3Frames<'a> {
    type Item = (&'a str, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.bytes;
        let pos = self.pos;
        let (frame_id, frame_size, data_start) = if self.major_version == 2 {
            if pos + 6 > bytes.len() {
                return None;
            }
            let frame_id = std::str::from_utf8(&bytes[pos..pos + 3]).unwrap_or("");
            let size = &bytes[pos + 3..pos + 6];
            let frame_size =
                ((size[0] as u32) << 16 | (size[1] as u32) << 8 | (size[2] as u32)) as usize;
            (frame_id, frame_size, pos + 6)
        } else {
            if pos + 10 > bytes.len() {
                return None;
            }
            let frame_id = std::str::from_utf8(&bytes[pos..pos + 4]).unwrap_or("");
            let size = &bytes[pos + 4..pos + 8];
            let frame_size = if self.major_version == 4 {
                synchsafe(size)
            } else {
                u32::from_be_bytes([size[0], size[1], size[2], size[3]]) as usize
            };
            (frame_id, frame_size, pos + 10)
        };

        if frame_id.trim_matches('\0').is_empty() || frame_size == 0 {
            return None;
        }

        let data_end = data_start.checked_add(frame_size)?;
        if data_end > bytes.len() {
            return None;
        }
        self.pos = data_end;
        Some((frame_id, &bytes[data_start..data_end]))
    }
}

fn decode_id3_text(payload: &[u8]) -> String {
    if payload.is_empty() {
        return String::new();
    }

    let encoding = payload[0];
    let bytes = &payload[1..];

    let text = match encoding {
        0 => bytes.iter().map(|b| char::from(*b)).collect::<String>(),
        1 => decode_utf16_with_bom(bytes),
        2 => decode_utf16(bytes, true),
        3 => String::from_utf8_lossy(bytes).into_owned(),
        _ => String::from_utf8_lossy(payload).into_owned(),
    };

    text.trim_matches('\0').trim().to_string()
}

fn decode_utf16_with_bom(bytes: &[u8]) -> String {
    if bytes.len() >= 2 {
        if bytes[0] == 0xFE && bytes[1] == 0xFF {
            return decode_utf16(&bytes[2..], true);
        }
        if bytes[0] == 0xFF && bytes[1] == 0xFE {
            return decode_utf16(&bytes[2..], false);
        }
    }
    decode_utf16(bytes, false)
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .take_while(|unit| *unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
