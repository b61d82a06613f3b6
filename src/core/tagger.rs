use std::path::Path;

use lofty::config::WriteOptions;
use lofty::error::{ErrorKind as LoftyErrorKind, LoftyError};
use lofty::file::TaggedFile;
use lofty::picture::{Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ArtworkBlob, TagField, TagSet};

/// 태그 코덱 어댑터.
/// 정규화된 TagSet과 외부 태그 라이브러리의 어휘 사이를 변환만 하고,
/// 실패를 어떻게 보고할지는 호출자가 정한다.
pub trait TagCodec: Send + Sync {
    /// 7개 필드를 모두 읽는다. 값이 없는 필드는 빈 문자열이다.
    fn read_tags(&self, path: &Path) -> Result<TagSet>;
    /// 값이 지정된 필드만 기록하고 파일에 커밋한다.
    fn write_tags(&self, path: &Path, tags: &TagSet) -> Result<()>;
    /// 첫 번째 아트워크를 읽는다. 태그나 그림이 없으면 None.
    fn read_artwork(&self, path: &Path) -> Result<Option<ArtworkBlob>>;
    /// 기존 아트워크를 모두 지우고 새 아트워크를 앞표지로 기록한다.
    fn write_artwork(&self, path: &Path, artwork: &ArtworkBlob) -> Result<()>;
}

/// lofty 기반 코덱. ID3v2, Vorbis comments, MP4 ilst 등 lofty가 아는
/// 모든 컨테이너를 파일의 기본 태그 형식으로 다룬다.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyCodec;

impl TagCodec for LoftyCodec {
    fn read_tags(&self, path: &Path) -> Result<TagSet> {
        let tagged_file = open(path)?;

        let Some(tag) = existing_tag(&tagged_file) else {
            debug!(path = %path.display(), "태그 없음, 빈 TagSet 반환");
            return Ok(TagSet::default().filled());
        };

        let mut tags = TagSet::default();
        for field in TagField::ALL {
            tags.set(field, read_field(tag, field));
        }
        Ok(tags.filled())
    }

    fn write_tags(&self, path: &Path, tags: &TagSet) -> Result<()> {
        let edits = tags
            .present()
            .map(|(field, value)| FieldEdit::plan(path, field, value))
            .collect::<Result<Vec<_>>>()?;

        let mut tagged_file = open(path)?;
        let tag = tag_or_create(&mut tagged_file, path)?;

        for edit in edits {
            edit.apply(tag);
        }

        commit(tag, path)
    }

    fn read_artwork(&self, path: &Path) -> Result<Option<ArtworkBlob>> {
        let tagged_file = open(path)?;

        let Some(tag) = existing_tag(&tagged_file) else {
            return Ok(None);
        };

        let pictures = tag.pictures();
        let picture = pictures
            .iter()
            .find(|pic| pic.pic_type() == PictureType::CoverFront)
            .or_else(|| pictures.first());

        Ok(picture.map(|pic| ArtworkBlob(pic.data().to_vec())))
    }

    fn write_artwork(&self, path: &Path, artwork: &ArtworkBlob) -> Result<()> {
        let mut picture =
            Picture::from_reader(&mut artwork.as_bytes()).map_err(|e| Error::Format {
                path: path.to_path_buf(),
                reason: format!("아트워크를 그림으로 인식할 수 없습니다: {e}"),
            })?;
        picture.set_pic_type(PictureType::CoverFront);

        let mut tagged_file = open(path)?;
        let tag = tag_or_create(&mut tagged_file, path)?;

        let existing: Vec<PictureType> = tag.pictures().iter().map(Picture::pic_type).collect();
        for pic_type in existing {
            tag.remove_picture_type(pic_type);
        }
        tag.push_picture(picture);

        commit(tag, path)
    }
}

/// 정규화 필드를 lofty의 ItemKey로 변환한다.
fn item_key(field: TagField) -> ItemKey {
    match field {
        TagField::Title => ItemKey::TrackTitle,
        TagField::Album => ItemKey::AlbumTitle,
        TagField::Artist => ItemKey::TrackArtist,
        TagField::Genre => ItemKey::Genre,
        TagField::Year => ItemKey::RecordingDate,
        TagField::Disc => ItemKey::DiscNumber,
        TagField::Track => ItemKey::TrackNumber,
    }
}

/// 트랙/디스크 번호와 전체 개수 항목.
fn position_keys(field: TagField) -> Option<(ItemKey, ItemKey)> {
    match field {
        TagField::Track => Some((ItemKey::TrackNumber, ItemKey::TrackTotal)),
        TagField::Disc => Some((ItemKey::DiscNumber, ItemKey::DiscTotal)),
        _ => None,
    }
}

/// 필드 값을 담을 수 있는 모든 항목. 필드를 비울 때 전부 지운다.
fn field_keys(field: TagField) -> Vec<ItemKey> {
    match (field, position_keys(field)) {
        (_, Some((number, total))) => vec![number, total],
        (TagField::Year, None) => vec![ItemKey::RecordingDate, ItemKey::Year],
        (field, None) => vec![item_key(field)],
    }
}

/// 필드의 첫 번째 값을 읽는다. 연도는 녹음 날짜가 없으면 Year 항목을 본다.
/// 트랙/디스크는 전체 개수가 있으면 `N/M`으로 합친다.
fn read_field(tag: &Tag, field: TagField) -> Option<String> {
    if let Some((number_key, total_key)) = position_keys(field) {
        let number = tag.get_string(&number_key)?;
        return Some(match tag.get_string(&total_key) {
            Some(total) => format!("{number}/{total}"),
            None => number.to_string(),
        });
    }

    tag.get_string(&item_key(field))
        .or_else(|| match field {
            TagField::Year => tag.get_string(&ItemKey::Year),
            _ => None,
        })
        .map(|s| s.to_string())
}

/// `N` 또는 `N/M` 형식의 트랙/디스크 값을 숫자로 나눈다.
fn parse_position(value: &str) -> Option<(u32, Option<u32>)> {
    let (number, total) = match value.split_once('/') {
        Some((number, total)) => (number, Some(total)),
        None => (value, None),
    };
    let parse = |s: &str| {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u32>().ok()
    };

    let total = match total {
        Some(total) => Some(parse(total)?),
        None => None,
    };
    Some((parse(number)?, total))
}

/// 한 필드를 태그에 반영하는 방법. 값 검증은 파일을 열기 전에 끝낸다.
#[derive(Debug)]
struct FieldEdit {
    remove: Vec<ItemKey>,
    insert: Vec<(ItemKey, String)>,
}

impl FieldEdit {
    /// 빈 문자열은 필드를 지운다. 트랙/디스크는 다시 읽었을 때 같은 값이
    /// 나오는 숫자 형식만 받고, 나머지는 `Error::Format`으로 거절한다.
    fn plan(path: &Path, field: TagField, value: &str) -> Result<Self> {
        if value.is_empty() {
            return Ok(Self {
                remove: field_keys(field),
                insert: Vec::new(),
            });
        }

        if let Some((number_key, total_key)) = position_keys(field) {
            let (number, total) = parse_position(value).ok_or_else(|| Error::Format {
                path: path.to_path_buf(),
                reason: format!("{} 값은 숫자 또는 \"숫자/숫자\" 형식이어야 합니다: {value:?}", field.key()),
            })?;

            let mut edit = Self {
                remove: Vec::new(),
                insert: vec![(number_key, number.to_string())],
            };
            match total {
                Some(total) => edit.insert.push((total_key, total.to_string())),
                None => edit.remove.push(total_key),
            }
            return Ok(edit);
        }

        let remove = match field {
            TagField::Year => vec![ItemKey::Year],
            _ => Vec::new(),
        };
        Ok(Self {
            remove,
            insert: vec![(item_key(field), value.to_string())],
        })
    }

    fn apply(self, tag: &mut Tag) {
        for key in &self.remove {
            tag.remove_key(key);
        }
        for (key, value) in self.insert {
            tag.insert_text(key, value);
        }
    }
}

fn open(path: &Path) -> Result<TaggedFile> {
    let probe = Probe::open(path)
        .map_err(|source| classify(path, source))?
        .guess_file_type()
        .map_err(|source| Error::io(path, source))?;

    probe.read().map_err(|source| classify(path, source))
}

/// 기본 태그를 우선하고, 없으면 파일에 있는 아무 태그나 쓴다.
fn existing_tag(tagged_file: &TaggedFile) -> Option<&Tag> {
    tagged_file.primary_tag().or_else(|| tagged_file.first_tag())
}

/// 기본 태그 형식의 태그를 가져오거나 새로 만든다.
/// 새로 만들 때 파일에 다른 형식의 태그가 있으면 그 항목과 그림을 옮겨 담아,
/// 이번에 쓰지 않은 필드가 읽기 결과에서 사라지지 않게 한다.
fn tag_or_create<'a>(tagged_file: &'a mut TaggedFile, path: &Path) -> Result<&'a mut Tag> {
    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.tag(tag_type).is_none() {
        let mut tag = Tag::new(tag_type);
        if let Some(existing) = tagged_file.first_tag() {
            debug!(
                path = %path.display(),
                from = ?existing.tag_type(),
                to = ?tag_type,
                "기존 태그 내용으로 새 태그 생성"
            );
            seed_from(&mut tag, existing);
        } else {
            debug!(path = %path.display(), ?tag_type, "태그 컨테이너 생성");
        }
        tagged_file.insert_tag(tag);
    }
    tagged_file.tag_mut(tag_type).ok_or_else(|| Error::Format {
        path: path.to_path_buf(),
        reason: format!("{tag_type:?} 태그를 지원하지 않는 파일입니다"),
    })
}

/// 대상 형식이 담을 수 있는 항목과 모든 그림을 복사한다.
fn seed_from(tag: &mut Tag, existing: &Tag) {
    for item in existing.items() {
        tag.insert(item.clone());
    }
    for picture in existing.pictures() {
        tag.push_picture(picture.clone());
    }
}

fn commit(tag: &Tag, path: &Path) -> Result<()> {
    tag.save_to_path(path, WriteOptions::default())
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn classify(path: &Path, source: LoftyError) -> Error {
    match source.kind() {
        LoftyErrorKind::UnknownFormat => Error::Format {
            path: path.to_path_buf(),
            reason: source.to_string(),
        },
        _ => Error::Read {
            path: path.to_path_buf(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures;
    use crate::error::ErrorKind;

    fn tags(pairs: &[(TagField, &str)]) -> TagSet {
        let mut tags = TagSet::default();
        for (field, value) in pairs {
            tags.set(*field, Some(value.to_string()));
        }
        tags
    }

    #[test]
    fn test_read_untagged_file_gives_empty_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::wav(dir.path(), "blank.wav");

        let read = LoftyCodec.read_tags(&path).unwrap();
        assert_eq!(read, TagSet::default().filled());
    }

    #[test]
    fn test_partial_write_keeps_existing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::wav(dir.path(), "song.wav");

        LoftyCodec
            .write_tags(&path, &tags(&[(TagField::Album, "Old Album")]))
            .unwrap();
        LoftyCodec
            .write_tags(
                &path,
                &tags(&[(TagField::Title, "Song A"), (TagField::Year, "2020")]),
            )
            .unwrap();

        let read = LoftyCodec.read_tags(&path).unwrap();
        assert_eq!(read.title.as_deref(), Some("Song A"));
        assert_eq!(read.album.as_deref(), Some("Old Album"));
        assert_eq!(read.year.as_deref(), Some("2020"));
        assert_eq!(read.artist.as_deref(), Some(""));
        assert_eq!(read.genre.as_deref(), Some(""));
        assert_eq!(read.disc.as_deref(), Some(""));
        assert_eq!(read.track.as_deref(), Some(""));
    }

    #[test]
    fn test_repeated_write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::wav(dir.path(), "song.wav");
        let input = tags(&[
            (TagField::Artist, "IU"),
            (TagField::Genre, "Ballad"),
            (TagField::Track, "3"),
            (TagField::Disc, "1"),
        ]);

        LoftyCodec.write_tags(&path, &input).unwrap();
        let first = LoftyCodec.read_tags(&path).unwrap();
        LoftyCodec.write_tags(&path, &input).unwrap();
        let second = LoftyCodec.read_tags(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.artist.as_deref(), Some("IU"));
        assert_eq!(second.track.as_deref(), Some("3"));
        assert_eq!(second.disc.as_deref(), Some("1"));
    }

    #[test]
    fn test_other_tag_fields_survive_first_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::riff_info_wav(dir.path(), "info.wav", "Old Album");
        assert_eq!(
            LoftyCodec.read_tags(&path).unwrap().album.as_deref(),
            Some("Old Album")
        );

        LoftyCodec
            .write_tags(&path, &tags(&[(TagField::Title, "Song A")]))
            .unwrap();

        let read = LoftyCodec.read_tags(&path).unwrap();
        assert_eq!(read.title.as_deref(), Some("Song A"));
        assert_eq!(read.album.as_deref(), Some("Old Album"));
    }

    #[test]
    fn test_other_tag_fields_survive_artwork_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::riff_info_wav(dir.path(), "info.wav", "Old Album");
        let cover = ArtworkBlob(fixtures::png_bytes(8, 8));

        LoftyCodec.write_artwork(&path, &cover).unwrap();

        assert_eq!(LoftyCodec.read_artwork(&path).unwrap(), Some(cover));
        assert_eq!(
            LoftyCodec.read_tags(&path).unwrap().album.as_deref(),
            Some("Old Album")
        );
    }

    #[test]
    fn test_empty_value_clears_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::wav(dir.path(), "song.wav");

        LoftyCodec
            .write_tags(
                &path,
                &tags(&[
                    (TagField::Title, "X"),
                    (TagField::Year, "2020"),
                    (TagField::Track, "3/12"),
                    (TagField::Artist, "IU"),
                ]),
            )
            .unwrap();
        LoftyCodec
            .write_tags(
                &path,
                &tags(&[
                    (TagField::Title, ""),
                    (TagField::Year, ""),
                    (TagField::Track, ""),
                ]),
            )
            .unwrap();

        let read = LoftyCodec.read_tags(&path).unwrap();
        assert_eq!(read.title.as_deref(), Some(""));
        assert_eq!(read.year.as_deref(), Some(""));
        assert_eq!(read.track.as_deref(), Some(""));
        assert_eq!(read.artist.as_deref(), Some("IU"));
    }

    #[test]
    fn test_track_with_total_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::wav(dir.path(), "song.wav");

        LoftyCodec
            .write_tags(
                &path,
                &tags(&[(TagField::Track, "3/12"), (TagField::Disc, "1/2")]),
            )
            .unwrap();
        let read = LoftyCodec.read_tags(&path).unwrap();
        assert_eq!(read.track.as_deref(), Some("3/12"));
        assert_eq!(read.disc.as_deref(), Some("1/2"));

        LoftyCodec
            .write_tags(&path, &tags(&[(TagField::Track, "4")]))
            .unwrap();
        assert_eq!(LoftyCodec.read_tags(&path).unwrap().track.as_deref(), Some("4"));
    }

    #[test]
    fn test_unstorable_position_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::wav(dir.path(), "song.wav");
        LoftyCodec
            .write_tags(&path, &tags(&[(TagField::Disc, "1")]))
            .unwrap();

        for value in ["A1", "3/", "/12", "1/x", "-2"] {
            let err = LoftyCodec
                .write_tags(
                    &path,
                    &tags(&[(TagField::Disc, value), (TagField::Title, "t")]),
                )
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{value}");
        }

        let read = LoftyCodec.read_tags(&path).unwrap();
        assert_eq!(read.disc.as_deref(), Some("1"));
        assert_eq!(read.title.as_deref(), Some(""));
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("3"), Some((3, None)));
        assert_eq!(parse_position("3/12"), Some((3, Some(12))));
        assert_eq!(parse_position(" 03 / 12 "), Some((3, Some(12))));
        assert_eq!(parse_position("A1"), None);
        assert_eq!(parse_position("1/2/3"), None);
        assert_eq!(parse_position("99999999999"), None);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoftyCodec
            .read_tags(&dir.path().join("missing.wav"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Read);
    }

    #[test]
    fn test_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.bin");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let err = LoftyCodec
            .write_tags(&path, &tags(&[(TagField::Title, "x")]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_artwork_round_trip_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::wav(dir.path(), "song.wav");

        assert_eq!(LoftyCodec.read_artwork(&path).unwrap(), None);

        let first = ArtworkBlob(fixtures::png_bytes(8, 8));
        let second = ArtworkBlob(fixtures::png_bytes(16, 4));
        LoftyCodec.write_artwork(&path, &first).unwrap();
        LoftyCodec.write_artwork(&path, &second).unwrap();

        assert_eq!(LoftyCodec.read_artwork(&path).unwrap(), Some(second));
    }
}
