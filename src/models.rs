use serde::{Deserialize, Serialize};

/// 정규화된 태그 필드 목록. 순서는 읽기 결과의 출력 순서와 같다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagField {
    Title,
    Album,
    Artist,
    Genre,
    Year,
    Disc,
    Track,
}

impl TagField {
    pub const ALL: [TagField; 7] = [
        TagField::Title,
        TagField::Album,
        TagField::Artist,
        TagField::Genre,
        TagField::Year,
        TagField::Disc,
        TagField::Track,
    ];

    /// 브리지 인자와 응답 맵에서 쓰는 키.
    pub fn key(self) -> &'static str {
        match self {
            TagField::Title => "title",
            TagField::Album => "album",
            TagField::Artist => "artist",
            TagField::Genre => "genre",
            TagField::Year => "year",
            TagField::Disc => "disc",
            TagField::Track => "track",
        }
    }

    /// 이전 클라이언트가 보내는 `tagsTitle` 형태의 키.
    pub fn legacy_key(self) -> &'static str {
        match self {
            TagField::Title => "tagsTitle",
            TagField::Album => "tagsAlbum",
            TagField::Artist => "tagsArtist",
            TagField::Genre => "tagsGenre",
            TagField::Year => "tagsYear",
            TagField::Disc => "tagsDisc",
            TagField::Track => "tagsTrack",
        }
    }
}

/// 요청 하나 동안만 존재하는 7개 필드 메타데이터.
/// 쓰기 시 `None` 필드는 기존 값을 건드리지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
}

impl TagSet {
    pub fn get(&self, field: TagField) -> Option<&str> {
        match field {
            TagField::Title => self.title.as_deref(),
            TagField::Album => self.album.as_deref(),
            TagField::Artist => self.artist.as_deref(),
            TagField::Genre => self.genre.as_deref(),
            TagField::Year => self.year.as_deref(),
            TagField::Disc => self.disc.as_deref(),
            TagField::Track => self.track.as_deref(),
        }
    }

    pub fn set(&mut self, field: TagField, value: Option<String>) {
        let slot = match field {
            TagField::Title => &mut self.title,
            TagField::Album => &mut self.album,
            TagField::Artist => &mut self.artist,
            TagField::Genre => &mut self.genre,
            TagField::Year => &mut self.year,
            TagField::Disc => &mut self.disc,
            TagField::Track => &mut self.track,
        };
        *slot = value;
    }

    /// 값이 지정된 필드만 순회한다.
    pub fn present(&self) -> impl Iterator<Item = (TagField, &str)> {
        TagField::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    /// 읽기 결과 형태로 변환한다. 값이 없는 필드는 빈 문자열이 된다.
    pub fn filled(&self) -> TagSet {
        let mut filled = TagSet::default();
        for field in TagField::ALL {
            filled.set(field, Some(self.get(field).unwrap_or_default().to_string()));
        }
        filled
    }
}

/// 태그에 포함된 이미지 한 장. 형식은 바이트 자체로 판별한다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkBlob(pub Vec<u8>);

impl ArtworkBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn mime_type(&self) -> &'static str {
        detect_mime_type(&self.0)
    }
}

/// 이미지 바이너리의 매직 바이트로 MIME 타입을 판별한다.
pub fn detect_mime_type(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Gif) => "image/gif",
        Ok(image::ImageFormat::Bmp) => "image/bmp",
        Ok(image::ImageFormat::WebP) => "image/webp",
        _ => "image/jpeg",
    }
}

/// 원본 이미지 안의 정사각형 잘라내기 영역.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
