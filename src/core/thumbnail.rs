use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageFormat;
use tracing::{debug, info};

use crate::config::{ThumbnailConfig, ThumbnailMode};
use crate::core::artwork;
use crate::core::tagger::TagCodec;
use crate::error::Result;

/// 썸네일 생성 전략. 시작 시 한 번 고르고 요청마다 다시 판단하지 않는다.
pub trait Thumbnailer: Send + Sync {
    fn name(&self) -> &'static str;

    /// 썸네일 바이트를 만든다. 포함된 그림이 없으면 None.
    fn thumbnail(&self, codec: &dyn TagCodec, path: &Path) -> Result<Option<Vec<u8>>>;
}

/// 포함된 그림을 디코딩해 고정 크기로 맞춘 뒤 JPEG로 다시 인코딩한다.
#[derive(Debug, Clone, Copy)]
pub struct RenderThumbnailer {
    pub size: u32,
    pub jpeg_quality: u8,
}

impl Thumbnailer for RenderThumbnailer {
    fn name(&self) -> &'static str {
        "render"
    }

    fn thumbnail(&self, codec: &dyn TagCodec, path: &Path) -> Result<Option<Vec<u8>>> {
        let Some(artwork) = artwork::extract(codec, path)? else {
            return Ok(None);
        };

        let decoded = image::load_from_memory(artwork.as_bytes())?;
        let scaled = decoded
            .resize_to_fill(self.size, self.size, FilterType::Lanczos3)
            .to_rgb8();

        let mut buf = Cursor::new(Vec::new());
        scaled.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality))?;

        debug!(path = %path.display(), size = self.size, "썸네일 렌더링");
        Ok(Some(buf.into_inner()))
    }
}

/// 렌더링을 못 하는 환경용. 포함된 그림을 크기 조정 없이 그대로 돌려준다.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedThumbnailer;

impl Thumbnailer for EmbeddedThumbnailer {
    fn name(&self) -> &'static str {
        "embedded"
    }

    fn thumbnail(&self, codec: &dyn TagCodec, path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(artwork::extract(codec, path)?.map(|a| a.into_bytes()))
    }
}

/// 이미지 코덱이 JPEG를 읽고 쓸 수 있는지 확인한다.
pub fn can_render() -> bool {
    ImageFormat::Jpeg.reading_enabled()
        && ImageFormat::Jpeg.writing_enabled()
        && ImageFormat::Png.reading_enabled()
}

/// 설정과 능력 검사로 썸네일 전략을 고른다.
pub fn select(config: &ThumbnailConfig) -> Arc<dyn Thumbnailer> {
    let render = match config.mode {
        ThumbnailMode::Render => true,
        ThumbnailMode::Embedded => false,
        ThumbnailMode::Auto => can_render(),
    };

    let thumbnailer: Arc<dyn Thumbnailer> = if render {
        Arc::new(RenderThumbnailer {
            size: config.size,
            jpeg_quality: config.jpeg_quality,
        })
    } else {
        Arc::new(EmbeddedThumbnailer)
    };
    info!(mode = ?config.mode, strategy = thumbnailer.name(), "썸네일 전략 선택");
    thumbnailer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures;
    use crate::core::tagger::LoftyCodec;
    use crate::models::ArtworkBlob;

    fn tagged_song(dir: &Path, width: u32, height: u32) -> (std::path::PathBuf, Vec<u8>) {
        let path = fixtures::wav(dir, "song.wav");
        let cover = fixtures::png_bytes(width, height);
        LoftyCodec
            .write_artwork(&path, &ArtworkBlob(cover.clone()))
            .unwrap();
        (path, cover)
    }

    #[test]
    fn test_embedded_returns_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let (path, cover) = tagged_song(dir.path(), 640, 480);

        let thumb = EmbeddedThumbnailer.thumbnail(&LoftyCodec, &path).unwrap();
        assert_eq!(thumb, Some(cover));
    }

    #[test]
    fn test_embedded_without_artwork() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::wav(dir.path(), "song.wav");

        assert_eq!(EmbeddedThumbnailer.thumbnail(&LoftyCodec, &path).unwrap(), None);
    }

    #[test]
    fn test_render_scales_to_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let (path, _) = tagged_song(dir.path(), 640, 480);
        let thumbnailer = RenderThumbnailer {
            size: 200,
            jpeg_quality: 100,
        };

        let bytes = thumbnailer.thumbnail(&LoftyCodec, &path).unwrap().unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 200));
    }

    #[test]
    fn test_select_honours_mode() {
        let mut config = ThumbnailConfig::default();

        config.mode = ThumbnailMode::Embedded;
        assert_eq!(select(&config).name(), "embedded");

        config.mode = ThumbnailMode::Render;
        assert_eq!(select(&config).name(), "render");

        config.mode = ThumbnailMode::Auto;
        assert!(can_render());
        assert_eq!(select(&config).name(), "render");
    }
}
