use std::path::Path;

use tracing::debug;

use crate::core::tagger::TagCodec;
use crate::error::{Error, Result};
use crate::models::ArtworkBlob;

/// 오디오 파일에 포함된 앞표지(없으면 첫 번째 그림)를 꺼낸다.
/// 아트워크가 없으면 오류가 아니라 None이다.
pub fn extract(codec: &dyn TagCodec, path: &Path) -> Result<Option<ArtworkBlob>> {
    let artwork = codec.read_artwork(path)?;
    debug!(
        path = %path.display(),
        bytes = artwork.as_ref().map_or(0, |a| a.as_bytes().len()),
        "아트워크 추출"
    );
    Ok(artwork)
}

/// 이미지 파일을 읽어 아트워크로 만든다. 이미지로 인식되지 않으면 오류.
pub fn load(artwork_path: &Path) -> Result<ArtworkBlob> {
    let data = std::fs::read(artwork_path).map_err(|e| Error::io(artwork_path, e))?;
    image::guess_format(&data)?;
    Ok(ArtworkBlob(data))
}

/// 이미지 파일을 오디오 파일의 유일한 아트워크로 기록한다.
pub fn attach(codec: &dyn TagCodec, path: &Path, artwork_path: &Path) -> Result<()> {
    let artwork = load(artwork_path)?;
    debug!(
        path = %path.display(),
        artwork = %artwork_path.display(),
        mime = artwork.mime_type(),
        "아트워크 기록"
    );
    codec.write_artwork(path, &artwork)
}
