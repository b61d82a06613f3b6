use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::CropRegion;

/// `width` x `height` 이미지의 가운데 정사각형 영역.
///
/// 한 변은 `min(width, height)`이고, 긴 축은 차이의 절반(버림)만큼 띄운다.
pub fn square_region(width: u32, height: u32) -> CropRegion {
    let (w, h) = (i64::from(width), i64::from(height));

    let new_width = w.min(h);
    let new_height = if h > w { h - (h - w) } else { h };
    let crop_x = ((w - h) / 2).max(0);
    let crop_y = ((h - w) / 2).max(0);

    CropRegion {
        x: crop_x as u32,
        y: crop_y as u32,
        width: new_width as u32,
        height: new_height as u32,
    }
}

pub fn crop(image: &DynamicImage) -> DynamicImage {
    let region = square_region(image.width(), image.height());
    image.crop_imm(region.x, region.y, region.width, region.height)
}

/// `path`의 이미지를 디코딩해 가운데 정사각형으로 자르고 PNG로 인코딩한다.
/// 형식은 확장자가 아니라 파일 내용으로 판별한다.
pub fn crop_file(path: &Path) -> Result<Vec<u8>> {
    let source = decode(path)?;
    if source.width() == 0 || source.height() == 0 {
        return Err(Error::InvalidArgument(format!(
            "빈 이미지입니다: {}",
            path.display()
        )));
    }

    let cropped = crop(&source);
    debug!(
        path = %path.display(),
        from = ?(source.width(), source.height()),
        side = cropped.width(),
        "정사각형 자르기"
    );

    let mut buf = Cursor::new(Vec::new());
    cropped.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn decode(path: &Path) -> Result<DynamicImage> {
    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| Error::io(path, e))?;
    Ok(reader.decode()?)
}
