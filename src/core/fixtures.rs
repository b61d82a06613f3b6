//! 테스트마다 즉석에서 만드는 픽스처.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::tag::{Tag, TagType};

/// 태그 없는 작은 모노 16비트 PCM WAV를 쓴다.
pub fn wav(dir: &Path, name: &str) -> PathBuf {
    let samples = vec![0u8; 1600];
    let mut data = Vec::with_capacity(44 + samples.len());

    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(36 + samples.len() as u32).to_le_bytes());
    data.extend_from_slice(b"WAVE");

    data.extend_from_slice(b"fmt ");
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes()); // PCM
    data.extend_from_slice(&1u16.to_le_bytes()); // 채널
    data.extend_from_slice(&8000u32.to_le_bytes()); // 샘플레이트
    data.extend_from_slice(&16000u32.to_le_bytes()); // 바이트레이트
    data.extend_from_slice(&2u16.to_le_bytes()); // 블록 정렬
    data.extend_from_slice(&16u16.to_le_bytes()); // 샘플당 비트

    data.extend_from_slice(b"data");
    data.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    data.extend_from_slice(&samples);

    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// RIFF INFO 태그만 있는 WAV. 앨범 필드가 `album`으로 채워져 있다.
pub fn riff_info_wav(dir: &Path, name: &str, album: &str) -> PathBuf {
    let path = wav(dir, name);
    let mut tag = Tag::new(TagType::RiffInfo);
    tag.insert_text(ItemKey::AlbumTitle, album.to_string());
    tag.save_to_path(&path, WriteOptions::default()).unwrap();
    path
}

/// 잘라 낸 위치를 구분할 수 있는 그라디언트.
pub fn image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(width, height)).unwrap();
    path
}
