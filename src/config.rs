use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// `RUST_LOG`이 없을 때 쓰는 tracing 필터.
    #[serde(default)]
    pub log_filter: Option<String>,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailMode {
    /// 이미지 코덱 능력을 검사해 결정
    #[default]
    Auto,
    /// 포함된 그림을 디코딩해 크기를 맞추고 JPEG로 인코딩
    Render,
    /// 포함된 그림을 그대로 반환
    Embedded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    #[serde(default)]
    pub mode: ThumbnailMode,
    #[serde(default = "default_thumbnail_size")]
    pub size: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            mode: ThumbnailMode::default(),
            size: default_thumbnail_size(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

fn default_thumbnail_size() -> u32 {
    200
}

fn default_jpeg_quality() -> u8 {
    100
}

pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("audio-tagger")
        .join("config.toml")
}

pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content),
        Err(_) => Config::default(),
    }
}

fn parse_config(content: &str) -> Config {
    toml::from_str(content).unwrap_or_default()
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}
