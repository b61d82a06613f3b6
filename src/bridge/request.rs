use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{TagField, TagSet};

/// 브리지가 아는 고정된 명령 집합.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    WriteAllTags,
    ExtractAllTags,
    WriteArtwork,
    ExtractArtwork,
    ExtractThumbnail,
    CropToSquare,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::WriteAllTags,
        Operation::ExtractAllTags,
        Operation::WriteArtwork,
        Operation::ExtractArtwork,
        Operation::ExtractThumbnail,
        Operation::CropToSquare,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::WriteAllTags => "writeAllTags",
            Operation::ExtractAllTags => "extractAllTags",
            Operation::WriteArtwork => "writeArtwork",
            Operation::ExtractArtwork => "extractArtwork",
            Operation::ExtractThumbnail => "extractThumbnail",
            Operation::CropToSquare => "cropToSquare",
        }
    }

    pub fn from_name(name: &str) -> Option<Operation> {
        Operation::ALL.into_iter().find(|op| op.name() == name)
    }
}

/// 앱 셸이 보내는 원시 요청: 명령 이름과 이름 붙은 문자열 인자.
/// `null` 인자는 없는 인자와 같다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: HashMap<String, Option<String>>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), Some(value.into()));
        self
    }

    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_deref())
    }

    fn required(&self, key: &str) -> Result<PathBuf> {
        self.argument(key)
            .map(PathBuf::from)
            .ok_or_else(|| Error::InvalidArgument(format!("{} 인자가 필요합니다", key)))
    }

    /// 태그 필드는 `title`과 예전 표기인 `tagsTitle`을 모두 받는다.
    fn tag_set(&self) -> TagSet {
        let mut tags = TagSet::default();
        for field in TagField::ALL {
            let value = self
                .argument(field.key())
                .or_else(|| self.argument(field.legacy_key()));
            tags.set(field, value.map(str::to_string));
        }
        tags
    }
}

/// 해석이 끝난 타입 있는 요청.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    WriteAllTags { path: PathBuf, tags: TagSet },
    ExtractAllTags { path: PathBuf },
    WriteArtwork { path: PathBuf, artwork_path: PathBuf },
    ExtractArtwork { path: PathBuf },
    ExtractThumbnail { path: PathBuf },
    CropToSquare { path: PathBuf },
}

impl Request {
    pub fn decode(op: Operation, call: &MethodCall) -> Result<Request> {
        let path = call.required("path")?;
        let request = match op {
            Operation::WriteAllTags => Request::WriteAllTags {
                path,
                tags: call.tag_set(),
            },
            Operation::ExtractAllTags => Request::ExtractAllTags { path },
            Operation::WriteArtwork => Request::WriteArtwork {
                path,
                artwork_path: call.required("artworkPath")?,
            },
            Operation::ExtractArtwork => Request::ExtractArtwork { path },
            Operation::ExtractThumbnail => Request::ExtractThumbnail { path },
            Operation::CropToSquare => Request::CropToSquare { path },
        };
        Ok(request)
    }

    pub fn operation(&self) -> Operation {
        match self {
            Request::WriteAllTags { .. } => Operation::WriteAllTags,
            Request::ExtractAllTags { .. } => Operation::ExtractAllTags,
            Request::WriteArtwork { .. } => Operation::WriteArtwork,
            Request::ExtractArtwork { .. } => Operation::ExtractArtwork,
            Request::ExtractThumbnail { .. } => Operation::ExtractThumbnail,
            Request::CropToSquare { .. } => Operation::CropToSquare,
        }
    }
}
