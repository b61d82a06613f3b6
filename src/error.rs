use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

/// 브리지 내부 오류. 외부 응답에서는 0/1, null, 빈 바이트로 뭉개지지만
/// 진단과 테스트를 위해 종류를 유지한다.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("파일을 읽을 수 없습니다 ({path}): {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },
    #[error("태그를 기록할 수 없습니다 ({path}): {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },
    #[error("지원하지 않는 태그 구조입니다 ({path}): {reason}")]
    Format { path: PathBuf, reason: String },
    #[error("이미지를 처리할 수 없습니다: {0}")]
    Image(#[from] image::ImageError),
    #[error("잘못된 인자: {0}")]
    InvalidArgument(String),
    #[error("입출력 오류 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Read,
    Write,
    Format,
    Image,
    InvalidArgument,
    Io,
    /// 실패가 아니라 돌려줄 리소스가 없음.
    Absent,
    NotImplemented,
    InvalidRequest,
    /// 작업 스레드가 응답 없이 끝남 (패닉 등).
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Read { .. } => ErrorKind::Read,
            Error::Write { .. } => ErrorKind::Write,
            Error::Format { .. } => ErrorKind::Format,
            Error::Image(_) => ErrorKind::Image,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Read => "read",
            ErrorKind::Write => "write",
            ErrorKind::Format => "format",
            ErrorKind::Image => "image",
            ErrorKind::InvalidArgument => "invalidArgument",
            ErrorKind::Io => "io",
            ErrorKind::Absent => "absent",
            ErrorKind::NotImplemented => "notImplemented",
            ErrorKind::InvalidRequest => "invalidRequest",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}
