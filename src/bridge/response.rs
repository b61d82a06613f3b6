use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use serde_json::json;

use crate::bridge::request::Operation;
use crate::error::{Error, ErrorKind};
use crate::models::TagSet;

/// 공개 결과 형태. 클라이언트는 이 값만 믿으면 된다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 성공 `0`, 실패 `1`.
    Code(i32),
    /// 태그 맵. 읽기에 실패하면 `None`.
    Tags(Option<TagSet>),
    /// 비어 있을 수 있는 바이트.
    Bytes(Vec<u8>),
    /// 값 없음. 알 수 없는 명령에 쓴다.
    Null,
}

/// 공개 값 옆에 붙는 선택적 오류 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

/// 한 번 만들어 호출자에게 넘기는 불변 응답.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub value: Value,
    pub error: Option<ErrorReport>,
}

impl Response {
    pub fn ok(value: Value) -> Self {
        Self { value, error: None }
    }

    /// 명령별 실패 값. 오류 종류는 함께 남긴다.
    pub fn failure(op: Operation, err: &Error) -> Self {
        Self {
            value: failure_value(op),
            error: Some(ErrorReport {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }

    /// 돌려줄 데이터 없음. 공개 값은 실패와 같고 종류만 다르다.
    pub fn absent(op: Operation) -> Self {
        Self {
            value: failure_value(op),
            error: Some(ErrorReport {
                kind: ErrorKind::Absent,
                message: format!("{}: 반환할 데이터가 없습니다", op.name()),
            }),
        }
    }

    pub fn not_implemented(method: &str) -> Self {
        Self {
            value: Value::Null,
            error: Some(ErrorReport {
                kind: ErrorKind::NotImplemented,
                message: format!("알 수 없는 명령: {method}"),
            }),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            value: Value::Null,
            error: Some(ErrorReport {
                kind: ErrorKind::InvalidRequest,
                message: message.into(),
            }),
        }
    }

    /// 작업이 응답 없이 끝났을 때 보낸다.
    pub fn fallback(method: &str) -> Self {
        match Operation::from_name(method) {
            Some(op) => Self {
                value: failure_value(op),
                error: Some(ErrorReport {
                    kind: ErrorKind::Internal,
                    message: format!("{method}: 작업이 응답 없이 종료되었습니다"),
                }),
            },
            None => Self::not_implemented(method),
        }
    }

    /// `serve` 루프가 쓰는 JSON 형태. 바이트는 base64로 인코딩한다.
    pub fn to_json(&self, id: u64, method: Option<&str>) -> serde_json::Value {
        let result = match &self.value {
            Value::Code(code) => json!(code),
            Value::Tags(Some(tags)) => json!(tags),
            Value::Tags(None) | Value::Null => serde_json::Value::Null,
            Value::Bytes(bytes) => json!(BASE64.encode(bytes)),
        };

        let mut body = json!({
            "id": id,
            "method": method,
            "result": result,
        });
        if let Some(error) = &self.error {
            body["error"] = json!(error);
        }
        body
    }
}

fn failure_value(op: Operation) -> Value {
    match op {
        Operation::WriteAllTags | Operation::WriteArtwork => Value::Code(1),
        Operation::ExtractAllTags => Value::Tags(None),
        Operation::ExtractArtwork | Operation::ExtractThumbnail | Operation::CropToSquare => {
            Value::Bytes(Vec::new())
        }
    }
}
