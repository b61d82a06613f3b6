//! 앱 셸 요청 처리.
//!
//! [`MethodCall`]을 타입 있는 [`Request`]로 해석하고, 태그 코덱·아트워크·
//! 썸네일·자르기 구성 요소로 실행한 뒤 [`Response`] 하나로 만든다.
//! 모든 오류는 여기서 명령별 공개 값으로 바뀌고 디스패처까지 가지 않는다.

pub mod dispatcher;
pub mod request;
pub mod response;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::tagger::TagCodec;
use crate::core::thumbnail::Thumbnailer;
use crate::core::{artwork, cropper};

pub use dispatcher::{Completion, Dispatcher, RequestId, Submitter};
pub use request::{MethodCall, Operation, Request};
pub use response::{Response, Value};

pub struct Bridge {
    codec: Arc<dyn TagCodec>,
    thumbnailer: Arc<dyn Thumbnailer>,
}

impl Bridge {
    pub fn new(codec: Arc<dyn TagCodec>, thumbnailer: Arc<dyn Thumbnailer>) -> Self {
        Self { codec, thumbnailer }
    }

    /// 원시 호출을 해석해 실행한다. 모르는 명령은 `notImplemented`.
    pub fn handle(&self, call: &MethodCall) -> Response {
        let Some(op) = Operation::from_name(&call.method) else {
            warn!(method = %call.method, "알 수 없는 명령");
            return Response::not_implemented(&call.method);
        };

        match Request::decode(op, call) {
            Ok(request) => self.execute(request),
            Err(e) => {
                warn!(method = op.name(), error = %e, "요청 해석 실패");
                Response::failure(op, &e)
            }
        }
    }

    pub fn execute(&self, request: Request) -> Response {
        let op = request.operation();
        debug!(?request, "요청 실행");

        let outcome = match request {
            Request::WriteAllTags { path, tags } => self
                .codec
                .write_tags(&path, &tags)
                .map(|()| Some(Value::Code(0))),
            Request::ExtractAllTags { path } => self
                .codec
                .read_tags(&path)
                .map(|tags| Some(Value::Tags(Some(tags)))),
            Request::WriteArtwork { path, artwork_path } => {
                artwork::attach(self.codec.as_ref(), &path, &artwork_path)
                    .map(|()| Some(Value::Code(0)))
            }
            Request::ExtractArtwork { path } => artwork::extract(self.codec.as_ref(), &path)
                .map(|artwork| artwork.map(|a| Value::Bytes(a.into_bytes()))),
            Request::ExtractThumbnail { path } => self
                .thumbnailer
                .thumbnail(self.codec.as_ref(), &path)
                .map(|thumb| thumb.map(Value::Bytes)),
            Request::CropToSquare { path } => {
                cropper::crop_file(&path).map(|png| Some(Value::Bytes(png)))
            }
        };

        match outcome {
            Ok(Some(value)) => Response::ok(value),
            Ok(None) => Response::absent(op),
            Err(e) => {
                warn!(method = op.name(), error = %e, "작업 실패");
                Response::failure(op, &e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use super::Bridge;
    use crate::core::tagger::TagCodec;
    use crate::core::thumbnail::EmbeddedThumbnailer;
    use crate::error::{Error, Result};
    use crate::models::{ArtworkBlob, TagSet};

    /// 경로별 메모리 코덱. `/broken`으로 시작하는 경로는 실패한다.
    #[derive(Default)]
    pub struct MemoryCodec {
        files: Mutex<HashMap<PathBuf, (TagSet, Option<ArtworkBlob>)>>,
    }

    impl MemoryCodec {
        fn check(path: &Path) -> Result<()> {
            if path.starts_with("/broken") {
                return Err(Error::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                ));
            }
            Ok(())
        }
    }

    impl TagCodec for MemoryCodec {
        fn read_tags(&self, path: &Path) -> Result<TagSet> {
            Self::check(path)?;
            let files = self.files.lock().unwrap();
            Ok(files
                .get(path)
                .map(|(tags, _)| tags.filled())
                .unwrap_or_else(|| TagSet::default().filled()))
        }

        fn write_tags(&self, path: &Path, tags: &TagSet) -> Result<()> {
            Self::check(path)?;
            let mut files = self.files.lock().unwrap();
            let entry = files.entry(path.to_path_buf()).or_default();
            for (field, value) in tags.present() {
                entry.0.set(field, Some(value.to_string()));
            }
            Ok(())
        }

        fn read_artwork(&self, path: &Path) -> Result<Option<ArtworkBlob>> {
            Self::check(path)?;
            let files = self.files.lock().unwrap();
            Ok(files.get(path).and_then(|(_, art)| art.clone()))
        }

        fn write_artwork(&self, path: &Path, artwork: &ArtworkBlob) -> Result<()> {
            Self::check(path)?;
            let mut files = self.files.lock().unwrap();
            files.entry(path.to_path_buf()).or_default().1 = Some(artwork.clone());
            Ok(())
        }
    }

    pub fn memory_bridge() -> Bridge {
        Bridge::new(Arc::new(MemoryCodec::default()), Arc::new(EmbeddedThumbnailer))
    }
}
