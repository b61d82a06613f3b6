use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, warn};

use crate::bridge::request::MethodCall;
use crate::bridge::response::Response;
use crate::bridge::Bridge;

pub type RequestId = u64;

/// 끝난 요청. 호출자 스레드에서 받는다.
#[derive(Debug)]
pub struct Completion {
    pub id: RequestId,
    pub method: String,
    pub response: Response,
}

/// 한 번만 쓰는 완료 토큰.
///
/// `send`가 토큰을 소비한다. 보내지 못하고 버려지면 (작업 패닉, 스레드 생성
/// 실패) 명령의 실패 값을 대신 보낸다. 요청마다 완료는 정확히 한 번이다.
pub struct Responder {
    id: RequestId,
    method: String,
    tx: Option<Sender<Completion>>,
}

impl Responder {
    fn new(id: RequestId, method: &str, tx: Sender<Completion>) -> Self {
        Self {
            id,
            method: method.to_string(),
            tx: Some(tx),
        }
    }

    pub fn send(mut self, response: Response) {
        self.deliver(response);
    }

    fn deliver(&mut self, response: Response) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let completion = Completion {
            id: self.id,
            method: std::mem::take(&mut self.method),
            response,
        };
        if tx.send(completion).is_err() {
            debug!(id = self.id, "호출자가 이미 종료되어 응답을 버립니다");
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(id = self.id, method = %self.method, "응답 없이 작업 종료, 실패 값 전달");
            let fallback = Response::fallback(&self.method);
            self.deliver(fallback);
        }
    }
}

/// 요청을 시작하는 복제 가능한 핸들. 요청마다 작업 스레드 하나를 쓰고,
/// 요청끼리 공유하는 것은 브리지뿐이다.
#[derive(Clone)]
pub struct Submitter {
    bridge: Arc<Bridge>,
    tx: Sender<Completion>,
    next_id: Arc<AtomicU64>,
}

impl Submitter {
    pub fn next_id(&self) -> RequestId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn submit(&self, call: MethodCall) -> RequestId {
        let id = self.next_id();
        self.submit_as(id, call);
        id
    }

    /// `submit`과 같지만 id를 호출자가 정한다.
    pub fn submit_as(&self, id: RequestId, call: MethodCall) {
        let responder = Responder::new(id, &call.method, self.tx.clone());
        spawn_worker(Arc::clone(&self.bridge), id, call, responder);
    }

    /// 아무것도 실행하지 않고 바로 응답한다. 해석조차 안 되는 요청용.
    pub fn reject(&self, id: RequestId, response: Response) {
        Responder::new(id, "", self.tx.clone()).send(response);
    }
}

fn spawn_worker(bridge: Arc<Bridge>, id: RequestId, call: MethodCall, responder: Responder) {
    let spawned = thread::Builder::new()
        .name(format!("bridge-{id}"))
        .spawn(move || {
            let response = bridge.handle(&call);
            responder.send(response);
        });

    // 실패하면 클로저와 함께 responder가 여기서 버려지고 실패 값이 전달된다.
    if let Err(e) = spawned {
        error!(id, error = %e, "작업 스레드를 만들 수 없습니다");
    }
}

/// 호출을 백그라운드에서 실행하고, 완료는 디스패처를 가진 스레드로 돌려준다.
pub struct Dispatcher {
    submitter: Submitter,
    completions: Receiver<Completion>,
}

impl Dispatcher {
    pub fn new(bridge: Bridge) -> Self {
        let (tx, completions) = mpsc::channel();
        Self {
            submitter: Submitter {
                bridge: Arc::new(bridge),
                tx,
                next_id: Arc::new(AtomicU64::new(1)),
            },
            completions,
        }
    }

    pub fn submitter(&self) -> Submitter {
        self.submitter.clone()
    }

    pub fn submit(&self, call: MethodCall) -> RequestId {
        self.submitter.submit(call)
    }

    /// 다음 완료까지 기다린다. 디스패처가 송신자를 직접 들고 있어 채널이
    /// 끊기지 않으므로, 진행 중인 요청이 있을 때만 호출한다.
    pub fn recv(&self) -> Option<Completion> {
        self.completions.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// 디스패처의 송신자를 내려놓는다. 반환된 수신자는 모든 `Submitter`
    /// 복제본이 사라지고 모든 작업이 응답하면 끝난다.
    pub fn into_completions(self) -> Receiver<Completion> {
        self.completions
    }

    /// 호출 하나를 백그라운드에서 실행하고 응답을 기다린다.
    pub fn call(&self, call: MethodCall) -> Response {
        let (tx, rx) = mpsc::channel();
        let id = self.submitter.next_id();
        let method = call.method.clone();

        let responder = Responder::new(id, &method, tx);
        spawn_worker(Arc::clone(&self.submitter.bridge), id, call, responder);

        match rx.recv() {
            Ok(completion) => completion.response,
            Err(_) => Response::fallback(&method),
        }
    }
}
