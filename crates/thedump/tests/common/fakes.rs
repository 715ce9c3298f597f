//! In-memory stand-ins for the backend collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use thedump::remote::error::Result as ApiResult;
use thedump::{ApiError, FileStatusItem, StatusService, UploadReceipt, UploadRequest, UploadTransport};

/// Scripted reply for one status poll.
pub enum PollReply {
    Statuses(Vec<FileStatusItem>),
    Fail(String),
}

/// Status service that answers polls from a script. Once the script runs out
/// every requested file is reported as still pending.
#[derive(Clone, Default)]
pub struct ScriptedStatusService {
    replies: Arc<Mutex<VecDeque<PollReply>>>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedStatusService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_reply(&self, statuses: Vec<FileStatusItem>) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(PollReply::Statuses(statuses));
        self
    }

    pub fn then_fail(&self, message: &str) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(PollReply::Fail(message.to_string()));
        self
    }

    /// File identifiers requested by each poll, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StatusService for ScriptedStatusService {
    async fn fetch_statuses(&self, file_uuids: &[String]) -> ApiResult<Vec<FileStatusItem>> {
        let mut requested = file_uuids.to_vec();
        requested.sort();
        self.calls.lock().unwrap().push(requested);

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(PollReply::Statuses(statuses)) => Ok(statuses),
            Some(PollReply::Fail(message)) => Err(ApiError::Server {
                status: 503,
                message,
            }),
            None => Ok(file_uuids
                .iter()
                .map(|uuid| FileStatusItem::pending(uuid))
                .collect()),
        }
    }
}

/// Status service whose first call blocks until [`GatedStatusService::open`]
/// is called.
#[derive(Clone)]
pub struct GatedStatusService {
    gate: Arc<Notify>,
    reply: Vec<FileStatusItem>,
    calls: Arc<Mutex<usize>>,
}

impl GatedStatusService {
    pub fn new(reply: Vec<FileStatusItem>) -> Self {
        Self {
            gate: Arc::new(Notify::new()),
            reply,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn open(&self) {
        self.gate.notify_one();
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl StatusService for GatedStatusService {
    async fn fetch_statuses(&self, _file_uuids: &[String]) -> ApiResult<Vec<FileStatusItem>> {
        *self.calls.lock().unwrap() += 1;
        self.gate.notified().await;
        Ok(self.reply.clone())
    }
}

/// Upload transport that records requests and answers from a script.
#[derive(Clone, Default)]
pub struct FakeTransport {
    outcomes: Arc<Mutex<VecDeque<Result<UploadReceipt, ApiError>>>>,
    requests: Arc<Mutex<Vec<UploadRequest>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_succeed(&self, file_uuid: &str) -> &Self {
        self.outcomes.lock().unwrap().push_back(Ok(UploadReceipt {
            file_uuid: file_uuid.to_string(),
            storage_path: format!("uploads/{}", file_uuid),
        }));
        self
    }

    pub fn then_fail(&self, error: ApiError) -> &Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<UploadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadTransport for FakeTransport {
    async fn upload(&self, request: UploadRequest) -> ApiResult<UploadReceipt> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::Server {
                    status: 500,
                    message: "no scripted outcome".to_string(),
                })
            })
    }
}
