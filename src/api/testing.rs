use std::collections::VecDeque;
use std::sync::Mutex;

use super::{ApiError, ApiRequest, ApiResponse, Transport};

/// Replays canned responses in order and records every request it sees.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    seen: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<ApiResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<ApiRequest> {
        self.seen
            .lock()
            .expect("seen mutex should not be poisoned")
            .clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.seen()
            .into_iter()
            .map(|request| format!("{} {}", request.method, request.path))
            .collect()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.seen
            .lock()
            .expect("seen mutex should not be poisoned")
            .push(request.clone());
        self.responses
            .lock()
            .expect("responses mutex should not be poisoned")
            .pop_front()
            .ok_or_else(|| ApiError::Network("no scripted response left".to_string()))
    }
}

pub fn respond(status: u16, body: serde_json::Value) -> ApiResponse {
    ApiResponse::new(status, body.to_string())
}
