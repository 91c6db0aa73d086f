//! Scripted in-process transport for unit tests

use super::types::{ApiError, ApiRequest, BatchResponse};
use super::BatchTransport;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = dyn Fn(&str, &ApiRequest) -> std::result::Result<Value, ApiError> + Send + Sync;

/// Transport that answers each request with a closure and records batches
pub(crate) struct MockTransport {
    responder: Box<Responder>,
    /// Whole-batch failures to raise before answering, front first
    failures: Mutex<VecDeque<Error>>,
    /// One-shot per-request overrides keyed by request id
    overrides: Mutex<Vec<(String, ApiError)>>,
    batches: Mutex<Vec<Vec<(String, ApiRequest)>>>,
}

impl MockTransport {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &ApiRequest) -> std::result::Result<Value, ApiError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            failures: Mutex::new(VecDeque::new()),
            overrides: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same body
    pub(crate) fn constant(body: Value) -> Self {
        Self::new(move |_, _| Ok(body.clone()))
    }

    /// Fail the next batch submission as a whole
    pub(crate) fn fail_next_batch(&self, error: Error) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Answer the next request with this id with an error, once
    pub(crate) fn fail_once(&self, id: impl Into<String>, status: u16) {
        self.overrides
            .lock()
            .unwrap()
            .push((id.into(), ApiError::new(status, "scripted failure")));
    }

    /// Batches submitted so far
    pub(crate) fn batches(&self) -> Vec<Vec<(String, ApiRequest)>> {
        self.batches.lock().unwrap().clone()
    }

    /// All submitted requests in submission order
    pub(crate) fn requests(&self) -> Vec<(String, ApiRequest)> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl BatchTransport for MockTransport {
    async fn submit_batch(
        &self,
        requests: Vec<(String, ApiRequest)>,
    ) -> Result<Vec<BatchResponse>> {
        self.batches.lock().unwrap().push(requests.clone());

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let mut overrides = self.overrides.lock().unwrap();
        let responses = requests
            .iter()
            .map(|(id, request)| {
                let result = match overrides.iter().position(|(o, _)| o == id) {
                    Some(pos) => Err(overrides.remove(pos).1),
                    None => (self.responder)(id, request),
                };
                BatchResponse {
                    id: id.clone(),
                    result,
                }
            })
            .collect();
        Ok(responses)
    }
}
