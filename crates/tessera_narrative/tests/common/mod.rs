//! Shared test fixtures: a scripted fake generation driver.

// Each integration-test binary compiles this module separately and uses
// a different slice of it.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tessera_core::{GenerateRequest, GenerateResponse, Output};
use tessera_error::{BackendError, BackendErrorKind, TesseraResult};
use tessera_interface::{TextGeneration, VisionAnalysis};

/// One scripted driver turn.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Respond with this text
    Text(String),
    /// Fail with this backend error kind
    Fail(BackendErrorKind),
}

/// A generation driver that replays a fixed script.
///
/// Once the script is exhausted, every further call fails with
/// `Unavailable`, which models an unconfigured backend.
#[derive(Debug, Default)]
pub struct FakeDriver {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<GenerateRequest>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver with no credentials: every call fails `Unavailable`.
    pub fn unavailable() -> Self {
        Self::new()
    }

    pub fn respond_with(self, text: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Text(text.into()));
        self
    }

    pub fn fail_with(self, kind: BackendErrorKind) -> Self {
        self.script.lock().unwrap().push_back(Scripted::Fail(kind));
        self
    }

    /// Number of generate calls observed.
    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGeneration for FakeDriver {
    async fn generate(&self, req: &GenerateRequest) -> TesseraResult<GenerateResponse> {
        self.calls.lock().unwrap().push(req.clone());

        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Text(text)) => Ok(GenerateResponse {
                outputs: vec![Output::Text(text)],
            }),
            Some(Scripted::Fail(kind)) => Err(BackendError::new(kind).into()),
            None => Err(BackendError::new(BackendErrorKind::Unavailable).into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[async_trait]
impl VisionAnalysis for FakeDriver {
    fn vision_model_name(&self) -> &str {
        "fake-vision"
    }
}
