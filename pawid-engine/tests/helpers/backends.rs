//! Stub classification backends

use async_trait::async_trait;
use pawid_engine::{BackendError, ClassificationBackend, ImageInput};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a stub does when called
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Return this payload
    Respond(Value),
    /// Return this payload after a delay
    RespondAfter(Duration, Value),
    /// Fail with an upstream status code
    Status(u16),
    /// Fail with a transport error
    Transport,
    /// Never answer
    Hang,
}

/// Scripted backend that counts its calls
pub struct StubBackend {
    name: String,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl StubBackend {
    pub fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn responding(name: &str, payload: Value) -> Arc<Self> {
        Self::new(name, Behavior::Respond(payload))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassificationBackend for StubBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, _image: &ImageInput) -> Result<Value, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::Respond(payload) => Ok(payload.clone()),
            Behavior::RespondAfter(delay, payload) => {
                tokio::time::sleep(*delay).await;
                Ok(payload.clone())
            }
            Behavior::Status(code) => Err(BackendError::Status(*code)),
            Behavior::Transport => Err(BackendError::Transport("connection refused".to_string())),
            Behavior::Hang => std::future::pending().await,
        }
    }
}
