//! Scripted [`Delivery`] fake.
//!
//! Each `post()`/`delete()` pops the next scripted outcome (defaults to
//! success when the queue is empty) and records the request, so tests can
//! assert both what was called and in which order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::id::PlacementId;
use crate::error::DeliveryError;
use crate::port::{DeleteRequest, Delivery, PostRequest};

/// One recorded delivery call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryCall {
    Post(PostRequest),
    Delete(DeleteRequest),
}

impl DeliveryCall {
    pub fn placement(&self) -> &PlacementId {
        match self {
            Self::Post(request) => &request.placement,
            Self::Delete(request) => &request.placement,
        }
    }
}

/// A delivery collaborator with queued outcomes.
pub struct ScriptedDelivery {
    post_results: Mutex<VecDeque<Result<String, DeliveryError>>>,
    delete_results: Mutex<VecDeque<Result<(), DeliveryError>>>,
    calls: Mutex<Vec<DeliveryCall>>,
    next_ref: AtomicU32,
}

impl ScriptedDelivery {
    pub fn new() -> Self {
        Self {
            post_results: Mutex::new(VecDeque::new()),
            delete_results: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            next_ref: AtomicU32::new(1),
        }
    }

    pub fn with_post_results(self, results: Vec<Result<String, DeliveryError>>) -> Self {
        *self.post_results.lock() = results.into();
        self
    }

    pub fn with_delete_results(self, results: Vec<Result<(), DeliveryError>>) -> Self {
        *self.delete_results.lock() = results.into();
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<DeliveryCall> {
        self.calls.lock().clone()
    }

    pub fn post_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, DeliveryCall::Post(_)))
            .count()
    }

    pub fn delete_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, DeliveryCall::Delete(_)))
            .count()
    }
}

impl Default for ScriptedDelivery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Delivery for ScriptedDelivery {
    async fn post(&self, request: &PostRequest) -> Result<String, DeliveryError> {
        self.calls.lock().push(DeliveryCall::Post(request.clone()));
        let scripted = self.post_results.lock().pop_front();
        scripted.unwrap_or_else(|| {
            let n = self.next_ref.fetch_add(1, Ordering::SeqCst);
            Ok(format!("msg-{n}"))
        })
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<(), DeliveryError> {
        self.calls.lock().push(DeliveryCall::Delete(request.clone()));
        self.delete_results.lock().pop_front().unwrap_or(Ok(()))
    }
}
