//! Delivery port: posting and removing ad content on a channel.

use async_trait::async_trait;

use crate::domain::id::PlacementId;
use crate::error::DeliveryError;

/// Content to publish for a placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub placement: PlacementId,
    /// Channel's external handle.
    pub channel: String,
    pub headline: String,
    pub body: String,
}

/// Previously published content to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub placement: PlacementId,
    pub channel: String,
    /// Reference returned by the post that created the content.
    pub content_ref: String,
}

/// Content-delivery collaborator.
///
/// Calls are made outside any database transaction. Failures are reported
/// to operators and never abort a batch.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Publish content, returning the external content reference.
    async fn post(&self, request: &PostRequest) -> Result<String, DeliveryError>;

    /// Remove published content.
    async fn delete(&self, request: &DeleteRequest) -> Result<(), DeliveryError>;
}
