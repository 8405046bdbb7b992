//! Activity feed notifications.
//!
//! Every engine mutation emits an [`ActivityEvent`]. Delivery is fire-and-forget:
//! a failing sink is logged and never fails the request that produced the event.

mod redis_sink;

pub use redis_sink::RedisActivitySink;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    LeadsGenerated,
    LeadUpdated,
    LeadApproved,
    LeadRejected,
    LeadApprovalRevoked,
    LeadReassigned,
    BulkApproval,
    CampaignStatusChanged,
    AssignmentChanged,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub kind: ActivityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind, actor_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            actor_id,
            campaign_id: None,
            lead_id: None,
            details: serde_json::Value::Null,
            occurred_at: Utc::now(),
        }
    }

    pub fn campaign(mut self, campaign_id: Uuid) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    pub fn lead(mut self, lead_id: Uuid) -> Self {
        self.lead_id = Some(lead_id);
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()>;
}

/// Writes events to the structured log only. Used when no feed store is configured.
#[derive(Clone, Default)]
pub struct TracingActivitySink;

#[async_trait]
impl ActivitySink for TracingActivitySink {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()> {
        tracing::info!(
            activity_id = %event.id,
            kind = ?event.kind,
            actor_id = ?event.actor_id,
            campaign_id = ?event.campaign_id,
            lead_id = ?event.lead_id,
            details = %event.details,
            "Activity"
        );
        Ok(())
    }
}

/// Hands the event to the sink on a background task and returns immediately.
pub fn publish(sink: &Arc<dyn ActivitySink>, event: ActivityEvent) {
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        if let Err(e) = sink.record(&event).await {
            tracing::warn!(
                activity_id = %event.id,
                kind = ?event.kind,
                error = %e,
                "Failed to record activity"
            );
        }
    });
}
