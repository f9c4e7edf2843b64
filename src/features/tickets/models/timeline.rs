use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "timeline_action", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineAction {
    Created,
    Assigned,
    StatusChange,
    Update,
    Escalated,
    Resolved,
    Cancelled,
    Note,
}

/// Append-only audit entry bound to exactly one ticket. Entries are
/// never mutated or deleted; ordering is by creation time.
#[derive(Debug, Clone, FromRow)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub ticket_id: String,
    pub action: TimelineAction,
    pub message: String,
    /// "system", a dinas id, or "reporter"
    pub author: String,
    /// Citizen-facing tracking only shows public entries
    pub is_public: bool,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a timeline entry
#[derive(Debug, Clone)]
pub struct NewTimelineEntry {
    pub ticket_id: String,
    pub action: TimelineAction,
    pub message: String,
    pub author: String,
    pub is_public: bool,
    pub metadata: Option<serde_json::Value>,
}
