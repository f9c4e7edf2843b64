use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::tickets::models::{
    Category, Ticket, TicketStatus, TimelineAction, TimelineEntry, Urgency,
};
use crate::shared::phone::mask_phone;

/// Internal ticket-creation payload. Reaches the API only through the
/// intake pipeline or the shared-secret endpoint, never a staff session.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTicketRequest {
    pub category: Option<Category>,

    #[validate(length(max = 100, message = "Subcategory must be at most 100 characters"))]
    pub subcategory: Option<String>,

    #[validate(length(min = 1, max = 500, message = "Location is required"))]
    pub location: String,

    pub formatted_address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    #[validate(length(min = 1, message = "Reporter phone is required"))]
    pub reporter_phone: String,

    #[validate(length(min = 1, max = 100, message = "Reporter name must be 1-100 characters"))]
    pub reporter_name: Option<String>,

    pub urgency: Option<Urgency>,
    pub photo_before: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateTicketResponse {
    pub ticket_id: String,
    pub track_url: String,
}

/// Staff status/photo patch. All fields optional; an empty patch is a
/// validation error at the service layer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,
    pub photo_before: Option<String>,
    pub photo_after: Option<String>,
    /// Optional staff note appended as a timeline entry
    pub note: Option<String>,
    /// Send the reporter a status-change message in addition to the
    /// unconditional resolution notice
    #[serde(default)]
    pub notify_reporter: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListTicketsQuery {
    pub status: Option<TicketStatus>,
    pub urgency: Option<Urgency>,
    pub category: Option<Category>,
    /// Substring match against id, location, and description
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketResponse {
    pub id: String,
    pub category: Category,
    pub subcategory: Option<String>,
    pub location: String,
    pub formatted_address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub description: String,
    pub reporter_phone: String,
    pub reporter_name: Option<String>,
    pub status: TicketStatus,
    pub urgency: Urgency,
    pub assigned_dinas: Vec<String>,
    pub photo_before: Option<String>,
    pub photo_after: Option<String>,
    pub rating: Option<i32>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub rated_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for TicketResponse {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            category: t.category,
            subcategory: t.subcategory,
            location: t.location,
            formatted_address: t.formatted_address,
            lat: t.lat,
            lng: t.lng,
            description: t.description,
            reporter_phone: t.reporter_phone,
            reporter_name: t.reporter_name,
            status: t.status,
            urgency: t.urgency,
            assigned_dinas: t.assigned_dinas,
            photo_before: t.photo_before,
            photo_after: t.photo_after,
            rating: t.rating,
            feedback: t.feedback,
            created_at: t.created_at,
            updated_at: t.updated_at,
            resolved_at: t.resolved_at,
            rated_at: t.rated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimelineEntryResponse {
    pub action: TimelineAction,
    pub message: String,
    pub author: String,
    pub is_public: bool,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<TimelineEntry> for TimelineEntryResponse {
    fn from(e: TimelineEntry) -> Self {
        Self {
            action: e.action,
            message: e.message,
            author: e.author,
            is_public: e.is_public,
            metadata: e.metadata,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketDetailResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub timeline: Vec<TimelineEntryResponse>,
}

/// Citizen-facing tracking projection: reporter identity masked,
/// internal timeline entries withheld, no OTP or gateway fields.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicTicketResponse {
    pub id: String,
    pub category: Category,
    pub subcategory: Option<String>,
    pub location: String,
    pub description: String,
    pub status: TicketStatus,
    pub urgency: Urgency,
    pub reporter_phone_masked: String,
    pub photo_before: Option<String>,
    pub photo_after: Option<String>,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub timeline: Vec<TimelineEntryResponse>,
}

impl PublicTicketResponse {
    pub fn project(ticket: Ticket, timeline: Vec<TimelineEntry>) -> Self {
        Self {
            reporter_phone_masked: mask_phone(&ticket.reporter_phone),
            timeline: timeline
                .into_iter()
                .filter(|e| e.is_public)
                .map(TimelineEntryResponse::from)
                .collect(),
            id: ticket.id,
            category: ticket.category,
            subcategory: ticket.subcategory,
            location: ticket.location,
            description: ticket.description,
            status: ticket.status,
            urgency: ticket.urgency,
            photo_before: ticket.photo_before,
            photo_after: ticket.photo_after,
            rating: ticket.rating,
            created_at: ticket.created_at,
            resolved_at: ticket.resolved_at,
        }
    }
}

/// Coordinate-bearing subset for the dashboard map
#[derive(Debug, Serialize, ToSchema)]
pub struct MapTicketResponse {
    pub id: String,
    pub category: Category,
    pub urgency: Urgency,
    pub status: TicketStatus,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitRatingRequest {
    #[validate(length(min = 1, message = "OTP is required"))]
    pub otp: String,

    pub rating: i32,

    pub feedback: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestOtpResponse {
    /// Masked destination the code was sent to
    pub sent_to: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total: i64,
    pub by_status: Vec<CountBucket>,
    pub by_category: Vec<CountBucket>,
    pub by_urgency: Vec<CountBucket>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CountBucket {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AnalyticsQuery {
    /// Number of days to look back (default 7, max 90)
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyticsResponse {
    pub days: i64,
    pub created_per_day: Vec<DayBucket>,
    pub resolved_per_day: Vec<DayBucket>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayBucket {
    pub day: chrono::NaiveDate,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn ticket() -> Ticket {
        Ticket {
            id: "BDG-20260826-0001".to_string(),
            category: Category::Sanitation,
            subcategory: None,
            location: "Cicadas".to_string(),
            formatted_address: None,
            lat: None,
            lng: None,
            description: "Tumpukan sampah".to_string(),
            reporter_phone: "+6285155347701".to_string(),
            reporter_name: Some("Budi".to_string()),
            status: TicketStatus::Pending,
            urgency: Urgency::Medium,
            assigned_dinas: vec!["dlh-bandung".to_string()],
            photo_before: None,
            photo_after: None,
            rating: None,
            feedback: None,
            rating_otp: Some("123456".to_string()),
            rating_otp_expires_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            resolved_at: None,
            rated_at: None,
        }
    }

    fn entry(is_public: bool, message: &str) -> TimelineEntry {
        TimelineEntry {
            id: Uuid::now_v7(),
            ticket_id: "BDG-20260826-0001".to_string(),
            action: TimelineAction::Note,
            message: message.to_string(),
            author: "system".to_string(),
            is_public,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn public_projection_masks_phone_and_filters_timeline() {
        let projected = PublicTicketResponse::project(
            ticket(),
            vec![entry(false, "internal"), entry(true, "public")],
        );

        assert!(!projected.reporter_phone_masked.contains("5534"));
        assert_eq!(projected.timeline.len(), 1);
        assert_eq!(projected.timeline[0].message, "public");

        // OTP never appears in the serialized projection
        let json = serde_json::to_string(&projected).unwrap();
        assert!(!json.contains("123456"));
        assert!(!json.contains("reporter_name"));
    }
}
