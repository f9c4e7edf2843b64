use chrono::{DateTime, Utc};
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

use crate::shared::constants::TICKET_ID_PREFIX;

/// Complaint category, fixed set shared with the classifier prompt
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema, JsonSchema,
)]
#[sqlx(type_name = "complaint_category", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Emergency,
    Infrastructure,
    Sanitation,
    Social,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Emergency,
        Category::Infrastructure,
        Category::Sanitation,
        Category::Social,
        Category::Other,
    ];

    /// Urgency applied when the caller does not specify one
    pub fn default_urgency(&self) -> Urgency {
        match self {
            Category::Emergency => Urgency::Critical,
            _ => Urgency::Medium,
        }
    }

    /// Tolerant parse used on classifier output; anything unknown is Other
    pub fn parse_or_other(value: &str) -> Category {
        match value.trim().to_uppercase().as_str() {
            "EMERGENCY" => Category::Emergency,
            "INFRASTRUCTURE" => Category::Infrastructure,
            "SANITATION" => Category::Sanitation,
            "SOCIAL" => Category::Social,
            _ => Category::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Emergency => "EMERGENCY",
            Category::Infrastructure => "INFRASTRUCTURE",
            Category::Sanitation => "SANITATION",
            Category::Social => "SOCIAL",
            Category::Other => "OTHER",
        };
        write!(f, "{}", s)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema, JsonSchema,
)]
#[sqlx(type_name = "complaint_urgency", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

impl Urgency {
    /// Strict parse of the classifier's wire spelling
    pub fn parse(value: &str) -> Option<Urgency> {
        match value.trim().to_uppercase().as_str() {
            "CRITICAL" => Some(Urgency::Critical),
            "HIGH" => Some(Urgency::High),
            "MEDIUM" => Some(Urgency::Medium),
            "LOW" => Some(Urgency::Low),
            _ => None,
        }
    }

    /// Tolerant parse used on classifier output; anything unknown is Medium
    pub fn parse_or_medium(value: &str) -> Urgency {
        Urgency::parse(value).unwrap_or(Urgency::Medium)
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Urgency::Critical => "CRITICAL",
            Urgency::High => "HIGH",
            Urgency::Medium => "MEDIUM",
            Urgency::Low => "LOW",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Pending,
    InProgress,
    Resolved,
    Escalated,
    Cancelled,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TicketStatus::Pending => "PENDING",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
            TicketStatus::Escalated => "ESCALATED",
            TicketStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Database model for a complaint ticket. The human-readable id is the
/// primary key; tickets are never hard-deleted.
#[derive(Debug, Clone, FromRow)]
pub struct Ticket {
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
    pub rating_otp: Option<String>,
    pub rating_otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub rated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Whether a dinas id is among this ticket's assignees
    pub fn is_assigned_to(&self, dinas_id: &str) -> bool {
        self.assigned_dinas.iter().any(|d| d == dinas_id)
    }

    /// Resolving requires an after photo, either newly supplied or
    /// already stored. Hard business rule, not advisory.
    pub fn can_resolve_with(&self, new_photo_after: Option<&str>) -> bool {
        new_photo_after.is_some() || self.photo_after.is_some()
    }
}

/// Generate a ticket id: `BDG-YYYYMMDD-NNNN` with a random 4-digit
/// suffix. Collisions are possible by construction; the caller retries
/// on primary-key conflict.
pub fn generate_ticket_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!(
        "{}-{}-{:04}",
        TICKET_ID_PREFIX,
        now.format("%Y%m%d"),
        suffix
    )
}

/// Parse the embedded creation date back out of a ticket id.
/// Returns None for ids not matching `PREFIX-YYYYMMDD-NNNN`.
pub fn parse_ticket_id_date(id: &str) -> Option<chrono::NaiveDate> {
    let mut parts = id.splitn(3, '-');
    let prefix = parts.next()?;
    let date = parts.next()?;
    let suffix = parts.next()?;

    if prefix != TICKET_ID_PREFIX || suffix.len() != 4 || !suffix.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    chrono::NaiveDate::parse_from_str(date, "%Y%m%d").ok()
}

/// Check a transition against the lifecycle state machine:
/// pending -> in_progress -> resolved, escalated from in_progress,
/// cancelled from pending/in_progress. Leaving resolved or cancelled is
/// not hard-blocked, matching the operational policy of allowing staff
/// to correct a mistaken close.
pub fn is_normal_transition(from: TicketStatus, to: TicketStatus) -> bool {
    use TicketStatus::*;
    matches!(
        (from, to),
        (Pending, InProgress)
            | (Pending, Cancelled)
            | (InProgress, Resolved)
            | (InProgress, Escalated)
            | (InProgress, Cancelled)
            | (Escalated, InProgress)
            | (Escalated, Resolved)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ticket_id_round_trips_its_date() {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 10, 30, 0).unwrap();
        let id = generate_ticket_id(now);
        assert!(id.starts_with("BDG-20260826-"));
        assert_eq!(
            parse_ticket_id_date(&id),
            Some(chrono::NaiveDate::from_ymd_opt(2026, 8, 26).unwrap())
        );
    }

    #[test]
    fn malformed_ids_do_not_parse() {
        assert!(parse_ticket_id_date("BDG-20260826").is_none());
        assert!(parse_ticket_id_date("XXX-20260826-0001").is_none());
        assert!(parse_ticket_id_date("BDG-2026086-0001").is_none());
        assert!(parse_ticket_id_date("BDG-20260826-00A1").is_none());
    }

    #[test]
    fn emergency_defaults_to_critical_urgency() {
        assert_eq!(Category::Emergency.default_urgency(), Urgency::Critical);
        assert_eq!(Category::Infrastructure.default_urgency(), Urgency::Medium);
    }

    #[test]
    fn unknown_enums_default_safely() {
        assert_eq!(Category::parse_or_other("banjir"), Category::Other);
        assert_eq!(
            Category::parse_or_other("infrastructure"),
            Category::Infrastructure
        );
        assert_eq!(Urgency::parse_or_medium("urgent!!"), Urgency::Medium);
        assert_eq!(Urgency::parse_or_medium("critical"), Urgency::Critical);
    }

    #[test]
    fn lifecycle_transitions() {
        use TicketStatus::*;
        assert!(is_normal_transition(Pending, InProgress));
        assert!(is_normal_transition(InProgress, Resolved));
        assert!(is_normal_transition(InProgress, Escalated));
        assert!(is_normal_transition(Pending, Cancelled));
        assert!(!is_normal_transition(Pending, Resolved));
        assert!(!is_normal_transition(Resolved, InProgress));
        assert!(!is_normal_transition(Cancelled, InProgress));
    }

    fn ticket(photo_after: Option<&str>) -> Ticket {
        Ticket {
            id: "BDG-20260826-0001".to_string(),
            category: Category::Infrastructure,
            subcategory: None,
            location: "Jalan Dago".to_string(),
            formatted_address: None,
            lat: None,
            lng: None,
            description: "Jalan berlubang".to_string(),
            reporter_phone: "+6285155347701".to_string(),
            reporter_name: Some("Budi".to_string()),
            status: TicketStatus::InProgress,
            urgency: Urgency::Medium,
            assigned_dinas: vec!["dpu-bandung".to_string()],
            photo_before: None,
            photo_after: photo_after.map(String::from),
            rating: None,
            feedback: None,
            rating_otp: None,
            rating_otp_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            resolved_at: None,
            rated_at: None,
        }
    }

    #[test]
    fn resolving_requires_an_after_photo() {
        assert!(!ticket(None).can_resolve_with(None));
    }

    #[test]
    fn resolving_accepts_a_newly_supplied_after_photo() {
        assert!(ticket(None).can_resolve_with(Some("https://storage.example.test/after.jpg")));
    }

    #[test]
    fn resolving_accepts_a_previously_stored_after_photo() {
        assert!(ticket(Some("https://storage.example.test/after.jpg")).can_resolve_with(None));
    }
}
