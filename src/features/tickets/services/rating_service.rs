use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sqlx::PgPool;
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::notifications::service::NotificationService;
use crate::features::notifications::templates;
use crate::features::tickets::dtos::ticket_dto::{RequestOtpResponse, SubmitRatingRequest};
use crate::features::tickets::models::{NewTimelineEntry, Ticket, TicketStatus, TimelineAction};
use crate::features::tickets::services::ticket_service::TicketService;
use crate::shared::constants::{AUTHOR_REPORTER, FEEDBACK_MAX_LEN, OTP_RESEND_COOLDOWN, OTP_VALIDITY};
use crate::shared::phone::mask_phone;

/// OTP-gated citizen rating. A rating is only accepted on a resolved,
/// unrated ticket and only with the currently valid code; issuing a new
/// code invalidates the previous one by overwriting it.
pub struct RatingService {
    pool: PgPool,
    tickets: Arc<TicketService>,
    notifications: Arc<NotificationService>,
}

impl RatingService {
    pub fn new(
        pool: PgPool,
        tickets: Arc<TicketService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            pool,
            tickets,
            notifications,
        }
    }

    pub async fn request_otp(&self, ticket_id: &str) -> Result<RequestOtpResponse> {
        let ticket = self.tickets.fetch(ticket_id).await?;
        check_rateable(&ticket)?;

        let now = Utc::now();
        if let Some(expires_at) = ticket.rating_otp_expires_at {
            if let Some(wait_seconds) = cooldown_remaining(expires_at, now) {
                return Err(AppError::OtpCooldown { wait_seconds });
            }
        }

        let code = generate_otp();
        let expires_at = now + Duration::from_std(OTP_VALIDITY).unwrap_or(Duration::minutes(30));

        sqlx::query(
            "UPDATE tickets SET rating_otp = $2, rating_otp_expires_at = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(ticket_id)
        .bind(&code)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let validity_minutes = OTP_VALIDITY.as_secs() / 60;
        self.notifications
            .notify(
                Some(ticket_id),
                &ticket.reporter_phone,
                &templates::rating_otp(ticket_id, &code, validity_minutes),
            )
            .await;

        Ok(RequestOtpResponse {
            sent_to: mask_phone(&ticket.reporter_phone),
            expires_at,
        })
    }

    pub async fn submit_rating(&self, ticket_id: &str, req: SubmitRatingRequest) -> Result<()> {
        check_rating_value(req.rating)?;
        check_feedback(req.feedback.as_deref())?;

        let ticket = self.tickets.fetch(ticket_id).await?;
        check_rateable(&ticket)?;
        verify_otp(
            ticket.rating_otp.as_deref(),
            ticket.rating_otp_expires_at,
            &req.otp,
            Utc::now(),
        )?;

        sqlx::query(
            r#"
            UPDATE tickets
            SET rating = $2, feedback = $3, rated_at = $4,
                rating_otp = NULL, rating_otp_expires_at = NULL, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(ticket_id)
        .bind(req.rating)
        .bind(&req.feedback)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.tickets
            .append_timeline(NewTimelineEntry {
                ticket_id: ticket_id.to_string(),
                action: TimelineAction::Note,
                message: format!("Pelapor memberi rating {}/5", req.rating),
                author: AUTHOR_REPORTER.to_string(),
                is_public: true,
                metadata: Some(serde_json::json!({ "rating": req.rating })),
            })
            .await;

        Ok(())
    }
}

fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// A ticket takes a rating only after resolution and only once.
fn check_rateable(ticket: &Ticket) -> Result<()> {
    if ticket.status != TicketStatus::Resolved {
        return Err(AppError::NotResolved);
    }
    if ticket.rating.is_some() {
        return Err(AppError::AlreadyRated);
    }
    Ok(())
}

fn check_rating_value(rating: i32) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::InvalidRating)
    }
}

fn check_feedback(feedback: Option<&str>) -> Result<()> {
    match feedback {
        Some(text) if text.chars().count() > FEEDBACK_MAX_LEN => Err(AppError::FeedbackTooLong),
        _ => Ok(()),
    }
}

/// Seconds left in the resend cooldown, or None once it has elapsed.
/// The issue instant is reconstructed from the stored expiry and the
/// fixed validity window.
fn cooldown_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    let validity = Duration::from_std(OTP_VALIDITY).ok()?;
    let cooldown = Duration::from_std(OTP_RESEND_COOLDOWN).ok()?;
    let issued_at = expires_at - validity;
    let elapsed = now - issued_at;

    if elapsed < cooldown {
        Some((cooldown - elapsed).num_seconds().max(1))
    } else {
        None
    }
}

fn verify_otp(
    stored: Option<&str>,
    stored_expiry: Option<DateTime<Utc>>,
    provided: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let (code, expires_at) = match (stored, stored_expiry) {
        (Some(code), Some(expires_at)) => (code, expires_at),
        // No outstanding code: indistinguishable from a wrong guess
        _ => return Err(AppError::OtpMismatch),
    };

    if now > expires_at {
        return Err(AppError::OtpExpired);
    }
    if code != provided.trim() {
        return Err(AppError::OtpMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tickets::models::{Category, Urgency};

    fn resolved_ticket() -> Ticket {
        Ticket {
            id: "BDG-20260826-0007".to_string(),
            category: Category::Infrastructure,
            subcategory: None,
            location: "Jalan Dago".to_string(),
            formatted_address: None,
            lat: None,
            lng: None,
            description: "Jalan rusak".to_string(),
            reporter_phone: "+6285155347701".to_string(),
            reporter_name: None,
            status: TicketStatus::Resolved,
            urgency: Urgency::High,
            assigned_dinas: vec!["dpu-bandung".to_string()],
            photo_before: None,
            photo_after: Some("https://storage.aduan.bandung.go.id/x.jpg".to_string()),
            rating: None,
            feedback: None,
            rating_otp: None,
            rating_otp_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            resolved_at: Some(Utc::now()),
            rated_at: None,
        }
    }

    #[test]
    fn rating_requires_resolution_and_is_single_shot() {
        let mut ticket = resolved_ticket();
        assert!(check_rateable(&ticket).is_ok());

        ticket.status = TicketStatus::InProgress;
        assert!(matches!(check_rateable(&ticket), Err(AppError::NotResolved)));

        ticket.status = TicketStatus::Resolved;
        ticket.rating = Some(5);
        assert!(matches!(check_rateable(&ticket), Err(AppError::AlreadyRated)));
    }

    #[test]
    fn rating_value_bounds() {
        assert!(check_rating_value(1).is_ok());
        assert!(check_rating_value(5).is_ok());
        assert!(matches!(check_rating_value(0), Err(AppError::InvalidRating)));
        assert!(matches!(check_rating_value(6), Err(AppError::InvalidRating)));
    }

    #[test]
    fn feedback_length_is_capped() {
        assert!(check_feedback(None).is_ok());
        assert!(check_feedback(Some(&"a".repeat(FEEDBACK_MAX_LEN))).is_ok());
        assert!(matches!(
            check_feedback(Some(&"a".repeat(FEEDBACK_MAX_LEN + 1))),
            Err(AppError::FeedbackTooLong)
        ));
    }

    #[test]
    fn cooldown_window_then_free() {
        let now = Utc::now();
        let validity = Duration::from_std(OTP_VALIDITY).unwrap();

        // Issued just now
        let wait = cooldown_remaining(now + validity, now);
        assert!(wait.is_some());
        assert!(wait.unwrap() > 0);

        // Issued 90 seconds ago, cooldown is 60
        let issued_90s_ago = now - Duration::seconds(90) + validity;
        assert_eq!(cooldown_remaining(issued_90s_ago, now), None);
    }

    #[test]
    fn otp_verification_paths_are_distinct() {
        let now = Utc::now();
        let future = now + Duration::minutes(10);
        let past = now - Duration::minutes(1);

        assert!(verify_otp(Some("123456"), Some(future), "123456", now).is_ok());
        assert!(verify_otp(Some("123456"), Some(future), " 123456 ", now).is_ok());
        assert!(matches!(
            verify_otp(Some("123456"), Some(future), "000000", now),
            Err(AppError::OtpMismatch)
        ));
        assert!(matches!(
            verify_otp(Some("123456"), Some(past), "123456", now),
            Err(AppError::OtpExpired)
        ));
        assert!(matches!(
            verify_otp(None, None, "123456", now),
            Err(AppError::OtpMismatch)
        ));
    }

    #[test]
    fn otp_codes_are_six_digits() {
        for _ in 0..50 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
