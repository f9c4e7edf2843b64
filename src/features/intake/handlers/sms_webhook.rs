use axum::{extract::State, response::Response, Form};
use serde::Deserialize;

use crate::features::intake::handlers::voice_webhook::twiml_response;
use crate::features::intake::routes::IntakeState;
use crate::features::intake::twiml::TwimlResponse;
use crate::features::notifications::models::MessageChannel;
use crate::features::notifications::templates;
use crate::shared::phone::normalize_phone;

#[derive(Debug, Deserialize)]
pub struct InboundSms {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "Body")]
    pub body: Option<String>,
}

/// Inbound SMS command webhook. Supported grammar is a single command,
/// `CEK <TICKET-ID>`, case-insensitive; anything else gets usage help.
pub async fn handle(State(state): State<IntakeState>, Form(sms): Form<InboundSms>) -> Response {
    let from = sms.from.unwrap_or_default();
    let body = sms.body.unwrap_or_default();

    let ticket_id = parse_cek_command(&body);
    let sender = sender_identity(&from);

    state
        .notifications
        .log_inbound(ticket_id.as_deref(), MessageChannel::Sms, &sender, &body)
        .await;

    let reply = match ticket_id {
        Some(id) => match state.tickets.fetch(&id).await {
            Ok(ticket) => templates::tracking_reply(&ticket),
            Err(e) => {
                tracing::debug!("SMS tracking lookup for '{}' failed: {}", id, e);
                templates::tracking_not_found(&id)
            }
        },
        None => templates::sms_help(),
    };

    twiml_response(TwimlResponse::new().message(&reply).build())
}

/// Canonical sender for the message log, so inbound rows match the
/// normalized reporter numbers on tickets. Alphanumeric sender ids
/// (operator shortcodes) pass through as-is.
fn sender_identity(from: &str) -> String {
    normalize_phone(from).unwrap_or_else(|_| from.to_string())
}

/// Extract the ticket id from a `CEK <id>` command, or None when the
/// body does not match the grammar.
fn parse_cek_command(body: &str) -> Option<String> {
    let mut words = body.split_whitespace();
    let command = words.next()?;
    if !command.eq_ignore_ascii_case("cek") {
        return None;
    }
    let id = words.next()?;
    if words.next().is_some() {
        return None;
    }
    Some(id.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cek_command_is_case_insensitive() {
        assert_eq!(
            parse_cek_command("CEK BDG-20260826-0001"),
            Some("BDG-20260826-0001".to_string())
        );
        assert_eq!(
            parse_cek_command("cek bdg-20260826-0001"),
            Some("BDG-20260826-0001".to_string())
        );
        assert_eq!(
            parse_cek_command("  Cek   BDG-20260826-0001  "),
            Some("BDG-20260826-0001".to_string())
        );
    }

    #[test]
    fn inbound_senders_are_logged_in_canonical_form() {
        assert_eq!(sender_identity("0812-3456-7890"), "+6281234567890");
        assert_eq!(sender_identity("6281234567890"), "+6281234567890");
        // Operator shortcodes are not phone numbers and stay raw
        assert_eq!(sender_identity("INFO"), "INFO");
        assert_eq!(sender_identity("3636"), "3636");
    }

    #[test]
    fn non_matching_bodies_are_rejected() {
        assert_eq!(parse_cek_command(""), None);
        assert_eq!(parse_cek_command("halo"), None);
        assert_eq!(parse_cek_command("CEK"), None);
        assert_eq!(parse_cek_command("CEK one two"), None);
        assert_eq!(parse_cek_command("STATUS BDG-20260826-0001"), None);
    }
}
