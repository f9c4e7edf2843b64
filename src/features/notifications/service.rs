use sqlx::PgPool;

use crate::core::error::Result;
use crate::features::notifications::channel::NotificationChannel;
use crate::features::notifications::models::{MessageChannel, MessageDirection, MessageStatus};
use crate::shared::phone::normalize_phone;

/// Outbound notification dispatcher. Every attempt, successful or not,
/// leaves a message_logs row; delivery failures are logged and swallowed
/// so a gateway outage never fails the enclosing ticket operation.
pub struct NotificationService {
    pool: PgPool,
    channel: Box<dyn NotificationChannel>,
}

impl NotificationService {
    pub fn new(pool: PgPool, channel: Box<dyn NotificationChannel>) -> Self {
        Self { pool, channel }
    }

    /// Send `body` to `destination`, logging the attempt. Returns
    /// whether delivery was accepted by the provider.
    pub async fn notify(&self, ticket_id: Option<&str>, destination: &str, body: &str) -> bool {
        let destination = match normalize_phone(destination) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::warn!(
                    "Skipping notification to unnormalizable destination: {}",
                    e
                );
                return false;
            }
        };

        let (status, provider_message_id) = match self.channel.send(&destination, body).await {
            Ok(id) => {
                tracing::info!(ticket_id = ?ticket_id, provider_id = %id, "Notification sent");
                (MessageStatus::Sent, Some(id))
            }
            Err(e) => {
                tracing::warn!(ticket_id = ?ticket_id, "Notification send failed: {}", e);
                (MessageStatus::Failed, None)
            }
        };

        if let Err(e) = self
            .log_message(
                ticket_id,
                MessageDirection::Outbound,
                self.channel.channel(),
                &destination,
                body,
                provider_message_id.as_deref(),
                status,
            )
            .await
        {
            tracing::error!("Failed to log outbound message: {}", e);
        }

        status == MessageStatus::Sent
    }

    /// Record an inbound message (e.g. an SMS command) for auditability.
    pub async fn log_inbound(
        &self,
        ticket_id: Option<&str>,
        channel: MessageChannel,
        source: &str,
        body: &str,
    ) {
        if let Err(e) = self
            .log_message(
                ticket_id,
                MessageDirection::Inbound,
                channel,
                source,
                body,
                None,
                MessageStatus::Received,
            )
            .await
        {
            tracing::error!("Failed to log inbound message: {}", e);
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn log_message(
        &self,
        ticket_id: Option<&str>,
        direction: MessageDirection,
        channel: MessageChannel,
        destination: &str,
        body: &str,
        provider_message_id: Option<&str>,
        status: MessageStatus,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO message_logs
                (id, ticket_id, direction, channel, destination, body, provider_message_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(ticket_id)
        .bind(direction)
        .bind(channel)
        .bind(destination)
        .bind(body)
        .bind(provider_message_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
