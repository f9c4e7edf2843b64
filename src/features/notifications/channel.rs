use async_trait::async_trait;

use crate::core::config::NotifyConfig;
use crate::core::error::{AppError, Result};
use crate::features::notifications::models::MessageChannel;

/// One outbound messaging provider. Implementations return the
/// provider's message id on success so the dispatcher can log it.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn channel(&self) -> MessageChannel;

    async fn send(&self, destination: &str, body: &str) -> Result<String>;
}

/// Fonnte-style WhatsApp gateway: form POST with an API-key header.
pub struct WhatsAppGateway {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl WhatsAppGateway {
    pub fn new(http: reqwest::Client, config: &NotifyConfig) -> Self {
        Self {
            http,
            api_url: config.whatsapp_api_url.clone(),
            api_key: config.whatsapp_api_key.clone(),
        }
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppGateway {
    fn channel(&self) -> MessageChannel {
        MessageChannel::Whatsapp
    }

    async fn send(&self, destination: &str, body: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", &self.api_key)
            .form(&[("target", destination), ("message", body)])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("WhatsApp gateway request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "WhatsApp gateway returned HTTP {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Invalid WhatsApp gateway response: {}", e))
        })?;

        // Fonnte returns {"status": true, "id": ["..."]} on accept
        if payload["status"].as_bool() != Some(true) {
            return Err(AppError::ExternalServiceError(format!(
                "WhatsApp gateway rejected message: {}",
                payload["reason"].as_str().unwrap_or("unknown")
            )));
        }

        let id = payload["id"][0]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "accepted".to_string());

        Ok(id)
    }
}

/// Twilio-style SMS gateway: form POST to the Messages resource with
/// basic auth on the account SID.
pub struct SmsGateway {
    http: reqwest::Client,
    api_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl SmsGateway {
    pub fn new(http: reqwest::Client, config: &NotifyConfig) -> Self {
        Self {
            http,
            api_url: config.sms_api_url.clone(),
            account_sid: config.sms_account_sid.clone(),
            auth_token: config.sms_auth_token.clone(),
            from_number: config.sms_from_number.clone(),
        }
    }
}

#[async_trait]
impl NotificationChannel for SmsGateway {
    fn channel(&self) -> MessageChannel {
        MessageChannel::Sms
    }

    async fn send(&self, destination: &str, body: &str) -> Result<String> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.api_url, self.account_sid
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", destination),
                ("From", self.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!("SMS gateway request failed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "SMS gateway returned HTTP {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Invalid SMS gateway response: {}", e))
        })?;

        payload["sid"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::ExternalServiceError("SMS gateway response has no sid".to_string())
            })
    }
}

/// Pick the configured provider. Unknown values are rejected at config
/// load, so this only sees the two supported names.
pub fn channel_from_config(config: &NotifyConfig) -> Result<Box<dyn NotificationChannel>> {
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    match config.provider.as_str() {
        "sms" => Ok(Box::new(SmsGateway::new(http, config))),
        _ => Ok(Box::new(WhatsAppGateway::new(http, config))),
    }
}
