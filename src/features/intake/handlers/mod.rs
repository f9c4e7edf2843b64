pub mod sms_webhook;
pub mod voice_webhook;
