use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::features::intake::routes::IntakeState;
use crate::features::intake::services::classifier_service::{ClassificationOutcome, DegradedReason};
use crate::features::intake::twiml::TwimlResponse;
use crate::features::tickets::dtos::ticket_dto::CreateTicketRequest;

const APOLOGY: &str =
    "Mohon maaf, terjadi kendala pada sistem kami. Silakan coba beberapa saat lagi \
     atau hubungi petugas kami di jam kerja.";

const ASK_ADDRESS: &str =
    "Mohon maaf, kami belum menangkap alamat kejadian. Bisa tolong sebutkan alamat \
     atau patokan lokasinya?";

const ASK_NAME: &str =
    "Mohon maaf, boleh kami tahu nama Anda untuk pencatatan tiket?";

const RECORD_MAX_SECS: u32 = 120;

/// Voice-AI platform webhook payload. Only `function-call` messages are
/// acted on; everything else is acknowledged and ignored.
#[derive(Debug, Deserialize)]
pub struct VoiceWebhookPayload {
    pub message: Option<VoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct VoiceMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "functionCall")]
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub parameters: Value,
}

/// Static health check for the voice platform's uptime probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "voice-webhook" }))
}

/// Function-call dispatch. Every path out of this handler is a payload
/// the voice agent can speak: either a result object or an apologetic
/// sentence. Raw errors never reach the caller.
pub async fn handle(
    State(state): State<IntakeState>,
    Json(payload): Json<VoiceWebhookPayload>,
) -> Json<Value> {
    let Some(message) = payload.message else {
        return Json(json!({ "result": "ignored" }));
    };
    if message.kind != "function-call" {
        return Json(json!({ "result": "ignored" }));
    }
    let Some(call) = message.function_call else {
        return Json(json!({ "result": "ignored" }));
    };

    tracing::info!("Voice function call: {}", call.name);

    match call.name.as_str() {
        "validateAddress" => validate_address(&state, &call.parameters).await,
        "createTicket" => create_ticket(&state, &call.parameters).await,
        other => {
            tracing::warn!("Unknown voice function call: {}", other);
            Json(json!(APOLOGY))
        }
    }
}

async fn validate_address(state: &IntakeState, parameters: &Value) -> Json<Value> {
    let address = parameters["address"].as_str().unwrap_or("").trim();
    if address.is_empty() {
        return Json(json!(ASK_ADDRESS));
    }

    let resolution = state.address.resolve(address).await;
    Json(json!({
        "valid": resolution.valid,
        "inCoverage": resolution.in_coverage,
        "formattedAddress": resolution.formatted_address,
        "confidence": resolution.confidence,
    }))
}

async fn create_ticket(state: &IntakeState, parameters: &Value) -> Json<Value> {
    let description = parameters["description"].as_str().unwrap_or("").trim();
    let phone = parameters["phone"]
        .as_str()
        .or_else(|| parameters["caller"].as_str())
        .unwrap_or("")
        .trim();
    let address = parameters["address"].as_str().unwrap_or("").trim();
    let reporter_name = parameters["name"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    if description.is_empty() {
        return Json(json!(
            "Mohon maaf, kami belum menangkap isi keluhan Anda. Bisa tolong diulangi?"
        ));
    }
    if phone.is_empty() {
        return Json(json!(
            "Mohon maaf, kami tidak dapat mengenali nomor telepon Anda untuk konfirmasi."
        ));
    }
    if address.is_empty() {
        return Json(json!(ASK_ADDRESS));
    }
    if reporter_name.is_none() {
        return Json(json!(ASK_NAME));
    }

    let outcome = state.classifier.classify_text(description).await;
    let resolution = state.address.resolve(address).await;

    let request = CreateTicketRequest {
        category: Some(outcome.complaint.category),
        subcategory: Some(outcome.complaint.subcategory.clone()),
        location: address.to_string(),
        formatted_address: resolution.formatted_address.clone(),
        lat: resolution.lat,
        lng: resolution.lng,
        description: outcome.complaint.description.clone(),
        reporter_phone: phone.to_string(),
        reporter_name,
        urgency: Some(outcome.complaint.urgency),
        photo_before: None,
    };

    match state
        .tickets
        .create(request, intake_note(&outcome, resolution.in_coverage))
        .await
    {
        Ok(created) => {
            state.cache.invalidate_tickets();
            Json(json!({
                "success": true,
                "ticketId": created.ticket_id,
                "trackUrl": created.track_url,
                "message": outcome.complaint.spoken_summary,
            }))
        }
        Err(e) => {
            tracing::error!("Voice ticket creation failed: {}", e);
            Json(json!(APOLOGY))
        }
    }
}

/// Internal note flagging degraded classification or an out-of-coverage
/// address, so staff can spot tickets built from fallback defaults.
fn intake_note(outcome: &ClassificationOutcome, in_coverage: bool) -> Option<String> {
    let mut notes = Vec::new();
    match outcome.degraded {
        Some(DegradedReason::UpstreamFailure) => {
            notes.push("Klasifikasi otomatis gagal; kategori memakai nilai bawaan")
        }
        Some(DegradedReason::ParseFallback) => {
            notes.push("Keluaran klasifikasi tidak valid; kategori memakai nilai bawaan")
        }
        None => {}
    }
    if !in_coverage {
        notes.push("Alamat kemungkinan di luar wilayah layanan");
    }
    if notes.is_empty() {
        None
    } else {
        Some(notes.join(". "))
    }
}

/// Incoming call fallback when the conversational agent is unavailable:
/// greet and record the complaint for the recording callback below.
pub async fn incoming_call() -> Response {
    let xml = TwimlResponse::new()
        .say(
            "Selamat datang di layanan aduan warga Kota Bandung. \
             Setelah nada, sampaikan keluhan Anda beserta alamat kejadian.",
        )
        .record(RECORD_MAX_SECS, "/webhooks/voice/recording")
        .build();
    twiml_response(xml)
}

#[derive(Debug, Deserialize)]
pub struct RecordingCallback {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "RecordingUrl")]
    pub recording_url: Option<String>,
}

/// Recording callback: fetch the audio, classify it directly through
/// the multimodal path, and confirm the ticket in the same call.
pub async fn recording(
    State(state): State<IntakeState>,
    Form(callback): Form<RecordingCallback>,
) -> Response {
    let Some(recording_url) = callback.recording_url.filter(|u| !u.is_empty()) else {
        return spoken_apology("Kami tidak menerima rekaman Anda.");
    };
    let Some(phone) = callback.from.filter(|f| !f.is_empty()) else {
        return spoken_apology("Kami tidak dapat mengenali nomor telepon Anda.");
    };

    let audio = match fetch_recording(&state, &recording_url).await {
        Ok(audio) => audio,
        Err(e) => {
            tracing::error!("Failed to fetch recording: {}", e);
            return spoken_apology(APOLOGY);
        }
    };

    let outcome = state.classifier.classify_audio(audio.bytes, audio.mime_type).await;
    let resolution = state.address.resolve(&outcome.complaint.location).await;

    let request = CreateTicketRequest {
        category: Some(outcome.complaint.category),
        subcategory: Some(outcome.complaint.subcategory.clone()),
        location: outcome.complaint.location.clone(),
        formatted_address: resolution.formatted_address.clone(),
        lat: resolution.lat,
        lng: resolution.lng,
        description: outcome.complaint.description.clone(),
        reporter_phone: phone,
        reporter_name: None,
        urgency: Some(outcome.complaint.urgency),
        photo_before: None,
    };

    match state
        .tickets
        .create(request, intake_note(&outcome, resolution.in_coverage))
        .await
    {
        Ok(created) => {
            state.cache.invalidate_tickets();
            let xml = TwimlResponse::new()
                .say(&format!(
                    "{} Nomor tiket Anda adalah {}. Kami juga mengirimkannya melalui pesan.",
                    outcome.complaint.spoken_summary, created.ticket_id
                ))
                .hangup()
                .build();
            twiml_response(xml)
        }
        Err(e) => {
            tracing::error!("Recording ticket creation failed: {}", e);
            spoken_apology(APOLOGY)
        }
    }
}

struct FetchedAudio {
    bytes: Vec<u8>,
    mime_type: String,
}

async fn fetch_recording(
    state: &IntakeState,
    url: &str,
) -> crate::core::error::Result<FetchedAudio> {
    use crate::core::error::AppError;

    let response = state.http.get(url).send().await.map_err(|e| {
        AppError::ExternalServiceError(format!("Recording download failed: {}", e))
    })?;

    if !response.status().is_success() {
        return Err(AppError::ExternalServiceError(format!(
            "Recording download returned HTTP {}",
            response.status()
        )));
    }

    let mime_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("audio/wav")
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::ExternalServiceError(format!("Recording read failed: {}", e)))?
        .to_vec();

    Ok(FetchedAudio { bytes, mime_type })
}

fn spoken_apology(text: &str) -> Response {
    twiml_response(TwimlResponse::new().say(text).hangup().build())
}

pub(crate) fn twiml_response(xml: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::intake::services::classifier_service::ClassifiedComplaint;
    use crate::features::tickets::models::{Category, Urgency};

    fn outcome(degraded: Option<DegradedReason>) -> ClassificationOutcome {
        ClassificationOutcome {
            complaint: ClassifiedComplaint {
                category: Category::Infrastructure,
                urgency: Urgency::Medium,
                subcategory: "Umum".to_string(),
                description: "x".to_string(),
                location: "y".to_string(),
                spoken_summary: "z".to_string(),
                assigned_dinas: vec!["dpu-bandung".to_string()],
            },
            degraded,
        }
    }

    #[test]
    fn clean_intake_leaves_no_note() {
        assert_eq!(intake_note(&outcome(None), true), None);
    }

    #[test]
    fn degraded_and_coverage_flags_are_noted() {
        let note = intake_note(&outcome(Some(DegradedReason::UpstreamFailure)), false);
        let note = note.unwrap();
        assert!(note.contains("Klasifikasi otomatis gagal"));
        assert!(note.contains("luar wilayah layanan"));
    }

    #[test]
    fn webhook_payload_parses_function_calls() {
        let payload: VoiceWebhookPayload = serde_json::from_value(json!({
            "message": {
                "type": "function-call",
                "functionCall": {
                    "name": "validateAddress",
                    "parameters": { "address": "Gedung Sate" }
                }
            }
        }))
        .unwrap();

        let call = payload.message.unwrap().function_call.unwrap();
        assert_eq!(call.name, "validateAddress");
        assert_eq!(call.parameters["address"], "Gedung Sate");
    }

    #[test]
    fn non_function_messages_are_ignored_shape() {
        let payload: VoiceWebhookPayload = serde_json::from_value(json!({
            "message": { "type": "transcript" }
        }))
        .unwrap();
        assert_eq!(payload.message.unwrap().kind, "transcript");
    }
}
