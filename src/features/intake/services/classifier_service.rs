use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

use crate::features::dinas::registry::dinas_for;
use crate::features::tickets::models::{Category, Urgency};
use crate::shared::llm::{parse_with_fallback, LlmClient, LlmResponse, UserContent};

fn default_true() -> bool {
    true
}

const LOCATION_UNKNOWN: &str = "Lokasi tidak disebutkan";

/// Raw classifier output as the model produces it. Category and urgency
/// come back as free strings and are parsed leniently afterwards.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[schemars(title = "AnalyzedComplaint")]
pub struct AnalyzedComplaint {
    #[schemars(
        description = "One of: EMERGENCY, INFRASTRUCTURE, SANITATION, SOCIAL, OTHER"
    )]
    #[serde(default)]
    pub category: String,

    #[schemars(description = "One of: LOW, MEDIUM, HIGH, CRITICAL")]
    #[serde(default)]
    pub urgency: String,

    #[schemars(description = "Short free-text subcategory in Indonesian, e.g. 'Jalan Berlubang'")]
    #[serde(default)]
    pub subcategory: String,

    #[schemars(description = "Cleaned-up complaint description in Indonesian")]
    #[serde(default)]
    pub description: String,

    #[schemars(description = "Location as stated by the reporter, verbatim, or empty if absent")]
    #[serde(default)]
    pub location: String,

    #[schemars(
        description = "One or two sentences in Indonesian summarizing the complaint, spoken back to the caller"
    )]
    #[serde(default)]
    pub spoken_summary: String,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    pub is_llm_success: bool,

    #[schemars(skip)]
    pub llm_error_message: Option<String>,
}

impl LlmResponse for AnalyzedComplaint {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}

/// A classified complaint with every field resolved to a concrete
/// value. No field is ever empty; absent data falls back to safe
/// defaults rather than blocking intake.
#[derive(Debug, Clone)]
pub struct ClassifiedComplaint {
    pub category: Category,
    pub urgency: Urgency,
    pub subcategory: String,
    pub description: String,
    pub location: String,
    pub spoken_summary: String,
    pub assigned_dinas: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// The LLM call itself failed; everything below is defaults
    UpstreamFailure,
    /// The response arrived but could not be parsed as the schema
    ParseFallback,
}

/// Classification result. `degraded` is set when the complaint was
/// built from fallback defaults instead of a real model response, so
/// callers can surface that on the ticket timeline.
#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    pub complaint: ClassifiedComplaint,
    pub degraded: Option<DegradedReason>,
}

pub struct ClassifierService {
    llm: Arc<LlmClient>,
}

impl ClassifierService {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    /// Classify a complaint transcript. Never returns an error: an
    /// unreachable or incoherent model degrades to OTHER/MEDIUM.
    pub async fn classify_text(&self, transcript: &str) -> ClassificationOutcome {
        self.classify(UserContent::Text(transcript.to_string()), transcript)
            .await
    }

    /// Classify a raw voice recording via the multimodal audio path.
    /// The fallback description notes that a recording exists, since
    /// there is no transcript to echo.
    pub async fn classify_audio(&self, bytes: Vec<u8>, mime_type: String) -> ClassificationOutcome {
        self.classify(
            UserContent::Audio { bytes, mime_type },
            "Rekaman suara pelapor (belum ditranskripsi)",
        )
        .await
    }

    async fn classify(&self, content: UserContent, fallback_description: &str) -> ClassificationOutcome {
        let system = build_system_prompt();

        let analyzed = match self.llm.complete(&system, content).await {
            Ok(text) => parse_with_fallback::<AnalyzedComplaint>(&text),
            Err(e) => {
                tracing::warn!("Classifier LLM call failed: {}", e);
                return ClassificationOutcome {
                    complaint: fallback_complaint(fallback_description),
                    degraded: Some(DegradedReason::UpstreamFailure),
                };
            }
        };

        let degraded = if analyzed.is_success() {
            None
        } else {
            tracing::warn!(
                "Classifier parse fallback: {:?}",
                analyzed.llm_error_message
            );
            Some(DegradedReason::ParseFallback)
        };

        ClassificationOutcome {
            complaint: finalize(analyzed, fallback_description),
            degraded,
        }
    }
}

fn build_system_prompt() -> String {
    format!(
        "Anda adalah sistem klasifikasi aduan warga untuk Pemerintah Kota Bandung. \
         Analisis keluhan warga dan keluarkan JSON terstruktur.\n\n\
         Kategori:\n\
         - EMERGENCY: kebakaran, kecelakaan, bencana, ancaman jiwa yang butuh respons segera\n\
         - INFRASTRUCTURE: jalan rusak, jembatan, lampu jalan, drainase, trotoar\n\
         - SANITATION: sampah, saluran tersumbat, limbah, kebersihan lingkungan\n\
         - SOCIAL: bantuan sosial, gelandangan, anak terlantar, kesejahteraan warga\n\
         - OTHER: tidak masuk kategori mana pun\n\n\
         Urgensi (berdasarkan kebutuhan waktu respons):\n\
         - CRITICAL: ancaman jiwa atau kerusakan meluas, respons dalam hitungan jam\n\
         - HIGH: mengganggu banyak orang atau berisiko memburuk, respons dalam 1 hari\n\
         - MEDIUM: gangguan nyata tanpa risiko segera, respons dalam beberapa hari\n\
         - LOW: keluhan minor atau permintaan informasi\n\n\
         Tulis subcategory, description, dan spoken_summary dalam Bahasa Indonesia. Kutip lokasi apa adanya \
         dari keluhan; kosongkan jika tidak disebut. Jangan mengarang lokasi.\n\n\
         Anda HARUS membalas dengan JSON valid sesuai skema berikut:\n```json\n{}\n```\n\
         Balas HANYA dengan objek JSON tersebut.",
        AnalyzedComplaint::json_schema_string()
    )
}

/// Fill unparseable or missing fields with defaults and resolve the
/// responsible agencies. Emergency complaints are never allowed to sit
/// below CRITICAL by default.
fn finalize(analyzed: AnalyzedComplaint, fallback_description: &str) -> ClassifiedComplaint {
    let category = Category::parse_or_other(&analyzed.category);

    let urgency = Urgency::parse(&analyzed.urgency).unwrap_or_else(|| category.default_urgency());

    let subcategory = if analyzed.subcategory.trim().is_empty() {
        "Umum".to_string()
    } else {
        analyzed.subcategory.trim().to_string()
    };

    let description = if analyzed.description.trim().is_empty() {
        fallback_description.to_string()
    } else {
        analyzed.description.trim().to_string()
    };

    let location = if analyzed.location.trim().is_empty() {
        LOCATION_UNKNOWN.to_string()
    } else {
        analyzed.location.trim().to_string()
    };

    let spoken_summary = if analyzed.spoken_summary.trim().is_empty() {
        "Mohon maaf, kami mencatat aduan Anda dan akan segera menindaklanjutinya.".to_string()
    } else {
        analyzed.spoken_summary.trim().to_string()
    };

    let assigned_dinas = dinas_for(category);

    ClassifiedComplaint {
        category,
        urgency,
        subcategory,
        description,
        location,
        spoken_summary,
        assigned_dinas,
    }
}

fn fallback_complaint(description: &str) -> ClassifiedComplaint {
    finalize(AnalyzedComplaint::default(), description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::dinas::registry::FALLBACK_DINAS;

    #[test]
    fn infrastructure_complaint_keeps_its_location() {
        let analyzed = AnalyzedComplaint {
            category: "INFRASTRUCTURE".to_string(),
            urgency: "HIGH".to_string(),
            subcategory: "Jalan Berlubang".to_string(),
            description: "Jalan berlubang besar membahayakan pengendara".to_string(),
            location: "Jalan Dago".to_string(),
            ..Default::default()
        };

        let complaint = finalize(analyzed, "jalan rusak parah di Jalan Dago");
        assert_eq!(complaint.category, Category::Infrastructure);
        assert_eq!(complaint.location, "Jalan Dago");
        assert_eq!(complaint.assigned_dinas, vec!["dpu-bandung"]);
    }

    #[test]
    fn empty_fields_fall_back_to_defaults() {
        let complaint = finalize(AnalyzedComplaint::default(), "keluhan asli warga");
        assert_eq!(complaint.category, Category::Other);
        assert_eq!(complaint.urgency, Urgency::Medium);
        assert_eq!(complaint.subcategory, "Umum");
        assert_eq!(complaint.description, "keluhan asli warga");
        assert_eq!(complaint.location, LOCATION_UNKNOWN);
        assert!(!complaint.spoken_summary.is_empty());
        assert_eq!(complaint.assigned_dinas, vec![FALLBACK_DINAS]);
    }

    #[test]
    fn emergency_without_urgency_defaults_to_critical() {
        let analyzed = AnalyzedComplaint {
            category: "EMERGENCY".to_string(),
            subcategory: "Kebakaran".to_string(),
            description: "Kebakaran rumah di gang sempit".to_string(),
            ..Default::default()
        };

        let complaint = finalize(analyzed, "kebakaran");
        assert_eq!(complaint.urgency, Urgency::Critical);
        assert_eq!(complaint.assigned_dinas.len(), 3);
        assert!(complaint.assigned_dinas.contains(&"damkar-bandung".to_string()));
    }

    #[test]
    fn unknown_enum_strings_degrade_not_error() {
        let analyzed = AnalyzedComplaint {
            category: "WEIRD_CATEGORY".to_string(),
            urgency: "EXTREME".to_string(),
            description: "Deskripsi".to_string(),
            ..Default::default()
        };

        let complaint = finalize(analyzed, "fallback");
        assert_eq!(complaint.category, Category::Other);
        // OTHER's own default, not a hard-coded MEDIUM for garbage input
        assert_eq!(complaint.urgency, Urgency::Medium);
    }

    #[test]
    fn prompt_embeds_the_response_schema() {
        let prompt = build_system_prompt();
        assert!(prompt.contains("INFRASTRUCTURE"));
        assert!(prompt.contains("CRITICAL"));
        assert!(prompt.contains("\"category\""));
    }
}
