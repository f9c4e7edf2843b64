use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::config::GeocodingConfig;
use crate::core::error::{AppError, Result};
use crate::shared::llm::{parse_with_fallback, LlmClient, LlmResponse, UserContent};
use std::sync::Arc;
use utoipa::ToSchema;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Outcome of tiered address resolution. Out-of-coverage addresses are
/// reported, not rejected; the caller decides whether to refuse the
/// ticket.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AddressResolution {
    pub valid: bool,
    pub in_coverage: bool,
    pub formatted_address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub confidence: Confidence,
}

/// Well-known Bandung landmarks callers use instead of street addresses.
/// A fuzzy hit short-circuits the geocoder entirely.
struct Landmark {
    name: &'static str,
    aliases: &'static [&'static str],
    lat: f64,
    lng: f64,
}

const LANDMARKS: &[Landmark] = &[
    Landmark {
        name: "gedung sate",
        aliases: &["kantor gubernur jabar"],
        lat: -6.9025,
        lng: 107.6186,
    },
    Landmark {
        name: "alun alun bandung",
        aliases: &["alun-alun", "masjid raya bandung"],
        lat: -6.9219,
        lng: 107.6071,
    },
    Landmark {
        name: "lapangan gasibu",
        aliases: &["gasibu"],
        lat: -6.9000,
        lng: 107.6190,
    },
    Landmark {
        name: "stasiun bandung",
        aliases: &["stasiun hall"],
        lat: -6.9144,
        lng: 107.6023,
    },
    Landmark {
        name: "kebun binatang bandung",
        aliases: &["bandung zoo"],
        lat: -6.8900,
        lng: 107.6069,
    },
    Landmark {
        name: "institut teknologi bandung",
        aliases: &["itb", "kampus itb ganesha"],
        lat: -6.8915,
        lng: 107.6107,
    },
    Landmark {
        name: "pasar baru bandung",
        aliases: &["pasar baru trade center"],
        lat: -6.9175,
        lng: 107.6036,
    },
];

/// Nominatim search result, trimmed to the fields this resolver reads
#[derive(Debug, Deserialize)]
pub struct NominatimResponse {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

/// LLM plausibility judgement used when the geocoder finds nothing
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[schemars(title = "AddressJudgement")]
struct AddressJudgement {
    #[schemars(description = "Whether the text plausibly describes a real address or place")]
    valid: bool,

    #[schemars(description = "Whether the place is likely inside Kota Bandung")]
    in_coverage: bool,

    #[schemars(description = "A cleaned-up, human-readable form of the address, if inferable")]
    formatted_address: Option<String>,

    #[serde(default = "default_true")]
    #[schemars(skip)]
    is_llm_success: bool,

    #[schemars(skip)]
    llm_error_message: Option<String>,
}

impl LlmResponse for AddressJudgement {
    fn mark_as_fallback(&mut self, error_message: String) {
        self.is_llm_success = false;
        self.llm_error_message = Some(error_message);
    }

    fn is_success(&self) -> bool {
        self.is_llm_success
    }
}

/// Tiered address resolution: landmark registry, then Nominatim, then
/// an LLM judgement, degrading to permissive accept so the intake
/// pipeline never blocks on address validation alone.
pub struct AddressService {
    client: reqwest::Client,
    config: GeocodingConfig,
    llm: Arc<LlmClient>,
}

impl AddressService {
    pub fn new(config: GeocodingConfig, llm: Arc<LlmClient>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("AduanKota/1.0 (municipal-complaint-intake)")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            llm,
        })
    }

    pub async fn resolve(&self, address_text: &str) -> AddressResolution {
        // Tier 1: local landmark registry
        if let Some(landmark) = match_landmark(address_text) {
            tracing::debug!("Address matched landmark '{}'", landmark.name);
            return AddressResolution {
                valid: true,
                in_coverage: true,
                formatted_address: Some(format!("{}, Bandung", title_case(landmark.name))),
                lat: Some(landmark.lat),
                lng: Some(landmark.lng),
                confidence: Confidence::High,
            };
        }

        // Tier 2: geocoder
        match self.geocode(address_text).await {
            Ok(Some(hit)) => {
                let lat = hit.lat.parse::<f64>().ok();
                let lng = hit.lon.parse::<f64>().ok();
                let in_coverage = self.is_in_coverage(lat, lng, &hit.display_name);
                return AddressResolution {
                    valid: true,
                    in_coverage,
                    formatted_address: Some(hit.display_name),
                    lat,
                    lng,
                    confidence: Confidence::High,
                };
            }
            Ok(None) => {
                tracing::debug!("Geocoder found nothing for '{}'", address_text);
            }
            Err(e) => {
                tracing::warn!("Geocoder unavailable: {}", e);
            }
        }

        // Tier 3: LLM judgement, then permissive degrade
        self.judge_with_llm(address_text).await
    }

    async fn geocode(&self, address_text: &str) -> Result<Option<NominatimResponse>> {
        let mentions_city = address_text
            .to_lowercase()
            .contains(&self.config.city.to_lowercase());
        let query = if mentions_city {
            address_text.to_string()
        } else {
            format!("{}, {}", address_text, self.config.city)
        };

        let url = format!(
            "{}/search?q={}&format=json&limit=1&countrycodes={}",
            self.config.nominatim_base_url,
            urlencoding::encode(&query),
            self.config.country_code
        );

        tracing::debug!("Geocoding: {} -> {}", address_text, url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Nominatim request failed: {}", e))
        })?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim returned status: {}", response.status());
            return Ok(None);
        }

        let results: Vec<NominatimResponse> = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to parse Nominatim response: {}", e))
        })?;

        Ok(results.into_iter().next())
    }

    /// Inside the service-area bounding box, or the formatted result
    /// mentions the service city. Either condition is enough.
    fn is_in_coverage(&self, lat: Option<f64>, lng: Option<f64>, display_name: &str) -> bool {
        let (south, north, west, east) = self.config.bbox;
        if let (Some(lat), Some(lng)) = (lat, lng) {
            if lat >= south && lat <= north && lng >= west && lng <= east {
                return true;
            }
        }
        display_name
            .to_lowercase()
            .contains(&self.config.city.to_lowercase())
    }

    async fn judge_with_llm(&self, address_text: &str) -> AddressResolution {
        let system = format!(
            "You judge Indonesian address descriptions for a complaint hotline in Kota {city}. \
             The geocoder found nothing for the text below. Decide whether it plausibly \
             describes a real location and whether that location is likely inside Kota {city}.\n\n\
             You MUST respond with valid JSON conforming to this schema:\n```json\n{schema}\n```\n\
             Respond ONLY with the JSON object.",
            city = self.config.city,
            schema = AddressJudgement::json_schema_string()
        );

        match self
            .llm
            .complete(&system, UserContent::Text(address_text.to_string()))
            .await
        {
            Ok(text) => {
                let judgement: AddressJudgement = parse_with_fallback(&text);
                if judgement.is_success() {
                    return AddressResolution {
                        valid: judgement.valid,
                        in_coverage: judgement.in_coverage,
                        formatted_address: judgement.formatted_address,
                        lat: None,
                        lng: None,
                        confidence: Confidence::Medium,
                    };
                }
                tracing::warn!(
                    "Address judgement parse fallback: {:?}",
                    judgement.llm_error_message
                );
            }
            Err(e) => {
                tracing::warn!("Address judgement LLM call failed: {}", e);
            }
        }

        // Permissive degrade: accept, flag coverage by substring only.
        // "No info is worse than wrong info" does not apply to addresses;
        // the ticket still carries the raw text for field crews.
        AddressResolution {
            valid: true,
            in_coverage: address_text
                .to_lowercase()
                .contains(&self.config.city.to_lowercase()),
            formatted_address: None,
            lat: None,
            lng: None,
            confidence: Confidence::Low,
        }
    }
}

/// Lowercase, collapse whitespace, strip punctuation
fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1).min(current[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// Fuzzy landmark lookup: normalized substring containment in either
/// direction, or edit distance <= 2 against the full name/alias.
fn match_landmark(address_text: &str) -> Option<&'static Landmark> {
    let normalized = normalize_text(address_text);
    if normalized.is_empty() {
        return None;
    }

    LANDMARKS.iter().find(|landmark| {
        std::iter::once(landmark.name)
            .chain(landmark.aliases.iter().copied())
            .any(|candidate| {
                let candidate = normalize_text(candidate);
                normalized.contains(&candidate)
                    || candidate.contains(&normalized)
                    || levenshtein(&normalized, &candidate) <= 2
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_matches_exact_and_alias() {
        assert!(match_landmark("Gedung Sate").is_some());
        assert!(match_landmark("depan gasibu").is_some());
        assert!(match_landmark("ITB").is_some());
    }

    #[test]
    fn landmark_tolerates_typos_and_punctuation() {
        // One substitution away from "alun alun bandung" aliases
        assert!(match_landmark("alun-alun").is_some());
        assert!(match_landmark("gedong sate").is_some());
    }

    #[test]
    fn unrelated_text_does_not_match() {
        assert!(match_landmark("Jalan Braga nomor 12").is_none());
        assert!(match_landmark("").is_none());
    }

    #[test]
    fn coverage_by_bbox_or_city_mention() {
        let config = GeocodingConfig {
            nominatim_base_url: "http://localhost".to_string(),
            city: "Bandung".to_string(),
            country_code: "id".to_string(),
            bbox: (-7.05, -6.82, 107.52, 107.75),
        };

        // Build without touching the network path
        let llm = Arc::new(
            LlmClient::new(crate::core::config::LlmConfig {
                api_base: "http://localhost".to_string(),
                api_key: "test".to_string(),
                model: "test".to_string(),
                request_timeout_secs: 1,
            })
            .unwrap(),
        );
        let service = AddressService::new(config, llm).unwrap();

        // Inside bbox, no city mention
        assert!(service.is_in_coverage(Some(-6.90), Some(107.61), "Jl. Diponegoro, Jawa Barat"));
        // Outside bbox, but the formatted text names the city
        assert!(service.is_in_coverage(Some(-6.2), Some(106.8), "Kota Bandung, Jawa Barat"));
        // Outside bbox, no mention
        assert!(!service.is_in_coverage(Some(-6.2), Some(106.8), "Jakarta Pusat"));
        // No coordinates at all
        assert!(!service.is_in_coverage(None, None, "somewhere"));
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("gasibu", "gasibu"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
    }
}
