//! HTTP parser client — local LLM inference over the Ollama generate API.

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::types::RawPrescription;
use super::{ParseError, PrescriptionParser};

const SYSTEM_PROMPT: &str = "\
You are a prescription transcription assistant. Extract every medication from \
the prescription the user provides and respond with ONLY a JSON object of this \
exact shape, no prose:\n\
{\n\
  \"medications\": [{\"name\": \"...\", \"dosage\": \"...\", \"frequency\": \"...\", \
\"duration\": \"...\", \"instructions\": \"...\"}],\n\
  \"schedule\": {\"times_per_day\": 1, \"preferred_times\": [\"morning\"], \
\"food_timing\": \"neutral\", \"duration_days\": 7, \"start_time_minutes\": 480, \
\"end_time_minutes\": 1200, \"interval_days\": 1}\n\
}\n\
Omit \"schedule\" entirely if the prescription gives no timing information. \
Omit \"start_time_minutes\"/\"end_time_minutes\" unless the prescription names \
specific times of day.";

/// HTTP client for a local LLM inference service.
pub struct HttpParserClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpParserClient {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Default local instance with a 5-minute timeout.
    pub fn default_local(model: &str) -> Self {
        Self::new("http://localhost:11434", model, 300)
    }

    fn generate(&self, prompt: &str, images: Vec<String>) -> Result<RawPrescription, ParseError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            system: SYSTEM_PROMPT,
            stream: false,
            images,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                ParseError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                ParseError::Timeout(self.timeout_secs)
            } else {
                ParseError::Malformed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ParseError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ParseError::Malformed(e.to_string()))?;

        parse_prescription_response(&parsed.response)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl PrescriptionParser for HttpParserClient {
    fn parse_text(&self, text: &str) -> Result<RawPrescription, ParseError> {
        let prompt = format!("Prescription text:\n{text}");
        self.generate(&prompt, Vec::new())
    }

    fn parse_image(&self, bytes: &[u8], mime_type: &str) -> Result<RawPrescription, ParseError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let prompt = format!("Transcribe the attached prescription image ({mime_type}).");
        self.generate(&prompt, vec![encoded])
    }
}

/// Parse a conversational LLM response into the wire shape.
pub fn parse_prescription_response(response: &str) -> Result<RawPrescription, ParseError> {
    let json = extract_json_block(response)?;
    let parsed: RawPrescription =
        serde_json::from_str(json).map_err(|e| ParseError::Malformed(e.to_string()))?;

    if parsed.medications.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(parsed)
}

/// Extract a JSON block from LLM response text.
/// Handles responses that wrap the JSON in prose or markdown fences.
fn extract_json_block(response: &str) -> Result<&str, ParseError> {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Ok(after_fence[..end].trim());
        }
    }

    // Find the first { and last }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return Ok(&trimmed[start..=end]);
        }
    }

    Err(ParseError::MissingJson)
}

/// Canned parser for tests and offline development.
pub struct MockParser {
    response: Result<RawPrescription, String>,
}

impl MockParser {
    pub fn returning(prescription: RawPrescription) -> Self {
        Self {
            response: Ok(prescription),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

impl PrescriptionParser for MockParser {
    fn parse_text(&self, _text: &str) -> Result<RawPrescription, ParseError> {
        self.response
            .clone()
            .map_err(ParseError::Malformed)
    }

    fn parse_image(&self, _bytes: &[u8], _mime: &str) -> Result<RawPrescription, ParseError> {
        self.response
            .clone()
            .map_err(ParseError::Malformed)
    }
}
