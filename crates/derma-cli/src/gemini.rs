//! Gemini client for the two external collaborators: label-photo ingredient
//! extraction and the follow-up chat. Only request building and reply
//! unpacking live here; interpreting the reply is `derma_core`'s job.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use derma_core::{ChatTurn, EXTRACTION_PROMPT, Role, parse_reply};
use derma_store::settings::AssistantSettings;

/// Checked in order.
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

pub fn api_key_from_env() -> Result<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty())
        .with_context(|| format!("no API key: set {}", API_KEY_VARS.join(" or ")))
}

/// MIME type for an image path, by extension. Unknown extensions are sent as JPEG.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    api_base: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: String, settings: &AssistantSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_key,
            model: settings.model.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_env(settings: &AssistantSettings) -> Result<Self> {
        Self::new(api_key_from_env()?, settings)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        tracing::debug!(model = %self.model, turns = request.contents.len(), "calling Gemini");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Gemini API error: {body}");
            bail!("Gemini API returned {status}: {body}");
        }

        response
            .json()
            .await
            .context("failed to parse Gemini response")
    }

    /// Send a label photo and return the standardized ingredient names it lists.
    /// An empty or blocked reply is zero detections, not an error.
    pub async fn extract_ingredients(&self, image: &[u8], mime_type: &str) -> Result<Vec<String>> {
        let reply = self.generate(&extraction_request(image, mime_type)).await?;
        let names = extracted_names(reply);
        tracing::info!(detected = names.len(), "ingredients extracted from image");
        Ok(names)
    }

    /// One chat round trip. `history` is everything said so far, oldest first.
    pub async fn chat(&self, history: &[ChatTurn], message: &str) -> Result<String> {
        reply_text(self.generate(&chat_request(history, message)).await?)
    }
}

fn extraction_request(image: &[u8], mime_type: &str) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            role: None,
            parts: vec![
                Part::Text {
                    text: EXTRACTION_PROMPT.to_string(),
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: mime_type.to_string(),
                        data: general_purpose::STANDARD.encode(image),
                    },
                },
            ],
        }],
    }
}

fn chat_request(history: &[ChatTurn], message: &str) -> GenerateRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|turn| Content {
            role: Some(turn.role),
            parts: vec![Part::Text {
                text: turn.content.clone(),
            }],
        })
        .collect();
    contents.push(Content {
        role: Some(Role::User),
        parts: vec![Part::Text {
            text: message.to_string(),
        }],
    });
    GenerateRequest { contents }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(reply: GenerateResponse) -> String {
    reply
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default()
}

fn extracted_names(reply: GenerateResponse) -> Vec<String> {
    parse_reply(&candidate_text(reply))
}

/// Chat replies must say something.
fn reply_text(reply: GenerateResponse) -> Result<String> {
    let text = candidate_text(reply);
    if text.trim().is_empty() {
        bail!("no response from Gemini");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_request_shape() {
        let json = serde_json::to_value(extraction_request(b"\xff\xd8\xff", "image/jpeg")).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], EXTRACTION_PROMPT);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "/9j/");
        assert!(json["contents"][0].get("role").is_none());
    }

    #[test]
    fn test_chat_request_appends_message() {
        let history = vec![ChatTurn::user("context"), ChatTurn::model("ok")];
        let json = serde_json::to_value(chat_request(&history, "Can I use this daily?")).unwrap();
        let contents = json["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
        assert_eq!(contents[2]["parts"][0]["text"], "Can I use this daily?");
    }

    #[test]
    fn test_reply_text_joins_parts() {
        let reply: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Water, "}, {"text": "Glycerin"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(reply_text(reply).unwrap(), "Water, Glycerin");
    }

    #[test]
    fn test_empty_chat_reply_is_error() {
        let blocked: GenerateResponse =
            serde_json::from_value(serde_json::json!({"candidates": [{"finishReason": "SAFETY"}]}))
                .unwrap();
        assert!(reply_text(blocked).is_err());

        let none: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(reply_text(none).is_err());
    }

    #[test]
    fn test_empty_extraction_is_zero_detections() {
        let none: GenerateResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert!(extracted_names(none).is_empty());

        let blocked: GenerateResponse =
            serde_json::from_value(serde_json::json!({"candidates": [{"finishReason": "SAFETY"}]}))
                .unwrap();
        assert!(extracted_names(blocked).is_empty());

        let unusable: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": " , \n "}]}}]
        }))
        .unwrap();
        assert!(extracted_names(unusable).is_empty());
    }

    #[test]
    fn test_extracted_names_split_reply() {
        let reply: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Aqua, Glycerin,\n- Niacinamide."}]}}]
        }))
        .unwrap();
        assert_eq!(extracted_names(reply), vec!["Aqua", "Glycerin", "Niacinamide"]);
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("label.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("label.webp")), "image/webp");
        assert_eq!(mime_type_for(Path::new("label.jpg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("label")), "image/jpeg");
    }

    #[test]
    fn test_endpoint_trims_base() {
        let settings = AssistantSettings {
            api_base: "http://localhost:9000/v1beta/".to_string(),
            ..AssistantSettings::default()
        };
        let client = GeminiClient::new("key".to_string(), &settings).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
