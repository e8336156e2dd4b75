use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use super::{ContentRequest, ContentResponse, GenerativeApi, ModelRole, Part};
use crate::config::Config;
use crate::error::{ConfigError, GenerationError};
use crate::image::InlineImage;

/// [`GenerativeApi`] backed by the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl std::fmt::Debug for GeminiApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiApi")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

impl GeminiApi {
    /// Build a client from `config`. Fails without a credential.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        let http = build_http(reqwest::Client::builder().timeout(config.request_timeout()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn model(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Text => &self.text_model,
            ModelRole::Image => &self.image_model,
        }
    }

    fn endpoint(&self, role: ModelRole) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model(role)
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize, Default)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireBlob>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    mime_type: String,
    data: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Deserialize)]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
}

#[derive(Deserialize)]
struct WireError {
    error: WireErrorBody,
}

#[derive(Deserialize)]
struct WireErrorBody {
    #[serde(default)]
    message: String,
}

fn to_wire(part: &Part) -> WirePart {
    match part {
        Part::Text(t) => WirePart {
            text: Some(t.clone()),
            inline_data: None,
        },
        Part::Image(img) => WirePart {
            text: None,
            inline_data: Some(WireBlob {
                mime_type: img.mime_type.clone(),
                data: img.to_base64(),
            }),
        },
    }
}

fn build_request(req: &ContentRequest) -> WireRequest {
    let config = GenerationConfig {
        temperature: req.temperature,
        response_mime_type: req
            .response_schema
            .as_ref()
            .map(|_| "application/json".to_string()),
        response_schema: req.response_schema.clone(),
        response_modalities: req
            .wants_image
            .then(|| vec!["TEXT".to_string(), "IMAGE".to_string()]),
    };
    let has_config = config.temperature.is_some()
        || config.response_schema.is_some()
        || config.response_modalities.is_some();
    WireRequest {
        contents: vec![WireContent {
            role: Some("user".into()),
            parts: req.parts.iter().map(to_wire).collect(),
        }],
        system_instruction: req.system_instruction.as_ref().map(|s| WireContent {
            role: None,
            parts: vec![WirePart {
                text: Some(s.clone()),
                inline_data: None,
            }],
        }),
        generation_config: has_config.then_some(config),
    }
}

fn from_wire(resp: WireResponse) -> Result<ContentResponse, GenerationError> {
    let parts = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        if let Some(blob) = part.inline_data {
            if !blob.data.is_empty() {
                out.push(Part::Image(InlineImage::from_base64(
                    blob.mime_type,
                    &blob.data,
                )?));
            }
        } else if let Some(text) = part.text {
            out.push(Part::Text(text));
        }
    }
    Ok(ContentResponse { parts: out })
}

#[async_trait]
impl GenerativeApi for GeminiApi {
    async fn generate(&self, request: &ContentRequest) -> Result<ContentResponse, GenerationError> {
        let url = self.endpoint(request.model);
        let body = build_request(request);
        trace!(target: "llm", %url, prompt = %request.prompt_text(), "gemini request");
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<WireError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            debug!(target: "llm", status = status.as_u16(), %message, "gemini error");
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let wire: WireResponse = resp.json().await?;
        let out = from_wire(wire)?;
        debug!(
            target: "llm",
            parts = out.parts.len(),
            has_image = out.first_image().is_some(),
            "gemini response"
        );
        Ok(out)
    }
}

fn build_http(builder: reqwest::ClientBuilder) -> Result<reqwest::Client, ConfigError> {
    builder.build().map_err(ConfigError::HttpClient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let req = ContentRequest::image_model()
            .image(InlineImage::png(vec![0, 1, 2]))
            .with_text("make it blue");
        let body = serde_json::to_value(build_request(&req)).unwrap();
        assert_eq!(
            body["contents"][0]["parts"][0]["inlineData"],
            json!({"mimeType": "image/png", "data": "AAEC"})
        );
        assert_eq!(body["contents"][0]["parts"][1]["text"], "make it blue");
        assert_eq!(
            body["generationConfig"]["responseModalities"],
            json!(["TEXT", "IMAGE"])
        );
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn schema_sets_json_mime() {
        let req = ContentRequest::text("plan")
            .system("be an architect")
            .json_schema(json!({"type": "OBJECT"}));
        let body = serde_json::to_value(build_request(&req)).unwrap();
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "be an architect"
        );
    }

    #[test]
    fn response_parts_decoded() {
        let wire: WireResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [
                {"text": "here"},
                {"inlineData": {"mimeType": "image/png", "data": "AAEC"}}
            ]}}]
        }))
        .unwrap();
        let resp = from_wire(wire).unwrap();
        assert_eq!(resp.text().as_deref(), Some("here"));
        assert_eq!(resp.first_image().unwrap().data, vec![0, 1, 2]);
    }

    #[test]
    fn empty_candidates_yield_no_parts() {
        let wire: WireResponse = serde_json::from_value(json!({})).unwrap();
        assert!(from_wire(wire).unwrap().parts.is_empty());
    }

    #[test]
    fn client_build_failure_is_a_config_error() {
        let bad = reqwest::Client::builder().user_agent("bad\nagent");
        assert!(matches!(build_http(bad), Err(ConfigError::HttpClient(_))));

        let cfg = Config::default().with_api_key("k");
        let api = GeminiApi::from_config(&cfg).unwrap();
        assert_eq!(api.model(ModelRole::Text), cfg.text_model);
    }
}
