pub mod gemini;
pub mod mock;
pub mod retry;

pub use gemini::GeminiApi;
pub use retry::{RetryApi, RetryPolicy};

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{ConfigError, GenerationError};
use crate::image::InlineImage;

/// Which configured model a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// Text and structured JSON generation.
    Text,
    /// Image generation and editing.
    Image,
}

/// One piece of request or response content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Image(InlineImage),
}

/// A single `generateContent` style request.
#[derive(Debug, Clone)]
pub struct ContentRequest {
    pub model: ModelRole,
    pub system_instruction: Option<String>,
    pub parts: Vec<Part>,
    pub temperature: Option<f32>,
    /// Output schema; when set the response is JSON text.
    pub response_schema: Option<Value>,
    /// Ask for image output alongside text.
    pub wants_image: bool,
}

impl ContentRequest {
    /// Plain text request against the text model.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            model: ModelRole::Text,
            system_instruction: None,
            parts: vec![Part::Text(prompt.into())],
            temperature: None,
            response_schema: None,
            wants_image: false,
        }
    }

    /// Request against the image model. Parts are added with
    /// [`image`](Self::image) and [`with_text`](Self::with_text).
    pub fn image_model() -> Self {
        Self {
            model: ModelRole::Image,
            system_instruction: None,
            parts: Vec::new(),
            temperature: None,
            response_schema: None,
            wants_image: true,
        }
    }

    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn image(mut self, img: InlineImage) -> Self {
        self.parts.push(Part::Image(img));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text(text.into()));
        self
    }

    pub fn json_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Concatenated text parts, used for logging.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parts of the first candidate of a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentResponse {
    pub parts: Vec<Part>,
}

impl ContentResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(text.into())],
        }
    }

    pub fn from_image(img: InlineImage) -> Self {
        Self {
            parts: vec![Part::Image(img)],
        }
    }

    /// All text parts joined, or `None` when there are none.
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Image(_) => None,
            })
            .collect();
        (!texts.is_empty()).then(|| texts.concat())
    }

    /// First embedded image part.
    pub fn first_image(&self) -> Option<&InlineImage> {
        self.parts.iter().find_map(|p| match p {
            Part::Image(img) => Some(img),
            Part::Text(_) => None,
        })
    }

    pub fn into_first_image(self) -> Option<InlineImage> {
        self.parts.into_iter().find_map(|p| match p {
            Part::Image(img) => Some(img),
            Part::Text(_) => None,
        })
    }
}

/// Boundary to the remote generative model.
///
/// One request, one response; implementations do not retry on their own.
/// Wrap with [`RetryApi`] for that.
#[async_trait]
pub trait GenerativeApi: Send + Sync {
    async fn generate(&self, request: &ContentRequest) -> Result<ContentResponse, GenerationError>;
}

#[async_trait]
impl<T: GenerativeApi + ?Sized> GenerativeApi for Arc<T> {
    async fn generate(&self, request: &ContentRequest) -> Result<ContentResponse, GenerationError> {
        (**self).generate(request).await
    }
}

/// Build the Gemini client described by `config`, wrapped in its retry
/// policy. Fails when no credential is configured.
pub fn connect(config: &Config) -> Result<Arc<dyn GenerativeApi>, ConfigError> {
    let api = GeminiApi::from_config(config)?;
    let policy = RetryPolicy::new(config.max_retries, config.retry_delay());
    Ok(Arc::new(RetryApi::new(api, policy)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_helpers() {
        let png = InlineImage::png(vec![1, 2]);
        let resp = ContentResponse {
            parts: vec![
                Part::Text("a".into()),
                Part::Image(png.clone()),
                Part::Text("b".into()),
            ],
        };
        assert_eq!(resp.text().as_deref(), Some("ab"));
        assert_eq!(resp.first_image(), Some(&png));
        assert!(ContentResponse::default().text().is_none());
    }

    #[test]
    fn connect_requires_credential() {
        let cfg = Config {
            api_key: None,
            ..Config::default()
        };
        assert!(matches!(connect(&cfg), Err(ConfigError::MissingCredential)));
    }
}
