//! Scripted [`GenerativeApi`] used by tests and offline demos.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::trace;

use super::{ContentRequest, ContentResponse, GenerativeApi};
use crate::error::GenerationError;

type Responder = Arc<dyn Fn(&ContentRequest) -> Result<ContentResponse, GenerationError> + Send + Sync>;

struct Rule {
    needle: String,
    delay: Duration,
    respond: Responder,
}

/// Answers requests by matching their prompt text against registered needles.
///
/// The first rule whose needle occurs in the request's text parts or system
/// instruction wins. Unmatched requests fail with a 404 [`GenerationError::Api`].
///
/// ```
/// use archigen::llm::{mock::ScriptedApi, ContentRequest, ContentResponse, GenerativeApi};
/// # tokio_test::block_on(async {
/// let api = ScriptedApi::new().on("hello", |_| Ok(ContentResponse::from_text("hi")));
/// let resp = api.generate(&ContentRequest::text("hello there")).await.unwrap();
/// assert_eq!(resp.text().as_deref(), Some("hi"));
/// # });
/// ```
#[derive(Default)]
pub struct ScriptedApi {
    rules: Vec<Rule>,
    calls: Mutex<Vec<ContentRequest>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond immediately to requests containing `needle`.
    pub fn on<F>(self, needle: impl Into<String>, respond: F) -> Self
    where
        F: Fn(&ContentRequest) -> Result<ContentResponse, GenerationError> + Send + Sync + 'static,
    {
        self.on_delayed(needle, Duration::ZERO, respond)
    }

    /// Respond after `delay` to requests containing `needle`.
    pub fn on_delayed<F>(mut self, needle: impl Into<String>, delay: Duration, respond: F) -> Self
    where
        F: Fn(&ContentRequest) -> Result<ContentResponse, GenerationError> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            needle: needle.into(),
            delay,
            respond: Arc::new(respond),
        });
        self
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Copies of every request received so far.
    pub fn requests(&self) -> Vec<ContentRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeApi for ScriptedApi {
    async fn generate(&self, request: &ContentRequest) -> Result<ContentResponse, GenerationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        let text = request.prompt_text();
        let system = request.system_instruction.as_deref().unwrap_or("");
        let rule = self
            .rules
            .iter()
            .find(|r| text.contains(&r.needle) || system.contains(&r.needle));
        let Some(rule) = rule else {
            trace!(target: "llm", %text, "unscripted request");
            return Err(GenerationError::Api {
                status: 404,
                message: "no scripted response".into(),
            });
        };
        if !rule.delay.is_zero() {
            tokio::time::sleep(rule.delay).await;
        }
        (rule.respond)(request)
    }
}
