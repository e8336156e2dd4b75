//! Free-text image editing session.

use std::path::Path;
use tracing::{error, info};

use crate::client::GenerationClient;
use crate::error::GenerationError;
use crate::image::{InlineImage, mime_for_path};

pub const EDIT_FAILED: &str = "Failed to process image. Please try a different prompt or image.";

/// Holds a source image and the latest edit of it.
#[derive(Debug, Default, Clone)]
pub struct ImageEditSession {
    original: Option<InlineImage>,
    processed: Option<InlineImage>,
    error: Option<String>,
}

impl ImageEditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source image. Clears any previous result and error.
    pub fn load(&mut self, image: InlineImage) {
        self.original = Some(image);
        self.processed = None;
        self.error = None;
    }

    pub fn load_data_url(&mut self, url: &str) -> Result<(), GenerationError> {
        self.load(InlineImage::from_data_url(url)?);
        Ok(())
    }

    /// Read the source from disk, taking the mime type from the extension.
    pub async fn load_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        self.load(InlineImage::new(mime_for_path(path), data));
        Ok(())
    }

    pub fn original(&self) -> Option<&InlineImage> {
        self.original.as_ref()
    }

    pub fn processed(&self) -> Option<&InlineImage> {
        self.processed.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Edit the source with `prompt`.
    ///
    /// Does nothing without a source image or with a blank prompt. On failure
    /// the previous processed image is kept and [`error`](Self::error) is set.
    pub async fn apply(
        &mut self,
        client: &GenerationClient,
        prompt: &str,
    ) -> Option<&InlineImage> {
        let source = self.original.as_ref()?;
        if prompt.trim().is_empty() {
            return None;
        }
        self.error = None;
        match client.edit_image(source, prompt).await {
            Ok(image) => {
                info!(bytes = image.data.len(), "image edited");
                Some(&*self.processed.insert(image))
            }
            Err(e) => {
                error!(error = %e, "image edit failed");
                self.error = Some(EDIT_FAILED.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ContentResponse;
    use crate::llm::mock::ScriptedApi;
    use std::sync::Arc;

    fn client() -> GenerationClient {
        GenerationClient::new(Arc::new(
            ScriptedApi::new()
                .on("sepia", |_| Ok(ContentResponse::from_image(InlineImage::png(vec![7]))))
                .on("nothing", |_| Ok(ContentResponse::from_text("no image"))),
        ))
    }

    #[tokio::test]
    async fn apply_without_source_is_noop() {
        let mut s = ImageEditSession::new();
        assert!(s.apply(&client(), "sepia").await.is_none());
        assert!(s.error().is_none());
    }

    #[tokio::test]
    async fn failure_keeps_previous_result() {
        let c = client();
        let mut s = ImageEditSession::new();
        s.load_data_url("data:image/jpeg;base64,AAEC").unwrap();
        assert_eq!(s.apply(&c, "sepia tone").await.map(|i| i.data.clone()), Some(vec![7]));
        assert!(s.apply(&c, "nothing").await.is_none());
        assert_eq!(s.error(), Some(EDIT_FAILED));
        assert_eq!(s.processed().map(|i| i.data.clone()), Some(vec![7]));
    }

    #[tokio::test]
    async fn load_resets_state() {
        let c = client();
        let mut s = ImageEditSession::new();
        s.load(InlineImage::png(vec![1]));
        s.apply(&c, "nothing").await;
        assert!(s.error().is_some());
        s.load(InlineImage::png(vec![2]));
        assert!(s.error().is_none());
        assert!(s.processed().is_none());
    }
}
