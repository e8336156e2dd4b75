//! The four remote jobs: drawing, styled render, image edit and layout.

use std::sync::Arc;
use tracing::{debug, instrument, trace};

use crate::drawing::extract_svg;
use crate::error::GenerationError;
use crate::image::InlineImage;
use crate::llm::{ContentRequest, GenerativeApi};
use crate::prompts;
use crate::scene::{LayoutResponse, SceneItem};

/// Typed operations over a [`GenerativeApi`].
///
/// Each method is one request. Retrying is the job of the api it wraps.
#[derive(Clone)]
pub struct GenerationClient {
    api: Arc<dyn GenerativeApi>,
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient").finish_non_exhaustive()
    }
}

impl GenerationClient {
    pub fn new(api: Arc<dyn GenerativeApi>) -> Self {
        Self { api }
    }

    /// Produce top-down SVG markup for `prompt`.
    #[instrument(skip(self), level = "debug")]
    pub async fn generate_drawing(&self, prompt: &str) -> Result<String, GenerationError> {
        let req = ContentRequest::text(prompts::drawing_prompt(prompt))
            .system(prompts::DRAWING_SYSTEM)
            .temperature(prompts::DRAWING_TEMPERATURE);
        let resp = self.api.generate(&req).await?;
        let raw = resp.text().unwrap_or_default();
        trace!(target: "llm", %raw, "drawing response");
        let markup = extract_svg(&raw)?;
        debug!(len = markup.len(), "drawing extracted");
        Ok(markup)
    }

    /// Render `reference` as a photorealistic image from `viewpoint`.
    #[instrument(skip(self, reference), level = "debug")]
    pub async fn generate_styled_render(
        &self,
        prompt: &str,
        viewpoint: &str,
        reference: &InlineImage,
    ) -> Result<InlineImage, GenerationError> {
        let req = ContentRequest::image_model()
            .image(reference.clone())
            .with_text(prompts::styled_render_prompt(prompt, viewpoint));
        self.api
            .generate(&req)
            .await?
            .into_first_image()
            .ok_or_else(|| GenerationError::NoImageReturned {
                context: viewpoint.to_string(),
            })
    }

    /// Apply a free-text edit to `source`. The mime type travels with the
    /// image.
    #[instrument(skip(self, source), level = "debug")]
    pub async fn edit_image(
        &self,
        source: &InlineImage,
        prompt: &str,
    ) -> Result<InlineImage, GenerationError> {
        let req = ContentRequest::image_model()
            .image(source.clone())
            .with_text(prompt);
        self.api
            .generate(&req)
            .await?
            .into_first_image()
            .ok_or_else(|| GenerationError::NoImageReturned {
                context: "image edit".into(),
            })
    }

    /// Ask for a schema-constrained layout and assign ids locally.
    #[instrument(skip(self), level = "debug")]
    pub async fn generate_layout(&self, prompt: &str) -> Result<Vec<SceneItem>, GenerationError> {
        let req = ContentRequest::text(prompts::layout_prompt(prompt))
            .system(prompts::LAYOUT_SYSTEM)
            .json_schema(prompts::layout_schema());
        let resp = self.api.generate(&req).await?;
        let body = resp.text().unwrap_or_default();
        trace!(target: "llm", %body, "layout response");
        if body.trim().is_empty() {
            return Err(GenerationError::NoLayout);
        }
        let layout: LayoutResponse = serde_json::from_str(body.trim())?;
        let items: Vec<SceneItem> = layout.items.into_iter().map(|r| r.into_item()).collect();
        debug!(count = items.len(), "layout parsed");
        Ok(items)
    }

    /// Render a scene snapshot plus its markup in `style`.
    #[instrument(skip(self, markup, snapshot), level = "debug")]
    pub async fn render_scene(
        &self,
        markup: &str,
        snapshot: InlineImage,
        style: &str,
    ) -> Result<InlineImage, GenerationError> {
        let req = ContentRequest::image_model()
            .image(snapshot)
            .with_text(prompts::scene_render_prompt(style, markup));
        self.api
            .generate(&req)
            .await?
            .into_first_image()
            .ok_or_else(|| GenerationError::NoImageReturned {
                context: "perspective".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ContentResponse;
    use crate::llm::mock::ScriptedApi;
    use crate::scene::ComponentKind;

    fn client(api: ScriptedApi) -> (GenerationClient, Arc<ScriptedApi>) {
        let api = Arc::new(api);
        (GenerationClient::new(api.clone()), api)
    }

    #[tokio::test]
    async fn drawing_is_unfenced() {
        let (c, api) = client(ScriptedApi::new().on("SVG blueprint", |_| {
            Ok(ContentResponse::from_text(
                "```xml\n<svg viewBox=\"0 0 10 10\"><rect/></svg>\n```",
            ))
        }));
        let svg = c.generate_drawing("a hut").await.unwrap();
        assert_eq!(svg, "<svg viewBox=\"0 0 10 10\"><rect/></svg>");
        let req = &api.requests()[0];
        assert_eq!(req.temperature, Some(prompts::DRAWING_TEMPERATURE));
        assert!(req.system_instruction.is_some());
    }

    #[tokio::test]
    async fn prose_is_an_invalid_drawing() {
        let (c, _) = client(
            ScriptedApi::new().on("SVG", |_| Ok(ContentResponse::from_text("sorry, no"))),
        );
        let err = c.generate_drawing("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidDrawing));
    }

    #[tokio::test]
    async fn text_only_render_is_no_image() {
        let (c, _) = client(
            ScriptedApi::new().on("Perspective", |_| Ok(ContentResponse::from_text("here you go"))),
        );
        let err = c
            .generate_styled_render("a loft", "Isometric View", &InlineImage::png(vec![0]))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::NoImageReturned { context } if context == "Isometric View"));
    }

    #[tokio::test]
    async fn edit_sends_source_mime() {
        let (c, api) = client(ScriptedApi::new().on("brighter", |_| {
            Ok(ContentResponse::from_image(InlineImage::png(vec![9])))
        }));
        let src = InlineImage::new("image/jpeg", vec![1, 2, 3]);
        let out = c.edit_image(&src, "make it brighter").await.unwrap();
        assert_eq!(out.data, vec![9]);
        let sent = &api.requests()[0];
        assert!(sent.parts.contains(&crate::llm::Part::Image(src)));
    }

    #[tokio::test]
    async fn layout_assigns_ids_and_defaults() {
        let (c, api) = client(ScriptedApi::new().on("layout", |_| {
            Ok(ContentResponse::from_text(
                r#"{"items":[{"type":"ROOM_SQUARE","x":300,"y":200},{"type":"BED","x":320,"y":220,"rotation":90}]}"#,
            ))
        }));
        let items = c.generate_layout("a bedroom").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id, items[1].id);
        assert_eq!(items[0].kind, ComponentKind::RoomSquare);
        assert_eq!(items[1].rotation, 90.0);
        assert!(api.requests()[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn empty_layout_body() {
        let (c, _) = client(ScriptedApi::new().on("layout", |_| Ok(ContentResponse::from_text("  "))));
        assert!(matches!(
            c.generate_layout("x").await,
            Err(GenerationError::NoLayout)
        ));
    }

    #[tokio::test]
    async fn malformed_layout_body() {
        let (c, _) = client(
            ScriptedApi::new().on("layout", |_| Ok(ContentResponse::from_text("{\"rooms\": []}"))),
        );
        assert!(matches!(
            c.generate_layout("x").await,
            Err(GenerationError::LayoutParse(_))
        ));
    }
}
