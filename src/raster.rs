//! SVG to PNG conversion on a fixed-size white canvas.
//!
//! The drawing is scaled uniformly to fit ("contain") and centered. Content
//! size comes from the parsed document, then from the declared view-box, then
//! from a per-rasterizer fallback.

use resvg::tiny_skia::{self, Pixmap, Transform};
use resvg::usvg;
use std::time::Duration;
use tracing::{debug, warn};

use crate::drawing::{ViewBox, declares_pixel_size, prepare_markup};
use crate::error::GenerationError;
use crate::image::InlineImage;

/// Canvas edge for snapshots sent to the image model.
pub const SNAPSHOT_SIZE: u32 = 1024;
/// Canvas edge for user downloads.
pub const EXPORT_SIZE: u32 = 2048;

/// Where the drawing landed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Placement {
    /// Contain `content` inside `canvas` and center it.
    pub fn contain(canvas: (u32, u32), content: (f32, f32)) -> Self {
        let (cw, ch) = (canvas.0 as f32, canvas.1 as f32);
        let (w, h) = content;
        let scale = (cw / w).min(ch / h);
        Self {
            x: (cw - w * scale) / 2.0,
            y: (ch - h * scale) / 2.0,
            width: w * scale,
            height: h * scale,
            scale,
        }
    }
}

/// A rendered canvas before encoding.
pub struct Raster {
    pub pixmap: Pixmap,
    pub placement: Placement,
}

impl Raster {
    pub fn encode_png(&self) -> Result<InlineImage, GenerationError> {
        let png = self
            .pixmap
            .encode_png()
            .map_err(|e| GenerationError::Rasterization(e.to_string()))?;
        Ok(InlineImage::png(png))
    }
}

/// Converts SVG markup into a fixed-size PNG.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    width: u32,
    height: u32,
    fallback: (f32, f32),
    timeout: Duration,
}

impl Rasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fallback: (width as f32, height as f32),
            timeout: Duration::from_secs(30),
        }
    }

    /// 1024×1024 canvas for AI-facing snapshots.
    pub fn snapshot() -> Self {
        Self::new(SNAPSHOT_SIZE, SNAPSHOT_SIZE)
    }

    /// 2048×2048 canvas for downloads, with a 1000×1000 fallback content size.
    pub fn export() -> Self {
        Self::new(EXPORT_SIZE, EXPORT_SIZE).fallback_size(1000.0, 1000.0)
    }

    /// Content size used when neither the document nor its view-box has one.
    pub fn fallback_size(mut self, width: f32, height: f32) -> Self {
        self.fallback = (width, height);
        self
    }

    /// Upper bound for [`rasterize_async`](Self::rasterize_async).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render `markup` onto the canvas without encoding it.
    pub fn render(&self, markup: &str) -> Result<Raster, GenerationError> {
        let prepared = prepare_markup(markup);
        let mut opt = usvg::Options::default();
        opt.fontdb_mut().load_system_fonts();
        let tree = usvg::Tree::from_str(&prepared, &opt).map_err(|e| {
            warn!(error = %e, "failed to decode svg");
            GenerationError::Rasterization(e.to_string())
        })?;

        let natural = tree.size();
        let natural = (natural.width(), natural.height());
        // usvg assumes 100x100 for markup without a size; that is not a
        // natural size, so such drawings take the fallback instead.
        let content = resolve_content_size(
            declares_pixel_size(&prepared).then_some(natural),
            ViewBox::from_markup(&prepared),
            self.fallback,
        );
        let placement = Placement::contain((self.width, self.height), content);

        let mut pixmap = Pixmap::new(self.width, self.height)
            .ok_or_else(|| GenerationError::Rasterization("failed to allocate canvas".into()))?;
        pixmap.fill(tiny_skia::Color::WHITE);
        // The tree is drawn at its natural size; stretch it onto the placement box.
        let transform = Transform::from_scale(
            placement.width / natural.0,
            placement.height / natural.1,
        )
        .post_translate(placement.x, placement.y);
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        debug!(
            canvas = ?(self.width, self.height),
            content = ?content,
            scale = placement.scale,
            "svg rasterized"
        );
        Ok(Raster { pixmap, placement })
    }

    /// Render and encode `markup` as PNG.
    pub fn rasterize(&self, markup: &str) -> Result<InlineImage, GenerationError> {
        self.render(markup)?.encode_png()
    }

    /// [`rasterize`](Self::rasterize) on the blocking pool, bounded by the
    /// configured timeout so a pathological drawing cannot stall the caller.
    pub async fn rasterize_async(&self, markup: String) -> Result<InlineImage, GenerationError> {
        let this = self.clone();
        let job = tokio::task::spawn_blocking(move || this.rasterize(&markup));
        match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(res)) => res,
            Ok(Err(e)) => Err(GenerationError::Rasterization(e.to_string())),
            Err(_) => Err(GenerationError::Rasterization(format!(
                "timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

fn usable(size: (f32, f32)) -> bool {
    size.0.is_finite() && size.1.is_finite() && size.0 > 0.0 && size.1 > 0.0
}

/// Pick the content size: natural size, then view-box, then `fallback`.
pub fn resolve_content_size(
    natural: Option<(f32, f32)>,
    view_box: Option<ViewBox>,
    fallback: (f32, f32),
) -> (f32, f32) {
    natural
        .filter(|s| usable(*s))
        .or_else(|| view_box.and_then(|vb| vb.size()))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contain_centers_wide_content() {
        let p = Placement::contain((1024, 1024), (400.0, 300.0));
        assert!((p.scale - 2.56).abs() < 1e-4);
        assert!((p.width - 1024.0).abs() < 1e-3);
        assert!((p.height - 768.0).abs() < 1e-3);
        assert!(p.x.abs() < 1e-3);
        assert!((p.y - 128.0).abs() < 1e-3);
    }

    #[test]
    fn content_size_fallback_order() {
        let vb = ViewBox {
            min_x: 0.0,
            min_y: 0.0,
            width: 640.0,
            height: 480.0,
        };
        assert_eq!(
            resolve_content_size(Some((10.0, 20.0)), Some(vb), (1.0, 1.0)),
            (10.0, 20.0)
        );
        assert_eq!(
            resolve_content_size(Some((0.0, 20.0)), Some(vb), (1.0, 1.0)),
            (640.0, 480.0)
        );
        assert_eq!(
            resolve_content_size(None, None, (1024.0, 1024.0)),
            (1024.0, 1024.0)
        );
    }

    #[test]
    fn undecodable_markup_is_a_rasterization_error() {
        let err = Rasterizer::snapshot().rasterize("<svg><rect").unwrap_err();
        assert!(matches!(err, GenerationError::Rasterization(_)));
    }
}
