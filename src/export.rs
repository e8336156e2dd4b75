//! Writing drawings and renders to disk as `<subject>-<timestamp>.png`.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::GenerationError;
use crate::image::InlineImage;
use crate::raster::Rasterizer;

/// Subject used for exported drawings.
pub const DRAWING_SUBJECT: &str = "blueprint";

/// `<subject>-<millis>.<ext>` with whitespace runs in `subject` turned into
/// dashes.
///
/// ```
/// use archigen::export::file_name;
/// let at = chrono::DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
/// assert_eq!(file_name("Isometric Cutaway", at, "png"), "Isometric-Cutaway-1700000000123.png");
/// ```
pub fn file_name(subject: &str, at: DateTime<Utc>, ext: &str) -> String {
    let subject = subject.split_whitespace().collect::<Vec<_>>().join("-");
    format!("{subject}-{}.{ext}", at.timestamp_millis())
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] GenerationError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Save `image` in `dir` under a timestamped name derived from `subject`.
pub async fn write_image(
    dir: impl AsRef<Path>,
    subject: &str,
    image: &InlineImage,
) -> Result<PathBuf, ExportError> {
    let dir = dir.as_ref();
    let path = dir.join(file_name(subject, Utc::now(), image.extension()));
    let write = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &image.data).await
    };
    write.await.map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = image.data.len(), "image exported");
    Ok(path)
}

/// Rasterize `markup` with `rasterizer` and save it as a drawing export.
pub async fn export_drawing_with(
    dir: impl AsRef<Path>,
    markup: &str,
    rasterizer: &Rasterizer,
) -> Result<PathBuf, ExportError> {
    let png = rasterizer.rasterize_async(markup.to_string()).await?;
    write_image(dir, DRAWING_SUBJECT, &png).await
}

/// Rasterize `markup` at download resolution and save it.
pub async fn export_drawing(dir: impl AsRef<Path>, markup: &str) -> Result<PathBuf, ExportError> {
    export_drawing_with(dir, markup, &Rasterizer::export()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_collapses_whitespace() {
        let at = DateTime::from_timestamp_millis(42).unwrap();
        assert_eq!(file_name("  Realistic   Top-Down ", at, "jpg"), "Realistic-Top-Down-42.jpg");
        assert_eq!(file_name(DRAWING_SUBJECT, at, "png"), "blueprint-42.png");
    }
}
