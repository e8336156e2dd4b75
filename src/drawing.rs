//! Helpers for the SVG drawings produced by the text model.
//!
//! The model is asked for bare SVG but routinely wraps it in code fences or
//! adds commentary. [`extract_svg`] recovers the `<svg>…</svg>` element and
//! [`prepare_markup`] makes it self-describing enough to rasterize.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::GenerationError;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

static ROOT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<svg\b[^>]*>").expect("static regex"));
static VIEW_BOX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bviewBox\s*=\s*["']\s*([-\d\s.,eE+]+?)\s*["']"#).expect("static regex")
});
static PIXEL_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\swidth\s*=\s*["']\s*\d+(\.\d+)?(px)?\s*["']"#).expect("static regex")
});
static PIXEL_HEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\sheight\s*=\s*["']\s*\d+(\.\d+)?(px)?\s*["']"#).expect("static regex")
});

/// Declared `viewBox` of a drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewBox {
    /// Parse the `viewBox` attribute of the root `<svg>` tag.
    pub fn from_markup(markup: &str) -> Option<Self> {
        let root = ROOT_TAG.find(markup)?.as_str();
        let caps = VIEW_BOX.captures(root)?;
        let parts: Vec<f32> = caps[1]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [min_x, min_y, width, height] => Some(Self {
                min_x: *min_x,
                min_y: *min_y,
                width: *width,
                height: *height,
            }),
            _ => None,
        }
    }

    /// Width and height when both are usable as a content size.
    pub fn size(&self) -> Option<(f32, f32)> {
        (self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
            .then_some((self.width, self.height))
    }
}

/// Whether the root `<svg>` tag carries both a pixel `width` and `height`.
pub fn declares_pixel_size(markup: &str) -> bool {
    ROOT_TAG
        .find(markup)
        .is_some_and(|root| PIXEL_WIDTH.is_match(root.as_str()) && PIXEL_HEIGHT.is_match(root.as_str()))
}

/// Pull the SVG element out of a raw model response.
///
/// Code fences are stripped, then everything between the first `<svg` and the
/// last `</svg>` is kept. Fails with [`GenerationError::InvalidDrawing`] when
/// the result does not start with the root tag.
///
/// ```
/// use archigen::drawing::extract_svg;
/// let raw = "Here you go:\n```svg\n<svg viewBox=\"0 0 10 10\"></svg>\n```";
/// assert_eq!(extract_svg(raw).unwrap(), "<svg viewBox=\"0 0 10 10\"></svg>");
/// ```
pub fn extract_svg(raw: &str) -> Result<String, GenerationError> {
    let text = raw
        .replace("```xml", "")
        .replace("```svg", "")
        .replace("```", "");
    let mut text = text.trim();
    if let (Some(start), Some(end)) = (text.find("<svg"), text.rfind("</svg>")) {
        if end >= start {
            text = &text[start..end + "</svg>".len()];
        }
    }
    if !text.starts_with("<svg") {
        return Err(GenerationError::InvalidDrawing);
    }
    Ok(text.to_string())
}

/// Make markup renderable without a surrounding document.
///
/// Injects the SVG namespace when missing and, when the root tag lacks a
/// pixel `width` or `height`, copies the missing dimension from the view-box.
/// Only the root tag is inspected, so a `stroke-width` on a child element
/// does not count as a size.
pub fn prepare_markup(markup: &str) -> String {
    let Some(root) = ROOT_TAG.find(markup) else {
        return markup.to_string();
    };
    let tag = root.as_str();
    let mut injected = String::new();
    if !tag.contains(SVG_NS) {
        injected.push_str(&format!(r#" xmlns="{SVG_NS}""#));
    }
    let has_width = PIXEL_WIDTH.is_match(tag);
    let has_height = PIXEL_HEIGHT.is_match(tag);
    if !has_width || !has_height {
        if let Some((w, h)) = ViewBox::from_markup(markup).and_then(|vb| vb.size()) {
            let tag = strip_attr(tag, "width", has_width);
            let tag = strip_attr(&tag, "height", has_height);
            if !has_width {
                injected.push_str(&format!(r#" width="{w}""#));
            }
            if !has_height {
                injected.push_str(&format!(r#" height="{h}""#));
            }
            return rebuild(markup, root.range(), &tag, &injected);
        }
    }
    rebuild(markup, root.range(), tag, &injected)
}

// Non-pixel sizes such as `width="100%"` are dropped before a pixel value is
// injected, otherwise the tag would carry the attribute twice.
fn strip_attr(tag: &str, name: &str, keep: bool) -> String {
    if keep {
        return tag.to_string();
    }
    let re = Regex::new(&format!(r#"(?i)\s{name}\s*=\s*("[^"]*"|'[^']*')"#));
    match re {
        Ok(re) => re.replace(tag, "").into_owned(),
        Err(_) => tag.to_string(),
    }
}

fn rebuild(markup: &str, range: std::ops::Range<usize>, tag: &str, injected: &str) -> String {
    // `tag` always begins with the four bytes "<svg".
    let mut out = String::with_capacity(markup.len() + injected.len());
    out.push_str(&markup[..range.start]);
    out.push_str(&tag[..4]);
    out.push_str(injected);
    out.push_str(&tag[4..]);
    out.push_str(&markup[range.end..]);
    out
}
