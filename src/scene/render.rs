//! SVG serialization of a scene.

use std::fmt::Write;

use super::{ComponentKind, ItemId, SceneItem, Viewport};

/// Size of the layout coordinate system shared with the layout model.
pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;

const BACKGROUND: &str = "#020617";

/// Draw `items` on an 800×600 canvas.
///
/// `selected` is highlighted. When a `viewport` is given its pan and zoom wrap
/// the items; AI-facing snapshots pass `None`.
pub fn scene_svg(items: &[SceneItem], selected: Option<ItemId>, viewport: Option<&Viewport>) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = CANVAS_WIDTH,
        h = CANVAS_HEIGHT
    );
    let _ = write!(
        out,
        r#"<rect width="{CANVAS_WIDTH}" height="{CANVAS_HEIGHT}" fill="{BACKGROUND}"/>"#
    );
    match viewport {
        Some(vp) => {
            let _ = write!(out, r#"<g transform="{}">"#, vp.transform());
        }
        None => out.push_str("<g>"),
    }
    for item in items {
        item_svg(&mut out, item, selected == Some(item.id));
    }
    out.push_str("</g></svg>");
    out
}

fn item_svg(out: &mut String, item: &SceneItem, selected: bool) {
    let entry = item.kind.entry();
    let (w, h) = (entry.width, entry.height);
    let _ = write!(
        out,
        r#"<g transform="translate({x}, {y}) rotate({r} {cx} {cy}) scale({sx} {sy})">"#,
        x = item.x,
        y = item.y,
        r = item.rotation,
        cx = w * item.scale_x / 2.0,
        cy = h * item.scale_y / 2.0,
        sx = item.scale_x,
        sy = item.scale_y,
    );
    component_svg(out, item.kind, w, h, selected);
    out.push_str("</g>");
}

fn component_svg(out: &mut String, kind: ComponentKind, w: f64, h: f64, selected: bool) {
    let stroke = if selected { "#a855f7" } else { "#334155" };
    let fill = if selected { "#f3e8ff" } else { "#1e293b" };
    let sw = if selected { 3 } else { 2 };
    let _ = match kind {
        ComponentKind::RoomSquare => write!(
            out,
            "<rect width=\"{w}\" height=\"{h}\" fill=\"#0f172a\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>\
             <text x=\"5\" y=\"20\" fill=\"#64748b\" font-size=\"12\" font-family=\"sans-serif\">Room</text>"
        ),
        ComponentKind::RoomLShape => write!(
            out,
            "<path d=\"M0,0 L{w},0 L{w},{hh} L{hw},{hh} L{hw},{h} L0,{h} Z\" fill=\"#0f172a\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>",
            hw = w / 2.0,
            hh = h / 2.0
        ),
        ComponentKind::WallHorizontal | ComponentKind::WallVertical => write!(
            out,
            "<rect width=\"{w}\" height=\"{h}\" fill=\"#94a3b8\" stroke=\"none\"/>"
        ),
        ComponentKind::Door => write!(
            out,
            "<path d=\"M0,{h} Q{w},{h} {w},0\" fill=\"none\" stroke=\"{stroke}\" stroke-dasharray=\"4,4\"/>\
             <rect x=\"{px}\" y=\"0\" width=\"5\" height=\"{h}\" fill=\"#cbd5e1\"/>",
            px = w - 5.0
        ),
        ComponentKind::Window => write!(
            out,
            "<rect width=\"{w}\" height=\"{h}\" fill=\"#e2e8f0\" stroke=\"#94a3b8\"/>\
             <line x1=\"{m}\" y1=\"0\" x2=\"{m}\" y2=\"{h}\" stroke=\"#94a3b8\"/>",
            m = w / 2.0
        ),
        ComponentKind::Bed => write!(
            out,
            "<rect width=\"{w}\" height=\"{h}\" rx=\"5\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>\
             <rect x=\"5\" y=\"5\" width=\"{iw}\" height=\"20\" rx=\"2\" fill=\"#cbd5e1\"/>\
             <rect x=\"5\" y=\"30\" width=\"{iw}\" height=\"{sh}\" rx=\"2\" fill=\"#e2e8f0\"/>",
            iw = w - 10.0,
            sh = h - 35.0
        ),
        ComponentKind::Desk => write!(
            out,
            "<rect width=\"{w}\" height=\"{h}\" fill=\"#475569\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>"
        ),
        ComponentKind::Chair => write!(
            out,
            "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{cx}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{sw}\"/>\
             <rect x=\"5\" y=\"{by}\" width=\"{bw}\" height=\"5\" rx=\"2\" fill=\"#64748b\"/>",
            cx = w / 2.0,
            cy = h / 2.0,
            by = h - 10.0,
            bw = w - 10.0
        ),
        ComponentKind::Plant => write!(
            out,
            "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{cx}\" fill=\"#22c55e\" fill-opacity=\"0.2\" stroke=\"#22c55e\"/>\
             <circle cx=\"{cx}\" cy=\"{cy}\" r=\"5\" fill=\"#22c55e\"/>",
            cx = w / 2.0,
            cy = h / 2.0
        ),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn item(kind: ComponentKind) -> SceneItem {
        SceneItem {
            id: Uuid::new_v4(),
            kind,
            x: 10.0,
            y: 20.0,
            rotation: 90.0,
            scale_x: 1.5,
            scale_y: 1.0,
        }
    }

    #[test]
    fn item_transform_rotates_about_center() {
        let bed = item(ComponentKind::Bed);
        let svg = scene_svg(&[bed], None, None);
        assert!(svg.contains(r#"transform="translate(10, 20) rotate(90 60 50) scale(1.5 1)""#));
    }

    #[test]
    fn selection_changes_stroke() {
        let chair = item(ComponentKind::Chair);
        let plain = scene_svg(std::slice::from_ref(&chair), None, None);
        let picked = scene_svg(std::slice::from_ref(&chair), Some(chair.id), None);
        assert!(!plain.contains("#a855f7"));
        assert!(picked.contains("#a855f7"));
    }

    #[test]
    fn viewport_wraps_items() {
        let mut vp = Viewport::default();
        vp.pan_x = 5.0;
        let svg = scene_svg(&[], None, Some(&vp));
        assert!(svg.contains(r#"<g transform="translate(5, 0) scale(1)">"#));
    }
}
