//! Editable 2D floor plan: placed components, selection, viewport, and the
//! two AI-backed operations (layout replacement and perspective render).

pub mod catalog;
pub mod render;
pub mod viewport;

pub use catalog::{CATALOG, CatalogEntry, Category, ComponentKind};
pub use render::{CANVAS_HEIGHT, CANVAS_WIDTH, scene_svg};
pub use viewport::Viewport;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::client::GenerationClient;
use crate::error::GenerationError;
use crate::image::InlineImage;
use crate::prompts;
use crate::raster::Rasterizer;

pub type ItemId = Uuid;

/// Where [`SceneEditor::add_item`] centers new components.
pub const DEFAULT_ANCHOR: (f64, f64) = (300.0, 200.0);

/// Shown when [`SceneEditor::generate_layout`] fails.
pub const LAYOUT_FAILED: &str = "Failed to generate blueprint. Please try again.";

/// Furniture must keep this distance from the room's walls.
pub const CONTAINMENT_MARGIN: f64 = 10.0;

/// A placed component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub x: f64,
    pub y: f64,
    /// Degrees. Edits keep it in `[0, 360)` but layouts may carry any value.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

/// Axis aligned rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    /// Whether `inner` lies inside `self` shrunk by `margin` on every side.
    pub fn contains(&self, inner: &Bounds, margin: f64) -> bool {
        inner.x >= self.x + margin
            && inner.y >= self.y + margin
            && inner.x + inner.width <= self.x + self.width - margin
            && inner.y + inner.height <= self.y + self.height - margin
    }
}

impl SceneItem {
    pub fn new(kind: ComponentKind, x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            x,
            y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Footprint after scale and rotation about the item's center.
    pub fn bounds(&self) -> Bounds {
        let entry = self.kind.entry();
        let w = entry.width * self.scale_x;
        let h = entry.height * self.scale_y;
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let rw = (w * cos).abs() + (h * sin).abs();
        let rh = (w * sin).abs() + (h * cos).abs();
        let (cx, cy) = (self.x + w / 2.0, self.y + h / 2.0);
        Bounds {
            x: cx - rw / 2.0,
            y: cy - rh / 2.0,
            width: rw,
            height: rh,
        }
    }
}

/// One entry of a generated layout, before an id is assigned.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRecord {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub scale_x: Option<f64>,
    #[serde(default)]
    pub scale_y: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct LayoutResponse {
    pub items: Vec<LayoutRecord>,
}

impl LayoutRecord {
    /// Assign a fresh id. Missing rotation becomes 0; missing or zero scales
    /// become 1.
    pub fn into_item(self) -> SceneItem {
        let scale = |s: Option<f64>| s.filter(|v| *v != 0.0 && v.is_finite()).unwrap_or(1.0);
        SceneItem {
            id: Uuid::new_v4(),
            kind: self.kind,
            x: self.x,
            y: self.y,
            rotation: self.rotation.filter(|r| r.is_finite()).unwrap_or(0.0),
            scale_x: scale(self.scale_x),
            scale_y: scale(self.scale_y),
        }
    }
}

/// Ordered list of placed items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub items: Vec<SceneItem>,
}

impl Scene {
    pub fn get(&self, id: ItemId) -> Option<&SceneItem> {
        self.items.iter().find(|i| i.id == id)
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut SceneItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Furniture items not inside any room with the required margin.
    ///
    /// The rule is only communicated to the layout model; this reports
    /// violations without moving anything.
    pub fn containment_violations(&self) -> Vec<ItemId> {
        let rooms: Vec<Bounds> = self
            .items
            .iter()
            .filter(|i| i.kind.is_room())
            .map(SceneItem::bounds)
            .collect();
        self.items
            .iter()
            .filter(|i| i.kind.is_furniture())
            .filter(|i| {
                let b = i.bounds();
                !rooms.iter().any(|r| r.contains(&b, CONTAINMENT_MARGIN))
            })
            .map(|i| i.id)
            .collect()
    }
}

/// Whether clicks select items or drag the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    Select,
    Pan,
}

/// In-memory editing session over a [`Scene`].
#[derive(Debug, Default)]
pub struct SceneEditor {
    scene: Scene,
    selected: Option<ItemId>,
    mode: EditorMode,
    viewport: Viewport,
    perspective: Option<InlineImage>,
    rasterizer: Option<Rasterizer>,
}

impl SceneEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `rasterizer` for perspective snapshots instead of the 1024 default.
    pub fn with_rasterizer(mut self, rasterizer: Rasterizer) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.scene.items
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }

    pub fn selected_item(&self) -> Option<&SceneItem> {
        self.selected.and_then(|id| self.scene.get(id))
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        if mode != EditorMode::Pan {
            self.viewport.end_drag();
        }
        self.mode = mode;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    /// Last perspective render, shown as an overlay.
    pub fn perspective(&self) -> Option<&InlineImage> {
        self.perspective.as_ref()
    }

    pub fn dismiss_perspective(&mut self) {
        self.perspective = None;
    }

    /// Append a `kind` centered on [`DEFAULT_ANCHOR`] and select it.
    pub fn add_item(&mut self, kind: ComponentKind) -> ItemId {
        let entry = kind.entry();
        let item = SceneItem::new(
            kind,
            DEFAULT_ANCHOR.0 - entry.width / 2.0,
            DEFAULT_ANCHOR.1 - entry.height / 2.0,
        );
        let id = item.id;
        debug!(%kind, %id, "item added");
        self.scene.items.push(item);
        self.selected = Some(id);
        id
    }

    /// Select `id`. Ignored in pan mode or for unknown ids.
    pub fn select(&mut self, id: ItemId) -> bool {
        if self.mode != EditorMode::Select || self.scene.get(id).is_none() {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Remove the selected item and clear the selection.
    pub fn remove_selected(&mut self) -> Option<SceneItem> {
        let id = self.selected.take()?;
        let pos = self.scene.items.iter().position(|i| i.id == id)?;
        Some(self.scene.items.remove(pos))
    }

    /// Advance the selected item's rotation by 90° modulo 360.
    pub fn rotate_selected(&mut self) -> Option<f64> {
        let id = self.selected?;
        let item = self.scene.get_mut(id)?;
        item.rotation = (item.rotation + 90.0) % 360.0;
        Some(item.rotation)
    }

    /// Translate the selected item.
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> bool {
        let Some(item) = self.selected.and_then(|id| self.scene.get_mut(id)) else {
            return false;
        };
        item.x += dx;
        item.y += dy;
        true
    }

    /// Pointer pressed on the canvas background.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if self.mode == EditorMode::Pan {
            self.viewport.begin_drag(x, y);
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.mode == EditorMode::Pan {
            self.viewport.drag_to(x, y);
        }
    }

    pub fn pointer_up(&mut self) {
        self.viewport.end_drag();
    }

    /// Markup as shown on screen, with selection and viewport applied.
    pub fn to_svg(&self) -> String {
        scene_svg(&self.scene.items, self.selected, Some(&self.viewport))
    }

    /// Markup without selection highlight or viewport, for AI snapshots.
    pub fn snapshot_svg(&self) -> String {
        scene_svg(&self.scene.items, None, None)
    }

    /// Replace every item with a layout generated for `prompt`.
    ///
    /// On failure the items and the selection are left exactly as they were.
    pub async fn generate_layout(
        &mut self,
        client: &GenerationClient,
        prompt: &str,
    ) -> Result<usize, GenerationError> {
        self.perspective = None;
        let items = client.generate_layout(prompt).await.map_err(|e| {
            error!(error = %e, "layout generation failed");
            e
        })?;
        let count = items.len();
        self.scene = Scene { items };
        self.selected = None;
        let violations = self.scene.containment_violations();
        if !violations.is_empty() {
            warn!(count = violations.len(), "layout places furniture outside rooms");
        }
        info!(count, "layout replaced");
        Ok(count)
    }

    /// Render the current scene through the image model and keep the result
    /// as the overlay.
    pub async fn render_perspective(
        &mut self,
        client: &GenerationClient,
    ) -> Result<&InlineImage, GenerationError> {
        self.render_perspective_with_style(client, prompts::SCENE_RENDER_STYLE)
            .await
    }

    pub async fn render_perspective_with_style(
        &mut self,
        client: &GenerationClient,
        style: &str,
    ) -> Result<&InlineImage, GenerationError> {
        let markup = self.snapshot_svg();
        let rasterizer = self
            .rasterizer
            .clone()
            .unwrap_or_else(Rasterizer::snapshot);
        let snapshot = rasterizer.rasterize_async(markup.clone()).await?;
        let image = client
            .render_scene(&markup, snapshot, style)
            .await
            .map_err(|e| {
                error!(error = %e, "perspective render failed");
                e
            })?;
        let image = self.perspective.insert(image);
        Ok(&*image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_centers_on_anchor_and_selects() {
        let mut ed = SceneEditor::new();
        let id = ed.add_item(ComponentKind::Desk);
        let item = ed.selected_item().unwrap();
        assert_eq!(item.id, id);
        assert_eq!((item.x, item.y), (250.0, 180.0));
        assert_eq!(item.rotation, 0.0);
    }

    #[test]
    fn four_rotations_return_to_start() {
        let mut ed = SceneEditor::new();
        ed.add_item(ComponentKind::Bed);
        let seen: Vec<f64> = (0..4).filter_map(|_| ed.rotate_selected()).collect();
        assert_eq!(seen, vec![90.0, 180.0, 270.0, 0.0]);
    }

    #[test]
    fn remove_clears_selection() {
        let mut ed = SceneEditor::new();
        let a = ed.add_item(ComponentKind::Chair);
        let b = ed.add_item(ComponentKind::Plant);
        let removed = ed.remove_selected().unwrap();
        assert_eq!(removed.id, b);
        assert_eq!(ed.selected(), None);
        assert_eq!(ed.items().len(), 1);
        assert_eq!(ed.items()[0].id, a);
        assert!(ed.remove_selected().is_none());
        assert!(ed.rotate_selected().is_none());
    }

    #[test]
    fn pan_mode_disables_selection() {
        let mut ed = SceneEditor::new();
        let a = ed.add_item(ComponentKind::Door);
        ed.clear_selection();
        ed.set_mode(EditorMode::Pan);
        assert!(!ed.select(a));
        ed.pointer_down(10.0, 10.0);
        ed.pointer_move(25.0, 5.0);
        ed.pointer_up();
        assert_eq!((ed.viewport().pan_x, ed.viewport().pan_y), (15.0, -5.0));
        // item coordinates are untouched by panning
        assert_eq!(ed.items()[0].x, 275.0);
        ed.set_mode(EditorMode::Select);
        assert!(ed.select(a));
    }

    #[test]
    fn move_selected_translates() {
        let mut ed = SceneEditor::new();
        ed.add_item(ComponentKind::WallHorizontal);
        assert!(ed.move_selected(5.0, -5.0));
        let item = ed.selected_item().unwrap();
        assert_eq!((item.x, item.y), (255.0, 190.0));
    }

    #[test]
    fn layout_record_defaults() {
        let rec: LayoutRecord =
            serde_json::from_str(r#"{"type":"BED","x":1,"y":2,"scaleX":0}"#).unwrap();
        let item = rec.into_item();
        assert_eq!(item.kind, ComponentKind::Bed);
        assert_eq!(item.rotation, 0.0);
        assert_eq!((item.scale_x, item.scale_y), (1.0, 1.0));
    }

    #[test]
    fn bounds_swap_on_quarter_turn() {
        let mut desk = SceneItem::new(ComponentKind::Desk, 0.0, 0.0);
        desk.rotation = 90.0;
        let b = desk.bounds();
        assert!((b.width - 40.0).abs() < 1e-9);
        assert!((b.height - 100.0).abs() < 1e-9);
        assert!((b.x - 30.0).abs() < 1e-9);
        assert!((b.y + 30.0).abs() < 1e-9);
    }

    #[test]
    fn containment_flags_stray_furniture() {
        let room = SceneItem::new(ComponentKind::RoomSquare, 300.0, 200.0);
        let inside = SceneItem::new(ComponentKind::Chair, 320.0, 220.0);
        let touching = SceneItem::new(ComponentKind::Chair, 305.0, 220.0);
        let door = SceneItem::new(ComponentKind::Door, 0.0, 0.0);
        let scene = Scene {
            items: vec![room, inside, touching.clone(), door],
        };
        assert_eq!(scene.containment_violations(), vec![touching.id]);
    }
}
