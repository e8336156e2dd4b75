/// Pan and zoom applied around the item list when drawing.
///
/// Purely presentational: stored item coordinates are never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
    drag_start: Option<(f64, f64)>,
}

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.1;

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
            drag_start: None,
        }
    }
}

impl Viewport {
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        // Snap to tenths so repeated steps do not drift.
        self.zoom = ((zoom * 10.0).round() / 10.0).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Zoom as a whole percentage, for display.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    pub fn begin_drag(&mut self, pointer_x: f64, pointer_y: f64) {
        self.drag_start = Some((pointer_x - self.pan_x, pointer_y - self.pan_y));
    }

    pub fn drag_to(&mut self, pointer_x: f64, pointer_y: f64) {
        if let Some((sx, sy)) = self.drag_start {
            self.pan_x = pointer_x - sx;
            self.pan_y = pointer_y - sy;
        }
    }

    pub fn end_drag(&mut self) {
        self.drag_start = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Map a screen point into scene coordinates.
    pub fn to_scene(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pan_x) / self.zoom, (y - self.pan_y) / self.zoom)
    }

    /// SVG transform attribute value.
    pub fn transform(&self) -> String {
        format!(
            "translate({}, {}) scale({})",
            self.pan_x, self.pan_y, self.zoom
        )
    }
}
