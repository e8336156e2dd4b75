//! Fixed instructions and prompt builders for every remote call.

use serde_json::{Value, json};

use crate::scene::ComponentKind;

/// Temperature for drawing generation; low keeps the markup precise.
pub const DRAWING_TEMPERATURE: f32 = 0.3;

pub const DRAWING_SYSTEM: &str = "\
You are an expert architect and vector graphics designer.
Generate a clean, professional SVG floorplan for the user's description.

Rules:
1. Output ONLY valid SVG code, no markdown code fences.
2. The drawing is strictly 2D and seen from directly above.
3. Use a white background (fill='#FFFFFF').
4. Draw walls as bold black lines (stroke='black' stroke-width='4').
5. Draw windows, doors and furniture with thinner lines (stroke='black' stroke-width='2').
6. Always declare a viewBox and a width and height.
7. Do not write any text or explanation outside the <svg> element.
8. Keep the plan visually clear and well spaced.";

pub fn drawing_prompt(description: &str) -> String {
    format!("Create an SVG blueprint for: {description}")
}

pub fn styled_render_prompt(subject: &str, viewpoint: &str) -> String {
    format!(
        "Render a high-quality, photorealistic architectural visualization.
Perspective: {viewpoint}.
Subject: {subject}.

IMPORTANT: strictly follow the layout and geometry of the reference image (blueprint).
The reference image is the ground truth for the room shape and furniture placement.
Lighting: natural, professional architectural photography."
    )
}

pub fn layout_prompt(description: &str) -> String {
    format!(
        "Create a layout for: \"{description}\".

IMPORTANT: every piece of furniture must be strictly INSIDE the room walls. Align doors and windows to the room edges."
    )
}

pub const LAYOUT_SYSTEM: &str = "\
You are an expert architectural layout engine.
Produce a JSON floor plan for the user's description.

Available components:
Structure: ROOM_SQUARE, ROOM_L_SHAPE, WALL_HORIZONTAL, WALL_VERTICAL, DOOR, WINDOW
Furniture: BED, DESK, CHAIR, PLANT

Geometry rules (CRITICAL):
1. The canvas is 800x600 pixels, top-left (0,0), center (400,300).
2. Rooms:
   - Place a ROOM_SQUARE near the middle of the canvas (e.g. x=300, y=200).
   - The default room is 200x200.
   - Resize rooms with scaleX and scaleY (scaleX=1.5 gives width 300).
3. Containment (MANDATORY):
   - BED, DESK, CHAIR and PLANT must lie strictly INSIDE a room rectangle.
   - For a room at (Rx, Ry) of size (Rw, Rh) and furniture at (Fx, Fy) of size (Fw, Fh):
       Fx >= Rx + 10
       Fy >= Ry + 10
       Fx + Fw <= Rx + Rw - 10
       Fy + Fh <= Ry + Rh - 10
   - NEVER place furniture at (0,0) or at negative coordinates.
4. Perimeter:
   - DOOR and WINDOW sit on the edges of a room rectangle.
   - Rotate them by 0, 90, 180 or 270 to align with the wall.

Example response:
{
  \"items\": [
    { \"type\": \"ROOM_SQUARE\", \"x\": 300, \"y\": 200, \"rotation\": 0, \"scaleX\": 1.5, \"scaleY\": 1.5 },
    { \"type\": \"BED\", \"x\": 320, \"y\": 220, \"rotation\": 0, \"scaleX\": 1, \"scaleY\": 1 },
    { \"type\": \"DOOR\", \"x\": 300, \"y\": 250, \"rotation\": 90, \"scaleX\": 1, \"scaleY\": 1 }
  ]
}
Return ONLY valid JSON.";

/// Output schema for layout generation.
pub fn layout_schema() -> Value {
    let kinds: Vec<&str> = ComponentKind::ALL.iter().map(|k| k.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": { "type": "STRING", "enum": kinds },
                        "x": { "type": "NUMBER" },
                        "y": { "type": "NUMBER" },
                        "rotation": { "type": "NUMBER" },
                        "scaleX": { "type": "NUMBER" },
                        "scaleY": { "type": "NUMBER" }
                    },
                    "required": ["type", "x", "y"]
                }
            }
        }
    })
}

/// Default style for scene perspective renders.
pub const SCENE_RENDER_STYLE: &str =
    "Photorealistic 3D render, isometric view, soft lighting, architectural visualization";

pub fn scene_render_prompt(style: &str, markup: &str) -> String {
    format!(
        "Render a high-quality photorealistic image based on this floorplan layout.
Style: {style}.

The attached image is a snapshot of the layout. Here is its SVG structure:
{markup}"
    )
}
