use serde::{Deserialize, Serialize};

/// Every component that can be placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    RoomSquare,
    RoomLShape,
    WallHorizontal,
    WallVertical,
    Door,
    Window,
    Desk,
    Bed,
    Chair,
    Plant,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 10] = [
        ComponentKind::RoomSquare,
        ComponentKind::RoomLShape,
        ComponentKind::WallHorizontal,
        ComponentKind::WallVertical,
        ComponentKind::Door,
        ComponentKind::Window,
        ComponentKind::Desk,
        ComponentKind::Bed,
        ComponentKind::Chair,
        ComponentKind::Plant,
    ];

    /// Wire name used in layout JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::RoomSquare => "ROOM_SQUARE",
            ComponentKind::RoomLShape => "ROOM_L_SHAPE",
            ComponentKind::WallHorizontal => "WALL_HORIZONTAL",
            ComponentKind::WallVertical => "WALL_VERTICAL",
            ComponentKind::Door => "DOOR",
            ComponentKind::Window => "WINDOW",
            ComponentKind::Desk => "DESK",
            ComponentKind::Bed => "BED",
            ComponentKind::Chair => "CHAIR",
            ComponentKind::Plant => "PLANT",
        }
    }

    pub fn is_room(&self) -> bool {
        matches!(self, ComponentKind::RoomSquare | ComponentKind::RoomLShape)
    }

    /// Items that must sit inside a room.
    pub fn is_furniture(&self) -> bool {
        matches!(
            self,
            ComponentKind::Bed | ComponentKind::Desk | ComponentKind::Chair | ComponentKind::Plant
        )
    }

    pub fn entry(&self) -> &'static CatalogEntry {
        // CATALOG is ordered like ALL.
        &CATALOG[*self as usize]
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        ComponentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown component: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Structure,
    Furniture,
    Deco,
}

/// Display metadata and default footprint of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub kind: ComponentKind,
    pub label: &'static str,
    pub width: f64,
    pub height: f64,
    pub category: Category,
}

pub const CATALOG: [CatalogEntry; 10] = [
    CatalogEntry {
        kind: ComponentKind::RoomSquare,
        label: "Square Room",
        width: 200.0,
        height: 200.0,
        category: Category::Structure,
    },
    CatalogEntry {
        kind: ComponentKind::RoomLShape,
        label: "L-Shaped Room",
        width: 200.0,
        height: 200.0,
        category: Category::Structure,
    },
    CatalogEntry {
        kind: ComponentKind::WallHorizontal,
        label: "Wall (H)",
        width: 100.0,
        height: 10.0,
        category: Category::Structure,
    },
    CatalogEntry {
        kind: ComponentKind::WallVertical,
        label: "Wall (V)",
        width: 10.0,
        height: 100.0,
        category: Category::Structure,
    },
    CatalogEntry {
        kind: ComponentKind::Door,
        label: "Door",
        width: 50.0,
        height: 50.0,
        category: Category::Structure,
    },
    CatalogEntry {
        kind: ComponentKind::Window,
        label: "Window",
        width: 60.0,
        height: 10.0,
        category: Category::Structure,
    },
    CatalogEntry {
        kind: ComponentKind::Desk,
        label: "Desk",
        width: 100.0,
        height: 40.0,
        category: Category::Furniture,
    },
    CatalogEntry {
        kind: ComponentKind::Bed,
        label: "Bed",
        width: 80.0,
        height: 100.0,
        category: Category::Furniture,
    },
    CatalogEntry {
        kind: ComponentKind::Chair,
        label: "Chair",
        width: 30.0,
        height: 30.0,
        category: Category::Furniture,
    },
    CatalogEntry {
        kind: ComponentKind::Plant,
        label: "Plant",
        width: 30.0,
        height: 30.0,
        category: Category::Deco,
    },
];
