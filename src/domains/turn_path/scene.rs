use super::types::LonLat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Classification fixed when an entity enters the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Road { road_id: String },
    Intersection { name: String },
    Location,
    TurnPath(PathTag),
    Other,
}

/// Category labels the map feed uses for road-like features.
const ROAD_CATEGORIES: &[&str] = &["road", "haul road", "haul_road", "ramp", "access road", "road segment"];

impl EntityKind {
    /// Resolves the kind of a map feature from its category label and attributes.
    pub fn classify(category: Option<&str>, attributes: &BTreeMap<String, String>) -> Self {
        let category = category.map(|c| c.trim().to_ascii_lowercase()).unwrap_or_default();
        let road_id = attributes
            .get("road_id")
            .or_else(|| attributes.get("id"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if ROAD_CATEGORIES.iter().any(|c| category == *c) {
            if let Some(road_id) = road_id {
                return EntityKind::Road { road_id };
            }
            return EntityKind::Other;
        }
        if category == "intersection" {
            if let Some(name) = attributes.get("name").filter(|n| !n.trim().is_empty()) {
                return EntityKind::Intersection { name: name.trim().to_string() };
            }
        }
        if category == "location" || category == "side_center" {
            return EntityKind::Location;
        }
        EntityKind::Other
    }

    pub fn road_id(&self) -> Option<&str> {
        match self {
            EntityKind::Road { road_id } => Some(road_id),
            _ => None,
        }
    }
}

/// Tags carried by every entity the lifecycle manager creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathTag {
    Corridor,
    Centerline,
    StartMarker,
    EndMarker,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub fill: Rgba,
    pub outline: Option<Rgba>,
    pub outline_width: f32,
}

impl Material {
    pub fn solid(fill: Rgba) -> Self {
        Self { fill, outline: None, outline_width: 0.0 }
    }

    pub fn source_highlight() -> Self {
        Self { fill: Rgba(46, 204, 113, 220), outline: Some(Rgba(255, 255, 255, 255)), outline_width: 2.0 }
    }

    pub fn destination_highlight() -> Self {
        Self { fill: Rgba(52, 152, 219, 220), outline: Some(Rgba(255, 255, 255, 255)), outline_width: 2.0 }
    }

    pub fn intersection_highlight() -> Self {
        Self { fill: Rgba(241, 196, 15, 110), outline: Some(Rgba(241, 196, 15, 255)), outline_width: 3.0 }
    }

    pub fn corridor() -> Self {
        Self { fill: Rgba(231, 76, 60, 90), outline: Some(Rgba(231, 76, 60, 255)), outline_width: 1.5 }
    }

    pub fn centerline() -> Self {
        Self { fill: Rgba(255, 255, 255, 255), outline: None, outline_width: 3.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityGeometry {
    Point(LonLat),
    Polyline(Vec<LonLat>),
    Polygon(Vec<LonLat>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub material: Material,
    pub geometry: EntityGeometry,
    pub attributes: BTreeMap<String, String>,
}

impl SceneEntity {
    pub fn path_tag(&self) -> Option<PathTag> {
        match self.kind {
            EntityKind::TurnPath(tag) => Some(tag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEntity {
    pub name: String,
    pub kind: EntityKind,
    pub material: Material,
    pub geometry: EntityGeometry,
    pub attributes: BTreeMap<String, String>,
}

impl NewEntity {
    pub fn turn_path(tag: PathTag, name: impl Into<String>, material: Material, geometry: EntityGeometry) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::TurnPath(tag),
            material,
            geometry,
            attributes: BTreeMap::new(),
        }
    }
}

/// A road pick forwarded by the map adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadPick {
    pub entity_id: EntityId,
    pub position: Option<LonLat>,
}

const CONNECTION_KEYS: &[&str] = &[
    "from_location",
    "to_location",
    "from_location_name",
    "to_location_name",
    "start_location",
    "end_location",
];

/// Endpoint labels of a road, taken from its from/to-location attributes.
pub fn connection_names(attributes: &BTreeMap<String, String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for key in CONNECTION_KEYS {
        if let Some(value) = attributes.get(*key) {
            let value = value.trim();
            if !value.is_empty() && !names.iter().any(|n| n == value) {
                names.push(value.to_string());
            }
        }
    }
    names
}
