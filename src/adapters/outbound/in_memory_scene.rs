use crate::common::{DomainResult, TurnPathError};
use crate::domains::turn_path::ports::SceneGateway;
use crate::domains::turn_path::scene::{
    EntityGeometry, EntityId, EntityKind, Material, NewEntity, PathTag, Rgba, SceneEntity,
};
use crate::domains::turn_path::types::LonLat;
use geojson::GeoJson;
use std::collections::BTreeMap;

/// Scene held in memory, ordered by entity id.
///
/// Stands in for the interactive map in the demo binary and in tests. Entity
/// kinds are fixed on insertion and never re-derived.
#[derive(Debug, Default)]
pub struct InMemoryScene {
    entities: BTreeMap<EntityId, SceneEntity>,
    next_id: u64,
}

impl InMemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &SceneEntity> {
        self.entities.values()
    }

    /// Inserts a map feature, classifying it from its category label.
    pub fn insert_feature(
        &mut self,
        name: impl Into<String>,
        category: Option<&str>,
        attributes: BTreeMap<String, String>,
        geometry: EntityGeometry,
    ) -> EntityId {
        let kind = EntityKind::classify(category, &attributes);
        let material = default_material(&kind);
        self.add_entity(NewEntity {
            name: name.into(),
            kind,
            material,
            geometry,
            attributes,
        })
    }

    /// Loads every feature of a GeoJSON document; returns the ids in document order.
    ///
    /// The `category` property drives classification, `name` becomes the display
    /// name and every scalar property is kept as an attribute.
    pub fn load_geojson(&mut self, geojson: &str) -> DomainResult<Vec<EntityId>> {
        let parsed: GeoJson = geojson
            .parse()
            .map_err(|e| TurnPathError::Infrastructure(format!("invalid scene GeoJSON: {}", e)))?;
        let features = match parsed {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => {
                return Err(TurnPathError::Infrastructure("scene GeoJSON must contain features".to_string()))
            }
        };

        let mut ids = Vec::with_capacity(features.len());
        for feature in features {
            let Some(geometry) = feature.geometry.as_ref().and_then(|g| convert_geometry(&g.value)) else {
                continue;
            };
            let mut attributes = BTreeMap::new();
            if let Some(props) = &feature.properties {
                for (key, value) in props {
                    let text = match value {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Number(n) => n.to_string(),
                        serde_json::Value::Bool(b) => b.to_string(),
                        _ => continue,
                    };
                    attributes.insert(key.clone(), text);
                }
            }
            let name = attributes.get("name").cloned().unwrap_or_default();
            let category = attributes.get("category").cloned();
            ids.push(self.insert_feature(name, category.as_deref(), attributes, geometry));
        }
        Ok(ids)
    }
}

fn to_lon_lat(p: &[f64]) -> Option<LonLat> {
    (p.len() >= 2).then(|| LonLat::new(p[0], p[1]))
}

fn convert_geometry(value: &geojson::Value) -> Option<EntityGeometry> {
    match value {
        geojson::Value::Point(p) => to_lon_lat(p).map(EntityGeometry::Point),
        geojson::Value::LineString(line) => Some(EntityGeometry::Polyline(line.iter().filter_map(|p| to_lon_lat(p)).collect())),
        geojson::Value::MultiLineString(lines) => Some(EntityGeometry::Polyline(
            lines.iter().flatten().filter_map(|p| to_lon_lat(p)).collect(),
        )),
        geojson::Value::Polygon(rings) => rings
            .first()
            .map(|ring| EntityGeometry::Polygon(ring.iter().filter_map(|p| to_lon_lat(p)).collect())),
        _ => None,
    }
}

fn default_material(kind: &EntityKind) -> Material {
    match kind {
        EntityKind::Road { .. } => Material::solid(Rgba(120, 120, 120, 255)),
        EntityKind::Intersection { .. } => Material::solid(Rgba(200, 200, 200, 80)),
        EntityKind::Location => Material::solid(Rgba(255, 140, 0, 255)),
        EntityKind::TurnPath(_) | EntityKind::Other => Material::solid(Rgba(90, 90, 90, 255)),
    }
}

impl SceneGateway for InMemoryScene {
    fn entity(&self, id: EntityId) -> Option<&SceneEntity> {
        self.entities.get(&id)
    }

    fn add_entity(&mut self, entity: NewEntity) -> EntityId {
        self.next_id += 1;
        let id = EntityId(self.next_id);
        self.entities.insert(
            id,
            SceneEntity {
                id,
                name: entity.name,
                kind: entity.kind,
                material: entity.material,
                geometry: entity.geometry,
                attributes: entity.attributes,
            },
        );
        id
    }

    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.entities.remove(&id).is_some()
    }

    fn material(&self, id: EntityId) -> Option<Material> {
        self.entities.get(&id).map(|e| e.material.clone())
    }

    fn set_material(&mut self, id: EntityId, material: Material) -> bool {
        match self.entities.get_mut(&id) {
            Some(e) => {
                e.material = material;
                true
            }
            None => false,
        }
    }

    fn tagged_entities(&self) -> Vec<(EntityId, PathTag)> {
        self.entities
            .values()
            .filter_map(|e| e.path_tag().map(|tag| (e.id, tag)))
            .collect()
    }

    fn find_intersection(&self, name: &str) -> Option<EntityId> {
        self.entities.values().find_map(|e| match &e.kind {
            EntityKind::Intersection { name: n } if n == name => Some(e.id),
            _ => None,
        })
    }

    fn entities_for_road(&self, road_id: &str) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.kind.road_id() == Some(road_id))
            .map(|e| e.id)
            .collect()
    }
}
