use crate::common::{DomainResult, TurnPathError};
use crate::domains::turn_path::ports::LocationDataSource;
use crate::domains::turn_path::types::{LonLat, SideCenterMarker};
use geojson::{Feature, GeoJson};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const SIDE_CENTER_TYPES: &[&str] = &["road_side_center", "road side center", "side_center", "road-side-center"];

/// Resolve the location data directory.
/// Precedence: explicit base -> TURNPATH_DATA_DIR -> ./resources/turn_path -> /usr/share/turnpath-app
pub fn resolve_data_dir(base: Option<PathBuf>) -> PathBuf {
    if let Some(b) = base {
        return b;
    }
    if let Ok(v) = env::var("TURNPATH_DATA_DIR") {
        return PathBuf::from(v);
    }
    let cwd_default = Path::new("resources/turn_path");
    if cwd_default.exists() {
        return cwd_default.to_path_buf();
    }
    PathBuf::from("/usr/share/turnpath-app")
}

/// Markers held in memory, grouped by road in feed order.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLocationSource {
    by_road: HashMap<String, Vec<SideCenterMarker>>,
}

impl InMemoryLocationSource {
    pub fn new(markers: impl IntoIterator<Item = SideCenterMarker>) -> Self {
        let mut by_road: HashMap<String, Vec<SideCenterMarker>> = HashMap::new();
        for m in markers {
            by_road.entry(m.road_id.clone()).or_default().push(m);
        }
        Self { by_road }
    }

    /// Builds the source from a GeoJSON FeatureCollection of marker points.
    /// Features typed as something other than a side-center marker are skipped.
    pub fn from_geojson(geojson: &str) -> DomainResult<Self> {
        let parsed: GeoJson = geojson
            .parse()
            .map_err(|e| TurnPathError::Infrastructure(format!("invalid location GeoJSON: {}", e)))?;
        let features = match parsed {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => {
                return Err(TurnPathError::Infrastructure("location feed must contain features".to_string()))
            }
        };
        Ok(Self::new(features.iter().filter_map(marker_from_feature)))
    }

    pub fn road_count(&self) -> usize {
        self.by_road.len()
    }

    pub fn marker_count(&self) -> usize {
        self.by_road.values().map(Vec::len).sum()
    }
}

impl LocationDataSource for InMemoryLocationSource {
    fn side_center_markers(&self, road_id: &str) -> DomainResult<Vec<SideCenterMarker>> {
        Ok(self.by_road.get(road_id).cloned().unwrap_or_default())
    }
}

fn string_property(feature: &Feature, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match feature.property(k)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn marker_from_feature(feature: &Feature) -> Option<SideCenterMarker> {
    if let Some(kind) = string_property(feature, &["location_type", "type_name"]) {
        let kind = kind.to_ascii_lowercase();
        if !SIDE_CENTER_TYPES.contains(&kind.as_str()) {
            return None;
        }
    }
    let road_id = string_property(feature, &["road_id"])?;
    let position = feature.geometry.as_ref().and_then(|g| match &g.value {
        geojson::Value::Point(p) if p.len() >= 2 => Some(LonLat::new(p[0], p[1])),
        _ => None,
    });
    Some(SideCenterMarker {
        oid: string_property(feature, &["oid", "OBJECTID", "id"]),
        road_id,
        overlapping_entity_name: string_property(feature, &["overlapping_entity_name"]),
        best_overlap_entity: string_property(feature, &["best_overlap_entity"]),
        position,
    })
}

/// Reads side-center markers from `<base>/geojson/<markers_file>` on first use.
pub struct FilesystemLocationSource {
    base: PathBuf,
    markers_file: String,
    cache: OnceCell<InMemoryLocationSource>,
}

impl FilesystemLocationSource {
    pub fn new(base: Option<PathBuf>, markers_file: impl Into<String>) -> Self {
        Self {
            base: resolve_data_dir(base),
            markers_file: markers_file.into(),
            cache: OnceCell::new(),
        }
    }

    pub fn load_geojson(&self, name: &str) -> DomainResult<String> {
        let mut p = self.base.clone();
        p.push("geojson");
        p.push(name);
        fs::read_to_string(&p).map_err(|e| TurnPathError::Infrastructure(format!("{}: {}", p.display(), e)))
    }

    /// Reads and indexes the marker layer now instead of on the first lookup.
    /// Returns the number of markers held.
    pub fn preload(&self) -> DomainResult<usize> {
        Ok(self.markers()?.marker_count())
    }

    fn markers(&self) -> DomainResult<&InMemoryLocationSource> {
        self.cache.get_or_try_init(|| {
            let source = InMemoryLocationSource::from_geojson(&self.load_geojson(&self.markers_file)?)?;
            tracing::info!(
                "loaded {} side-center markers for {} roads from {}",
                source.marker_count(),
                source.road_count(),
                self.markers_file
            );
            Ok(source)
        })
    }
}

impl LocationDataSource for FilesystemLocationSource {
    fn side_center_markers(&self, road_id: &str) -> DomainResult<Vec<SideCenterMarker>> {
        self.markers()?.side_center_markers(road_id)
    }
}
