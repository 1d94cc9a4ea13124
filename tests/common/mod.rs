#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use turnpath_app::adapters::outbound::{InMemoryLocationSource, InMemoryScene};
use turnpath_app::common::{DomainResult, TurnPathError};
use turnpath_app::domains::logger::DomainLogger;
use turnpath_app::domains::turn_path::*;

pub struct CaptureLogger {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl CaptureLogger {
    pub fn new() -> Self { Self { messages: Arc::new(Mutex::new(Vec::new())) } }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|m| m.contains(needle))
    }
}

impl DomainLogger for CaptureLogger {
    fn info(&self, msg: &str) { self.messages.lock().unwrap().push(format!("INFO:{}", msg)); }
    fn warn(&self, msg: &str) { self.messages.lock().unwrap().push(format!("WARN:{}", msg)); }
    fn error(&self, msg: &str) { self.messages.lock().unwrap().push(format!("ERR:{}", msg)); }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn of_kind(&self, kind: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl UserNotifier for RecordingNotifier {
    fn info(&self, msg: &str) { self.messages.lock().unwrap().push(("info".into(), msg.into())); }
    fn alert(&self, msg: &str) { self.messages.lock().unwrap().push(("alert".into(), msg.into())); }
    fn prompt_profile(&self, msg: &str) { self.messages.lock().unwrap().push(("profile".into(), msg.into())); }
}

/// Solver answering every request with the same canned outcome.
pub struct FakeSolver {
    response: Option<PathResponse>,
    transport_error: Option<String>,
    pub requests: Mutex<Vec<PathRequest>>,
}

impl FakeSolver {
    pub fn answering(json: &str) -> Self {
        Self {
            response: Some(serde_json::from_str(json).unwrap()),
            transport_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(msg: &str) -> Self {
        Self {
            response: None,
            transport_error: Some(msg.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PathSolver for FakeSolver {
    async fn compute(&self, request: &PathRequest) -> DomainResult<PathResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match (&self.response, &self.transport_error) {
            (Some(r), _) => Ok(r.clone()),
            (None, Some(e)) => Err(TurnPathError::Transport(e.clone())),
            (None, None) => Err(TurnPathError::Transport("no response configured".into())),
        }
    }
}

pub struct FakeCatalog(pub Vec<VehicleProfile>);

#[async_trait]
impl VehicleCatalog for FakeCatalog {
    async fn list_profiles(&self) -> DomainResult<Vec<VehicleProfile>> {
        Ok(self.0.clone())
    }
}

pub fn haul_truck() -> VehicleProfile {
    VehicleProfile {
        id: "793F".into(),
        name: "CAT 793F".into(),
        width_m: 7.6,
        wheelbase_m: 5.9,
        max_steering_angle_deg: 36.0,
        min_turn_radius_m: Some(14.2),
        side_buffer_m: 1.0,
        front_buffer_m: 2.0,
        rear_buffer_m: 2.0,
    }
}

pub fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub fn marker(oid: &str, road_id: &str, overlap: Option<&str>, best: Option<&str>) -> SideCenterMarker {
    SideCenterMarker {
        oid: Some(oid.into()),
        road_id: road_id.into(),
        overlapping_entity_name: overlap.map(str::to_string),
        best_overlap_entity: best.map(str::to_string),
        position: None,
    }
}

pub fn selection(road_id: &str, connections: &[&str]) -> RoadSelection {
    RoadSelection {
        road_id: road_id.into(),
        display_name: road_id.into(),
        connection_names: connections.iter().map(|c| c.to_string()).collect(),
        entity_ids: Vec::new(),
        nearest_marker: None,
    }
}

/// Three roads (R1 and R2 meet at INT-7, R3 is elsewhere), the INT-7 polygon and a building.
pub struct Site {
    pub scene: InMemoryScene,
    pub r1: EntityId,
    pub r2: EntityId,
    pub r3: EntityId,
    pub intersection: EntityId,
    pub building: EntityId,
}

pub fn site() -> Site {
    let mut scene = InMemoryScene::new();
    let r1 = scene.insert_feature(
        "Main Haul",
        Some("haul road"),
        attrs(&[("road_id", "R1"), ("from_location", "Pit Exit"), ("to_location", "INT-7")]),
        EntityGeometry::Polyline(vec![LonLat::new(119.49, -23.49), LonLat::new(119.50, -23.50)]),
    );
    let r2 = scene.insert_feature(
        "Crusher Ramp",
        Some("road"),
        attrs(&[("road_id", "R2"), ("from_location", "INT-7"), ("to_location", "Crusher")]),
        EntityGeometry::Polyline(vec![LonLat::new(119.50, -23.50), LonLat::new(119.51, -23.51)]),
    );
    let r3 = scene.insert_feature(
        "Waste Dump Road",
        Some("road"),
        attrs(&[("road_id", "R3"), ("from_location", "Dump"), ("to_location", "Workshop")]),
        EntityGeometry::Polyline(vec![LonLat::new(119.60, -23.60), LonLat::new(119.61, -23.61)]),
    );
    let intersection = scene.insert_feature(
        "INT-7",
        Some("intersection"),
        attrs(&[("name", "INT-7")]),
        EntityGeometry::Polygon(vec![
            LonLat::new(119.499, -23.499),
            LonLat::new(119.501, -23.499),
            LonLat::new(119.501, -23.501),
            LonLat::new(119.499, -23.499),
        ]),
    );
    let building = scene.insert_feature(
        "Workshop",
        Some("building"),
        attrs(&[("name", "Workshop")]),
        EntityGeometry::Point(LonLat::new(119.6, -23.6)),
    );
    Site { scene, r1, r2, r3, intersection, building }
}

pub fn site_locations() -> InMemoryLocationSource {
    InMemoryLocationSource::new(vec![
        marker("m-11", "R1", Some("INT-7"), None),
        marker("m-21", "R2", None, Some("INT-7")),
        marker("m-31", "R3", Some("INT-9"), None),
    ])
}

pub const OK_RESPONSE: &str = r#"{
    "status": "ok",
    "path": {"length_m": 42.3, "path_type": "dubins", "wkt": "LINESTRING(119.50 -23.50, 119.501 -23.501)"},
    "clearance": {"vehicle_envelope_ok": true, "vehicle_width_with_buffer_m": 8}
}"#;

pub const ENVELOPE_OUTSIDE_RESPONSE: &str = r#"{
    "status": "envelope_outside_intersection",
    "clearance": {"outside_area_sqm": 3.4}
}"#;
