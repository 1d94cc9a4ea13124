// Solver protocol - request/response wire contract with the external path solver

use super::types::{
    Centerline, CenterlineKind, ClearanceFacts, ComputedPath, CustomVehicleProfile, Intersection, LonLat,
    PathConfig, PathFacts, ProfileChoice, RoadSelection,
};
use crate::common::{DomainResult, TurnPathError};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "ok";
pub const STATUS_ENVELOPE_OUTSIDE: &str = "envelope_outside_intersection";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    pub from_road_id: String,
    pub to_road_id: String,
    pub intersection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_vehicle_profile: Option<CustomVehicleProfile>,
    pub sampling_step_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_marker_oid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_marker_oid: Option<String>,
}

impl PathRequest {
    pub fn build(
        source: &RoadSelection,
        destination: &RoadSelection,
        config: &PathConfig,
        intersection: &Intersection,
    ) -> DomainResult<Self> {
        if source.road_id == destination.road_id {
            return Err(TurnPathError::validation("source and destination must be different roads"));
        }
        let (vehicle_profile_id, custom_vehicle_profile) = match &config.profile {
            ProfileChoice::Catalog { profile_id } => (Some(profile_id.clone()), None),
            ProfileChoice::Custom(custom) => (None, Some(custom.clone())),
        };
        Ok(Self {
            from_road_id: source.road_id.clone(),
            to_road_id: destination.road_id.clone(),
            intersection_name: intersection.name.clone(),
            vehicle_profile_id,
            custom_vehicle_profile,
            sampling_step_m: config.sampling_step_m,
            from_marker_oid: intersection.from_marker_oid.clone(),
            to_marker_oid: intersection.to_marker_oid.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub path: Option<PathPayload>,
    #[serde(default)]
    pub clearance: Option<ClearancePayload>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPayload {
    #[serde(default)]
    pub length_m: Option<f64>,
    #[serde(default)]
    pub path_type: Option<String>,
    #[serde(default)]
    pub wkt: Option<String>,
    #[serde(default)]
    pub smooth_wkt: Option<String>,
    #[serde(default)]
    pub raw_wkt: Option<String>,
    #[serde(default)]
    pub geojson: Option<serde_json::Value>,
    #[serde(default)]
    pub smooth_geojson: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearancePayload {
    #[serde(default)]
    pub vehicle_envelope_ok: Option<bool>,
    #[serde(default)]
    pub outside_area_sqm: Option<f64>,
    #[serde(default)]
    pub vehicle_width_with_buffer_m: Option<f64>,
}

/// Interprets a decoded solver response.
///
/// `ok` yields the computed path; `envelope_outside_intersection` is a clearance
/// violation; every other status is a solver rejection.
pub fn classify_response(response: PathResponse, intersection: &Intersection) -> DomainResult<ComputedPath> {
    match response.status.trim() {
        STATUS_OK => {}
        STATUS_ENVELOPE_OUTSIDE => {
            return Err(TurnPathError::ClearanceViolation {
                outside_area_sqm: response.clearance.and_then(|c| c.outside_area_sqm),
            });
        }
        other => {
            let message = response
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| format!("unexpected status '{}'", other));
            return Err(TurnPathError::SolverRejected { message });
        }
    }

    let payload = response.path.ok_or_else(|| TurnPathError::SolverRejected {
        message: "response has status ok but no path".to_string(),
    })?;
    let clearance = response.clearance.unwrap_or_default();

    let centerline = select_centerline(&payload);
    let polygon = payload
        .smooth_geojson
        .as_ref()
        .and_then(polygon_ring)
        .or_else(|| payload.geojson.as_ref().and_then(polygon_ring));

    Ok(ComputedPath {
        status: STATUS_OK.to_string(),
        path: PathFacts {
            length_m: payload.length_m.unwrap_or(0.0),
            path_type: payload.path_type.unwrap_or_default(),
            centerline,
            polygon,
        },
        clearance: ClearanceFacts {
            vehicle_envelope_ok: clearance.vehicle_envelope_ok.unwrap_or(true),
            outside_area_sqm: clearance.outside_area_sqm.unwrap_or(0.0),
            vehicle_width_with_buffer_m: clearance.vehicle_width_with_buffer_m.unwrap_or(0.0),
        },
        intersection: intersection.clone(),
    })
}

fn select_centerline(payload: &PathPayload) -> Option<Centerline> {
    [
        (CenterlineKind::Smooth, &payload.smooth_wkt),
        (CenterlineKind::Plain, &payload.wkt),
        (CenterlineKind::Raw, &payload.raw_wkt),
    ]
    .into_iter()
    .find_map(|(kind, wkt)| {
        wkt.as_ref()
            .filter(|w| !w.trim().is_empty())
            .map(|w| Centerline { kind, wkt: w.clone() })
    })
}

/// Exterior ring of a polygon delivered either as GeoJSON or as bare coordinates.
fn polygon_ring(value: &serde_json::Value) -> Option<Vec<LonLat>> {
    if value.is_object() {
        let parsed = GeoJson::from_json_value(value.clone()).ok()?;
        let geometry = match parsed {
            GeoJson::Geometry(g) => g,
            GeoJson::Feature(f) => f.geometry?,
            GeoJson::FeatureCollection(fc) => fc.features.into_iter().find_map(|f| f.geometry)?,
        };
        return match geometry.value {
            geojson::Value::Polygon(rings) => rings.into_iter().next().and_then(|r| positions(&r)),
            geojson::Value::MultiPolygon(polys) => polys
                .into_iter()
                .next()
                .and_then(|p| p.into_iter().next())
                .and_then(|r| positions(&r)),
            _ => None,
        };
    }
    if let Ok(rings) = serde_json::from_value::<Vec<Vec<Vec<f64>>>>(value.clone()) {
        return rings.into_iter().next().and_then(|r| positions(&r));
    }
    serde_json::from_value::<Vec<Vec<f64>>>(value.clone())
        .ok()
        .and_then(|r| positions(&r))
}

fn positions(ring: &[Vec<f64>]) -> Option<Vec<LonLat>> {
    let points: Vec<LonLat> = ring
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| LonLat::new(p[0], p[1]))
        .collect();
    if points.len() >= 3 && points.iter().all(LonLat::is_finite) {
        Some(points)
    } else {
        None
    }
}
