use crate::common::{DomainResult, TurnPathError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic position in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub id: String,
    pub name: String,
    pub width_m: f64,
    pub wheelbase_m: f64,
    pub max_steering_angle_deg: f64,
    pub min_turn_radius_m: Option<f64>,
    pub side_buffer_m: f64,
    pub front_buffer_m: f64,
    pub rear_buffer_m: f64,
}

/// Operator-entered dimensions that bypass the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomVehicleProfile {
    pub name: String,
    pub vehicle_width_m: f64,
    pub wheelbase_m: f64,
    pub max_steering_angle_deg: f64,
    pub side_buffer_m: f64,
    pub front_buffer_m: f64,
    pub rear_buffer_m: f64,
}

impl From<&VehicleProfile> for CustomVehicleProfile {
    fn from(p: &VehicleProfile) -> Self {
        Self {
            name: p.name.clone(),
            vehicle_width_m: p.width_m,
            wheelbase_m: p.wheelbase_m,
            max_steering_angle_deg: p.max_steering_angle_deg,
            side_buffer_m: p.side_buffer_m,
            front_buffer_m: p.front_buffer_m,
            rear_buffer_m: p.rear_buffer_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProfileChoice {
    Catalog { profile_id: String },
    Custom(CustomVehicleProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    pub profile: ProfileChoice,
    pub sampling_step_m: f64,
}

impl PathConfig {
    pub fn catalog(profile_id: impl Into<String>, sampling_step_m: f64) -> Self {
        Self {
            profile: ProfileChoice::Catalog { profile_id: profile_id.into() },
            sampling_step_m,
        }
    }

    pub fn custom(profile: CustomVehicleProfile, sampling_step_m: f64) -> Self {
        Self {
            profile: ProfileChoice::Custom(profile),
            sampling_step_m,
        }
    }

    /// Checks the config before it is accepted by the profile step.
    pub fn validate(&self) -> DomainResult<()> {
        if !(self.sampling_step_m.is_finite() && self.sampling_step_m > 0.0) {
            return Err(TurnPathError::validation("sampling step must be a positive number of metres"));
        }
        match &self.profile {
            ProfileChoice::Catalog { profile_id } => {
                if profile_id.trim().is_empty() {
                    return Err(TurnPathError::validation("select a vehicle profile"));
                }
            }
            ProfileChoice::Custom(custom) => {
                if custom.name.trim().is_empty() {
                    return Err(TurnPathError::validation("custom profile needs a name"));
                }
                for (label, value) in [
                    ("vehicle width", custom.vehicle_width_m),
                    ("wheelbase", custom.wheelbase_m),
                ] {
                    if !(value.is_finite() && value > 0.0) {
                        return Err(TurnPathError::validation(format!("{} must be positive", label)));
                    }
                }
                for (label, value) in [
                    ("side buffer", custom.side_buffer_m),
                    ("front buffer", custom.front_buffer_m),
                    ("rear buffer", custom.rear_buffer_m),
                ] {
                    if !(value.is_finite() && value >= 0.0) {
                        return Err(TurnPathError::validation(format!("{} must not be negative", label)));
                    }
                }
                let angle = custom.max_steering_angle_deg;
                if !(angle.is_finite() && angle > 0.0 && angle < 90.0) {
                    return Err(TurnPathError::validation(
                        "max steering angle must lie between 0 and 90 degrees",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Precomputed point at the lateral midpoint of a road.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideCenterMarker {
    pub oid: Option<String>,
    pub road_id: String,
    pub overlapping_entity_name: Option<String>,
    pub best_overlap_entity: Option<String>,
    pub position: Option<LonLat>,
}

impl SideCenterMarker {
    /// Annotated intersection name, falling back to the best-effort overlap.
    pub fn intersection_name(&self) -> Option<&str> {
        self.overlapping_entity_name
            .as_deref()
            .or(self.best_overlap_entity.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadSelection {
    pub road_id: String,
    pub display_name: String,
    pub connection_names: Vec<String>,
    pub entity_ids: Vec<super::scene::EntityId>,
    pub nearest_marker: Option<SideCenterMarker>,
}

impl RoadSelection {
    pub fn marker_oid(&self) -> Option<&str> {
        self.nearest_marker.as_ref().and_then(|m| m.oid.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStrategy {
    SideCenterMarkers,
    ConnectionNames,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub name: String,
    pub from_marker_oid: Option<String>,
    pub to_marker_oid: Option<String>,
    pub strategy: ResolutionStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CenterlineKind {
    Smooth,
    Plain,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centerline {
    pub kind: CenterlineKind,
    pub wkt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathFacts {
    pub length_m: f64,
    pub path_type: String,
    pub centerline: Option<Centerline>,
    /// Exterior ring supplied by the solver, if any.
    pub polygon: Option<Vec<LonLat>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceFacts {
    pub vehicle_envelope_ok: bool,
    pub outside_area_sqm: f64,
    pub vehicle_width_with_buffer_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedPath {
    pub status: String,
    pub path: PathFacts,
    pub clearance: ClearanceFacts,
    pub intersection: Intersection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Profile,
    SelectingSource,
    SelectingDestination,
    Computing,
    ShowingPath,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowState::Profile => "profile",
            WorkflowState::SelectingSource => "selecting_source",
            WorkflowState::SelectingDestination => "selecting_destination",
            WorkflowState::Computing => "computing",
            WorkflowState::ShowingPath => "showing_path",
        };
        f.write_str(s)
    }
}

/// What to do when neither resolution strategy finds a shared intersection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "name", rename_all = "snake_case")]
pub enum UnresolvedIntersectionPolicy {
    #[default]
    Fail,
    Placeholder(String),
}
