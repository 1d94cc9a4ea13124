use super::protocol::{PathRequest, PathResponse};
use super::scene::{EntityId, Material, NewEntity, PathTag, SceneEntity};
use super::types::{SideCenterMarker, VehicleProfile};
use crate::common::DomainResult;
use async_trait::async_trait;

/// Port for the location feed the intersection resolver reads from.
pub trait LocationDataSource: Send + Sync {
    /// Side-center markers belonging to `road_id`, in feed order.
    fn side_center_markers(&self, road_id: &str) -> DomainResult<Vec<SideCenterMarker>>;
}

/// Port for the external vehicle profile catalog.
#[async_trait]
pub trait VehicleCatalog: Send + Sync {
    async fn list_profiles(&self) -> DomainResult<Vec<VehicleProfile>>;
}

/// Port for the curvature-bounded path solver.
///
/// Implementations return `Ok` for any response body they could decode, whatever its
/// status; transport and decoding problems are `TurnPathError::Transport`.
#[async_trait]
pub trait PathSolver: Send + Sync {
    async fn compute(&self, request: &PathRequest) -> DomainResult<PathResponse>;
}

/// Port onto the interactive map. Only the controller and the lifecycle manager write to it.
pub trait SceneGateway {
    fn entity(&self, id: EntityId) -> Option<&SceneEntity>;
    fn add_entity(&mut self, entity: NewEntity) -> EntityId;
    fn remove_entity(&mut self, id: EntityId) -> bool;
    fn material(&self, id: EntityId) -> Option<Material>;
    fn set_material(&mut self, id: EntityId, material: Material) -> bool;
    /// Every entity currently carrying a turn-path tag.
    fn tagged_entities(&self) -> Vec<(EntityId, PathTag)>;
    fn find_intersection(&self, name: &str) -> Option<EntityId>;
    /// All entities backing `road_id` (a road may be drawn as several pieces).
    fn entities_for_road(&self, road_id: &str) -> Vec<EntityId>;
}

/// Port for user-facing messages shown by the dialog.
pub trait UserNotifier: Send + Sync {
    fn info(&self, msg: &str);
    fn alert(&self, msg: &str);
    /// Shown on the profile step when the operator has to (re)configure it.
    fn prompt_profile(&self, msg: &str);
}
