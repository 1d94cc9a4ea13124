use super::envelope::distance_m;
use super::events::WorkflowEvent;
use super::intersection::IntersectionResolver;
use super::lifecycle::{RenderReport, RenderSettings, RenderedPathRegistry};
use super::ports::{LocationDataSource, SceneGateway, UserNotifier};
use super::protocol::{classify_response, PathRequest, PathResponse};
use super::scene::{connection_names, EntityId, Material, RoadPick, SceneEntity};
use super::types::{
    ComputedPath, Intersection, PathConfig, ResolutionStrategy, RoadSelection, SideCenterMarker,
    UnresolvedIntersectionPolicy, WorkflowState,
};
use crate::common::{DomainResult, TurnPathError};
use crate::domains::logger::DynLogger;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowSettings {
    pub render: RenderSettings,
    pub unresolved_intersection: UnresolvedIntersectionPolicy,
}

/// A solver request the caller must issue, tagged with its generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingComputation {
    pub generation: u64,
    pub request: PathRequest,
}

#[derive(Debug)]
pub enum PickOutcome {
    /// Not a road, or picked while no road is expected.
    Ignored,
    SourceSelected,
    /// Destination pick matched the source road; nothing changed.
    SameRoadRejected,
    ComputationIssued(PendingComputation),
    /// The selection was reset (or redirected) because of this error.
    Failed(TurnPathError),
}

#[derive(Debug)]
pub enum ApplyOutcome {
    Shown(RenderReport),
    /// Result of an abandoned computation; discarded.
    Stale,
    Failed(TurnPathError),
}

/// Selection workflow controller, the single owned context of a turn-path dialog.
///
/// UI callbacks receive it by `&mut` together with the scene. Solver calls happen
/// outside: a road pick that completes the selection yields a [`PendingComputation`],
/// and the caller hands the result back through [`TurnPathWorkflow::apply_path_result`].
pub struct TurnPathWorkflow {
    session_id: Uuid,
    state: WorkflowState,
    dialog_visible: bool,
    config: Option<PathConfig>,
    last_config: Option<PathConfig>,
    source: Option<RoadSelection>,
    destination: Option<RoadSelection>,
    intersection: Option<Intersection>,
    computed: Option<ComputedPath>,
    generation: u64,
    in_flight: Option<u64>,
    // Original materials of entities this controller highlighted, in application order.
    highlights: Vec<(EntityId, Material)>,
    registry: RenderedPathRegistry,
    settings: WorkflowSettings,
    logger: DynLogger,
    notifier: Arc<dyn UserNotifier>,
    uncommitted_events: Vec<WorkflowEvent>,
}

impl TurnPathWorkflow {
    pub fn new(
        scene: &dyn SceneGateway,
        settings: WorkflowSettings,
        logger: DynLogger,
        notifier: Arc<dyn UserNotifier>,
    ) -> Self {
        let registry = RenderedPathRegistry::attach(scene, settings.render.clone(), logger.clone());
        Self {
            session_id: Uuid::new_v4(),
            state: WorkflowState::Profile,
            dialog_visible: false,
            config: None,
            last_config: None,
            source: None,
            destination: None,
            intersection: None,
            computed: None,
            generation: 0,
            in_flight: None,
            highlights: Vec::new(),
            registry,
            settings,
            logger,
            notifier,
            uncommitted_events: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid { self.session_id }
    pub fn state(&self) -> WorkflowState { self.state }
    pub fn dialog_visible(&self) -> bool { self.dialog_visible }
    pub fn config(&self) -> Option<&PathConfig> { self.config.as_ref() }
    /// Config of the previous selection, for prefilling the profile step.
    pub fn last_config(&self) -> Option<&PathConfig> { self.last_config.as_ref() }
    pub fn source(&self) -> Option<&RoadSelection> { self.source.as_ref() }
    pub fn destination(&self) -> Option<&RoadSelection> { self.destination.as_ref() }
    pub fn intersection(&self) -> Option<&Intersection> { self.intersection.as_ref() }
    pub fn computed_path(&self) -> Option<&ComputedPath> { self.computed.as_ref() }
    pub fn generation(&self) -> u64 { self.generation }
    pub fn in_flight(&self) -> Option<u64> { self.in_flight }
    pub fn highlighted_count(&self) -> usize { self.highlights.len() }
    pub fn registry(&self) -> &RenderedPathRegistry { &self.registry }

    pub fn uncommitted_events(&self) -> &[WorkflowEvent] {
        &self.uncommitted_events
    }

    pub fn take_events(&mut self) -> Vec<WorkflowEvent> {
        std::mem::take(&mut self.uncommitted_events)
    }

    /// Shows the dialog on the profile step. Calling it again changes nothing.
    pub fn open_dialog(&mut self) {
        if self.dialog_visible {
            return;
        }
        self.dialog_visible = true;
        self.uncommitted_events.push(WorkflowEvent::DialogOpened {
            session_id: self.session_id,
            timestamp: Utc::now(),
        });
    }

    /// Confirms the profile step and waits for the source road.
    pub fn start_selection(&mut self, scene: &mut dyn SceneGateway, config: PathConfig) -> DomainResult<()> {
        if let Err(e) = config.validate() {
            self.notifier.prompt_profile(&e.to_string());
            return Err(e);
        }
        if self.state != WorkflowState::Profile {
            self.reset_selection(scene);
        }
        self.dialog_visible = true;
        self.config = Some(config.clone());
        self.last_config = Some(config.clone());
        self.state = WorkflowState::SelectingSource;
        self.uncommitted_events.push(WorkflowEvent::SelectionStarted {
            session_id: self.session_id,
            config,
            timestamp: Utc::now(),
        });
        self.notifier.info("Click the source road on the map");
        Ok(())
    }

    pub fn handle_road_pick(
        &mut self,
        scene: &mut dyn SceneGateway,
        locations: &dyn LocationDataSource,
        pick: &RoadPick,
    ) -> PickOutcome {
        let Some(entity) = scene.entity(pick.entity_id) else {
            return PickOutcome::Ignored;
        };
        let Some(road_id) = entity.kind.road_id().map(str::to_string) else {
            return PickOutcome::Ignored;
        };

        match self.state {
            WorkflowState::SelectingSource => {
                let selection = self.build_selection(scene, entity, &road_id, locations, pick);
                self.highlight(scene, &selection.entity_ids, Material::source_highlight());
                self.logger.info(&format!("source road {} selected", road_id));
                self.source = Some(selection);
                self.state = WorkflowState::SelectingDestination;
                self.uncommitted_events.push(WorkflowEvent::SourceSelected {
                    session_id: self.session_id,
                    road_id,
                    timestamp: Utc::now(),
                });
                self.notifier.info("Click the destination road on the map");
                PickOutcome::SourceSelected
            }
            WorkflowState::SelectingDestination => {
                if self.source.as_ref().map(|s| s.road_id.as_str()) == Some(road_id.as_str()) {
                    self.notifier.alert("The destination road must differ from the source road");
                    return PickOutcome::SameRoadRejected;
                }
                let selection = self.build_selection(scene, entity, &road_id, locations, pick);
                self.highlight(scene, &selection.entity_ids, Material::destination_highlight());
                self.logger.info(&format!("destination road {} selected", road_id));
                self.destination = Some(selection);
                self.uncommitted_events.push(WorkflowEvent::DestinationSelected {
                    session_id: self.session_id,
                    road_id,
                    timestamp: Utc::now(),
                });
                match self.request_computation(scene, locations) {
                    Ok(pending) => PickOutcome::ComputationIssued(pending),
                    Err(e) => PickOutcome::Failed(e),
                }
            }
            _ => PickOutcome::Ignored,
        }
    }

    /// Resolves the shared intersection and issues a new solver request.
    ///
    /// When something is missing the operator is sent back to the step that
    /// provides it and no request is produced.
    pub fn request_computation(
        &mut self,
        scene: &mut dyn SceneGateway,
        locations: &dyn LocationDataSource,
    ) -> DomainResult<PendingComputation> {
        let Some(config) = self.config.clone() else {
            let err = TurnPathError::validation("configure a vehicle profile before computing a turn path");
            self.reset_selection(scene);
            self.notifier.prompt_profile(&err.to_string());
            return Err(err);
        };
        let (Some(source), Some(destination)) = (self.source.clone(), self.destination.clone()) else {
            let (state, msg) = if self.source.is_none() {
                (WorkflowState::SelectingSource, "pick a source road before computing")
            } else {
                (WorkflowState::SelectingDestination, "pick a destination road before computing")
            };
            self.state = state;
            self.notifier.info(msg);
            return Err(TurnPathError::validation(msg));
        };
        if source.road_id == destination.road_id {
            self.destination = None;
            self.state = WorkflowState::SelectingDestination;
            let err = TurnPathError::validation("source and destination must be different roads");
            self.notifier.alert(&err.to_string());
            return Err(err);
        }

        let resolved = IntersectionResolver::new(locations, self.logger.clone()).resolve(&source, &destination);
        let policy = self.settings.unresolved_intersection.clone();
        let intersection = match resolved {
            Some(found) => found,
            None => match policy {
                UnresolvedIntersectionPolicy::Fail => {
                    let err = TurnPathError::Resolution {
                        from_road_id: source.road_id.clone(),
                        to_road_id: destination.road_id.clone(),
                    };
                    return Err(self.fail(scene, err, None));
                }
                UnresolvedIntersectionPolicy::Placeholder(name) => {
                    self.logger.warn(&format!(
                        "no shared intersection for {} -> {}, sending placeholder '{}'",
                        source.road_id, destination.road_id, name
                    ));
                    Intersection {
                        name,
                        from_marker_oid: source.marker_oid().map(str::to_string),
                        to_marker_oid: destination.marker_oid().map(str::to_string),
                        strategy: ResolutionStrategy::Placeholder,
                    }
                }
            },
        };

        let request = PathRequest::build(&source, &destination, &config, &intersection)?;

        // A result still in flight from a previous computation becomes stale here.
        self.registry.clear(scene);
        self.computed = None;
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.state = WorkflowState::Computing;
        self.logger.info(&format!(
            "computing turn path {} -> {} via {} (generation {})",
            source.road_id, destination.road_id, intersection.name, self.generation
        ));
        self.uncommitted_events.push(WorkflowEvent::ComputationRequested {
            session_id: self.session_id,
            generation: self.generation,
            intersection: intersection.clone(),
            timestamp: Utc::now(),
        });
        self.intersection = Some(intersection);
        self.notifier.info("Computing turn path...");
        Ok(PendingComputation { generation: self.generation, request })
    }

    /// Applies a solver result, unless a newer selection has superseded it.
    pub fn apply_path_result(
        &mut self,
        scene: &mut dyn SceneGateway,
        generation: u64,
        result: DomainResult<PathResponse>,
    ) -> ApplyOutcome {
        if self.in_flight != Some(generation) {
            self.logger.info(&format!(
                "discarding turn path result of generation {} (current {:?})",
                generation, self.in_flight
            ));
            return ApplyOutcome::Stale;
        }
        self.in_flight = None;
        let Some(intersection) = self.intersection.clone() else {
            self.logger.warn("turn path result arrived without a resolved intersection");
            return ApplyOutcome::Stale;
        };

        match result.and_then(|r| classify_response(r, &intersection)) {
            Ok(path) => {
                let report = self.registry.render(scene, &path);
                if !path.clearance.vehicle_envelope_ok {
                    self.notifier.alert(&format!(
                        "Vehicle envelope exceeds the intersection by {:.2} m²",
                        path.clearance.outside_area_sqm
                    ));
                }
                self.notifier.info(&format!(
                    "Turn path via {}: {:.1} m ({})",
                    intersection.name, path.path.length_m, path.path.path_type
                ));
                self.uncommitted_events.push(WorkflowEvent::PathShown {
                    session_id: self.session_id,
                    generation,
                    length_m: path.path.length_m,
                    path_type: path.path.path_type.clone(),
                    timestamp: Utc::now(),
                });
                self.computed = Some(path);
                self.state = WorkflowState::ShowingPath;
                ApplyOutcome::Shown(report)
            }
            Err(e) => ApplyOutcome::Failed(self.fail(scene, e, Some(generation))),
        }
    }

    /// Returns to the profile step and undoes every map change this controller made.
    ///
    /// Safe to call any number of times, in any state.
    pub fn reset_selection(&mut self, scene: &mut dyn SceneGateway) {
        let from_state = self.state;
        let had_anything = from_state != WorkflowState::Profile
            || self.config.is_some()
            || self.source.is_some()
            || self.destination.is_some()
            || !self.highlights.is_empty()
            || self.registry.tracked_count() > 0
            || self.registry.has_intersection_highlight();

        while let Some((id, original)) = self.highlights.pop() {
            if !scene.set_material(id, original) {
                self.logger.warn(&format!("could not restore material of {}", id));
            }
        }
        self.registry.clear(scene);
        self.config = None;
        self.source = None;
        self.destination = None;
        self.intersection = None;
        self.computed = None;
        self.in_flight = None;
        self.state = WorkflowState::Profile;

        if had_anything {
            self.logger.info(&format!("turn path selection reset from {}", from_state));
            self.uncommitted_events.push(WorkflowEvent::SelectionReset {
                session_id: self.session_id,
                from_state,
                timestamp: Utc::now(),
            });
        }
    }

    pub fn cancel(&mut self, scene: &mut dyn SceneGateway) {
        self.reset_selection(scene);
    }

    pub fn close_dialog(&mut self, scene: &mut dyn SceneGateway) {
        self.reset_selection(scene);
        if self.dialog_visible {
            self.dialog_visible = false;
            self.uncommitted_events.push(WorkflowEvent::DialogClosed {
                session_id: self.session_id,
                timestamp: Utc::now(),
            });
        }
    }

    fn fail(&mut self, scene: &mut dyn SceneGateway, err: TurnPathError, generation: Option<u64>) -> TurnPathError {
        self.logger.error(&format!("turn path failed ({}): {}", err.kind(), err));
        self.reset_selection(scene);
        self.notifier.alert(&err.to_string());
        self.uncommitted_events.push(WorkflowEvent::ComputationFailed {
            session_id: self.session_id,
            generation,
            kind: err.kind().to_string(),
            reason: err.to_string(),
            timestamp: Utc::now(),
        });
        err
    }

    fn build_selection(
        &self,
        scene: &dyn SceneGateway,
        entity: &SceneEntity,
        road_id: &str,
        locations: &dyn LocationDataSource,
        pick: &RoadPick,
    ) -> RoadSelection {
        let mut entity_ids = scene.entities_for_road(road_id);
        if !entity_ids.contains(&entity.id) {
            entity_ids.insert(0, entity.id);
        }
        let display_name = if entity.name.trim().is_empty() { road_id.to_string() } else { entity.name.clone() };
        RoadSelection {
            road_id: road_id.to_string(),
            display_name,
            connection_names: connection_names(&entity.attributes),
            entity_ids,
            nearest_marker: self.nearest_marker(locations, road_id, pick),
        }
    }

    fn nearest_marker(
        &self,
        locations: &dyn LocationDataSource,
        road_id: &str,
        pick: &RoadPick,
    ) -> Option<SideCenterMarker> {
        let at = pick.position.filter(|p| p.is_finite())?;
        let markers = match locations.side_center_markers(road_id) {
            Ok(m) => m,
            Err(e) => {
                self.logger.warn(&format!("side-center markers for {} unavailable: {}", road_id, e));
                return None;
            }
        };
        markers
            .into_iter()
            .filter_map(|m| m.position.filter(|p| p.is_finite()).map(|p| (distance_m(at, p), m)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, m)| m)
    }

    fn highlight(&mut self, scene: &mut dyn SceneGateway, ids: &[EntityId], material: Material) {
        for &id in ids {
            if !self.highlights.iter().any(|(h, _)| *h == id) {
                match scene.material(id) {
                    Some(original) => self.highlights.push((id, original)),
                    None => continue,
                }
            }
            scene.set_material(id, material.clone());
        }
    }
}
