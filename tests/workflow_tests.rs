mod common;

use common::*;
use std::sync::Arc;
use turnpath_app::adapters::outbound::InMemoryLocationSource;
use turnpath_app::common::TurnPathError;
use turnpath_app::domains::turn_path::*;

struct Harness {
    site: Site,
    locations: InMemoryLocationSource,
    logger: Arc<CaptureLogger>,
    notifier: Arc<RecordingNotifier>,
    workflow: TurnPathWorkflow,
}

fn harness_with(settings: WorkflowSettings) -> Harness {
    let site = site();
    let logger = Arc::new(CaptureLogger::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = TurnPathWorkflow::new(&site.scene, settings, logger.clone(), notifier.clone());
    Harness { site, locations: site_locations(), logger, notifier, workflow }
}

fn harness() -> Harness {
    harness_with(WorkflowSettings::default())
}

impl Harness {
    fn start(&mut self) {
        self.workflow
            .start_selection(&mut self.site.scene, PathConfig::catalog("793F", 1.0))
            .unwrap();
    }

    fn pick(&mut self, entity_id: EntityId) -> PickOutcome {
        self.workflow
            .handle_road_pick(&mut self.site.scene, &self.locations, &RoadPick { entity_id, position: None })
    }

    fn material(&self, id: EntityId) -> Material {
        self.site.scene.material(id).unwrap()
    }

    fn pending(&mut self, from: EntityId, to: EntityId) -> PendingComputation {
        assert!(matches!(self.pick(from), PickOutcome::SourceSelected));
        match self.pick(to) {
            PickOutcome::ComputationIssued(pending) => pending,
            other => panic!("expected a computation, got {:?}", other),
        }
    }

    fn events_of(&self, event_type: &str) -> usize {
        use turnpath_app::common::DomainEvent;
        self.workflow
            .uncommitted_events()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

fn ok_response() -> PathResponse {
    serde_json::from_str(OK_RESPONSE).unwrap()
}

#[test]
fn test_open_dialog_is_idempotent() {
    let mut h = harness();
    assert!(!h.workflow.dialog_visible());
    h.workflow.open_dialog();
    h.workflow.open_dialog();
    assert!(h.workflow.dialog_visible());
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.events_of("DialogOpened"), 1);
}

#[test]
fn test_invalid_config_stays_on_profile_step() {
    let mut h = harness();
    let err = h
        .workflow
        .start_selection(&mut h.site.scene, PathConfig::catalog("793F", 0.0))
        .unwrap_err();
    assert!(matches!(err, TurnPathError::Validation { .. }));
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert!(h.workflow.config().is_none());
    assert_eq!(h.notifier.of_kind("profile").len(), 1);
}

#[test]
fn test_source_pick_highlights_road() {
    let mut h = harness();
    h.start();
    assert_eq!(h.workflow.state(), WorkflowState::SelectingSource);

    let r1 = h.site.r1;
    assert!(matches!(h.pick(r1), PickOutcome::SourceSelected));
    assert_eq!(h.workflow.state(), WorkflowState::SelectingDestination);
    assert_eq!(h.material(r1), Material::source_highlight());
    let source = h.workflow.source().unwrap();
    assert_eq!(source.road_id, "R1");
    assert_eq!(source.display_name, "Main Haul");
    assert_eq!(source.connection_names, vec!["Pit Exit".to_string(), "INT-7".to_string()]);
}

#[test]
fn test_cancel_during_destination_step_restores_map() {
    let mut h = harness();
    let r1 = h.site.r1;
    let original = h.material(r1);
    let before = h.site.scene.len();

    h.start();
    h.pick(r1);
    assert_ne!(h.material(r1), original);

    h.workflow.cancel(&mut h.site.scene);

    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.material(r1), original);
    assert_eq!(h.workflow.highlighted_count(), 0);
    assert!(h.workflow.source().is_none());
    assert!(h.workflow.config().is_none());
    assert_eq!(h.workflow.last_config(), Some(&PathConfig::catalog("793F", 1.0)));
    assert_eq!(h.workflow.generation(), 0);
    assert_eq!(h.site.scene.len(), before);
}

#[test]
fn test_same_road_destination_is_rejected() {
    let mut h = harness();
    h.start();
    let r1 = h.site.r1;
    h.pick(r1);

    assert!(matches!(h.pick(r1), PickOutcome::SameRoadRejected));
    assert_eq!(h.workflow.state(), WorkflowState::SelectingDestination);
    assert!(h.workflow.destination().is_none());
    assert_eq!(h.workflow.generation(), 0);
    assert_eq!(h.notifier.of_kind("alert").len(), 1);
}

#[test]
fn test_non_road_picks_are_ignored() {
    let mut h = harness();
    h.start();
    let (building, intersection) = (h.site.building, h.site.intersection);

    assert!(matches!(h.pick(building), PickOutcome::Ignored));
    assert!(matches!(h.pick(intersection), PickOutcome::Ignored));
    assert!(matches!(h.pick(EntityId(9_999)), PickOutcome::Ignored));
    assert_eq!(h.workflow.state(), WorkflowState::SelectingSource);
    assert_eq!(h.workflow.highlighted_count(), 0);
}

#[test]
fn test_picks_outside_selection_steps_are_ignored() {
    let mut h = harness();
    let r1 = h.site.r1;
    assert!(matches!(h.pick(r1), PickOutcome::Ignored));
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.material(r1), Material::solid(Rgba(120, 120, 120, 255)));
}

#[test]
fn test_reset_is_idempotent() {
    let mut h = harness();
    h.start();
    let r1 = h.site.r1;
    h.pick(r1);

    h.workflow.reset_selection(&mut h.site.scene);
    h.workflow.reset_selection(&mut h.site.scene);
    h.workflow.cancel(&mut h.site.scene);

    assert_eq!(h.events_of("SelectionReset"), 1);
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.workflow.registry().tracked_count(), 0);
}

#[test]
fn test_reset_on_fresh_workflow_changes_nothing() {
    let mut h = harness();
    let before = h.site.scene.len();
    h.workflow.reset_selection(&mut h.site.scene);
    assert_eq!(h.events_of("SelectionReset"), 0);
    assert_eq!(h.site.scene.len(), before);
}

#[test]
fn test_computation_without_config_prompts_for_profile() {
    let mut h = harness();
    let err = h
        .workflow
        .request_computation(&mut h.site.scene, &h.locations)
        .unwrap_err();
    assert!(matches!(err, TurnPathError::Validation { .. }));
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.workflow.in_flight(), None);
    assert_eq!(h.notifier.of_kind("profile").len(), 1);
}

#[test]
fn test_computation_without_destination_returns_to_destination_step() {
    let mut h = harness();
    h.start();
    let r1 = h.site.r1;
    h.pick(r1);

    let err = h
        .workflow
        .request_computation(&mut h.site.scene, &h.locations)
        .unwrap_err();
    assert!(matches!(err, TurnPathError::Validation { .. }));
    assert_eq!(h.workflow.state(), WorkflowState::SelectingDestination);
    assert_eq!(h.workflow.generation(), 0);
}

#[test]
fn test_destination_pick_issues_request_for_shared_intersection() {
    let mut h = harness();
    h.start();
    let (r1, r2) = (h.site.r1, h.site.r2);
    let pending = h.pending(r1, r2);

    assert_eq!(pending.generation, 1);
    assert_eq!(pending.request.from_road_id, "R1");
    assert_eq!(pending.request.to_road_id, "R2");
    assert_eq!(pending.request.intersection_name, "INT-7");
    assert_eq!(pending.request.vehicle_profile_id.as_deref(), Some("793F"));
    assert_eq!(pending.request.from_marker_oid.as_deref(), Some("m-11"));
    assert_eq!(pending.request.to_marker_oid.as_deref(), Some("m-21"));
    assert_eq!(h.workflow.state(), WorkflowState::Computing);
    assert_eq!(h.workflow.in_flight(), Some(1));
    assert_eq!(h.material(r2), Material::destination_highlight());
}

#[test]
fn test_ok_result_renders_path() {
    let mut h = harness();
    h.start();
    let (r1, r2, int7) = (h.site.r1, h.site.r2, h.site.intersection);
    let pending = h.pending(r1, r2);

    let outcome = h
        .workflow
        .apply_path_result(&mut h.site.scene, pending.generation, Ok(ok_response()));
    let report = match outcome {
        ApplyOutcome::Shown(report) => report,
        other => panic!("expected the path to be shown, got {:?}", other),
    };

    assert_eq!(h.workflow.state(), WorkflowState::ShowingPath);
    assert!(report.corridor_derived);
    assert_eq!(report.entity_count(), 4);
    assert!(report.intersection_highlighted);
    assert_eq!(h.material(int7), Material::intersection_highlight());
    assert_eq!(h.workflow.registry().tracked_count(), 4);

    let corridor = h.site.scene.entity(report.corridor.unwrap()).unwrap();
    match &corridor.geometry {
        EntityGeometry::Polygon(ring) => {
            assert_eq!(ring.len(), 5);
            assert_eq!(ring.first(), ring.last());
        }
        other => panic!("corridor is not a polygon: {:?}", other),
    }

    let computed = h.workflow.computed_path().unwrap();
    assert_eq!(computed.path.length_m, 42.3);
    assert_eq!(computed.path.path_type, "dubins");
    assert_eq!(h.events_of("PathShown"), 1);
}

#[test]
fn test_reset_after_showing_path_removes_everything() {
    let mut h = harness();
    let before = h.site.scene.len();
    let (r1, r2, int7) = (h.site.r1, h.site.r2, h.site.intersection);
    let originals = [h.material(r1), h.material(r2), h.material(int7)];

    h.start();
    let pending = h.pending(r1, r2);
    h.workflow
        .apply_path_result(&mut h.site.scene, pending.generation, Ok(ok_response()));
    assert_eq!(h.site.scene.len(), before + 4);

    h.workflow.reset_selection(&mut h.site.scene);

    assert_eq!(h.site.scene.len(), before);
    assert!(h.site.scene.tagged_entities().is_empty());
    assert_eq!([h.material(r1), h.material(r2), h.material(int7)], originals);
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
}

#[test]
fn test_late_result_after_cancel_is_discarded() {
    let mut h = harness();
    let before = h.site.scene.len();
    h.start();
    let (r1, r2) = (h.site.r1, h.site.r2);
    let pending = h.pending(r1, r2);

    h.workflow.cancel(&mut h.site.scene);
    let outcome = h
        .workflow
        .apply_path_result(&mut h.site.scene, pending.generation, Ok(ok_response()));

    assert!(matches!(outcome, ApplyOutcome::Stale));
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.site.scene.len(), before);
    assert!(h.logger.contains("discarding"));
}

#[test]
fn test_superseded_generation_is_discarded() {
    let mut h = harness();
    h.start();
    let (r1, r2) = (h.site.r1, h.site.r2);
    let first = h.pending(r1, r2);

    // new selection while the first computation is still out
    h.start();
    let second = h.pending(r1, r2);
    assert_eq!(second.generation, first.generation + 1);

    let stale = h
        .workflow
        .apply_path_result(&mut h.site.scene, first.generation, Ok(ok_response()));
    assert!(matches!(stale, ApplyOutcome::Stale));
    assert_eq!(h.workflow.state(), WorkflowState::Computing);
    assert_eq!(h.workflow.registry().tracked_count(), 0);

    let fresh = h
        .workflow
        .apply_path_result(&mut h.site.scene, second.generation, Ok(ok_response()));
    assert!(matches!(fresh, ApplyOutcome::Shown(_)));
}

#[test]
fn test_unresolved_intersection_fails_and_resets() {
    let mut h = harness();
    h.start();
    let (r1, r3) = (h.site.r1, h.site.r3);
    let original = h.material(r1);

    h.pick(r1);
    let outcome = h.pick(r3);

    match outcome {
        PickOutcome::Failed(TurnPathError::Resolution { from_road_id, to_road_id }) => {
            assert_eq!(from_road_id, "R1");
            assert_eq!(to_road_id, "R3");
        }
        other => panic!("expected a resolution failure, got {:?}", other),
    }
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.workflow.in_flight(), None);
    assert_eq!(h.workflow.generation(), 0);
    assert_eq!(h.material(r1), original);
    assert_eq!(h.notifier.of_kind("alert").len(), 1);
    assert_eq!(h.events_of("ComputationFailed"), 1);
}

#[test]
fn test_placeholder_policy_sends_configured_name() {
    let settings = WorkflowSettings {
        unresolved_intersection: UnresolvedIntersectionPolicy::Placeholder("UNRESOLVED".into()),
        ..Default::default()
    };
    let mut h = harness_with(settings);
    h.start();
    let (r1, r3) = (h.site.r1, h.site.r3);
    let pending = h.pending(r1, r3);

    assert_eq!(pending.request.intersection_name, "UNRESOLVED");
    assert_eq!(h.workflow.intersection().unwrap().strategy, ResolutionStrategy::Placeholder);
    assert!(h.logger.contains("placeholder"));
}

#[test]
fn test_envelope_outside_result_resets_without_drawing() {
    let mut h = harness();
    let before = h.site.scene.len();
    h.start();
    let (r1, r2) = (h.site.r1, h.site.r2);
    let pending = h.pending(r1, r2);

    let response: PathResponse = serde_json::from_str(ENVELOPE_OUTSIDE_RESPONSE).unwrap();
    let outcome = h
        .workflow
        .apply_path_result(&mut h.site.scene, pending.generation, Ok(response));

    match outcome {
        ApplyOutcome::Failed(TurnPathError::ClearanceViolation { outside_area_sqm }) => {
            assert_eq!(outside_area_sqm, Some(3.4));
        }
        other => panic!("expected a clearance violation, got {:?}", other),
    }
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.workflow.registry().tracked_count(), 0);
    assert_eq!(h.site.scene.len(), before);
    assert!(h.notifier.of_kind("alert").iter().any(|m| m.contains("3.4")));
}

#[test]
fn test_transport_error_resets_selection() {
    let mut h = harness();
    h.start();
    let (r1, r2) = (h.site.r1, h.site.r2);
    let pending = h.pending(r1, r2);

    let outcome = h.workflow.apply_path_result(
        &mut h.site.scene,
        pending.generation,
        Err(TurnPathError::Transport("connection refused".into())),
    );

    assert!(matches!(outcome, ApplyOutcome::Failed(TurnPathError::Transport(_))));
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert!(h.logger.contains("connection refused"));
}

#[test]
fn test_close_dialog_resets_and_hides() {
    let mut h = harness();
    h.workflow.open_dialog();
    h.start();
    let r1 = h.site.r1;
    h.pick(r1);

    h.workflow.close_dialog(&mut h.site.scene);
    h.workflow.close_dialog(&mut h.site.scene);

    assert!(!h.workflow.dialog_visible());
    assert_eq!(h.workflow.state(), WorkflowState::Profile);
    assert_eq!(h.events_of("DialogClosed"), 1);
}

fn marker_at(oid: &str, road_id: &str, lon: f64, lat: f64) -> SideCenterMarker {
    SideCenterMarker { position: Some(LonLat::new(lon, lat)), ..marker(oid, road_id, Some("INT-7"), None) }
}

impl Harness {
    fn pick_at(&mut self, entity_id: EntityId, lon: f64, lat: f64) -> PickOutcome {
        let pick = RoadPick { entity_id, position: Some(LonLat::new(lon, lat)) };
        self.workflow.handle_road_pick(&mut self.site.scene, &self.locations, &pick)
    }
}

#[test]
fn test_pick_position_selects_nearest_marker_pair() {
    let mut h = harness();
    h.locations = InMemoryLocationSource::new(vec![
        marker_at("a1", "R1", 119.495, -23.495),
        marker_at("a2", "R1", 119.499, -23.4995),
        marker_at("b1", "R2", 119.505, -23.505),
        marker_at("b2", "R2", 119.5012, -23.5012),
    ]);
    h.start();
    let (r1, r2) = (h.site.r1, h.site.r2);

    assert!(matches!(h.pick_at(r1, 119.4991, -23.4996), PickOutcome::SourceSelected));
    assert_eq!(h.workflow.source().unwrap().marker_oid(), Some("a2"));

    let pending = match h.pick_at(r2, 119.5011, -23.5013) {
        PickOutcome::ComputationIssued(pending) => pending,
        other => panic!("expected a computation, got {:?}", other),
    };
    assert_eq!(pending.request.intersection_name, "INT-7");
    assert_eq!(pending.request.from_marker_oid.as_deref(), Some("a2"));
    assert_eq!(pending.request.to_marker_oid.as_deref(), Some("b2"));
}

#[test]
fn test_unpositioned_picks_keep_feed_order() {
    let mut h = harness();
    h.locations = InMemoryLocationSource::new(vec![
        marker_at("a1", "R1", 119.495, -23.495),
        marker_at("a2", "R1", 119.499, -23.4995),
        marker_at("b1", "R2", 119.505, -23.505),
        marker_at("b2", "R2", 119.5012, -23.5012),
    ]);
    h.start();
    let (r1, r2) = (h.site.r1, h.site.r2);
    let pending = h.pending(r1, r2);

    assert_eq!(pending.request.from_marker_oid.as_deref(), Some("a1"));
    assert_eq!(pending.request.to_marker_oid.as_deref(), Some("b1"));
}

struct OfflineFeed;

impl LocationDataSource for OfflineFeed {
    fn side_center_markers(&self, _road_id: &str) -> turnpath_app::common::DomainResult<Vec<SideCenterMarker>> {
        Err(TurnPathError::Infrastructure("feed offline".into()))
    }
}

#[test]
fn test_marker_feed_outage_still_issues_computation() {
    let mut h = harness();
    h.start();
    let (r1, r2) = (h.site.r1, h.site.r2);
    let pick = |entity_id| RoadPick { entity_id, position: Some(LonLat::new(119.5, -23.5)) };

    let first = h.workflow.handle_road_pick(&mut h.site.scene, &OfflineFeed, &pick(r1));
    assert!(matches!(first, PickOutcome::SourceSelected));
    let second = h.workflow.handle_road_pick(&mut h.site.scene, &OfflineFeed, &pick(r2));

    match second {
        PickOutcome::ComputationIssued(pending) => {
            assert_eq!(pending.request.intersection_name, "INT-7");
            assert!(pending.request.from_marker_oid.is_none());
        }
        other => panic!("expected a computation, got {:?}", other),
    }
    assert!(h.logger.contains("feed offline"));
    assert!(h.notifier.of_kind("alert").is_empty());
}
