// Turn path service - wires the workflow controller to the solver and map ports
use crate::common::{ApplicationResult, DomainResult, EventEnvelope, TurnPathError};
use crate::domains::logger::DynLogger;
use crate::domains::turn_path::{
    ApplyOutcome, LocationDataSource, PathConfig, PathResponse, PathSolver, PendingComputation, PickOutcome,
    RoadPick, SceneGateway, TurnPathWorkflow, UserNotifier, VehicleCatalog, VehicleProfile, WorkflowSettings,
};
use std::sync::Arc;

/// Solver result tagged with the generation it was issued under.
#[derive(Debug)]
pub struct CompletedComputation {
    pub generation: u64,
    pub result: DomainResult<PathResponse>,
}

/// Runs one solver request. Free of workflow state so a UI loop can spawn it.
pub async fn run_computation(solver: Arc<dyn PathSolver>, pending: PendingComputation) -> CompletedComputation {
    let result = solver.compute(&pending.request).await;
    CompletedComputation { generation: pending.generation, result }
}

#[derive(Debug)]
pub enum PickResult {
    /// The pick did not start a computation.
    Selection(PickOutcome),
    Computed(ApplyOutcome),
}

pub struct TurnPathService<S: SceneGateway> {
    scene: S,
    workflow: TurnPathWorkflow,
    locations: Arc<dyn LocationDataSource>,
    solver: Arc<dyn PathSolver>,
    catalog: Arc<dyn VehicleCatalog>,
    profiles: Vec<VehicleProfile>,
    logger: DynLogger,
}

impl<S: SceneGateway> TurnPathService<S> {
    pub fn new(
        scene: S,
        locations: Arc<dyn LocationDataSource>,
        solver: Arc<dyn PathSolver>,
        catalog: Arc<dyn VehicleCatalog>,
        settings: WorkflowSettings,
        logger: DynLogger,
        notifier: Arc<dyn UserNotifier>,
    ) -> Self {
        let workflow = TurnPathWorkflow::new(&scene, settings, logger.clone(), notifier);
        Self {
            scene,
            workflow,
            locations,
            solver,
            catalog,
            profiles: Vec::new(),
            logger,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn workflow(&self) -> &TurnPathWorkflow {
        &self.workflow
    }

    pub fn profiles(&self) -> &[VehicleProfile] {
        &self.profiles
    }

    pub fn open_dialog(&mut self) {
        self.workflow.open_dialog();
    }

    /// Fetches the vehicle catalog and keeps it for the profile step.
    pub async fn load_profiles(&mut self) -> ApplicationResult<&[VehicleProfile]> {
        let profiles = self.catalog.list_profiles().await.map_err(|e| {
            self.logger.error(&format!("vehicle catalog unavailable: {}", e));
            e
        })?;
        self.logger.info(&format!("vehicle catalog holds {} profiles", profiles.len()));
        self.profiles = profiles;
        Ok(&self.profiles)
    }

    pub fn start_selection(&mut self, config: PathConfig) -> DomainResult<()> {
        self.workflow.start_selection(&mut self.scene, config)
    }

    /// Starts a selection for a catalog profile, loading the catalog if needed.
    pub async fn start_with_profile(&mut self, profile_id: &str, sampling_step_m: f64) -> ApplicationResult<()> {
        if self.profiles.is_empty() {
            self.load_profiles().await?;
        }
        if !self.profiles.iter().any(|p| p.id == profile_id) {
            let err = TurnPathError::validation(format!("unknown vehicle profile '{}'", profile_id));
            self.logger.warn(&err.to_string());
            return Err(err.into());
        }
        Ok(self.start_selection(PathConfig::catalog(profile_id, sampling_step_m))?)
    }

    /// Forwards a road pick; when it completes the selection the solver is called
    /// and its answer applied before returning.
    pub async fn pick_road(&mut self, pick: RoadPick) -> PickResult {
        match self.workflow.handle_road_pick(&mut self.scene, self.locations.as_ref(), &pick) {
            PickOutcome::ComputationIssued(pending) => {
                let completed = run_computation(self.solver.clone(), pending).await;
                PickResult::Computed(self.apply(completed))
            }
            other => PickResult::Selection(other),
        }
    }

    pub fn apply(&mut self, completed: CompletedComputation) -> ApplyOutcome {
        self.workflow
            .apply_path_result(&mut self.scene, completed.generation, completed.result)
    }

    pub fn cancel(&mut self) {
        self.workflow.cancel(&mut self.scene);
    }

    pub fn close_dialog(&mut self) {
        self.workflow.close_dialog(&mut self.scene);
    }

    /// Drains workflow events in their serialized form.
    pub fn take_event_envelopes(&mut self) -> Vec<EventEnvelope> {
        self.workflow
            .take_events()
            .iter()
            .filter_map(|e| match EventEnvelope::new(e, "turn-path-dialog") {
                Ok(env) => Some(env),
                Err(err) => {
                    self.logger.error(&format!("could not serialize workflow event: {}", err));
                    None
                }
            })
            .collect()
    }
}
