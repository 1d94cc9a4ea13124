use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use turnpath_app::adapters::outbound::{
    init_combined_logger, FilesystemLocationSource, HttpPathSolver, InMemoryScene, LoggingNotifier,
};
use turnpath_app::application::{PickResult, TurnPathService};
use turnpath_app::common::{ApplicationResult, TurnPathError};
use turnpath_app::domains::turn_path::{ApplyOutcome, RoadPick, SceneGateway};
use turnpath_app::Config;

#[tokio::main]
async fn main() -> ApplicationResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting turn path planner");

    let config_path = std::env::var("TURNPATH_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load(Some(Path::new(&config_path)))?;
    info!("Solver endpoint: {}{}", config.solver.base_url, config.solver.turn_path_path);

    let logger = init_combined_logger(config.logging.file.as_deref(), config.logging.level_filter());
    let notifier = Arc::new(LoggingNotifier::new(logger.clone()));

    let data_dir = config.locations.data_dir.clone().map(PathBuf::from);
    let locations = Arc::new(FilesystemLocationSource::new(data_dir, config.locations.markers_file.clone()));

    let warm = locations.clone();
    let preloaded = tokio::task::spawn_blocking(move || warm.preload())
        .await
        .map_err(|e| TurnPathError::Infrastructure(format!("marker preload task failed: {}", e)))?;
    match preloaded {
        Ok(count) => info!("Side-center markers ready: {}", count),
        Err(e) => warn!("Side-center markers unavailable, connection names only: {}", e),
    }

    let mut scene = InMemoryScene::new();
    match locations.load_geojson(&config.locations.roads_file) {
        Ok(roads) => {
            let ids = scene.load_geojson(&roads)?;
            info!("Loaded {} map features from {}", ids.len(), config.locations.roads_file);
        }
        Err(e) => warn!("No road layer loaded: {}", e),
    }

    let solver = Arc::new(HttpPathSolver::new(&config.solver)?);
    let mut service = TurnPathService::new(
        scene,
        locations,
        solver.clone(),
        solver,
        config.workflow_settings(),
        logger,
        notifier,
    );
    service.open_dialog();

    // Demo run: TURNPATH_PROFILE, TURNPATH_FROM and TURNPATH_TO name a catalog profile and two roads.
    let (Ok(profile), Ok(from), Ok(to)) = (
        std::env::var("TURNPATH_PROFILE"),
        std::env::var("TURNPATH_FROM"),
        std::env::var("TURNPATH_TO"),
    ) else {
        info!("Set TURNPATH_PROFILE, TURNPATH_FROM and TURNPATH_TO to plan a turn");
        return Ok(());
    };

    if let Err(e) = service
        .start_with_profile(&profile, config.workflow.default_sampling_step_m)
        .await
    {
        error!("Profile step failed: {}", e);
        return Ok(());
    }

    for road_id in [from, to] {
        let Some(entity_id) = service.scene().entities_for_road(&road_id).first().copied() else {
            error!("Road {} is not on the map", road_id);
            service.cancel();
            return Ok(());
        };
        match service.pick_road(RoadPick { entity_id, position: None }).await {
            PickResult::Selection(outcome) => info!("Pick of {}: {:?}", road_id, outcome),
            PickResult::Computed(ApplyOutcome::Shown(report)) => {
                info!("Turn path drawn with {} entities", report.entity_count())
            }
            PickResult::Computed(outcome) => warn!("Turn path not shown: {:?}", outcome),
        }
    }

    for envelope in service.take_event_envelopes() {
        info!("event {} at {}", envelope.event_type, envelope.occurred_at);
    }
    info!("Workflow finished in state {}", service.workflow().state());
    Ok(())
}
