use crate::domains::turn_path::{RenderSettings, UnresolvedIntersectionPolicy, WorkflowSettings};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub solver: SolverConfig,
    pub locations: LocationsConfig,
    pub rendering: RenderingConfig,
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub base_url: String,
    pub turn_path_path: String,
    pub profiles_path: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationsConfig {
    /// Falls back to TURNPATH_DATA_DIR and the default search paths when unset.
    pub data_dir: Option<String>,
    pub markers_file: String,
    pub roads_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingConfig {
    pub corridor_tightening: f64,
    pub simplify_epsilon_deg: f64,
    pub simplify_min_distance_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub default_sampling_step_m: f64,
    #[serde(default)]
    pub unresolved_intersection: UnresolvedIntersectionPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub file: Option<String>,
    pub level: Option<String>,
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level
            .as_deref()
            .and_then(|l| l.parse().ok())
            .unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Layers defaults, an optional TOML file and `TURNPATH__SECTION__KEY` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = ::config::Config::try_from(&Config::default())?;
        let mut builder = ::config::Config::builder().add_source(defaults);
        if let Some(p) = path {
            builder = builder.add_source(::config::File::from(p).required(false));
        }
        let merged = builder
            .add_source(::config::Environment::with_prefix("TURNPATH").separator("__"))
            .build()?;
        Ok(merged.try_deserialize()?)
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            render: RenderSettings {
                corridor_tightening: self.rendering.corridor_tightening,
                simplify_epsilon_deg: self.rendering.simplify_epsilon_deg,
                simplify_min_distance_m: self.rendering.simplify_min_distance_m,
            },
            unresolved_intersection: self.workflow.unresolved_intersection.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let render = RenderSettings::default();
        Self {
            solver: SolverConfig {
                base_url: "http://localhost:8000".to_string(),
                turn_path_path: "/api/turn-path".to_string(),
                profiles_path: "/api/vehicle-profiles".to_string(),
                timeout_secs: 30,
            },
            locations: LocationsConfig {
                data_dir: None,
                markers_file: "side_center_markers.geojson".to_string(),
                roads_file: "roads.geojson".to_string(),
            },
            rendering: RenderingConfig {
                corridor_tightening: render.corridor_tightening,
                simplify_epsilon_deg: render.simplify_epsilon_deg,
                simplify_min_distance_m: render.simplify_min_distance_m,
            },
            workflow: WorkflowConfig {
                default_sampling_step_m: 1.0,
                unresolved_intersection: UnresolvedIntersectionPolicy::Fail,
            },
            logging: LoggingConfig::default(),
        }
    }
}
