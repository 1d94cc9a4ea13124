// HTTP solver adapter - turn-path solver and vehicle catalog over reqwest

use crate::common::{DomainResult, TurnPathError};
use crate::config::SolverConfig;
use crate::domains::turn_path::ports::{PathSolver, VehicleCatalog};
use crate::domains::turn_path::protocol::{PathRequest, PathResponse};
use crate::domains::turn_path::types::VehicleProfile;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub struct HttpPathSolver {
    client: Client,
    turn_path_url: String,
    profiles_url: String,
}

impl HttpPathSolver {
    pub fn new(config: &SolverConfig) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TurnPathError::Infrastructure(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            turn_path_url: join_url(&config.base_url, &config.turn_path_path),
            profiles_url: join_url(&config.base_url, &config.profiles_path),
        })
    }

    pub fn turn_path_url(&self) -> &str {
        &self.turn_path_url
    }

    pub fn profiles_url(&self) -> &str {
        &self.profiles_url
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[async_trait]
impl PathSolver for HttpPathSolver {
    async fn compute(&self, request: &PathRequest) -> DomainResult<PathResponse> {
        tracing::debug!(
            from = %request.from_road_id,
            to = %request.to_road_id,
            intersection = %request.intersection_name,
            "posting turn path request"
        );
        let response = self
            .client
            .post(&self.turn_path_url)
            .json(request)
            .send()
            .await
            .map_err(|e| TurnPathError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TurnPathError::Transport(e.to_string()))?;

        // Error statuses usually still carry a JSON body with `status`/`error`.
        match serde_json::from_str::<PathResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(TurnPathError::Transport(format!(
                "solver returned HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            ))),
            Err(e) => Err(TurnPathError::Transport(format!("unparseable solver response: {}", e))),
        }
    }
}

/// Catalog entry as served by the solver.
#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub name: String,
    pub vehicle_width_m: f64,
    pub wheelbase_m: f64,
    pub max_steering_angle_deg: f64,
    #[serde(default)]
    pub min_turn_radius_m: Option<f64>,
    #[serde(default)]
    pub side_buffer_m: f64,
    #[serde(default)]
    pub front_buffer_m: f64,
    #[serde(default)]
    pub rear_buffer_m: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    Wrapped { profiles: Vec<CatalogEntry> },
    Bare(Vec<CatalogEntry>),
}

impl From<CatalogEntry> for VehicleProfile {
    fn from(e: CatalogEntry) -> Self {
        let id = match e.id {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => e.name.clone(),
        };
        VehicleProfile {
            id,
            name: e.name,
            width_m: e.vehicle_width_m,
            wheelbase_m: e.wheelbase_m,
            max_steering_angle_deg: e.max_steering_angle_deg,
            min_turn_radius_m: e.min_turn_radius_m,
            side_buffer_m: e.side_buffer_m,
            front_buffer_m: e.front_buffer_m,
            rear_buffer_m: e.rear_buffer_m,
        }
    }
}

/// Decodes a catalog payload, either a bare array or `{"profiles": [...]}`.
pub fn parse_catalog(body: &str) -> DomainResult<Vec<VehicleProfile>> {
    let parsed: CatalogBody = serde_json::from_str(body)?;
    let entries = match parsed {
        CatalogBody::Wrapped { profiles } => profiles,
        CatalogBody::Bare(entries) => entries,
    };
    Ok(entries.into_iter().map(VehicleProfile::from).collect())
}

#[async_trait]
impl VehicleCatalog for HttpPathSolver {
    async fn list_profiles(&self) -> DomainResult<Vec<VehicleProfile>> {
        let response = self
            .client
            .get(&self.profiles_url)
            .send()
            .await
            .map_err(|e| TurnPathError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(TurnPathError::Transport(format!(
                "vehicle catalog returned HTTP {}",
                response.status().as_u16()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| TurnPathError::Transport(e.to_string()))?;
        let profiles = parse_catalog(&body)?;
        tracing::info!("fetched {} vehicle profiles", profiles.len());
        Ok(profiles)
    }
}
