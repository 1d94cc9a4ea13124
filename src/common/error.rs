use thiserror::Error;

#[derive(Error, Debug)]
pub enum TurnPathError {
    #[error("Not ready: {reason}")]
    Validation { reason: String },

    #[error("No shared intersection between roads {from_road_id} and {to_road_id}")]
    Resolution {
        from_road_id: String,
        to_road_id: String,
    },

    #[error("Vehicle envelope leaves the intersection{}", leak_suffix(.outside_area_sqm))]
    ClearanceViolation { outside_area_sqm: Option<f64> },

    #[error("Path solver error: {message}")]
    SolverRejected { message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid geometry: {reason}")]
    GeometryValidation { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

fn leak_suffix(area: &Option<f64>) -> String {
    match area {
        Some(a) => format!(" ({:.2} m² outside)", a),
        None => String::new(),
    }
}

impl TurnPathError {
    pub fn validation(reason: impl Into<String>) -> Self {
        TurnPathError::Validation { reason: reason.into() }
    }

    pub fn geometry(reason: impl Into<String>) -> Self {
        TurnPathError::GeometryValidation { reason: reason.into() }
    }

    /// Short tag used in workflow events and log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            TurnPathError::Validation { .. } => "validation",
            TurnPathError::Resolution { .. } => "resolution",
            TurnPathError::ClearanceViolation { .. } => "clearance_violation",
            TurnPathError::SolverRejected { .. } => "solver_rejected",
            TurnPathError::Transport(_) => "transport",
            TurnPathError::GeometryValidation { .. } => "geometry",
            TurnPathError::Serialization(_) => "serialization",
            TurnPathError::Infrastructure(_) => "infrastructure",
        }
    }
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] TurnPathError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, TurnPathError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
