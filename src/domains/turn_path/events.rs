use super::types::{Intersection, PathConfig, WorkflowState};
use crate::common::DomainEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    DialogOpened {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    SelectionStarted {
        session_id: Uuid,
        config: PathConfig,
        timestamp: DateTime<Utc>,
    },
    SourceSelected {
        session_id: Uuid,
        road_id: String,
        timestamp: DateTime<Utc>,
    },
    DestinationSelected {
        session_id: Uuid,
        road_id: String,
        timestamp: DateTime<Utc>,
    },
    ComputationRequested {
        session_id: Uuid,
        generation: u64,
        intersection: Intersection,
        timestamp: DateTime<Utc>,
    },
    PathShown {
        session_id: Uuid,
        generation: u64,
        length_m: f64,
        path_type: String,
        timestamp: DateTime<Utc>,
    },
    ComputationFailed {
        session_id: Uuid,
        generation: Option<u64>,
        kind: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    SelectionReset {
        session_id: Uuid,
        from_state: WorkflowState,
        timestamp: DateTime<Utc>,
    },
    DialogClosed {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for WorkflowEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WorkflowEvent::DialogOpened { .. } => "DialogOpened",
            WorkflowEvent::SelectionStarted { .. } => "SelectionStarted",
            WorkflowEvent::SourceSelected { .. } => "SourceSelected",
            WorkflowEvent::DestinationSelected { .. } => "DestinationSelected",
            WorkflowEvent::ComputationRequested { .. } => "ComputationRequested",
            WorkflowEvent::PathShown { .. } => "PathShown",
            WorkflowEvent::ComputationFailed { .. } => "ComputationFailed",
            WorkflowEvent::SelectionReset { .. } => "SelectionReset",
            WorkflowEvent::DialogClosed { .. } => "DialogClosed",
        }
    }

    fn session_id(&self) -> Uuid {
        match self {
            WorkflowEvent::DialogOpened { session_id, .. }
            | WorkflowEvent::SelectionStarted { session_id, .. }
            | WorkflowEvent::SourceSelected { session_id, .. }
            | WorkflowEvent::DestinationSelected { session_id, .. }
            | WorkflowEvent::ComputationRequested { session_id, .. }
            | WorkflowEvent::PathShown { session_id, .. }
            | WorkflowEvent::ComputationFailed { session_id, .. }
            | WorkflowEvent::SelectionReset { session_id, .. }
            | WorkflowEvent::DialogClosed { session_id, .. } => *session_id,
        }
    }

    fn event_version(&self) -> u64 { 1 }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WorkflowEvent::DialogOpened { timestamp, .. }
            | WorkflowEvent::SelectionStarted { timestamp, .. }
            | WorkflowEvent::SourceSelected { timestamp, .. }
            | WorkflowEvent::DestinationSelected { timestamp, .. }
            | WorkflowEvent::ComputationRequested { timestamp, .. }
            | WorkflowEvent::PathShown { timestamp, .. }
            | WorkflowEvent::ComputationFailed { timestamp, .. }
            | WorkflowEvent::SelectionReset { timestamp, .. }
            | WorkflowEvent::DialogClosed { timestamp, .. } => *timestamp,
        }
    }
}
