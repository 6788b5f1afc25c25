use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::NavigatorSnapshot;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionStreamEvent {
    SessionState(SessionState),
    ExerciseFinished(ExerciseFinished),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionState {
    pub state: NavigatorSnapshot,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExerciseFinished {
    pub session_id: Uuid,
    pub exercise_id: u32,
    pub timestamp: DateTime<Utc>,
}

impl SessionStreamEvent {
    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            SessionStreamEvent::SessionState(_) => "session-state",
            SessionStreamEvent::ExerciseFinished(_) => "exercise-finished",
        }
    }
}
