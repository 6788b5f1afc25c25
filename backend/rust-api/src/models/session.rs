use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Top-level navigation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Home,
    LevelMap,
    Learning,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Home => "home",
            View::LevelMap => "level_map",
            View::Learning => "learning",
        }
    }
}

/// Lifecycle phase of one exercise attempt.
///
/// `Evaluating` only exists while an answer is being resolved and is never
/// observed once an event has been fully processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Learning,
    Evaluating,
    Results,
    Terminated,
}

/// Final counts shown on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub correct: u32,
    pub incorrect: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSnapshot {
    pub session_id: Uuid,
    pub exercise_id: u32,
    pub title: String,
    pub max_tries: u32,
    pub num_questions: u32,
    pub current_question: u32,
    pub tries_used: u32,
    pub phase: Phase,
    pub questions_correct: u32,
    pub questions_incorrect: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigatorSnapshot {
    pub view: View,
    pub active_level_id: Option<u32>,
    pub exercise: Option<ExerciseSnapshot>,
}

/// Events the presentation layer may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    EnterLevel { level_id: u32 },
    ExitLevel,
    EnterExercise { exercise_id: u32 },
    Answer { correct: bool },
    ExitExercise,
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::EnterLevel { .. } => "enter_level",
            SessionEvent::ExitLevel => "exit_level",
            SessionEvent::EnterExercise { .. } => "enter_exercise",
            SessionEvent::Answer { .. } => "answer",
            SessionEvent::ExitExercise => "exit_exercise",
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct EnterLevelRequest {
    #[validate(range(min = 1, message = "level_id must be positive"))]
    pub level_id: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EnterExerciseRequest {
    #[validate(range(min = 1, message = "exercise_id must be positive"))]
    pub exercise_id: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub correct: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub accepted: bool,
    pub completed_session_id: Option<Uuid>,
    pub state: NavigatorSnapshot,
}
