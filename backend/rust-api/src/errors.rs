use thiserror::Error;

use crate::services::exercise_engine::Resolution;

/// Faults surfaced by the content catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Exercise not found: {0}")]
    ExerciseNotFound(u32),

    #[error("Level not found: {0}")]
    LevelNotFound(u32),

    #[error("Duplicate exercise id: {0}")]
    DuplicateExercise(u32),

    #[error("Duplicate level id: {0}")]
    DuplicateLevel(u32),

    #[error("Level {level_id} references unknown exercise {exercise_id}")]
    DanglingExercise { level_id: u32, exercise_id: u32 },

    #[error("Invalid definition for {kind} {id}: {reason}")]
    InvalidDefinition {
        kind: &'static str,
        id: u32,
        reason: String,
    },

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::ExerciseNotFound(_) | CatalogError::LevelNotFound(_)
        )
    }
}

/// Internal faults of the exercise progression engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Exercise '{title}' needs max_tries >= 1 and num_questions >= 1")]
    InvalidDefinition { title: String },

    #[error(
        "No resolution matched (question {question}/{num_questions}, try {tries_used}/{max_tries}, correct={correct})"
    )]
    NoResolution {
        question: u32,
        num_questions: u32,
        tries_used: u32,
        max_tries: u32,
        correct: bool,
    },

    #[error("Ambiguous resolution: both {first:?} and {second:?} matched")]
    AmbiguousResolution {
        first: Resolution,
        second: Resolution,
    },
}

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session runtime is not running")]
    Stopped,

    #[error(transparent)]
    Navigator(#[from] NavigatorError),
}
