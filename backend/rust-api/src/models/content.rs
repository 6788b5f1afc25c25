use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ExerciseDefinition {
    #[validate(range(min = 1, message = "id must be positive"))]
    pub id: u32,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(alias = "maxTries")]
    #[validate(range(min = 1, message = "max_tries must be at least 1"))]
    pub max_tries: u32,
    #[serde(alias = "numQuestions", alias = "numQ")]
    #[validate(range(min = 1, message = "num_questions must be at least 1"))]
    pub num_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LevelDefinition {
    #[validate(range(min = 1, message = "id must be positive"))]
    pub id: u32,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(alias = "exerciseIds", alias = "exercises")]
    pub exercise_ids: Vec<u32>,
}

/// On-disk catalog document.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub exercises: Vec<ExerciseDefinition>,
    #[serde(default)]
    pub levels: Vec<LevelDefinition>,
}

/// A level together with its resolved exercises, in level order.
#[derive(Debug, Serialize)]
pub struct LevelDetail {
    pub id: u32,
    pub title: String,
    pub exercises: Vec<ExerciseDefinition>,
}
