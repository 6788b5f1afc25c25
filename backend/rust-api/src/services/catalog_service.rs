use std::collections::BTreeMap;
use std::path::Path;

use validator::Validate;

use crate::errors::CatalogError;
use crate::models::{CatalogDocument, ExerciseDefinition, LevelDefinition, LevelDetail};

/// Read-only lookup of exercise and level definitions.
pub trait Catalog: Send + Sync {
    fn exercise(&self, id: u32) -> Result<ExerciseDefinition, CatalogError>;

    fn level(&self, id: u32) -> Result<LevelDefinition, CatalogError>;

    /// All exercises, ordered by id.
    fn exercises(&self) -> Vec<ExerciseDefinition>;

    /// All levels, ordered by id.
    fn levels(&self) -> Vec<LevelDefinition>;

    /// Level with its exercise definitions resolved in level order.
    fn level_detail(&self, id: u32) -> Result<LevelDetail, CatalogError> {
        let level = self.level(id)?;
        let exercises = level
            .exercise_ids
            .iter()
            .map(|exercise_id| self.exercise(*exercise_id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LevelDetail {
            id: level.id,
            title: level.title,
            exercises,
        })
    }
}

/// In-memory catalog validated at construction.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    exercises: BTreeMap<u32, ExerciseDefinition>,
    levels: BTreeMap<u32, LevelDefinition>,
}

impl StaticCatalog {
    pub fn new(
        exercises: Vec<ExerciseDefinition>,
        levels: Vec<LevelDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut exercise_map = BTreeMap::new();
        for exercise in exercises {
            exercise
                .validate()
                .map_err(|e| CatalogError::InvalidDefinition {
                    kind: "exercise",
                    id: exercise.id,
                    reason: e.to_string(),
                })?;
            let id = exercise.id;
            if exercise_map.insert(id, exercise).is_some() {
                return Err(CatalogError::DuplicateExercise(id));
            }
        }

        let mut level_map = BTreeMap::new();
        for level in levels {
            level
                .validate()
                .map_err(|e| CatalogError::InvalidDefinition {
                    kind: "level",
                    id: level.id,
                    reason: e.to_string(),
                })?;
            if let Some(missing) = level
                .exercise_ids
                .iter()
                .find(|exercise_id| !exercise_map.contains_key(*exercise_id))
            {
                return Err(CatalogError::DanglingExercise {
                    level_id: level.id,
                    exercise_id: *missing,
                });
            }
            let id = level.id;
            if level_map.insert(id, level).is_some() {
                return Err(CatalogError::DuplicateLevel(id));
            }
        }

        tracing::info!(
            "Catalog loaded: {} exercises, {} levels",
            exercise_map.len(),
            level_map.len()
        );

        Ok(Self {
            exercises: exercise_map,
            levels: level_map,
        })
    }

    /// Loads a JSON catalog document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        tracing::info!("Loading catalog from {}", path.display());

        let raw = std::fs::read_to_string(path)?;
        let document: CatalogDocument = serde_json::from_str(&raw)?;
        Self::new(document.exercises, document.levels)
    }

    /// Content shipped with the player.
    pub fn builtin() -> Self {
        let exercises = [(1, 4), (2, 2), (3, 3), (4, 4), (5, 9), (6, 3)]
            .into_iter()
            .map(|(id, num_questions)| ExerciseDefinition {
                id,
                title: format!("Exercise {:02}", id),
                max_tries: 2,
                num_questions,
            })
            .map(|exercise| (exercise.id, exercise))
            .collect();

        let levels = [
            (1, vec![2, 3, 5]),
            (2, vec![3, 1, 5]),
            (3, vec![6, 1, 2]),
            (4, vec![3, 2, 5]),
        ]
        .into_iter()
        .map(|(id, exercise_ids)| LevelDefinition {
            id,
            title: format!("Level {:02}", id),
            exercise_ids,
        })
        .map(|level| (level.id, level))
        .collect();

        Self { exercises, levels }
    }
}

impl Catalog for StaticCatalog {
    fn exercise(&self, id: u32) -> Result<ExerciseDefinition, CatalogError> {
        self.exercises
            .get(&id)
            .cloned()
            .ok_or(CatalogError::ExerciseNotFound(id))
    }

    fn level(&self, id: u32) -> Result<LevelDefinition, CatalogError> {
        self.levels
            .get(&id)
            .cloned()
            .ok_or(CatalogError::LevelNotFound(id))
    }

    fn exercises(&self) -> Vec<ExerciseDefinition> {
        self.exercises.values().cloned().collect()
    }

    fn levels(&self) -> Vec<LevelDefinition> {
        self.levels.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(id: u32, max_tries: u32, num_questions: u32) -> ExerciseDefinition {
        ExerciseDefinition {
            id,
            title: format!("Exercise {}", id),
            max_tries,
            num_questions,
        }
    }

    fn level(id: u32, exercise_ids: Vec<u32>) -> LevelDefinition {
        LevelDefinition {
            id,
            title: format!("Level {}", id),
            exercise_ids,
        }
    }

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let builtin = StaticCatalog::builtin();
        let rebuilt = StaticCatalog::new(builtin.exercises(), builtin.levels()).unwrap();

        assert_eq!(rebuilt.exercises().len(), 6);
        assert_eq!(rebuilt.levels().len(), 4);
        assert_eq!(rebuilt.exercise(5).unwrap().num_questions, 9);
        assert_eq!(rebuilt.level(3).unwrap().exercise_ids, vec![6, 1, 2]);
        assert_eq!(rebuilt.level(2).unwrap().title, "Level 02");
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let catalog = StaticCatalog::builtin();

        let err = catalog.exercise(42).unwrap_err();
        assert!(matches!(err, CatalogError::ExerciseNotFound(42)));
        assert!(err.is_not_found());

        let err = catalog.level(9).unwrap_err();
        assert!(matches!(err, CatalogError::LevelNotFound(9)));
    }

    #[test]
    fn test_level_detail_keeps_level_order() {
        let catalog = StaticCatalog::builtin();
        let detail = catalog.level_detail(2).unwrap();

        let ids: Vec<u32> = detail.exercises.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 5]);
    }

    #[test]
    fn test_rejects_dangling_exercise_reference() {
        let levels = vec![level(1, vec![1, 7])];
        let err = StaticCatalog::new(vec![exercise(1, 2, 3)], levels).unwrap_err();

        assert!(matches!(
            err,
            CatalogError::DanglingExercise {
                level_id: 1,
                exercise_id: 7
            }
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let exercises = vec![exercise(1, 2, 3), exercise(1, 1, 1)];
        let err = StaticCatalog::new(exercises, vec![]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateExercise(1)));

        let err = StaticCatalog::new(
            vec![exercise(1, 2, 3)],
            vec![level(1, vec![1]), level(1, vec![])],
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateLevel(1)));
    }

    #[test]
    fn test_rejects_zero_question_exercise() {
        let err = StaticCatalog::new(vec![exercise(1, 2, 0)], vec![]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidDefinition {
                kind: "exercise",
                id: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_from_path_reads_json_document() {
        let file_name = format!("microlearn-catalog-{}.json", uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(file_name);
        std::fs::write(
            &path,
            r#"{
                "exercises": [{"id": 10, "title": "Warmup", "maxTries": 3, "numQ": 2}],
                "levels": [{"id": 1, "title": "Intro", "exercises": [10]}]
            }"#,
        )
        .unwrap();

        let catalog = StaticCatalog::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(catalog.exercise(10).unwrap().max_tries, 3);
        assert_eq!(catalog.level(1).unwrap().exercise_ids, vec![10]);
    }

    #[test]
    fn test_from_path_missing_file_is_io_error() {
        let err = StaticCatalog::from_path("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
