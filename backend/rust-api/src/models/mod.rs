pub mod content;
pub mod session;
pub mod stream;

pub use content::{CatalogDocument, ExerciseDefinition, LevelDefinition, LevelDetail};
pub use session::{
    DispatchResponse, EnterExerciseRequest, EnterLevelRequest, ExerciseSnapshot, NavigatorSnapshot,
    Phase, SessionEvent, SubmitAnswerRequest, Tally, View,
};
