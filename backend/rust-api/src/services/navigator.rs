use std::sync::Arc;

use uuid::Uuid;

use crate::errors::NavigatorError;
use crate::metrics::{
    ANSWERS_SUBMITTED_TOTAL, EXERCISE_SESSIONS_ACTIVE, EXERCISE_SESSIONS_TOTAL,
    IGNORED_EVENTS_TOTAL,
};
use crate::models::{ExerciseSnapshot, NavigatorSnapshot, Phase, SessionEvent, View};
use crate::services::catalog_service::Catalog;
use crate::services::exercise_engine::{ExerciseEngine, Step};

/// Outcome of one navigator event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Event not defined for the current view or phase.
    Ignored,
    Applied,
    /// The active engine terminated and was released.
    Completed {
        session_id: Uuid,
    },
}

impl Navigation {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Navigation::Ignored)
    }
}

/// The engine owned by the navigator while learning.
#[derive(Debug)]
struct ActiveExercise {
    session_id: Uuid,
    exercise_id: u32,
    engine: ExerciseEngine,
}

/// Home / level map / learning navigation with exclusive ownership of at most
/// one exercise engine.
///
/// Precondition: callers only enter exercises listed in the active level. The
/// navigator resolves ids through the catalog but does not check membership.
pub struct Navigator {
    catalog: Arc<dyn Catalog>,
    view: View,
    active_level_id: Option<u32>,
    active: Option<ActiveExercise>,
}

impl Navigator {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            view: View::Home,
            active_level_id: None,
            active: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn active_level_id(&self) -> Option<u32> {
        self.active_level_id
    }

    pub fn active_session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|active| active.session_id)
    }

    pub fn active_engine(&self) -> Option<&ExerciseEngine> {
        self.active.as_ref().map(|active| &active.engine)
    }

    /// Session id of the active engine while it shows results.
    pub fn results_session(&self) -> Option<Uuid> {
        self.active
            .as_ref()
            .filter(|active| active.engine.phase() == Phase::Results)
            .map(|active| active.session_id)
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Result<Navigation, NavigatorError> {
        match event {
            SessionEvent::EnterLevel { level_id } => self.enter_level(level_id),
            SessionEvent::ExitLevel => Ok(self.exit_level()),
            SessionEvent::EnterExercise { exercise_id } => self.enter_exercise(exercise_id),
            SessionEvent::Answer { correct } => self.answer(correct),
            SessionEvent::ExitExercise => Ok(self.exit_exercise()),
        }
    }

    pub fn enter_level(&mut self, level_id: u32) -> Result<Navigation, NavigatorError> {
        if self.view != View::Home {
            return Ok(self.ignore("enter_level"));
        }

        let level = self.catalog.level(level_id)?;
        self.active_level_id = Some(level.id);
        self.view = View::LevelMap;

        tracing::info!("Entered level {} ('{}')", level.id, level.title);
        Ok(Navigation::Applied)
    }

    pub fn exit_level(&mut self) -> Navigation {
        if self.view != View::LevelMap {
            return self.ignore("exit_level");
        }

        let left = self.active_level_id.take();
        self.active = None;
        self.view = View::Home;

        tracing::info!("Exited level {:?}", left);
        Navigation::Applied
    }

    pub fn enter_exercise(&mut self, exercise_id: u32) -> Result<Navigation, NavigatorError> {
        if self.view != View::LevelMap {
            return Ok(self.ignore("enter_exercise"));
        }

        let definition = self.catalog.exercise(exercise_id)?;
        let engine = ExerciseEngine::new(&definition)?;
        let session_id = Uuid::new_v4();

        self.active = Some(ActiveExercise {
            session_id,
            exercise_id: definition.id,
            engine,
        });
        self.view = View::Learning;

        EXERCISE_SESSIONS_TOTAL
            .with_label_values(&["started"])
            .inc();
        EXERCISE_SESSIONS_ACTIVE.inc();

        tracing::info!(
            "Exercise session started: {} for exercise {} ('{}')",
            session_id,
            definition.id,
            definition.title
        );
        Ok(Navigation::Applied)
    }

    pub fn answer(&mut self, correct: bool) -> Result<Navigation, NavigatorError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(self.ignore("answer"));
        };

        let step = active.engine.answer(correct)?;
        if step != Step::Ignored {
            let label = if correct { "true" } else { "false" };
            ANSWERS_SUBMITTED_TOTAL.with_label_values(&[label]).inc();
        }

        Ok(self.after_step(step, "answer", "finished"))
    }

    pub fn exit_exercise(&mut self) -> Navigation {
        let Some(active) = self.active.as_mut() else {
            return self.ignore("exit_exercise");
        };

        let step = active.engine.exit();
        self.after_step(step, "exit_exercise", "exited")
    }

    /// Delivers the results timeout for `session_id`. Timeouts for any session
    /// other than the active one are stale and ignored.
    pub fn results_elapsed(&mut self, session_id: Uuid) -> Navigation {
        if self.active_session_id() != Some(session_id) {
            return self.ignore("results_elapsed");
        }
        let Some(active) = self.active.as_mut() else {
            return Navigation::Ignored;
        };

        let step = active.engine.results_elapsed();
        self.after_step(step, "results_elapsed", "finished")
    }

    fn after_step(&mut self, step: Step, event: &'static str, outcome: &str) -> Navigation {
        match step {
            Step::Ignored => self.ignore(event),
            Step::Learning => Navigation::Applied,
            Step::Results(tally) => {
                tracing::info!(
                    "Exercise results: correct={}, incorrect={}",
                    tally.correct,
                    tally.incorrect
                );
                Navigation::Applied
            }
            Step::Completed => self.release(outcome),
        }
    }

    /// Consumes the completion signal of the active engine.
    fn release(&mut self, outcome: &str) -> Navigation {
        let Some(released) = self.active.take() else {
            return Navigation::Ignored;
        };
        self.view = View::LevelMap;

        EXERCISE_SESSIONS_TOTAL.with_label_values(&[outcome]).inc();
        EXERCISE_SESSIONS_ACTIVE.dec();

        tracing::info!(
            "Exercise session {}: {} (exercise {})",
            outcome,
            released.session_id,
            released.exercise_id
        );
        Navigation::Completed {
            session_id: released.session_id,
        }
    }

    fn ignore(&self, event: &'static str) -> Navigation {
        tracing::debug!("Event {} ignored in view {}", event, self.view.as_str());
        IGNORED_EVENTS_TOTAL.with_label_values(&[event]).inc();
        Navigation::Ignored
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        NavigatorSnapshot {
            view: self.view,
            active_level_id: self.active_level_id,
            exercise: self.active.as_ref().map(|active| {
                let progress = active.engine.progress();
                ExerciseSnapshot {
                    session_id: active.session_id,
                    exercise_id: active.exercise_id,
                    title: progress.title.clone(),
                    max_tries: progress.max_tries,
                    num_questions: progress.num_questions,
                    current_question: progress.current_question,
                    tries_used: progress.tries_used,
                    phase: active.engine.phase(),
                    questions_correct: progress.questions_correct,
                    questions_incorrect: progress.questions_incorrect,
                }
            }),
        }
    }
}
