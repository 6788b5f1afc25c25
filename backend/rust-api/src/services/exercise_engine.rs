//! Progression state machine for a single exercise attempt.
//!
//! ```text
//! Learning --Answer--> Evaluating --(resolution)--> Learning | Results
//! Learning --Exit----> Terminated
//! Results  --ResultsElapsed--> Terminated
//! ```
//!
//! `Evaluating` resolves synchronously inside [`ExerciseEngine::answer`], so callers
//! only ever observe `Learning`, `Results` or `Terminated`.

use crate::errors::EngineError;
use crate::models::{ExerciseDefinition, Phase, Tally};

/// Mutable progress of one attempt. Only the owning engine mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseProgress {
    pub title: String,
    pub max_tries: u32,
    pub num_questions: u32,
    /// 1-based index of the question being asked.
    pub current_question: u32,
    /// Attempts used on the current question, starting at 1.
    pub tries_used: u32,
    /// Correctness of the last submitted answer, cleared when moving on.
    pub current_answer_correct: Option<bool>,
    pub questions_correct: u32,
    pub questions_incorrect: u32,
}

impl ExerciseProgress {
    fn new(definition: &ExerciseDefinition) -> Self {
        Self {
            title: definition.title.clone(),
            max_tries: definition.max_tries,
            num_questions: definition.num_questions,
            current_question: 1,
            tries_used: 1,
            current_answer_correct: None,
            questions_correct: 0,
            questions_incorrect: 0,
        }
    }

    fn is_last_question(&self) -> bool {
        self.current_question == self.num_questions
    }

    fn tries_exhausted(&self) -> bool {
        self.tries_used == self.max_tries
    }

    fn clear_counters(&mut self) {
        self.current_answer_correct = None;
        self.tries_used = 1;
        self.current_question = 1;
        self.questions_correct = 0;
        self.questions_incorrect = 0;
    }
}

/// Guarded outcomes of evaluating an answer, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    LastIncorrectTriesExhausted,
    LastIncorrectRetry,
    IncorrectTriesExhausted,
    IncorrectRetry,
    LastCorrect,
    Correct,
}

impl Resolution {
    pub const ORDERED: [Resolution; 6] = [
        Resolution::LastIncorrectTriesExhausted,
        Resolution::LastIncorrectRetry,
        Resolution::IncorrectTriesExhausted,
        Resolution::IncorrectRetry,
        Resolution::LastCorrect,
        Resolution::Correct,
    ];

    /// Guard predicate for this resolution.
    pub fn matches(self, progress: &ExerciseProgress, correct: bool) -> bool {
        let last = progress.is_last_question();
        let before_last = progress.current_question < progress.num_questions;
        let exhausted = progress.tries_exhausted();
        let retries_left = progress.tries_used < progress.max_tries;

        match self {
            Resolution::LastIncorrectTriesExhausted => last && !correct && exhausted,
            Resolution::LastIncorrectRetry => last && !correct && retries_left,
            Resolution::IncorrectTriesExhausted => before_last && !correct && exhausted,
            Resolution::IncorrectRetry => before_last && !correct && retries_left,
            Resolution::LastCorrect => last && correct,
            Resolution::Correct => before_last && correct,
        }
    }

    pub fn target(self) -> Phase {
        match self {
            Resolution::LastIncorrectTriesExhausted | Resolution::LastCorrect => Phase::Results,
            _ => Phase::Learning,
        }
    }

    fn apply(self, progress: &mut ExerciseProgress) {
        match self {
            Resolution::LastIncorrectTriesExhausted => {
                progress.questions_incorrect += 1;
            }
            Resolution::LastIncorrectRetry | Resolution::IncorrectRetry => {
                progress.tries_used += 1;
            }
            Resolution::IncorrectTriesExhausted => {
                progress.tries_used = 1;
                progress.current_question += 1;
                progress.questions_incorrect += 1;
                progress.current_answer_correct = None;
            }
            Resolution::LastCorrect => {
                progress.questions_correct += 1;
            }
            Resolution::Correct => {
                progress.tries_used = 1;
                progress.current_question += 1;
                progress.questions_correct += 1;
                progress.current_answer_correct = None;
            }
        }
    }
}

/// Selects the single resolution whose guard holds.
///
/// Evaluation order is not trusted to hide overlapping guards: a second match is
/// reported as a fault just like no match at all.
pub fn resolve(progress: &ExerciseProgress, correct: bool) -> Result<Resolution, EngineError> {
    let mut matching = Resolution::ORDERED
        .iter()
        .copied()
        .filter(|resolution| resolution.matches(progress, correct));

    let first = matching.next().ok_or(EngineError::NoResolution {
        question: progress.current_question,
        num_questions: progress.num_questions,
        tries_used: progress.tries_used,
        max_tries: progress.max_tries,
        correct,
    })?;

    if let Some(second) = matching.next() {
        return Err(EngineError::AmbiguousResolution { first, second });
    }

    Ok(first)
}

/// Result of feeding one event to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Event not defined for the current phase; nothing changed.
    Ignored,
    /// Back in `Learning`, either on the same question or the next one.
    Learning,
    /// Entered `Results` with the final tally.
    Results(Tally),
    /// Entered `Terminated`. Emitted exactly once per engine.
    Completed,
}

#[derive(Debug, Clone)]
pub struct ExerciseEngine {
    progress: ExerciseProgress,
    phase: Phase,
}

impl ExerciseEngine {
    pub fn new(definition: &ExerciseDefinition) -> Result<Self, EngineError> {
        if definition.max_tries == 0 || definition.num_questions == 0 {
            return Err(EngineError::InvalidDefinition {
                title: definition.title.clone(),
            });
        }

        Ok(Self {
            progress: ExerciseProgress::new(definition),
            phase: Phase::Learning,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> &ExerciseProgress {
        &self.progress
    }

    pub fn tally(&self) -> Tally {
        Tally {
            correct: self.progress.questions_correct,
            incorrect: self.progress.questions_incorrect,
        }
    }

    pub fn answer(&mut self, correct: bool) -> Result<Step, EngineError> {
        if self.phase != Phase::Learning {
            tracing::debug!(
                "Answer ignored in phase {:?} for exercise '{}'",
                self.phase,
                self.progress.title
            );
            return Ok(Step::Ignored);
        }

        self.progress.current_answer_correct = Some(correct);
        self.phase = Phase::Evaluating;
        self.evaluate(correct)
    }

    fn evaluate(&mut self, correct: bool) -> Result<Step, EngineError> {
        let resolution = match resolve(&self.progress, correct) {
            Ok(resolution) => resolution,
            Err(e) => {
                self.phase = Phase::Learning;
                return Err(e);
            }
        };

        resolution.apply(&mut self.progress);
        self.phase = resolution.target();

        tracing::debug!(
            resolution = ?resolution,
            question = self.progress.current_question,
            tries_used = self.progress.tries_used,
            "Answer resolved for exercise '{}'",
            self.progress.title
        );

        match self.phase {
            Phase::Results => Ok(Step::Results(self.tally())),
            _ => Ok(Step::Learning),
        }
    }

    /// Leaves the attempt from `Learning` without finalising the tally.
    pub fn exit(&mut self) -> Step {
        if self.phase != Phase::Learning {
            tracing::debug!("Exit ignored in phase {:?}", self.phase);
            return Step::Ignored;
        }

        self.phase = Phase::Terminated;
        Step::Completed
    }

    /// Results display timed out.
    pub fn results_elapsed(&mut self) -> Step {
        if self.phase != Phase::Results {
            tracing::debug!("Results timeout ignored in phase {:?}", self.phase);
            return Step::Ignored;
        }

        // Leaving Results clears the attempt.
        self.progress.clear_counters();
        self.phase = Phase::Terminated;
        Step::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(max_tries: u32, num_questions: u32) -> ExerciseDefinition {
        ExerciseDefinition {
            id: 3,
            title: "Exercise 03".to_string(),
            max_tries,
            num_questions,
        }
    }

    fn engine(max_tries: u32, num_questions: u32) -> ExerciseEngine {
        ExerciseEngine::new(&definition(max_tries, num_questions)).unwrap()
    }

    fn progress_at(
        max_tries: u32,
        num_questions: u32,
        current_question: u32,
        tries_used: u32,
    ) -> ExerciseProgress {
        ExerciseProgress {
            title: "grid".to_string(),
            max_tries,
            num_questions,
            current_question,
            tries_used,
            current_answer_correct: None,
            questions_correct: 0,
            questions_incorrect: 0,
        }
    }

    #[test]
    fn test_new_engine_starts_learning_first_question() {
        let engine = engine(2, 3);
        let progress = engine.progress();

        assert_eq!(engine.phase(), Phase::Learning);
        assert_eq!(progress.current_question, 1);
        assert_eq!(progress.tries_used, 1);
        assert_eq!(progress.questions_correct, 0);
        assert_eq!(progress.questions_incorrect, 0);
        assert_eq!(progress.current_answer_correct, None);
    }

    #[test]
    fn test_new_rejects_zero_limits() {
        assert!(ExerciseEngine::new(&definition(0, 3)).is_err());
        assert!(ExerciseEngine::new(&definition(2, 0)).is_err());
    }

    #[test]
    fn test_three_correct_answers_reach_results() {
        let mut engine = engine(2, 3);

        assert_eq!(engine.answer(true).unwrap(), Step::Learning);
        assert_eq!(engine.answer(true).unwrap(), Step::Learning);
        let step = engine.answer(true).unwrap();

        assert_eq!(
            step,
            Step::Results(Tally {
                correct: 3,
                incorrect: 0
            })
        );
        assert_eq!(engine.phase(), Phase::Results);
        assert_eq!(engine.results_elapsed(), Step::Completed);
        assert_eq!(engine.phase(), Phase::Terminated);
    }

    #[test]
    fn test_incorrect_with_tries_left_retries_same_question() {
        let mut engine = engine(2, 3);

        assert_eq!(engine.answer(false).unwrap(), Step::Learning);
        assert_eq!(engine.progress().current_question, 1);
        assert_eq!(engine.progress().tries_used, 2);
        assert_eq!(engine.progress().current_answer_correct, Some(false));

        assert_eq!(engine.answer(false).unwrap(), Step::Learning);
        assert_eq!(engine.progress().current_question, 2);
        assert_eq!(engine.progress().tries_used, 1);
        assert_eq!(engine.progress().questions_incorrect, 1);
        assert_eq!(engine.progress().current_answer_correct, None);
    }

    #[test]
    fn test_last_question_retry_keeps_index() {
        let mut engine = engine(2, 3);
        engine.answer(true).unwrap();
        engine.answer(true).unwrap();

        assert_eq!(engine.answer(false).unwrap(), Step::Learning);
        assert_eq!(engine.phase(), Phase::Learning);
        assert_eq!(engine.progress().current_question, 3);
        assert_eq!(engine.progress().tries_used, 2);
    }

    #[test]
    fn test_last_question_exhausted_goes_to_results() {
        let mut engine = engine(2, 3);
        engine.answer(true).unwrap();
        engine.answer(true).unwrap();
        engine.answer(false).unwrap();

        let step = engine.answer(false).unwrap();

        assert_eq!(
            step,
            Step::Results(Tally {
                correct: 2,
                incorrect: 1
            })
        );
        assert_eq!(engine.progress().current_question, 3);
    }

    #[test]
    fn test_exit_from_learning_skips_results() {
        let mut engine = engine(2, 3);
        engine.answer(true).unwrap();
        assert_eq!(engine.progress().current_question, 2);

        assert_eq!(engine.exit(), Step::Completed);
        assert_eq!(engine.phase(), Phase::Terminated);
        assert_eq!(engine.progress().questions_correct, 1);
    }

    #[test]
    fn test_events_outside_learning_are_ignored() {
        let mut engine = engine(1, 1);
        engine.answer(true).unwrap();
        assert_eq!(engine.phase(), Phase::Results);
        let before = engine.progress().clone();

        assert_eq!(engine.answer(false).unwrap(), Step::Ignored);
        assert_eq!(engine.exit(), Step::Ignored);
        assert_eq!(engine.progress(), &before);
        assert_eq!(engine.phase(), Phase::Results);

        assert_eq!(engine.results_elapsed(), Step::Completed);
        assert_eq!(engine.answer(true).unwrap(), Step::Ignored);
        assert_eq!(engine.exit(), Step::Ignored);
        assert_eq!(engine.results_elapsed(), Step::Ignored);
        assert_eq!(engine.phase(), Phase::Terminated);
    }

    #[test]
    fn test_results_timeout_ignored_while_learning() {
        let mut engine = engine(2, 3);
        assert_eq!(engine.results_elapsed(), Step::Ignored);
        assert_eq!(engine.phase(), Phase::Learning);
    }

    #[test]
    fn test_leaving_results_clears_counters() {
        let mut engine = engine(1, 2);
        engine.answer(false).unwrap();
        engine.answer(true).unwrap();
        assert_eq!(engine.phase(), Phase::Results);

        engine.results_elapsed();
        let progress = engine.progress();

        assert_eq!(progress.title, "Exercise 03");
        assert_eq!(progress.max_tries, 1);
        assert_eq!(progress.num_questions, 2);
        assert_eq!(progress.current_question, 1);
        assert_eq!(progress.tries_used, 1);
        assert_eq!(progress.questions_correct, 0);
        assert_eq!(progress.questions_incorrect, 0);
    }

    #[test]
    fn test_exactly_one_resolution_matches_every_reachable_state() {
        for num_questions in 1..=6 {
            for max_tries in 1..=5 {
                for question in 1..=num_questions {
                    for tries in 1..=max_tries {
                        for correct in [true, false] {
                            let progress = progress_at(max_tries, num_questions, question, tries);
                            let matches: Vec<Resolution> = Resolution::ORDERED
                                .iter()
                                .copied()
                                .filter(|r| r.matches(&progress, correct))
                                .collect();
                            assert_eq!(
                                matches.len(),
                                1,
                                "q={}/{} tries={}/{} correct={} matched {:?}",
                                question,
                                num_questions,
                                tries,
                                max_tries,
                                correct,
                                matches
                            );
                            assert_eq!(resolve(&progress, correct).unwrap(), matches[0]);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_resolve_reports_unreachable_state() {
        let progress = progress_at(2, 3, 4, 1);
        assert!(matches!(
            resolve(&progress, true),
            Err(EngineError::NoResolution { .. })
        ));
    }

    /// Walks every possible answer sequence and checks progression invariants
    /// after each step.
    fn explore(engine: &ExerciseEngine, visited: &mut usize) {
        for correct in [true, false] {
            let mut next = engine.clone();
            let before = next.progress().clone();
            let step = next.answer(correct).unwrap();
            let after = next.progress().clone();
            *visited += 1;

            assert_ne!(next.phase(), Phase::Evaluating);
            assert!(after.current_question >= before.current_question);
            assert!(after.current_question - before.current_question <= 1);
            assert!(after.tries_used >= 1 && after.tries_used <= after.max_tries);
            assert!(after.questions_correct >= before.questions_correct);
            assert!(after.questions_incorrect >= before.questions_incorrect);
            assert!(after.questions_correct + after.questions_incorrect <= after.current_question);

            let resolved = after.questions_correct + after.questions_incorrect
                - before.questions_correct
                - before.questions_incorrect;
            assert!(resolved <= 1);

            if !correct && before.tries_used < before.max_tries {
                assert_eq!(after.tries_used, before.tries_used + 1);
                assert_eq!(after.current_question, before.current_question);
                assert_eq!(resolved, 0);
            } else {
                assert_eq!(resolved, 1);
            }

            match step {
                Step::Results(tally) => {
                    assert_eq!(next.phase(), Phase::Results);
                    assert_eq!(tally.correct + tally.incorrect, after.num_questions);
                    assert_eq!(after.current_question, after.num_questions);
                }
                Step::Learning => {
                    assert_eq!(next.phase(), Phase::Learning);
                    if before.current_question < before.num_questions && resolved == 1 {
                        assert_eq!(after.current_question, before.current_question + 1);
                        assert_eq!(after.tries_used, 1);
                    }
                    explore(&next, visited);
                }
                other => panic!("unexpected step {:?}", other),
            }
        }
    }

    #[test]
    fn test_all_answer_sequences_preserve_invariants() {
        for num_questions in 1..=4 {
            for max_tries in 1..=3 {
                let mut visited = 0;
                explore(&engine(max_tries, num_questions), &mut visited);
                assert!(visited > 0);
            }
        }
    }
}
