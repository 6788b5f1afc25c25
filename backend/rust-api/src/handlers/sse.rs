use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    metrics::SSE_CONNECTIONS_ACTIVE,
    models::{
        stream::{ExerciseFinished, SessionState, SessionStreamEvent},
        NavigatorSnapshot,
    },
    services::AppState,
};

/// SSE endpoint for navigator state changes
/// GET /api/v1/session/stream
pub async fn session_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::info!("Client connected to session SSE stream");

    let stream = create_state_stream(state.session.subscribe());
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Tracks the connection in the SSE gauge for as long as the stream lives.
struct ConnectionGuard;

impl ConnectionGuard {
    fn new() -> Self {
        SSE_CONNECTIONS_ACTIVE.inc();
        Self
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        SSE_CONNECTIONS_ACTIVE.dec();
        tracing::debug!("Session SSE stream closed");
    }
}

struct StreamState {
    receiver: watch::Receiver<NavigatorSnapshot>,
    last_exercise: Option<(Uuid, u32)>,
    pending: Option<SessionStreamEvent>,
    started: bool,
    _guard: ConnectionGuard,
}

fn to_event(event: &SessionStreamEvent) -> Event {
    Event::default()
        .event(event.event_name())
        .data(event.to_sse_data())
}

pub fn create_state_stream(
    receiver: watch::Receiver<NavigatorSnapshot>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    session_events(receiver).map(|event| Ok(to_event(&event)))
}

/// Emits the current snapshot, then one `session-state` event per change. An
/// `exercise-finished` event precedes the first snapshot without the engine
/// that was previously active.
fn session_events(
    receiver: watch::Receiver<NavigatorSnapshot>,
) -> impl Stream<Item = SessionStreamEvent> {
    let initial = StreamState {
        receiver,
        last_exercise: None,
        pending: None,
        started: false,
        _guard: ConnectionGuard::new(),
    };

    stream::unfold(initial, |mut st| async move {
        if let Some(event) = st.pending.take() {
            return Some((event, st));
        }

        if st.started && st.receiver.changed().await.is_err() {
            tracing::info!("Session runtime closed, ending SSE stream");
            return None;
        }
        st.started = true;

        let snapshot = st.receiver.borrow_and_update().clone();
        let current = snapshot
            .exercise
            .as_ref()
            .map(|exercise| (exercise.session_id, exercise.exercise_id));

        let finished = match st.last_exercise {
            Some((session_id, exercise_id)) if current.map(|(id, _)| id) != Some(session_id) => {
                Some(SessionStreamEvent::ExerciseFinished(ExerciseFinished {
                    session_id,
                    exercise_id,
                    timestamp: Utc::now(),
                }))
            }
            _ => None,
        };
        st.last_exercise = current;

        let state_event = SessionStreamEvent::SessionState(SessionState {
            state: snapshot,
            timestamp: Utc::now(),
        });

        match finished {
            Some(finished) => {
                st.pending = Some(state_event);
                Some((finished, st))
            }
            None => Some((state_event, st)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExerciseSnapshot, Phase, View};

    fn level_map() -> NavigatorSnapshot {
        NavigatorSnapshot {
            view: View::LevelMap,
            active_level_id: Some(1),
            exercise: None,
        }
    }

    fn learning(session_id: Uuid) -> NavigatorSnapshot {
        NavigatorSnapshot {
            view: View::Learning,
            active_level_id: Some(1),
            exercise: Some(ExerciseSnapshot {
                session_id,
                exercise_id: 2,
                title: "Exercise 02".to_string(),
                max_tries: 2,
                num_questions: 2,
                current_question: 2,
                tries_used: 1,
                phase: Phase::Results,
                questions_correct: 2,
                questions_incorrect: 0,
            }),
        }
    }

    #[tokio::test]
    async fn test_stream_starts_with_current_state() {
        let (_tx, rx) = watch::channel(level_map());
        let mut events = Box::pin(session_events(rx));

        match events.next().await {
            Some(SessionStreamEvent::SessionState(state)) => {
                assert_eq!(state.state.view, View::LevelMap);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_finished_event_precedes_released_state() {
        let session_id = Uuid::new_v4();
        let (tx, rx) = watch::channel(learning(session_id));
        let mut events = Box::pin(session_events(rx));
        events.next().await;

        tx.send(level_map()).unwrap();

        match events.next().await {
            Some(SessionStreamEvent::ExerciseFinished(finished)) => {
                assert_eq!(finished.session_id, session_id);
                assert_eq!(finished.exercise_id, 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match events.next().await {
            Some(SessionStreamEvent::SessionState(state)) => {
                assert!(state.state.exercise.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_ends_when_runtime_stops() {
        let (tx, rx) = watch::channel(level_map());
        let mut events = Box::pin(session_events(rx));
        events.next().await;

        drop(tx);

        assert!(events.next().await.is_none());
    }

    #[test]
    fn test_event_names() {
        let event = SessionStreamEvent::SessionState(SessionState {
            state: level_map(),
            timestamp: Utc::now(),
        });
        assert_eq!(event.event_name(), "session-state");
        assert!(event.to_sse_data().contains("\"type\":\"session-state\""));
    }
}
