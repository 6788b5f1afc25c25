//! Single task that owns the [`Navigator`] and serialises every event into it.
//!
//! Handlers talk to the runtime through a [`SessionHandle`]. Each command is
//! processed to completion before the next one is received, and the state
//! snapshot is republished after every command. The results timer is armed
//! while the active engine sits in `Results` and aborted as soon as it leaves.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::{NavigatorError, RuntimeError};
use crate::models::{NavigatorSnapshot, SessionEvent};
use crate::services::navigator::{Navigation, Navigator};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub navigation: Navigation,
    pub state: NavigatorSnapshot,
}

enum Command {
    Dispatch {
        event: SessionEvent,
        reply: oneshot::Sender<Result<DispatchOutcome, NavigatorError>>,
    },
    ResultsElapsed {
        session_id: Uuid,
    },
}

#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<NavigatorSnapshot>,
}

impl SessionHandle {
    /// Spawns the runtime task on the current tokio runtime.
    pub fn spawn(navigator: Navigator, results_delay: Duration) -> Self {
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(navigator.snapshot());

        let runtime = SessionRuntime {
            navigator,
            results_delay,
            timer: None,
            commands: commands.downgrade(),
            state: state_tx,
        };
        tokio::spawn(runtime.run(receiver));

        Self {
            commands,
            state: state_rx,
        }
    }

    pub async fn dispatch(&self, event: SessionEvent) -> Result<DispatchOutcome, RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Dispatch { event, reply })
            .await
            .map_err(|_| RuntimeError::Stopped)?;

        let outcome = response.await.map_err(|_| RuntimeError::Stopped)?;
        Ok(outcome?)
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigatorSnapshot> {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Pending `Results -> Terminated` timeout, aborted on drop.
struct ResultsTimer {
    session_id: Uuid,
    handle: JoinHandle<()>,
}

impl ResultsTimer {
    fn arm(session_id: Uuid, delay: Duration, commands: mpsc::Sender<Command>) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if commands
                .send(Command::ResultsElapsed { session_id })
                .await
                .is_err()
            {
                tracing::debug!("Results timer fired after runtime stopped: {}", session_id);
            }
        });

        Self { session_id, handle }
    }
}

impl Drop for ResultsTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct SessionRuntime {
    navigator: Navigator,
    results_delay: Duration,
    timer: Option<ResultsTimer>,
    commands: mpsc::WeakSender<Command>,
    state: watch::Sender<NavigatorSnapshot>,
}

impl SessionRuntime {
    async fn run(mut self, mut receiver: mpsc::Receiver<Command>) {
        tracing::info!(
            "Session runtime started (results delay {}ms)",
            self.results_delay.as_millis()
        );

        while let Some(command) = receiver.recv().await {
            self.handle(command);
        }

        tracing::info!("Session runtime stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Dispatch { event, reply } => {
                let kind = event.kind();
                let result = self.navigator.dispatch(event);
                self.reconcile_timer();
                self.publish();

                let result = result.map(|navigation| DispatchOutcome {
                    navigation,
                    state: self.navigator.snapshot(),
                });
                if let Err(e) = &result {
                    tracing::warn!("Event {} failed: {}", kind, e);
                }
                if reply.send(result).is_err() {
                    tracing::debug!("Caller dropped before {} reply", kind);
                }
            }
            Command::ResultsElapsed { session_id } => {
                self.navigator.results_elapsed(session_id);
                self.reconcile_timer();
                self.publish();
            }
        }
    }

    /// Keeps exactly one timer armed while the active engine shows results and
    /// none otherwise.
    fn reconcile_timer(&mut self) {
        match self.navigator.results_session() {
            Some(session_id) => {
                let armed = self.timer.as_ref().map(|timer| timer.session_id);
                if armed == Some(session_id) {
                    return;
                }
                let Some(commands) = self.commands.upgrade() else {
                    return;
                };
                tracing::debug!(
                    "Arming results timer for {} ({}ms)",
                    session_id,
                    self.results_delay.as_millis()
                );
                self.timer = Some(ResultsTimer::arm(session_id, self.results_delay, commands));
            }
            None => {
                if let Some(timer) = self.timer.take() {
                    tracing::debug!("Results timer released for {}", timer.session_id);
                }
            }
        }
    }

    fn publish(&self) {
        let snapshot = self.navigator.snapshot();
        self.state.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}
