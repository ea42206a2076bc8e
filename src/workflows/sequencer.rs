// Timer-driven sequencer behind the conductor dashboard
//
// One spawned task per started cycle walks the schedule and applies each cue to
// the shared board. Every cycle carries an epoch; reset() bumps it and aborts the
// tracked handles, so a cue that already woke up can no longer touch the board.

use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};

use super::agent::{AgentEvent, AgentNode};
use super::phase::{Phase, PhaseEvent};
use super::schedule::{Cue, Schedule};
use super::script;
use super::types::{AgentRole, DashboardSnapshot, LogEntry, WorkflowState};
use crate::telemetry::{create_workflow_span, generate_correlation_id};

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("start() needs a running tokio runtime to schedule its timers")]
    NoRuntime,
    #[error("Sequencer was dropped before reaching {0}")]
    Closed(WorkflowState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { run_id: String },
    /// A cycle is already in flight or finished; nothing was queued
    Ignored { state: WorkflowState },
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, StartOutcome::Started { .. })
    }
}

#[derive(Debug)]
struct Board {
    epoch: u64,
    phase: Phase,
    agents: Vec<AgentNode>,
    logs: Vec<LogEntry>,
    final_output: Option<String>,
}

impl Board {
    fn new() -> Self {
        Self {
            epoch: 0,
            phase: Phase::new(),
            agents: AgentRole::ALL.into_iter().map(AgentNode::new).collect(),
            logs: Vec::new(),
            final_output: None,
        }
    }

    fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            state: self.phase.current(),
            logs: self.logs.clone(),
            final_output: self.final_output.clone(),
            agents: self.agents.iter().map(AgentNode::view).collect(),
        }
    }

    fn clear(&mut self) {
        self.phase.handle(PhaseEvent::Reset);
        for agent in &mut self.agents {
            agent.handle(AgentEvent::Reset);
        }
        self.logs.clear();
        self.final_output = None;
    }

    fn log(&mut self, message: impl Into<String>) {
        let entry = LogEntry::now(message);
        debug!(message = %entry.message, "Workflow log");
        self.logs.push(entry);
    }

    fn apply(&mut self, cue: &Cue) {
        match cue {
            Cue::Phase { to, messages } => {
                if !self.phase.advance_to(*to) {
                    warn!(
                        current = %self.phase.current(),
                        target = %to,
                        "Skipping out-of-order phase cue"
                    );
                    return;
                }
                match to {
                    WorkflowState::Merging => {
                        for agent in &mut self.agents {
                            agent.handle(AgentEvent::Finish);
                        }
                    }
                    WorkflowState::Complete => {
                        self.final_output = Some(script::FINAL_OUTPUT.to_string());
                    }
                    _ => {}
                }
                for message in messages {
                    self.log(message.as_str());
                }
                info!(state = %to, logs = self.logs.len(), "Workflow advanced");
            }
            Cue::Log(message) => {
                if self.phase.current().is_running() {
                    self.log(message.as_str());
                }
            }
            Cue::AgentStarted(role) => {
                if self.phase.current() != WorkflowState::Dispatching {
                    warn!(role = %role, state = %self.phase.current(), "Agent cue outside dispatch");
                    return;
                }
                if let Some(agent) = self.agents.iter_mut().find(|a| a.role() == *role) {
                    agent.handle(AgentEvent::Dispatch);
                    info!(role = %role, "Agent processing");
                }
            }
        }
    }
}

/// Board plus the channel observers read it through
#[derive(Debug)]
struct Shared {
    board: Mutex<Board>,
    updates: watch::Sender<DashboardSnapshot>,
}

impl Shared {
    /// Mutate the board under the lock and publish the result if it changed
    fn update<R>(&self, f: impl FnOnce(&mut Board) -> R) -> R {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut board);
        let snapshot = board.snapshot();
        drop(board);

        self.updates.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        result
    }

    fn read<R>(&self, f: impl FnOnce(&Board) -> R) -> R {
        let board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        f(&board)
    }
}

/// Owns the dashboard state and advances it on a fixed schedule.
///
/// Rendering code should hold a receiver from [`WorkflowSequencer::subscribe`]
/// or a [`DashboardSnapshot`]; only the sequencer mutates the board.
#[derive(Debug)]
pub struct WorkflowSequencer {
    shared: Arc<Shared>,
    schedule: Arc<Schedule>,
    pending: Vec<JoinHandle<()>>,
}

impl Default for WorkflowSequencer {
    fn default() -> Self {
        Self::new(Schedule::observed())
    }
}

impl WorkflowSequencer {
    pub fn new(schedule: Schedule) -> Self {
        let (updates, _) = watch::channel(DashboardSnapshot::idle());
        Self {
            shared: Arc::new(Shared {
                board: Mutex::new(Board::new()),
                updates,
            }),
            schedule: Arc::new(schedule),
            pending: Vec::new(),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn state(&self) -> WorkflowState {
        self.shared.read(|board| board.phase.current())
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.shared.read(Board::snapshot)
    }

    /// Read-only feed of every published change
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Timer tasks that have not run to completion yet
    pub fn pending_timers(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }

    /// Kick off a cycle. Ignored unless the workflow is idle.
    pub fn start(&mut self) -> Result<StartOutcome, SequencerError> {
        let runtime = Handle::try_current().map_err(|_| SequencerError::NoRuntime)?;

        let started = self.shared.update(|board| {
            let state = board.phase.current();
            if state != WorkflowState::Idle {
                return Err(state);
            }
            board.clear();
            board.epoch += 1;
            board.phase.advance_to(WorkflowState::Analyzing);
            board.log(script::RECEIVED);
            Ok(board.epoch)
        });

        let epoch = match started {
            Ok(epoch) => epoch,
            Err(state) => {
                info!(state = %state, "Start ignored, workflow already active");
                return Ok(StartOutcome::Ignored { state });
            }
        };

        let run_id = generate_correlation_id();
        let span = create_workflow_span("conductor_run", &run_id, epoch);
        info!(parent: &span, "Conductor received request");

        self.pending.retain(|h| !h.is_finished());
        let task = drive(
            Arc::clone(&self.shared),
            Arc::clone(&self.schedule),
            epoch,
            Instant::now(),
        )
        .instrument(span);
        self.pending.push(runtime.spawn(task));

        Ok(StartOutcome::Started { run_id })
    }

    /// Cancel every pending cue and return to an empty idle board
    pub fn reset(&mut self) {
        let aborted = self.pending.len();
        for handle in self.pending.drain(..) {
            handle.abort();
        }

        let previous = self.shared.update(|board| {
            board.epoch += 1;
            let previous = board.phase.current();
            board.clear();
            previous
        });

        if previous == WorkflowState::Idle {
            debug!("Reset while idle");
        } else {
            info!(previous = %previous, aborted, "Workflow reset");
        }
    }
}

impl Drop for WorkflowSequencer {
    fn drop(&mut self) {
        for handle in self.pending.drain(..) {
            handle.abort();
        }
    }
}

async fn drive(shared: Arc<Shared>, schedule: Arc<Schedule>, epoch: u64, started_at: Instant) {
    for step in schedule.steps() {
        tokio::time::sleep_until(started_at + step.at).await;

        let applied = shared.update(|board| {
            if board.epoch != epoch {
                return false;
            }
            board.apply(&step.cue);
            true
        });

        if !applied {
            debug!(epoch, "Cycle superseded, dropping remaining cues");
            return;
        }
    }
    info!("Conductor cycle finished");
}

/// Wait until the observed dashboard reaches `state` or any later phase.
/// Waiting for `Idle` only resolves on an idle board.
pub async fn wait_for_state(
    updates: &mut watch::Receiver<DashboardSnapshot>,
    state: WorkflowState,
) -> Result<DashboardSnapshot, SequencerError> {
    let snapshot = updates
        .wait_for(|snapshot| match state {
            WorkflowState::Idle => snapshot.state == WorkflowState::Idle,
            _ => snapshot.state.rank() >= state.rank(),
        })
        .await
        .map_err(|_| SequencerError::Closed(state))?;
    Ok(snapshot.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::AgentStatus;

    #[test]
    fn test_start_without_runtime_is_an_error() {
        let mut sequencer = WorkflowSequencer::default();
        assert!(matches!(sequencer.start(), Err(SequencerError::NoRuntime)));
        assert_eq!(sequencer.state(), WorkflowState::Idle);
        assert!(sequencer.snapshot().logs.is_empty());
    }

    #[test]
    fn test_board_ignores_agent_cue_outside_dispatch() {
        let mut board = Board::new();
        board.apply(&Cue::AgentStarted(AgentRole::Infra));
        assert_eq!(board.snapshot().agent(AgentRole::Infra), Some(AgentStatus::Idle));
    }

    #[test]
    fn test_board_merge_completes_every_agent() {
        let mut board = Board::new();
        board.phase.advance_to(WorkflowState::Analyzing);
        board.apply(&Cue::Phase {
            to: WorkflowState::Dispatching,
            messages: vec![],
        });
        board.apply(&Cue::AgentStarted(AgentRole::Security));
        board.apply(&Cue::Phase {
            to: WorkflowState::Merging,
            messages: vec![script::MERGING.to_string()],
        });

        let snapshot = board.snapshot();
        assert!(snapshot
            .agents
            .iter()
            .all(|view| view.status == AgentStatus::Complete));
        assert_eq!(snapshot.logs.len(), 1);
        assert!(snapshot.check_consistency().is_ok());
    }

    #[test]
    fn test_board_skips_out_of_order_phase() {
        let mut board = Board::new();
        board.apply(&Cue::Phase {
            to: WorkflowState::Complete,
            messages: vec![script::COMPLETE.to_string()],
        });

        let snapshot = board.snapshot();
        assert_eq!(snapshot.state, WorkflowState::Idle);
        assert!(snapshot.logs.is_empty());
        assert!(snapshot.final_output.is_none());
    }

    #[test]
    fn test_wait_for_state_reports_closed_channel() {
        let (tx, mut rx) = watch::channel(DashboardSnapshot::idle());
        drop(tx);

        let result = tokio_test::block_on(wait_for_state(&mut rx, WorkflowState::Complete));
        assert!(matches!(
            result,
            Err(SequencerError::Closed(WorkflowState::Complete))
        ));
    }

    #[test]
    fn test_wait_for_state_resolves_once_past_target() {
        let mut complete = DashboardSnapshot::idle();
        complete.state = WorkflowState::Complete;
        let (_tx, mut rx) = watch::channel(complete);

        let snapshot =
            tokio_test::block_on(wait_for_state(&mut rx, WorkflowState::Merging)).unwrap();
        assert_eq!(snapshot.state, WorkflowState::Complete);
    }
}
