// Workflow sequencing for the conductor dashboard
// Phases only move forward; reset() is the single way back to idle

pub mod agent;
pub mod phase;
pub mod schedule;
pub mod script;
pub mod sequencer;
pub mod types;

pub use schedule::{Cue, Schedule, ScheduleError, Step};
pub use sequencer::{wait_for_state, SequencerError, StartOutcome, WorkflowSequencer};
pub use types::{AgentRole, AgentStatus, AgentView, DashboardSnapshot, LogEntry, WorkflowState};
