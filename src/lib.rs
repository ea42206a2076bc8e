// Conductor Demo Library - simulated multi-agent orchestration workflow
// This exposes the sequencer and its supporting pieces for the CLI and for testing

pub mod cli;
pub mod config;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use crate::config::{config, AgentTimingConfig, ConductorConfig, ObservabilityConfig, ScheduleConfig};
pub use crate::telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflows::{
    wait_for_state, AgentRole, AgentStatus, AgentView, Cue, DashboardSnapshot, LogEntry, Schedule,
    ScheduleError, SequencerError, StartOutcome, Step, WorkflowSequencer, WorkflowState,
};
