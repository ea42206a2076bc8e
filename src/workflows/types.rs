// Core types for the simulated conductor workflow

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the conductor workflow. Only moves forward, or back to `Idle` on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Analyzing,
    Dispatching,
    Merging,
    Complete,
}

impl WorkflowState {
    /// All phases in forward order
    pub const ORDER: [WorkflowState; 5] = [
        WorkflowState::Idle,
        WorkflowState::Analyzing,
        WorkflowState::Dispatching,
        WorkflowState::Merging,
        WorkflowState::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Analyzing => "analyzing",
            WorkflowState::Dispatching => "dispatching",
            WorkflowState::Merging => "merging",
            WorkflowState::Complete => "complete",
        }
    }

    /// Position in the forward order, `Idle` being 0
    pub fn rank(&self) -> usize {
        match self {
            WorkflowState::Idle => 0,
            WorkflowState::Analyzing => 1,
            WorkflowState::Dispatching => 2,
            WorkflowState::Merging => 3,
            WorkflowState::Complete => 4,
        }
    }

    /// A cycle is in flight between `start()` and completion
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            WorkflowState::Analyzing | WorkflowState::Dispatching | WorkflowState::Merging
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three mock worker nodes behind the conductor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Infra,
    Security,
    Cost,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [AgentRole::Infra, AgentRole::Security, AgentRole::Cost];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Infra => "infra",
            AgentRole::Security => "security",
            AgentRole::Cost => "cost",
        }
    }

    /// Display name shown on the agent node
    pub fn label(&self) -> &'static str {
        match self {
            AgentRole::Infra => "Infra Architect",
            AgentRole::Security => "Compliance",
            AgentRole::Cost => "Cost",
        }
    }

    /// Cosmetic provider tag; nothing is ever invoked
    pub fn provider(&self) -> &'static str {
        match self {
            AgentRole::Infra => "Bedrock",
            AgentRole::Security => "Internal",
            AgentRole::Cost => "Einstein",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Processing,
    Complete,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Processing => "processing",
            AgentStatus::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// One line of the conductor's activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    /// Stamp a message with the local wall-clock time
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentView {
    pub role: AgentRole,
    pub status: AgentStatus,
}

/// Read-only view of the dashboard handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub state: WorkflowState,
    pub logs: Vec<LogEntry>,
    pub final_output: Option<String>,
    pub agents: Vec<AgentView>,
}

impl DashboardSnapshot {
    pub fn idle() -> Self {
        Self {
            state: WorkflowState::Idle,
            logs: Vec::new(),
            final_output: None,
            agents: AgentRole::ALL
                .iter()
                .map(|&role| AgentView {
                    role,
                    status: AgentStatus::Idle,
                })
                .collect(),
        }
    }

    pub fn agent(&self, role: AgentRole) -> Option<AgentStatus> {
        self.agents
            .iter()
            .find(|view| view.role == role)
            .map(|view| view.status)
    }

    /// Check the cross-field invariants between the phase, the agents and the output.
    /// Returns a description of the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.final_output.is_some() != (self.state == WorkflowState::Complete) {
            return Err(format!(
                "final output presence does not match state {}",
                self.state
            ));
        }

        for view in &self.agents {
            let allowed = match self.state {
                WorkflowState::Idle | WorkflowState::Analyzing => {
                    view.status == AgentStatus::Idle
                }
                WorkflowState::Dispatching => view.status != AgentStatus::Complete,
                WorkflowState::Merging | WorkflowState::Complete => {
                    view.status == AgentStatus::Complete
                }
            };
            if !allowed {
                return Err(format!(
                    "agent {} is {} while workflow is {}",
                    view.role, view.status, self.state
                ));
            }
        }

        if self.state == WorkflowState::Idle && !self.logs.is_empty() {
            return Err("idle dashboard still carries log entries".to_string());
        }

        Ok(())
    }
}

impl Default for DashboardSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}
