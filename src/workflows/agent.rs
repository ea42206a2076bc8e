// Per-agent status machine for the three mock worker nodes

use statig::blocking::StateMachine;
use statig::prelude::*;

use super::types::{AgentRole, AgentStatus, AgentView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentEvent {
    /// The conductor routed work to this agent
    Dispatch,
    /// The conductor started merging; every agent is done
    Finish,
    Reset,
}

#[derive(Debug)]
pub struct AgentMachine {
    role: AgentRole,
}

#[state_machine(
    initial = "State::idle()",
    state(derive(Debug, Clone, Copy, PartialEq, Eq))
)]
impl AgentMachine {
    #[state]
    fn idle(&mut self, event: &AgentEvent) -> Outcome<State> {
        match event {
            AgentEvent::Dispatch => {
                tracing::debug!(role = %self.role, "Agent started processing");
                Transition(State::processing())
            }
            AgentEvent::Finish => Transition(State::complete()),
            AgentEvent::Reset => Handled,
        }
    }

    #[state]
    fn processing(&mut self, event: &AgentEvent) -> Outcome<State> {
        match event {
            AgentEvent::Finish => {
                tracing::debug!(role = %self.role, "Agent finished");
                Transition(State::complete())
            }
            AgentEvent::Reset => Transition(State::idle()),
            AgentEvent::Dispatch => Handled,
        }
    }

    #[state]
    fn complete(&mut self, event: &AgentEvent) -> Outcome<State> {
        match event {
            AgentEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }
}

pub struct AgentNode {
    role: AgentRole,
    machine: StateMachine<AgentMachine>,
}

impl std::fmt::Debug for AgentNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentNode")
            .field("role", &self.role)
            .field("status", &self.status())
            .finish()
    }
}

impl AgentNode {
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            machine: AgentMachine { role }.state_machine(),
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn status(&self) -> AgentStatus {
        match self.machine.state() {
            State::Idle { .. } => AgentStatus::Idle,
            State::Processing { .. } => AgentStatus::Processing,
            State::Complete { .. } => AgentStatus::Complete,
        }
    }

    pub fn handle(&mut self, event: AgentEvent) {
        self.machine.handle(&event);
    }

    pub fn view(&self) -> AgentView {
        AgentView {
            role: self.role,
            status: self.status(),
        }
    }
}
