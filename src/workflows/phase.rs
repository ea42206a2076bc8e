// Forward-only phase machine for the conductor workflow

use statig::blocking::StateMachine;
use statig::prelude::*;

use super::types::WorkflowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    Start,
    Dispatch,
    Merge,
    Complete,
    Reset,
}

impl PhaseEvent {
    /// Event that moves the workflow into `target`
    pub fn entering(target: WorkflowState) -> Self {
        match target {
            WorkflowState::Idle => PhaseEvent::Reset,
            WorkflowState::Analyzing => PhaseEvent::Start,
            WorkflowState::Dispatching => PhaseEvent::Dispatch,
            WorkflowState::Merging => PhaseEvent::Merge,
            WorkflowState::Complete => PhaseEvent::Complete,
        }
    }
}

#[derive(Debug, Default)]
pub struct PhaseMachine;

#[state_machine(
    initial = "State::idle()",
    state(derive(Debug, Clone, Copy, PartialEq, Eq))
)]
impl PhaseMachine {
    #[state]
    fn idle(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Start => Transition(State::analyzing()),
            _ => Handled,
        }
    }

    #[state]
    fn analyzing(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Dispatch => Transition(State::dispatching()),
            PhaseEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }

    #[state]
    fn dispatching(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Merge => Transition(State::merging()),
            PhaseEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }

    #[state]
    fn merging(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Complete => Transition(State::complete()),
            PhaseEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }

    #[state]
    fn complete(&mut self, event: &PhaseEvent) -> Outcome<State> {
        match event {
            PhaseEvent::Reset => Transition(State::idle()),
            _ => Handled,
        }
    }
}

/// Owns the phase machine and exposes it as a plain `WorkflowState`
pub struct Phase {
    machine: StateMachine<PhaseMachine>,
}

impl std::fmt::Debug for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phase")
            .field("state", &self.current())
            .finish()
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::new()
    }
}

impl Phase {
    pub fn new() -> Self {
        Self {
            machine: PhaseMachine.state_machine(),
        }
    }

    pub fn current(&self) -> WorkflowState {
        match self.machine.state() {
            State::Idle { .. } => WorkflowState::Idle,
            State::Analyzing { .. } => WorkflowState::Analyzing,
            State::Dispatching { .. } => WorkflowState::Dispatching,
            State::Merging { .. } => WorkflowState::Merging,
            State::Complete { .. } => WorkflowState::Complete,
        }
    }

    /// Feed an event; returns true when the phase actually changed
    pub fn handle(&mut self, event: PhaseEvent) -> bool {
        let before = self.current();
        self.machine.handle(&event);
        let after = self.current();
        if before == after {
            tracing::debug!(state = %before, event = ?event, "Phase event ignored");
            return false;
        }
        tracing::debug!(from = %before, to = %after, "Phase transition");
        true
    }

    /// Move to `target` if it is the next phase in order
    pub fn advance_to(&mut self, target: WorkflowState) -> bool {
        self.handle(PhaseEvent::entering(target)) && self.current() == target
    }
}
