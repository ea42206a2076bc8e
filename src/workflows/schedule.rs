//! Schedule Module
//!
//! The simulated workflow is a fixed timeline of cues, each firing at an offset
//! from the moment the cycle started. The timeline is plain data so it can be
//! built from configuration, validated once, and replayed by the sequencer.

use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use super::script;
use super::types::{AgentRole, WorkflowState};
use crate::config::ScheduleConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Phase offsets must be strictly increasing: dispatch {dispatch_ms}ms, merge {merge_ms}ms, complete {complete_ms}ms")]
    PhaseOutOfOrder {
        dispatch_ms: u64,
        merge_ms: u64,
        complete_ms: u64,
    },
    #[error("Agent {role} would start processing at {at_ms}ms, not before merge at {merge_ms}ms")]
    StaggerPastMerge {
        role: AgentRole,
        at_ms: u64,
        merge_ms: u64,
    },
    #[error("Agent {role} reports at {at_ms}ms, outside the dispatch window {dispatch_ms}..{merge_ms}ms")]
    ReportOutsideDispatch {
        role: AgentRole,
        at_ms: u64,
        dispatch_ms: u64,
        merge_ms: u64,
    },
    #[error("Agent {0} is configured more than once")]
    DuplicateAgent(AgentRole),
    #[error("Agent {0} has no timing configured")]
    MissingAgent(AgentRole),
}

/// What happens when a step fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    /// Enter a phase and append its log lines in order
    Phase {
        to: WorkflowState,
        messages: Vec<String>,
    },
    /// Informational log line only
    Log(String),
    /// One agent moves from idle to processing
    AgentStarted(AgentRole),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub at: Duration,
    pub cue: Cue,
}

/// Validated timeline of a single workflow cycle. Steps are sorted by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    steps: Vec<Step>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::observed()
    }
}

impl Schedule {
    /// The timing seen in the dashboard demo
    pub fn observed() -> Self {
        // Defaults always validate; fall back to an empty timeline rather than panic
        Self::from_config(&ScheduleConfig::default()).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Built-in schedule failed validation");
            Self { steps: Vec::new() }
        })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, ScheduleError> {
        let dispatch_ms = config.dispatch_at_ms;
        let merge_ms = config.merge_at_ms;
        let complete_ms = config.complete_at_ms;

        if dispatch_ms == 0 || dispatch_ms >= merge_ms || merge_ms >= complete_ms {
            return Err(ScheduleError::PhaseOutOfOrder {
                dispatch_ms,
                merge_ms,
                complete_ms,
            });
        }

        let mut seen = HashSet::new();
        for agent in &config.agents {
            if !seen.insert(agent.role) {
                return Err(ScheduleError::DuplicateAgent(agent.role));
            }
        }
        if let Some(missing) = AgentRole::ALL.iter().find(|role| !seen.contains(role)) {
            return Err(ScheduleError::MissingAgent(*missing));
        }

        let mut steps = vec![Step {
            at: Duration::from_millis(dispatch_ms),
            cue: Cue::Phase {
                to: WorkflowState::Dispatching,
                messages: vec![
                    script::INTENT_IDENTIFIED.to_string(),
                    script::routing_announcement(),
                ],
            },
        }];

        // Agents are emitted in role order so equal offsets resolve the same way every time
        for role in AgentRole::ALL {
            let Some(agent) = config.agents.iter().find(|a| a.role == role) else {
                continue;
            };

            let started_ms = dispatch_ms.saturating_add(agent.stagger_ms);
            if started_ms >= merge_ms {
                return Err(ScheduleError::StaggerPastMerge {
                    role,
                    at_ms: started_ms,
                    merge_ms,
                });
            }
            if agent.report_at_ms <= dispatch_ms || agent.report_at_ms >= merge_ms {
                return Err(ScheduleError::ReportOutsideDispatch {
                    role,
                    at_ms: agent.report_at_ms,
                    dispatch_ms,
                    merge_ms,
                });
            }

            steps.push(Step {
                at: Duration::from_millis(started_ms),
                cue: Cue::AgentStarted(role),
            });
            steps.push(Step {
                at: Duration::from_millis(agent.report_at_ms),
                cue: Cue::Log(script::agent_report(role).to_string()),
            });
        }

        steps.push(Step {
            at: Duration::from_millis(merge_ms),
            cue: Cue::Phase {
                to: WorkflowState::Merging,
                messages: vec![script::MERGING.to_string()],
            },
        });
        steps.push(Step {
            at: Duration::from_millis(complete_ms),
            cue: Cue::Phase {
                to: WorkflowState::Complete,
                messages: vec![script::COMPLETE.to_string()],
            },
        });

        // Stable: ties keep insertion order
        steps.sort_by_key(|step| step.at);

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Offset at which the cycle reaches `state`, if the schedule ever enters it
    pub fn offset_of(&self, state: WorkflowState) -> Option<Duration> {
        match state {
            WorkflowState::Idle => None,
            WorkflowState::Analyzing => Some(Duration::ZERO),
            _ => self.steps.iter().find_map(|step| match &step.cue {
                Cue::Phase { to, .. } if *to == state => Some(step.at),
                _ => None,
            }),
        }
    }

    /// Offset of the last step, i.e. when the cycle completes
    pub fn total_duration(&self) -> Duration {
        self.steps.last().map(|step| step.at).unwrap_or(Duration::ZERO)
    }

    /// Number of log entries a full cycle appends, counting the initial one
    pub fn log_count(&self) -> usize {
        1 + self
            .steps
            .iter()
            .map(|step| match &step.cue {
                Cue::Phase { messages, .. } => messages.len(),
                Cue::Log(_) => 1,
                Cue::AgentStarted(_) => 0,
            })
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentTimingConfig;

    #[test]
    fn test_observed_schedule_offsets() {
        let schedule = Schedule::observed();

        assert_eq!(
            schedule.offset_of(WorkflowState::Dispatching),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(
            schedule.offset_of(WorkflowState::Merging),
            Some(Duration::from_millis(6000))
        );
        assert_eq!(
            schedule.offset_of(WorkflowState::Complete),
            Some(Duration::from_millis(8000))
        );
        assert_eq!(schedule.total_duration(), Duration::from_millis(8000));
        assert_eq!(schedule.log_count(), 8);
    }

    #[test]
    fn test_steps_are_sorted() {
        let schedule = Schedule::observed();
        let offsets: Vec<Duration> = schedule.steps().iter().map(|s| s.at).collect();
        let mut sorted = offsets.clone();
        sorted.sort();
        assert_eq!(offsets, sorted);
    }

    #[test]
    fn test_agents_start_at_dispatch_plus_stagger() {
        let schedule = Schedule::observed();
        let starts: Vec<(AgentRole, u128)> = schedule
            .steps()
            .iter()
            .filter_map(|step| match step.cue {
                Cue::AgentStarted(role) => Some((role, step.at.as_millis())),
                _ => None,
            })
            .collect();

        assert_eq!(
            starts,
            vec![
                (AgentRole::Infra, 1700),
                (AgentRole::Security, 2100),
                (AgentRole::Cost, 2500),
            ]
        );
    }

    #[test]
    fn test_rejects_out_of_order_phases() {
        let config = ScheduleConfig {
            merge_at_ms: 9000,
            complete_at_ms: 8000,
            ..ScheduleConfig::default()
        };
        assert!(matches!(
            Schedule::from_config(&config),
            Err(ScheduleError::PhaseOutOfOrder { .. })
        ));

        let config = ScheduleConfig {
            dispatch_at_ms: 0,
            ..ScheduleConfig::default()
        };
        assert!(Schedule::from_config(&config).is_err());
    }

    #[test]
    fn test_rejects_stagger_that_would_skip_processing() {
        let mut config = ScheduleConfig::default();
        config.agents[2].stagger_ms = 4500;

        assert_eq!(
            Schedule::from_config(&config),
            Err(ScheduleError::StaggerPastMerge {
                role: AgentRole::Cost,
                at_ms: 6000,
                merge_ms: 6000,
            })
        );
    }

    #[test]
    fn test_rejects_report_outside_dispatch_window() {
        let mut config = ScheduleConfig::default();
        config.agents[0].report_at_ms = 1000;

        assert!(matches!(
            Schedule::from_config(&config),
            Err(ScheduleError::ReportOutsideDispatch {
                role: AgentRole::Infra,
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_duplicate_and_missing_agents() {
        let mut config = ScheduleConfig::default();
        config.agents.push(AgentTimingConfig {
            role: AgentRole::Infra,
            stagger_ms: 100,
            report_at_ms: 2000,
        });
        assert_eq!(
            Schedule::from_config(&config),
            Err(ScheduleError::DuplicateAgent(AgentRole::Infra))
        );

        let mut config = ScheduleConfig::default();
        config.agents.retain(|a| a.role != AgentRole::Security);
        assert_eq!(
            Schedule::from_config(&config),
            Err(ScheduleError::MissingAgent(AgentRole::Security))
        );
    }
}
