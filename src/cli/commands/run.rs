use anyhow::Result;
use std::io::Write;
use std::time::Duration;
use tokio::time::Instant;

use super::Command;
use crate::workflows::{
    AgentStatus, DashboardSnapshot, Schedule, StartOutcome, WorkflowSequencer, WorkflowState,
};

pub struct RunCommand {
    schedule: Schedule,
    reset_after: Option<Duration>,
    json: bool,
}

impl RunCommand {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            reset_after: None,
            json: false,
        }
    }

    pub fn with_reset_after(mut self, reset_after: Option<Duration>) -> Self {
        self.reset_after = reset_after;
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for RunCommand {
    async fn execute(&self) -> Result<()> {
        let mut sequencer = WorkflowSequencer::new(self.schedule.clone());
        let mut updates = sequencer.subscribe();
        let mut printer = SnapshotPrinter::new(std::io::stdout(), self.json);

        if let StartOutcome::Started { run_id } = sequencer.start()? {
            tracing::info!(run_id = %run_id, "Workflow started");
        }
        printer.render(&updates.borrow_and_update().clone())?;

        let deadline = self.reset_after.map(|after| Instant::now() + after);
        let reset_timer = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(reset_timer);

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    changed?;
                    let snapshot = updates.borrow_and_update().clone();
                    printer.render(&snapshot)?;
                    if snapshot.state == WorkflowState::Complete {
                        printer.finish(&snapshot)?;
                        break;
                    }
                }
                _ = &mut reset_timer => {
                    let interrupted = sequencer.state();
                    sequencer.reset();
                    printer.cancelled(interrupted, &sequencer.snapshot())?;
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Terminal stand-in for the dashboard view: prints what changed between snapshots
pub struct SnapshotPrinter<W: Write> {
    out: W,
    json: bool,
    last: Option<DashboardSnapshot>,
}

impl<W: Write> SnapshotPrinter<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self {
            out,
            json,
            last: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&mut self, snapshot: &DashboardSnapshot) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string(snapshot)?)?;
            self.last = Some(snapshot.clone());
            return Ok(());
        }

        let (last_state, seen_logs, last_agents) = match &self.last {
            Some(last) => (Some(last.state), last.logs.len(), last.agents.clone()),
            None => (None, 0, Vec::new()),
        };

        if last_state != Some(snapshot.state) {
            writeln!(self.out, "🎼 Conductor: {}", snapshot.state.as_str().to_uppercase())?;
        }

        for view in &snapshot.agents {
            let before = last_agents
                .iter()
                .find(|v| v.role == view.role)
                .map(|v| v.status);
            if before.is_some_and(|status| status != view.status) {
                let icon = match view.status {
                    AgentStatus::Idle => "○",
                    AgentStatus::Processing => "⏳",
                    AgentStatus::Complete => "✅",
                };
                writeln!(
                    self.out,
                    "   {} {} ({}): {}",
                    icon,
                    view.role.label(),
                    view.role.provider(),
                    view.status
                )?;
            }
        }

        // A shorter log means the board was cleared; print everything again
        let from = if snapshot.logs.len() < seen_logs { 0 } else { seen_logs };
        for entry in &snapshot.logs[from..] {
            writeln!(self.out, "   {entry}")?;
        }

        self.last = Some(snapshot.clone());
        Ok(())
    }

    pub fn finish(&mut self, snapshot: &DashboardSnapshot) -> Result<()> {
        if self.json {
            return Ok(());
        }
        if let Some(output) = &snapshot.final_output {
            writeln!(self.out)?;
            writeln!(self.out, "📄 FINAL OUTPUT")?;
            writeln!(self.out, "──────────────")?;
            writeln!(self.out, "{output}")?;
        }
        Ok(())
    }

    pub fn cancelled(&mut self, interrupted: WorkflowState, snapshot: &DashboardSnapshot) -> Result<()> {
        if self.json {
            return self.render(snapshot);
        }
        writeln!(
            self.out,
            "🔄 Reset during {interrupted}: pending steps cancelled, dashboard back to {}",
            snapshot.state
        )?;
        self.last = Some(snapshot.clone());
        Ok(())
    }
}
