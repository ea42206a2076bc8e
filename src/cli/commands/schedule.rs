use anyhow::Result;
use std::io::Write;

use super::Command;
use crate::workflows::{Cue, Schedule};

pub struct ScheduleCommand {
    schedule: Schedule,
}

impl ScheduleCommand {
    pub fn new(schedule: Schedule) -> Self {
        Self { schedule }
    }

    pub fn write_to(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "🕒 CONDUCTOR SCHEDULE")?;
        writeln!(out, "=====================")?;
        writeln!(out, "{:>7}ms  → analyzing", 0)?;

        for step in self.schedule.steps() {
            let at = step.at.as_millis();
            match &step.cue {
                Cue::Phase { to, messages } => {
                    writeln!(out, "{at:>7}ms  → {to}")?;
                    for message in messages {
                        writeln!(out, "{:>11}{message}", "")?;
                    }
                }
                Cue::Log(message) => writeln!(out, "{at:>7}ms    {message}")?,
                Cue::AgentStarted(role) => {
                    writeln!(out, "{at:>7}ms    {} starts processing", role.label())?
                }
            }
        }

        writeln!(out)?;
        writeln!(
            out,
            "{} log entries over {}ms",
            self.schedule.log_count(),
            self.schedule.total_duration().as_millis()
        )?;
        Ok(())
    }
}

impl Command for ScheduleCommand {
    async fn execute(&self) -> Result<()> {
        self.write_to(&mut std::io::stdout().lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_listing_covers_every_phase() {
        let mut out = Vec::new();
        ScheduleCommand::new(Schedule::observed())
            .write_to(&mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        for phase in ["analyzing", "dispatching", "merging", "complete"] {
            assert!(text.contains(&format!("→ {phase}")), "missing {phase}");
        }
        assert!(text.contains("Compliance starts processing"));
        assert!(text.contains("8 log entries over 8000ms"));
    }
}
