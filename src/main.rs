use anyhow::Result;
use clap::Parser;
use std::time::Duration;

use conductor_demo::cli::commands::run::RunCommand;
use conductor_demo::cli::commands::schedule::ScheduleCommand;
use conductor_demo::cli::commands::Command;
use conductor_demo::cli::{Cli, Commands};
use conductor_demo::{init_telemetry, ConductorConfig, Schedule};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConductorConfig::load_from(path, true)?,
        None => conductor_demo::config()?.clone(),
    };
    if cli.json_logs {
        config.observability.json_logs = true;
    }
    init_telemetry(&config.observability)?;

    let schedule = Schedule::from_config(&config.schedule)?;

    match cli.command {
        // Default behavior: play the workflow once
        None => tokio::runtime::Runtime::new()?.block_on(async {
            RunCommand::new(schedule).execute().await
        }),
        Some(Commands::Run { reset_after_ms, json }) => {
            tokio::runtime::Runtime::new()?.block_on(async {
                RunCommand::new(schedule)
                    .with_reset_after(reset_after_ms.map(Duration::from_millis))
                    .with_json(json)
                    .execute()
                    .await
            })
        }
        Some(Commands::Schedule) => tokio::runtime::Runtime::new()?.block_on(async {
            ScheduleCommand::new(schedule).execute().await
        }),
    }
}
