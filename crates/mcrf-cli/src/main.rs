use clap::Parser;
use mcrf_cli::cli::{Cli, Commands};
use mcrf_cli::config::load_config;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match &cli.command {
        Commands::Solve {
            file,
            method,
            depots,
            shaping,
            max_iterations,
            utilization,
            json,
        } => commands::solve::handle(
            &config,
            file,
            *method,
            *depots,
            shaping,
            *max_iterations,
            *utilization,
            *json,
        ),
        Commands::Batch {
            directory,
            method,
            depots,
            shaping,
            out,
        } => commands::batch::handle(&config, directory, *method, depots, shaping, out.as_deref()),
        Commands::Preprocess {
            file,
            depots,
            shaping,
            out,
        } => commands::preprocess::handle(&config, file, *depots, shaping, out.as_deref()),
        Commands::Convert {
            input,
            output,
            depots,
        } => commands::convert::handle(input, output, *depots),
        Commands::Inspect { file, depots, json } => commands::inspect::handle(file, *depots, *json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
