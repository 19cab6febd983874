// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, GlobalArgs, MappingsCommands};
use commands::Settings;

/// Log filter from RUST_LOG, else from --verbose/--quiet
fn env_filter(global: &GlobalArgs) -> EnvFilter {
    let default = if global.verbose {
        "debug"
    } else if global.quiet {
        "warn"
    } else {
        "info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&cli.global))
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let settings = Settings::resolve(&cli.global)?;

    match command {
        Commands::Init => commands::cmd_init(&settings),
        Commands::Run {
            dry_run,
            policy,
            generation,
            entities,
            output,
        } => commands::cmd_run(&settings, dry_run, policy, generation, entities, output),
        Commands::Diff {
            generation,
            entities,
            keys,
        } => commands::cmd_diff(&settings, generation, entities, keys),
        Commands::Verify {
            generation,
            entities,
        } => commands::cmd_verify(&settings, generation, entities),
        Commands::Generations => commands::cmd_generations(&settings),
        Commands::Mappings(MappingsCommands::List) => commands::cmd_mappings_list(&settings),
        Commands::Mappings(MappingsCommands::Show { entity }) => {
            commands::cmd_mappings_show(&settings, &entity)
        }
    }
}
