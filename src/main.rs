//! FeedbackLoop CLI - log insights and track the leaderboard.

use clap::Parser;
use feedbackloop::cli::{Cli, Commands, ConfigCommands};
use feedbackloop::commands::{self, Output};
use feedbackloop::config::{
    ConfigOverrides, DEFAULT_LOG_FILTER, OutputFormat, ResolvedConfig, resolve_config,
};
use std::process;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let overrides = build_overrides(&cli);
    let config = match resolve_config(cli.config_dir.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            report_error(&e, cli.human_readable);
            process::exit(1);
        }
    };

    init_logging(config.log_filter());

    let human = config.output_format() == OutputFormat::Human;
    let start = Instant::now();

    let result = run_command(cli.command, &config, human);

    debug!(
        duration_ms = start.elapsed().as_millis() as u64,
        success = result.is_ok(),
        "Command finished"
    );

    if let Err(e) = result {
        report_error(&e, human);
        process::exit(1);
    }
}

/// Collect CLI flags that take part in config precedence.
fn build_overrides(cli: &Cli) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::new();
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    if let Some(ref dir) = cli.data_dir {
        overrides = overrides.with_data_dir(dir.clone());
    }
    if let Some(backend) = cli.backend {
        overrides = overrides.with_storage_backend(backend);
    }
    if let Some(ref filter) = cli.log_filter {
        overrides = overrides.with_log_filter(filter.clone());
    }
    overrides
}

/// Install the stderr subscriber. An invalid filter falls back to the default.
fn init_logging(filter: &str) {
    let env_filter =
        EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_error(e: &feedbackloop::Error, human: bool) {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
}

fn run_command(
    command: Option<Commands>,
    config: &ResolvedConfig,
    human: bool,
) -> Result<(), feedbackloop::Error> {
    let mut store = commands::open_store(config);

    match command {
        Some(Commands::Login { name }) => {
            let result = commands::login(&mut store, &name)?;
            output(&result, human);
        }
        Some(Commands::Logout) => {
            output(&commands::logout(&mut store), human);
        }
        Some(Commands::Add { role, wish, goal }) => {
            let result = commands::add(&mut store, &role, &wish, &goal)?;
            output(&result, human);
        }
        Some(Commands::Whoami) => {
            output(&commands::whoami(&store), human);
        }
        Some(Commands::Leaderboard) => {
            output(&commands::leaderboard(&store), human);
        }
        Some(Commands::Insights { limit }) => {
            output(&commands::insights(&store, limit), human);
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => {
                output(&commands::config_show(config, &store), human);
            }
            ConfigCommands::Set { key, value } => {
                let result = commands::config_set(config, &key, &value)?;
                output(&result, human);
            }
        },
        Some(Commands::State) | None => {
            output(&commands::state(&store), human);
        }
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
