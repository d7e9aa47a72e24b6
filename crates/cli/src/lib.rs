pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use curbreport_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "curbreport",
    about = "Curbreport operator CLI",
    long_about = "Operate the violation-report store: migrations, demo seeds, \
                  connectivity checks, and recommendation queries.",
    after_help = "Examples:\n  curbreport migrate\n  curbreport seed\n  \
                  curbreport recommend --latitude 52.512852 --longitude 13.326802\n  \
                  curbreport doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Load the deterministic demo report dataset")]
    Seed,
    #[command(about = "Rank probable violation types for a prospective report")]
    Recommend(RecommendArgs),
    #[command(about = "Validate configuration and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

#[derive(Debug, clap::Args)]
pub struct RecommendArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub longitude: f64,
    #[arg(long, help = "Reporting user id; enables the history pass together with --time")]
    pub user_id: Option<Uuid>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Unix seconds of the prospective report; enables the history pass together with --user-id"
    )]
    pub time: Option<i64>,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Recommend(args) => commands::recommend::run(&args),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_logging() {
    let logging = AppConfig::load(LoadOptions::default())
        .map(|config| config.logging)
        .unwrap_or_else(|_| {
            curbreport_core::config::LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            }
        });

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.level)),
        );

    // A second init (e.g. in tests) is fine; keep the first subscriber.
    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
