use std::io::IsTerminal;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use miette::{IntoDiagnostic, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: nx::commands::Commands,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

fn level_filter(verbose: &Verbosity<InfoLevel>) -> LevelFilter {
    use clap_verbosity_flag::LevelFilter as Level;

    match verbose.log_level_filter() {
        Level::Off => LevelFilter::OFF,
        Level::Error => LevelFilter::ERROR,
        Level::Warn => LevelFilter::WARN,
        Level::Info => LevelFilter::INFO,
        Level::Debug => LevelFilter::DEBUG,
        Level::Trace => LevelFilter::TRACE,
    }
}

fn main() -> Result<()> {
    better_panic::install();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with((!cli.json_logs).then(|| {
            tracing_subscriber::fmt::layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .without_time()
                .compact()
        }))
        .with(cli.json_logs.then(|| {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .json()
        }))
        .with(
            EnvFilter::builder()
                .with_default_directive(level_filter(&cli.verbose).into())
                .from_env_lossy(),
        )
        .try_init()
        .into_diagnostic()?;

    cli.command.handle()
}
