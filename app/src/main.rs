use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use common::{
    config::{Config, DEFAULT_DATA_DIR, DEFAULT_OUTPUT_DIR},
    font,
    routing::build_routing,
};
use eyre::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod run;

/// Library crates whose logs follow the application log level
const LOG_TARGETS: &[&str] = &["common"];

#[derive(Parser)]
#[command(version, about = "Compare EMON CPU metrics across inference runs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Folder holding the EMON workbooks
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,
    /// Folder the charts are written to
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// TTF/OTF font for chart text, searched in the system font folders otherwise
    #[arg(long, global = true)]
    font: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long, global = true)]
    log: Vec<String>,
}

#[derive(Subcommand, Default)]
enum Commands {
    /// Plot one comparison chart per metric
    #[default]
    Plot,
    /// Print which sheet and column every metric is read from
    Routes,
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("emon_compare={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for target in LOG_TARGETS {
        if !args.log.iter().any(|x| x.starts_with(target)) {
            env_filter = env_filter.add_directive(format!("{target}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    let config = Config::emon(&args.data_dir, args.output_dir);
    match args.command.unwrap_or_default() {
        Commands::Plot => {
            if let Err(err) = plot(&config, args.font.as_deref(), !args.no_progress) {
                error!("{err:#?}");
                return Err(err);
            }
        }
        Commands::Routes => {
            println!(
                "{}",
                serde_json::to_string_pretty(&build_routing(&config))?
            );
        }
    };

    Ok(())
}

fn load_font(explicit: Option<&Path>) -> Result<()> {
    if let Some(path) = explicit {
        return font::register_font(path);
    }
    match font::find_system_font() {
        Some(path) => {
            if let Err(err) = font::register_font(&path) {
                warn!("{err:#}, chart text will not be drawn");
            }
        }
        None => warn!("No font found, chart text will not be drawn. Use --font to pick one"),
    }
    Ok(())
}

fn plot(config: &Config, font: Option<&Path>, progress: bool) -> Result<()> {
    load_font(font)?;
    let summary = run::run(config, progress)?;
    info!("{summary}");
    Ok(())
}
