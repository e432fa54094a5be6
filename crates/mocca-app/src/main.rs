use anyhow::Context;
use clap::{CommandFactory, Parser, error::ErrorKind};
use mocca_app::cli::CliArgs;
use mocca_app::run::{run, summary_lines};
use mocca_core::config::load_config;
use mocca_rfc::rfc::ical::import::ImportOptions;
use mocca_service::recurrence::ExpansionOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    if let Err(err) = args.validate() {
        CliArgs::command().error(ErrorKind::ValueValidation, err).exit();
    }

    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let config = load_config()?;

    tracing::debug!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let import = ImportOptions::from_settings(&config)?;
    let expansion = ExpansionOptions::from_settings(&config);

    let input = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let source = args
        .file
        .file_name()
        .map_or_else(|| args.file.display().to_string(), |name| name.to_string_lossy().into_owned());

    let outcome = run(&input, &source, &args, &import, expansion)?;

    println!("{}", serde_json::to_string_pretty(&outcome.query.instances)?);
    for line in summary_lines(&outcome) {
        eprintln!("{line}");
    }

    Ok(())
}
