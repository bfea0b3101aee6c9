use std::path::PathBuf;

mod app;
mod commands;
mod logging;
mod settings;
mod ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let matches = app::build_cli().get_matches();

    let log_path = matches
        .get_one::<String>("log-file")
        .map(PathBuf::from)
        .unwrap_or_else(settings::default_log_path);
    logging::init_logging(matches.get_flag("quiet"), &log_path)?;

    let explicit = matches.get_one::<String>("config").map(PathBuf::from);
    let fallback = settings::default_config_path();
    let config = settings::resolve_config(
        explicit.as_deref(),
        fallback.as_deref(),
        matches.get_one::<String>("base-url").map(String::as_str),
        |key| std::env::var(key).ok(),
    )
    .map_err(|err| {
        tracing::error!(event = "cli.config_failed", error_code = err.error_code(), error = %err);
        err
    })?;
    tracing::info!(
        event = "cli.started",
        base_url = config.backend.base_url.as_str(),
        log_file = %log_path.display()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::run_command(&matches, config))
}
