use std::fs;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub fn log_directive(quiet: bool) -> &'static str {
    if quiet {
        "farmware=error"
    } else {
        "farmware=info"
    }
}

/// Installs the JSON subscriber. The terminal belongs to the dashboard, so
/// events are appended to `path` rather than written to stderr.
pub fn init_logging(quiet: bool, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    // Targets are module paths, so the `farmware` prefix covers every crate.
    let filter = EnvFilter::from_default_env().add_directive(log_directive(quiet).parse()?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(filter)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quiet_lowers_directive_to_errors() {
        assert_eq!(log_directive(true), "farmware=error");
        assert_eq!(log_directive(false), "farmware=info");
    }
}
