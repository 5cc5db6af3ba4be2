use tracing_subscriber::EnvFilter;

use crate::cli::LogFormat;
use crate::error::CliError;

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init(format: LogFormat) -> Result<(), CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| CliError::Logging(e.to_string()))
}
