pub mod formats;

use flexi_logger::{FlexiLoggerError, Logger};

use crate::Error;

/// Used when the configured specification cannot be parsed.
pub const FALLBACK_SPEC: &str = "info";

/// Install the logger. `RUST_LOG` wins over `spec` when set.
///
/// An unparseable specification falls back to [`FALLBACK_SPEC`] and is
/// reported as a warning. Logs go to stderr; stdout carries command output.
pub fn init(spec: &str) -> Result<(), Error> {
    match Logger::try_with_env_or_str(spec) {
        Ok(logger) => start(logger)?,
        Err(e) => {
            start(Logger::try_with_str(FALLBACK_SPEC)?)?;
            log::warn!("invalid log specification, using '{FALLBACK_SPEC}': {e}");
        }
    }
    Ok(())
}

fn start(logger: Logger) -> Result<(), FlexiLoggerError> {
    logger
        .format(formats::cli_format)
        .log_to_stderr()
        .start()?;
    Ok(())
}
