use tes_core::TES_LOG_VAR;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing system for a binary
///
/// The filter is read from `TES_LOG`, then `RUST_LOG`, and defaults to
/// `default_directive`. Output goes to stderr so stdout stays free for
/// machine-readable results.
pub fn init(
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = build_filter(default_directive)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn build_filter(
    default_directive: &str,
) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    if let Ok(directives) = std::env::var(TES_LOG_VAR) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return Ok(filter);
        }
    }
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive))
}

/// Check if stderr is attached to a terminal
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Map a `-v` count to a default filter directive
pub fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_verbosity_directive() {
        assert_eq!(verbosity_directive(0), "warn");
        assert_eq!(verbosity_directive(1), "info");
        assert_eq!(verbosity_directive(2), "debug");
        assert_eq!(verbosity_directive(9), "trace");
    }

    #[test]
    #[serial]
    fn test_tes_log_takes_precedence() {
        std::env::set_var(TES_LOG_VAR, "tes_client=trace");
        let filter = build_filter("warn").unwrap();
        assert_eq!(filter.to_string(), "tes_client=trace");
        std::env::remove_var(TES_LOG_VAR);
    }

    #[test]
    #[serial]
    fn test_default_directive_used_without_env() {
        std::env::remove_var(TES_LOG_VAR);
        std::env::remove_var("RUST_LOG");
        let filter = build_filter("info").unwrap();
        assert_eq!(filter.to_string(), "info");
    }
}
