//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn, LevelFilter};

/// Initialize the logging system with the default `RUST_LOG` behaviour
pub fn init() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// Initialize the logging system with an explicit level filter such as `"info"`.
///
/// `RUST_LOG` still wins when set. Calling this more than once is harmless; only
/// the first call installs a logger.
pub fn init_with_level(level: &str) {
    let filter = parse_level(level).unwrap_or(LevelFilter::Info);
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .try_init();
}

/// Parse a textual level into a filter, `None` for unknown names
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    level.trim().parse::<LevelFilter>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_init_is_repeatable() {
        init_with_level("trace");
        init_with_level("info");
        init();
    }
}
