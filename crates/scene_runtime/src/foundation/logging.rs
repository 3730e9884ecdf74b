//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default filter (e.g. `"info"`), still letting
/// `RUST_LOG` override it. Safe to call more than once; returns false when a
/// logger was already installed.
pub fn init_with_filter(default_filter: &str) -> bool {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    match env_logger::Builder::from_env(env).try_init() {
        Ok(()) => true,
        Err(err) => {
            debug!("Logger already installed, keeping it: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_keeps_existing_logger() {
        init_with_filter("warn");
        assert!(!init_with_filter("trace"));
    }
}
