// ABOUTME: Tracing subscriber setup for console logging
// ABOUTME: Debug output is enabled by the --debug flag or the QUICKPLAY_DEBUG environment variable

use tracing::Level;

pub const DEBUG_ENV_VAR: &str = "QUICKPLAY_DEBUG";

pub fn init(debug: bool) {
    let level = log_level(debug, std::env::var_os(DEBUG_ENV_VAR).is_some());

    // Ignore the error when a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn log_level(flag: bool, env_set: bool) -> Level {
    if flag || env_set {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(false, false), Level::INFO);
        assert_eq!(log_level(true, false), Level::DEBUG);
        assert_eq!(log_level(false, true), Level::DEBUG);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
