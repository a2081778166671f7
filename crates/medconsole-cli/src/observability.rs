// Tracing to stderr so command output on stdout stays clean.
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn level_for(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

pub fn init_tracing(verbose: bool) {
    // Prefer RUST_LOG from env, otherwise use the verbosity level.
    let base_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level_for(verbose)));

    let _ = tracing_subscriber::registry()
        .with(base_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_level() {
        assert_eq!(level_for(true), "debug");
        assert_eq!(level_for(false), "warn");
    }
}
