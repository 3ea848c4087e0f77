// ABOUTME: tracing subscriber setup for console logging
// ABOUTME: RUST_LOG takes precedence; GROKBAR_DEBUG switches the default level to debug

use tracing_subscriber::EnvFilter;

pub const DEBUG_ENV: &str = "GROKBAR_DEBUG";

pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(std::env::var_os(DEBUG_ENV).is_some())));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

fn default_directive(debug: bool) -> &'static str {
    if debug { "grokbar=debug,info" } else { "info" }
}
