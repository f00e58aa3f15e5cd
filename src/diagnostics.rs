//! Operator-facing diagnostics and log setup.
//!
//! stdout carries only listings; everything else goes to stderr.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `ATTEN_LOG=debug`.
pub const LOG_ENV: &str = "ATTEN_LOG";

/// Install a stderr subscriber. Defaults to `warn` when `ATTEN_LOG` is unset.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

/// Prefix a diagnostic with the tool name, folding it onto a single line.
pub fn error_message(msg: impl Into<String>) -> String {
    let msg: String = msg.into();
    let one_line: Vec<&str> = msg.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    format!("atten: {}", one_line.join("; "))
}
