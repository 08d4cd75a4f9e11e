use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const LOG_ENV: &str = "APIGEN_LOG";

/// Install the stderr subscriber.
///
/// `APIGEN_LOG` takes a plain level ("debug") or a full filter spec
/// ("apigen::schema=trace,apigen=info"). Without it, `--debug` picks debug,
/// otherwise info.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = match std::env::var(LOG_ENV) {
        Ok(level) if is_plain_level(&level) => format!("apigen={level}"),
        Ok(spec) => spec,
        Err(_) => format!("apigen={default_level}"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .with_filter(EnvFilter::new(filter));

    // fails only when a subscriber is already installed
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    )
}
