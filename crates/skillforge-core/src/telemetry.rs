//! Centralised tracing initialisation for Skillforge binaries.
//!
//! Call [`init_tracing`] once at program start to configure the global
//! subscriber with an `EnvFilter` and optional JSON formatting.
//!
//! Safe to call more than once — subsequent calls are silently ignored
//! (the global subscriber can only be set once per process).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Project-specific filter override. Takes precedence over `RUST_LOG`, so
/// Skillforge verbosity can be tuned without disturbing a host process's
/// global log configuration.
pub const ENV_LOG: &str = "SKILLFORGE_LOG";

/// Initialise the global tracing subscriber.
///
/// * `json` — when `true`, emit newline-delimited JSON log lines.
/// * `level` — default verbosity when neither filter variable is set.
///
/// Filter resolution order: `SKILLFORGE_LOG`, then `RUST_LOG`, then a
/// default built from `level` that keeps the database and HTTP stacks at
/// `warn` (their chatter drowns pipeline events at `debug`).
pub fn init_tracing(json: bool, level: Level) {
    let directives = resolve_directives(
        std::env::var(ENV_LOG).ok(),
        std::env::var("RUST_LOG").ok(),
        level,
    );
    let env_filter = EnvFilter::new(directives);

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

fn resolve_directives(
    skillforge_log: Option<String>,
    rust_log: Option<String>,
    level: Level,
) -> String {
    skillforge_log.or(rust_log).unwrap_or_else(|| {
        format!(
            "{},surrealdb=warn,hyper=warn,reqwest=warn",
            level.as_str()
        )
    })
}
