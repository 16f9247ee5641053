//! Opt-in log output for applications and examples using the SDK.
//!
//! The library only emits `tracing` events; nothing is printed unless the
//! host installs a subscriber, either its own or the one set up by
//! [`init_logging`].
use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const ENABLED_ENV: &str = "SANDBOX_SDK_LOG";
const LEVEL_ENV: &str = "SANDBOX_SDK_LOG_LEVEL";
const JSON_PATH_ENV: &str = "SANDBOX_SDK_JSON_LOG_PATH";

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn logging_enabled() -> bool {
    std::env::var(ENABLED_ENV)
        .ok()
        .map(|value| parse_bool_env(&value).unwrap_or(true))
        .unwrap_or(true)
}

fn resolve_env_filter() -> tracing_subscriber::EnvFilter {
    if let Ok(level) = std::env::var(LEVEL_ENV)
        && let Ok(filter) = tracing_subscriber::EnvFilter::try_new(level)
    {
        return filter;
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Installs a global `tracing` subscriber once per process.
///
/// Environment variables:
/// - `SANDBOX_SDK_LOG`: enable/disable flag (default enabled).
/// - `SANDBOX_SDK_LOG_LEVEL`: level/filter override (`info`, `sandbox_sdk=debug`, ...).
/// - `SANDBOX_SDK_JSON_LOG_PATH`: if set, logs are written as JSONL to that
///   file; otherwise a compact human-readable format goes to stderr.
/// - `RUST_LOG`: fallback filter.
///
/// Does nothing if another global subscriber is already installed, and
/// repeated calls are no-ops:
///
/// ```
/// sandbox_sdk::observability::init_logging();
/// sandbox_sdk::observability::init_logging();
/// tracing::debug!("subscriber installed once");
/// ```
pub fn init_logging() {
    INIT.get_or_init(|| {
        if !logging_enabled() {
            return;
        }

        let env_filter = resolve_env_filter();
        if let Ok(path_raw) = std::env::var(JSON_PATH_ENV) {
            let path = std::path::PathBuf::from(path_raw);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                let _ = std::fs::create_dir_all(parent);
            }
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("sandbox-sdk.logs.jsonl");
            let writer = tracing_appender::rolling::never(dir, file_name);
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init();
        } else {
            let console_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init();
        }
    });
}
