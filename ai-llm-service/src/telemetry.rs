use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Target prefixes of the gateway's own crates.
pub const WORKSPACE_TARGETS: &[&str] = &[
    "ai_llm_service",
    "study_store",
    "nl_query",
    "api",
    "supervision_gateway",
];

/// RFC3339 UTC timer, e.g. `2025-09-12T10:20:30Z`.
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Whether `target` is a workspace crate or one of its modules.
pub fn is_workspace_target(target: &str) -> bool {
    WORKSPACE_TARGETS.iter().any(|p| {
        target == *p
            || target
                .strip_prefix(p)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Formatting layer that renders only events emitted by the gateway crates.
///
/// - RFC3339 UTC timestamps
/// - compact single-line format with `file:line`
/// - span close events (durations)
/// - ANSI colors only when stdout is a terminal
///
/// Compose it in the binary with the global `EnvFilter`; third-party crates
/// (sqlx, hyper, reqwest) stay silent on this layer.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_workspace)
}

/// Level directives for every workspace crate, e.g. `nl_query=debug`.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let lvl = level.as_str().to_lowercase();
    WORKSPACE_TARGETS
        .iter()
        .filter_map(|t| format!("{t}={lvl}").parse::<Directive>().ok())
        .collect()
}

/// `EnvFilter` from `RUST_LOG` (or `default`), then `level` for workspace crates.
///
/// A `RUST_LOG` set by the operator is left untouched.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => level_directives(level)
            .into_iter()
            .fold(EnvFilter::new(default), EnvFilter::add_directive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_matching_respects_module_boundaries() {
        assert!(is_workspace_target("nl_query"));
        assert!(is_workspace_target("nl_query::pipeline"));
        assert!(is_workspace_target("api::routes::query"));
        assert!(!is_workspace_target("apiary"));
        assert!(!is_workspace_target("sqlx::query"));
    }

    #[test]
    fn directives_cover_every_crate() {
        assert_eq!(level_directives(Level::DEBUG).len(), WORKSPACE_TARGETS.len());
    }
}
