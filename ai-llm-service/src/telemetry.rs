//! Tracing setup shared by the binary and the workspace crates.
//!
//! - RFC3339 UTC timestamps via `chrono`
//! - Compact single-line format with `file:line` and target
//! - ANSI colors only when stdout is a terminal
//! - `RUST_LOG` wins; otherwise a default filter is used

use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Targets of the workspace crates, used for per-crate level directives.
pub const WORKSPACE_TARGETS: &[&str] = &[
    "spec_rag",
    "ai_llm_service",
    "spec_chunker",
    "rag_store",
    "contextor",
    "rag_eval",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let s = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Formatting layer for the whole process.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(io::stdout().is_terminal())
        .event_format(fmt::format().compact().with_source_location(true))
}

/// Level directives for every workspace crate, e.g. `rag_store=debug`.
///
/// Targets that fail to parse are skipped.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let lvl = level.as_str().to_lowercase();
    WORKSPACE_TARGETS
        .iter()
        .filter_map(|t| Directive::from_str(&format!("{t}={lvl}")).ok())
        .collect()
}

/// `RUST_LOG` if set, otherwise `default` with the workspace crates raised to `level`.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => level_directives(level)
            .into_iter()
            .fold(EnvFilter::new(default), EnvFilter::add_directive),
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init(default: &str, level: Level) {
    let _ = tracing_subscriber::registry()
        .with(env_filter_with_level(default, level))
        .with(layer())
        .try_init();
}
