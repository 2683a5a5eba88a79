//! Tracing subscriber setup: "YYYY-MM-DD HH:MM:SS [LEVEL] message" lines in local time,
//! behind a filter that can be swapped at runtime.

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{reload, EnvFilter};

pub type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;
pub static RELOAD_HANDLE: std::sync::OnceLock<ReloadHandle> = std::sync::OnceLock::new();

pub const VALID_LEVELS: &str = "TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL";

/// Map a user-facing level name to a tracing filter directive.
/// CRITICAL has no tracing equivalent and collapses onto ERROR.
pub fn filter_for(level: &str) -> Option<&'static str> {
    match level.trim().to_lowercase().as_str() {
        "critical" | "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}

/// Pick the filter from, in order: the `--log-level` flag, the `LOG_LEVEL`
/// environment variable, the config file. Falls back to `info`.
pub fn resolve_filter(flag: Option<&str>, env: Option<&str>, config: Option<&str>) -> &'static str {
    for level in [flag, env, config].into_iter().flatten() {
        match filter_for(level) {
            Some(filter) => return filter,
            None => eprintln!("Invalid log level '{}'. Valid levels: {}", level, VALID_LEVELS),
        }
    }
    "info"
}

fn timestamp() -> String {
    #[cfg(unix)]
    {
        // SAFETY: localtime_r only writes into the tm we own
        let tm = unsafe {
            let now = libc::time(std::ptr::null_mut());
            let mut tm: libc::tm = std::mem::zeroed();
            libc::localtime_r(&now, &mut tm);
            tm
        };
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            tm.tm_year + 1900,
            tm.tm_mon + 1,
            tm.tm_mday,
            tm.tm_hour,
            tm.tm_min,
            tm.tm_sec
        )
    }

    #[cfg(not(unix))]
    {
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn level_color(level: &tracing::Level) -> &'static str {
    match *level {
        tracing::Level::TRACE => "\x1b[2m",
        tracing::Level::DEBUG => "\x1b[34m",
        tracing::Level::INFO => "\x1b[32m",
        tracing::Level::WARN => "\x1b[33m",
        tracing::Level::ERROR => "\x1b[31m",
    }
}

pub struct ExporterEventFormat {
    ansi: bool,
}

impl<S, N> FormatEvent<S, N> for ExporterEventFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let level = event.metadata().level();
        if self.ansi {
            write!(writer, "{} {}[{}]\x1b[0m ", timestamp(), level_color(level), level)?;
        } else {
            write!(writer, "{} [{}] ", timestamp(), level)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber. Logs go to stderr so `--check` output stays clean.
pub fn init_tracing(filter: &str) {
    use std::io::IsTerminal;
    use tracing_subscriber::prelude::*;

    let (filter_layer, reload_handle) = reload::Layer::new(EnvFilter::new(filter));
    let ansi = std::io::stderr().is_terminal();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(ExporterEventFormat { ansi }),
        )
        .init();

    let _ = RELOAD_HANDLE.set(reload_handle);
}

/// Swap the active filter, e.g. after the config file changed.
pub fn reload_level(level: &str) -> Result<&'static str> {
    let filter = filter_for(level)
        .ok_or_else(|| anyhow!("Invalid log level '{}'. Valid levels: {}", level, VALID_LEVELS))?;
    let handle = RELOAD_HANDLE
        .get()
        .ok_or_else(|| anyhow!("Logging is not initialized"))?;
    handle.reload(EnvFilter::new(filter))?;
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_map_to_filters() {
        assert_eq!(filter_for("CRITICAL"), Some("error"));
        assert_eq!(filter_for("Warn"), Some("warn"));
        assert_eq!(filter_for(" debug "), Some("debug"));
        assert_eq!(filter_for("verbose"), None);
    }

    #[test]
    fn flag_beats_env_and_config() {
        assert_eq!(resolve_filter(Some("debug"), Some("warn"), Some("ERROR")), "debug");
        assert_eq!(resolve_filter(None, Some("warn"), Some("ERROR")), "warn");
        assert_eq!(resolve_filter(None, None, Some("ERROR")), "error");
        assert_eq!(resolve_filter(None, None, None), "info");
    }

    #[test]
    fn invalid_level_falls_through() {
        assert_eq!(resolve_filter(Some("loud"), None, Some("TRACE")), "trace");
    }

    #[test]
    fn timestamp_is_fixed_width() {
        let ts = timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }
}
