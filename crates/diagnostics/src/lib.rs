//! Logging setup shared by every geotally crate
//!
//! Output goes to stderr through `emit_term`. The level comes from the
//! `GEOTALLY_LOG` environment variable:
//! - `GEOTALLY_LOG=off` (default) - silent
//! - `GEOTALLY_LOG=error` / `warn` - problems only
//! - `GEOTALLY_LOG=info` - registrations, query counts, row totals
//! - `GEOTALLY_LOG=debug` - rendered SQL and per-batch details

use std::sync::Once;

// Re-export emit so the macros below resolve from any crate
pub use emit;

/// Environment variable that selects the log level
pub const LOG_ENV: &str = "GEOTALLY_LOG";

static INIT: Once = Once::new();

/// Parsed value of [`LOG_ENV`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Parse a level name. Unknown names fall back to `Info` and are
    /// reported as `Err` so the caller can warn about them.
    pub fn parse(value: &str) -> Result<Self, Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "off" => Ok(LogLevel::Off),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(LogLevel::Info),
        }
    }

    fn min_level(self) -> Option<emit::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(emit::Level::Error),
            LogLevel::Warn => Some(emit::Level::Warn),
            LogLevel::Info => Some(emit::Level::Info),
            LogLevel::Debug => Some(emit::Level::Debug),
        }
    }
}

/// Initialize logging from `GEOTALLY_LOG`.
///
/// Safe to call more than once; only the first call has any effect.
pub fn init_diagnostics() {
    let raw = std::env::var(LOG_ENV).unwrap_or_default();
    match LogLevel::parse(&raw) {
        Ok(level) => init_with_level(level),
        Err(fallback) => {
            init_with_level(fallback);
            emit::warn!("Unknown {env} value {raw}, using info", env: LOG_ENV, raw: &raw);
        }
    }
}

/// Initialize logging at an explicit level, ignoring the environment
pub fn init_with_level(level: LogLevel) {
    INIT.call_once(|| {
        let Some(min) = level.min_level() else {
            return;
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(min))
            .init();

        // The runtime must live for the rest of the process.
        std::mem::forget(rt);
    });
}

/// Routine progress: registrations, queries issued, rows produced
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Detail for debugging: rendered SQL, batch sizes, sniffed delimiters
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Recoverable oddities, e.g. a session dropped without an explicit close
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Failures about to be returned to the caller
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}

pub use init_diagnostics as init;
