//! Logging setup on top of the tracing ecosystem.
//!
//! # Environment Variables
//!
//! - `SCRIPTDECK_LOG`: Filter directive (like `RUST_LOG`), e.g., `scriptdeck=debug`
//! - `SCRIPTDECK_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `SCRIPTDECK_LOG_FILE`: Enable daily-rolling JSON file logging (true/false)
//!
//! # Example
//!
//! ```no_run
//! use scriptdeck_core::logging::{self, LoggingConfig};
//!
//! let _guard = logging::init_logging(LoggingConfig::default().with_level("info"))?;
//! # Ok::<(), scriptdeck_core::Error>(())
//! ```

use crate::Error;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    /// Every format, in declaration order.
    pub const VALUES: &[LogFormat] = &[LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    /// Case-insensitive name lookup.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    /// Name accepted by [`Self::parse_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter when neither `SCRIPTDECK_LOG` nor `RUST_LOG` is set.
    pub level: String,
    /// Forced stderr format; detected from the environment and TTY when `None`.
    pub format: Option<LogFormat>,
    /// Directory for rolling log files; file logging is off when `None`.
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: None, file_dir: None }
    }
}

impl LoggingConfig {
    /// `warn` level, detected format, no file logging.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults adjusted for the CLI: `debug` when verbose, file logging into
    /// `log_dir` when `SCRIPTDECK_LOG_FILE` is truthy.
    pub fn from_env(verbose: bool, log_dir: &Path) -> Self {
        let mut config = Self::new();
        if verbose {
            config.level = "debug".to_string();
        }
        let file_enabled = env::var("SCRIPTDECK_LOG_FILE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if file_enabled {
            config.file_dir = Some(log_dir.to_path_buf());
        }
        config
    }

    /// Override the default filter directive.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Force a stderr format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Also write daily rolling JSON logs into `dir`.
    pub fn with_file_logging(mut self, dir: impl Into<PathBuf>) -> Self {
        self.file_dir = Some(dir.into());
        self
    }

    fn build_env_filter(&self) -> EnvFilter {
        let filter = env::var("SCRIPTDECK_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_else(|| self.level.clone());

        EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    fn is_tty() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    fn detect_format(&self) -> LogFormat {
        if let Some(format) = self.format {
            return format;
        }

        if let Ok(fmt_str) = env::var("SCRIPTDECK_LOG_FORMAT")
            && let Some(fmt) = LogFormat::parse_str(&fmt_str)
        {
            return fmt;
        }

        if Self::is_tty() { LogFormat::Pretty } else { LogFormat::Compact }
    }
}

/// Install the global tracing subscriber.
///
/// Returns the file writer guard when file logging is enabled; keep it alive
/// for the life of the process or buffered lines are lost.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>, Error> {
    let env_filter = config.build_env_filter();
    let format = config.detect_format();
    let registry = Registry::default().with(env_filter);

    let stderr_layer = match format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).with_ansi(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).boxed(),
    };

    let (file_layer, guard) = match &config.file_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::Config(format!("Failed to create log directory: {}", e)))?;
            let file_appender = tracing_appender::rolling::daily(dir, "scriptdeck.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (Some(fmt::layer().json().with_writer(non_blocking)), Some(guard))
        }
        None => (None, None),
    };

    registry
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("logging already initialized: {e}")))?;

    Ok(guard)
}

/// Shorten `content` to at most `max_chars` characters for log output.
pub fn truncate_for_log(content: &str, max_chars: usize) -> String {
    let total = content.chars().count();
    if total <= max_chars {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(max_chars).collect();
    truncated.push_str(&format!("... ({} total chars)", total));
    truncated
}

/// Sanitize file paths for logging (home directory shown as `~`).
pub fn sanitize_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }

    path.display().to_string()
}
