use chrono::Utc;
use clap::ValueEnum;
use serde_json::json;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Verbose,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn priority(self) -> u8 {
        match self {
            LogLevel::Trace => 0,
            LogLevel::Verbose => 1,
            LogLevel::Debug => 2,
            LogLevel::Info => 3,
            LogLevel::Warning => 4,
            LogLevel::Error => 5,
            LogLevel::Critical => 6,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LogLevel,
    pub json_output: bool,
    pub json_only: bool,
}

impl LoggerConfig {
    fn enabled(&self, level: LogLevel) -> bool {
        level.priority() >= self.level.priority()
    }
}

static LOGGER: OnceLock<LoggerConfig> = OnceLock::new();

pub fn init(config: LoggerConfig) {
    let _ = LOGGER.set(config);
}

/// Writes one log event to stderr, as a JSON line when `--json-output` is set.
pub fn log(
    level: LogLevel,
    event: &str,
    message: impl AsRef<str>,
    context: Option<serde_json::Value>,
) {
    let Some(config) = LOGGER.get() else {
        return;
    };
    if !config.enabled(level) {
        return;
    }
    if config.json_output {
        eprintln!("{}", json_line(level, event, message.as_ref(), context));
        return;
    }

    if config.json_only {
        return;
    }

    match context {
        Some(context) => eprintln!(
            "[{}] {}: {} {}",
            level.as_str(),
            event,
            message.as_ref(),
            context
        ),
        None => eprintln!("[{}] {}: {}", level.as_str(), event, message.as_ref()),
    }
}

pub fn info(event: &str, message: impl AsRef<str>, context: Option<serde_json::Value>) {
    log(LogLevel::Info, event, message, context);
}

pub fn warning(event: &str, message: impl AsRef<str>) {
    log(LogLevel::Warning, event, message, None);
}

pub fn error(event: &str, message: impl AsRef<str>) {
    log(LogLevel::Error, event, message, None);
}

fn json_line(
    level: LogLevel,
    event: &str,
    message: &str,
    context: Option<serde_json::Value>,
) -> String {
    json!({
        "ts": Utc::now().to_rfc3339(),
        "level": level.as_str(),
        "event": event,
        "message": message,
        "context": context,
    })
    .to_string()
}
