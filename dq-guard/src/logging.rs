//! Logging configuration for dq-guard.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the
//! application. [`setup::init_logging`] is a convenience for binaries and tests.

/// Controls how chatty the pipeline and the constraint engine are.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether every constraint outcome is logged at debug level
    pub log_constraint_details: bool,
    /// Whether table scans and report writes are logged at info level
    pub log_table_operations: bool,
    /// Whether computed metrics are logged at debug level
    pub log_metrics: bool,
    /// Maximum length for logged values such as sample violations
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_constraint_details: false,
            log_table_operations: true,
            log_metrics: false,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Logs everything, with long field values.
    pub fn verbose() -> Self {
        Self {
            log_constraint_details: true,
            log_table_operations: true,
            log_metrics: true,
            max_field_length: 1024,
        }
    }

    /// Warnings and errors only.
    pub fn production() -> Self {
        Self {
            log_constraint_details: false,
            log_table_operations: false,
            log_metrics: false,
            max_field_length: 128,
        }
    }
}

/// Logs a table-level operation when `log_table_operations` is enabled.
#[macro_export]
macro_rules! log_table_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_table_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Logs a constraint outcome when `log_constraint_details` is enabled.
#[macro_export]
macro_rules! log_constraint {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_constraint_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a value to at most `max_length` characters.
///
/// Counts characters, not bytes, so multi-byte names are never split.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    match value.char_indices().nth(max_length) {
        None => value.to_string(),
        Some((byte_idx, _)) => format!("{}...(truncated)", &value[..byte_idx]),
    }
}

/// Subscriber installation helpers.
pub mod setup {
    use tracing::Level;

    /// Subscriber settings for applications embedding dq-guard.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside dq-guard
        pub level: Level,
        /// Log level for dq-guard itself
        pub guard_level: Level,
        /// Emit JSON lines instead of human readable output
        pub json_format: bool,
        /// Overrides the generated filter directive
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                guard_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// JSON output, warnings from dependencies, info from dq-guard.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                guard_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Human readable debug output.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                guard_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_guard_level(mut self, level: Level) -> Self {
            self.guard_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the filter directive, e.g. `info,dq_guard=debug`.
        pub fn env_filter(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},dq_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.guard_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs a global `tracing` subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured directive. Fails if a
    /// global subscriber is already installed.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use dq_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::production()).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}
