use std::sync::Once;

/// Logger settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter string, e.g. `"sprig_engine=debug,wgpu=warn"`.
    /// Falls back to `RUST_LOG`, then to [`LoggingConfig::default_level`].
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    /// wgpu and naga are chatty at `info`; they are capped here unless the
    /// filter names them.
    pub quiet_gpu: bool,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            quiet_gpu: true,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global `env_logger` logger. Only the first call has effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(config.default_level);

        if config.quiet_gpu {
            for noisy in ["wgpu_core", "wgpu_hal", "naga"] {
                builder.filter_module(noisy, log::LevelFilter::Warn);
            }
        }

        // Explicit filters override the defaults above.
        if let Some(filter) = config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            builder.parse_filters(&filter);
        }

        builder.write_style(config.write_style);
        if builder.try_init().is_err() {
            eprintln!("sprig: a logger was already installed; keeping it");
            return;
        }

        log::debug!("logging initialized");
    });
}
