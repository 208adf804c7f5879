use anyhow::{anyhow, Result};
use stampede_config::domains::logging::{LogFormat, LogTarget, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Keeps the non-blocking file writer alive; dropping it flushes pending lines
#[must_use = "dropping the guard stops file logging"]
#[derive(Default)]
pub struct LoggingGuard {
    file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    pub fn has_file_output(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// `RUST_LOG` wins over the configured level when it is set and valid
pub fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    let env_filter = build_env_filter(log_level);

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Initialize logging from configuration
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<LoggingGuard> {
    let mut guard = LoggingGuard::default();
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(config.targets.len());

    for target in &config.targets {
        match target {
            LogTarget::Console => {
                layers.push(fmt_layer(
                    config.format,
                    config.include_location,
                    std::io::stderr,
                    true,
                ));
            }
            LogTarget::File {
                directory,
                file_prefix,
                rotation,
            } => {
                let appender = RollingFileAppender::builder()
                    .rotation(parse_rotation(rotation)?)
                    .filename_prefix(file_prefix.as_str())
                    .build(directory)
                    .map_err(|e| anyhow!("Failed to open log directory {}: {}", directory, e))?;
                let (writer, file_guard) = tracing_appender::non_blocking(appender);
                layers.push(fmt_layer(config.format, config.include_location, writer, false));
                guard.file_guard = Some(file_guard);
            }
        }
    }

    let env_filter = build_env_filter(config.level.as_str());

    if tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(guard)
}

fn fmt_layer<W>(format: LogFormat, include_location: bool, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_file(include_location)
        .with_line_number(include_location);

    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Text => layer.boxed(),
    }
}

fn parse_rotation(rotation: &str) -> Result<Rotation> {
    match rotation.to_lowercase().as_str() {
        "minutely" => Ok(Rotation::MINUTELY),
        "hourly" => Ok(Rotation::HOURLY),
        "daily" => Ok(Rotation::DAILY),
        "never" => Ok(Rotation::NEVER),
        other => Err(anyhow!("Unknown log rotation '{}'", other)),
    }
}
