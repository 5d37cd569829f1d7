// Logging for Troupe
//
// A thin layer over the `tracing` ecosystem. Actors and troupes emit
// structured events through the macros below; applications choose how those
// events are rendered by calling one of the initializers once at startup.
//
// # Usage Examples
//
// ```rust
// use troupe::logging;
//
// // INFO level, human-readable console output
// logging::init_default();
//
// // Or a custom configuration
// let config = logging::LogConfig {
//     level: tracing::Level::DEBUG,
//     json_format: true,
//     ..Default::default()
// };
// logging::init(config);
// ```
//
// `RUST_LOG` is honoured on top of the configured level, so
// `RUST_LOG=troupe=trace` turns on dispatch decisions without a rebuild.

use std::io;
use std::sync::Once;
use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the Troupe logging system
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id; actor threads are named after their actor
    pub show_thread_info: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl LogConfig {
    /// DEBUG level, with TRACE for dispatch decisions
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            target_filters: Some("troupe=debug,troupe::roster=trace,troupe::pool=trace".to_string()),
            ..Default::default()
        }
    }

    /// INFO level JSON output without file/line information
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            show_file_line: false,
            show_thread_info: true,
            target_filters: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            target_filters: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env().add_directive(config.level.into());
    if let Some(filters) = &config.target_filters {
        for directive in filters.split(',') {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

/// Build a subscriber for `config` that writes to `writer`
///
/// `init` installs one of these globally on stdout; tests and embedders can
/// scope it with `tracing::subscriber::with_default` instead.
pub fn build_subscriber<W>(config: &LogConfig, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(env_filter(config));

    if config.json_format {
        Box::new(
            registry.with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_file(config.show_file_line)
                    .with_line_number(config.show_file_line)
                    .with_thread_names(config.show_thread_info)
                    .with_writer(writer),
            ),
        )
    } else {
        Box::new(
            registry.with(
                fmt::layer()
                    .with_ansi(atty::is(atty::Stream::Stdout))
                    .with_file(config.show_file_line)
                    .with_line_number(config.show_file_line)
                    .with_thread_names(config.show_thread_info)
                    .with_thread_ids(config.show_thread_info)
                    .with_writer(writer),
            ),
        )
    }
}

/// Initialize the logging system with the given configuration
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        set_global_subscriber(build_subscriber(&config, io::stdout));
    });
}

// Helper function to set the global subscriber
fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Open `path` in append mode, creating it if needed
pub fn file_writer(path: &str) -> io::Result<Box<dyn io::Write + Send + Sync + 'static>> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Box::new(file))
}

/// Initialize logging with both console and file output
///
/// The file is opened up front so that a bad path is reported to the caller
/// instead of silently falling back to stderr.
pub fn init_with_file(config: LogConfig, log_file: &str) -> io::Result<()> {
    // Fail early on an unusable path
    file_writer(log_file)?;

    INIT.call_once(|| {
        let console_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let log_file_path = log_file.to_string();
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || match file_writer(&log_file_path) {
                Ok(writer) => writer,
                Err(_) => Box::new(io::stderr()),
            })
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// INFO level with human-readable console output
pub fn init_default() {
    init(LogConfig::default());
}

/// See [`LogConfig::development`]
pub fn init_development() {
    init(LogConfig::development());
}

/// See [`LogConfig::production`]
pub fn init_production() {
    init(LogConfig::production());
}

/// Warnings and errors only, to keep test output clean
///
/// Call it at the top of a test; repeated calls across tests are no-ops.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        target_filters: None,
    });
}

/// Log actor lifecycle events
///
/// ```rust
/// use troupe::log_lifecycle;
///
/// log_lifecycle!("actor", 7, "started");
/// log_lifecycle!("actor", 7, "draining", queued = 3);
/// ```
#[macro_export]
macro_rules! log_lifecycle {
    ($kind:expr, $id:expr, $event:expr) => {
        tracing::info!(kind = $kind, id = %$id, event = $event);
    };
    ($kind:expr, $id:expr, $event:expr, $($fields:tt)*) => {
        tracing::info!(kind = $kind, id = %$id, event = $event, $($fields)*);
    };
}

/// Log dispatch decisions
///
/// ```rust
/// use troupe::log_scheduler;
///
/// log_scheduler!("dynamic", "assigned_idle");
/// log_scheduler!("dynamic", "grew", population = 3);
/// ```
#[macro_export]
macro_rules! log_scheduler {
    ($mode:expr, $event:expr) => {
        tracing::trace!(mode = $mode, event = $event);
    };
    ($mode:expr, $event:expr, $($fields:tt)*) => {
        tracing::trace!(mode = $mode, event = $event, $($fields)*);
    };
}

/// Log error events
///
/// ```rust
/// use troupe::log_error;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "boom");
/// log_error!(error, actor = 3);
/// ```
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        tracing::error!(error = %$error);
    };
    ($error:expr, $($fields:tt)*) => {
        tracing::error!(error = %$error, $($fields)*);
    };
}

/// Get the current tracing dispatcher
///
/// Actor threads install the dispatcher that was current when they were
/// spawned, so a scoped subscriber (e.g. in a test) also sees their events.
#[inline]
pub fn current_subscriber() -> tracing::Dispatch {
    tracing::dispatcher::get_default(|d| d.clone())
}
