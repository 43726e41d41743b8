// logging.rs
//
// stdout porte les réponses JSON vers l'hôte : les logs vont sur stderr.

use pmoconfig::Config;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Convertit le niveau lu dans la configuration ("info", "WARN", ...)
pub fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// Filtre par défaut : `host.logger.min_level`, remplacé par `RUST_LOG` si
/// la variable est définie.
pub fn build_filter(config: &Config) -> EnvFilter {
    let level = config
        .get_log_min_level()
        .ok()
        .and_then(|l| string_to_level(&l))
        .unwrap_or(Level::INFO);

    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Installe le subscriber global. Sans effet si un subscriber est déjà en
/// place.
pub fn init_logging(config: &Config) {
    let enable_console = config.get_log_enable_console().unwrap_or(true);

    let subscriber = Registry::default().with(build_filter(config));

    let result = if enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(err) = result {
        eprintln!("Logging already initialized: {}", err);
    }
}
