use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use pmocast::{MdnsDiscovery, RustCastConnector};
use pmoconfig::{Config, get_config};
use pmovoice::{ChromecastSkill, JsonLineWriter, VoiceConfigExt, bridge, logging};
use tracing::info;

fn main() -> Result<()> {
    // Un répertoire de configuration explicite peut être passé en argument
    let config = match std::env::args().nth(1) {
        Some(dir) => Arc::new(
            Config::load_config(&dir)
                .with_context(|| format!("Cannot load configuration from {}", dir))?,
        ),
        None => get_config(),
    };

    logging::init_logging(&config);

    let settings = config.skill_settings()?;
    info!(
        config_dir = %config.directory(),
        data_dir = %settings.data_dir.display(),
        "Starting pmovoice"
    );

    let output = Arc::new(JsonLineWriter::new(io::stdout()));
    let mut skill = ChromecastSkill::new(
        settings.clone(),
        Arc::new(MdnsDiscovery::new(settings.discovery_window)),
        Arc::new(RustCastConnector::new()),
        output.clone(),
    );
    skill.initialize()?;

    let stdin = io::stdin();
    bridge::run(&mut skill, stdin.lock(), &output)?;

    skill.shutdown();
    Ok(())
}
