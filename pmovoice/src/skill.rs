//! The skill: wires discovery, name resolution, preferences and the
//! dispatcher together.

use std::sync::Arc;

use pmocast::{CastConnector, CastDiscovery};
use tracing::{debug, info, warn};

use crate::dispatcher::CommandDispatcher;
use crate::error::Result;
use crate::intent::{HostMessage, Intent};
use crate::preferences::PreferenceCache;
use crate::refresh::{DiscoveryWorker, VocabularySink, refresh_once};
use crate::resolver::NameResolver;
use crate::response::Reply;
use crate::settings::SkillSettings;

pub struct ChromecastSkill {
    settings: SkillSettings,
    resolver: Arc<NameResolver>,
    discovery: Arc<dyn CastDiscovery>,
    vocabulary: Arc<dyn VocabularySink>,
    dispatcher: CommandDispatcher,
    worker: Option<DiscoveryWorker>,
}

impl ChromecastSkill {
    pub fn new(
        settings: SkillSettings,
        discovery: Arc<dyn CastDiscovery>,
        connector: Arc<dyn CastConnector>,
        vocabulary: Arc<dyn VocabularySink>,
    ) -> Self {
        let resolver = Arc::new(NameResolver::new());
        let preferences = PreferenceCache::in_dir(&settings.data_dir);
        let dispatcher = CommandDispatcher::new(
            resolver.clone(),
            connector,
            preferences,
            settings.clone(),
        );

        Self {
            settings,
            resolver,
            discovery,
            vocabulary,
            dispatcher,
            worker: None,
        }
    }

    /// First discovery pass, then the periodic worker.
    ///
    /// A failed first pass is not fatal: the skill starts with no devices
    /// and the worker tries again later.
    pub fn initialize(&mut self) -> Result<()> {
        if let Err(err) = self.refresh_devices() {
            warn!(error = %err, "Initial discovery failed");
        }

        if self.worker.is_none() {
            let worker = DiscoveryWorker::spawn(
                self.discovery.clone(),
                self.resolver.clone(),
                self.vocabulary.clone(),
                self.settings.discovery_interval,
            )?;
            self.worker = Some(worker);
        }

        info!(
            devices = self.resolver.snapshot().len(),
            interval_secs = self.settings.discovery_interval.as_secs(),
            "Chromecast skill ready"
        );
        Ok(())
    }

    pub fn handle(&mut self, intent: &Intent) -> Reply {
        debug!(intent = intent.kind.name(), slots = ?intent.slots, "Handling intent");
        self.dispatcher.dispatch(intent)
    }

    /// Parses one host message and handles it.
    pub fn handle_message(&mut self, line: &str) -> Result<Reply> {
        let message = HostMessage::parse(line)?;
        let intent = Intent::try_from(message)?;
        Ok(self.handle(&intent))
    }

    /// Runs a discovery pass right now.
    pub fn refresh_devices(&self) -> Result<usize> {
        Ok(refresh_once(
            self.discovery.as_ref(),
            &self.resolver,
            self.vocabulary.as_ref(),
        )?)
    }

    /// Display names currently known, in discovery order.
    pub fn known_devices(&self) -> Vec<String> {
        self.resolver.snapshot().names()
    }

    pub fn resolver(&self) -> &Arc<NameResolver> {
        &self.resolver
    }

    pub fn preferences(&mut self) -> &mut PreferenceCache {
        self.dispatcher.preferences()
    }

    pub fn shutdown(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
            info!("Chromecast skill stopped");
        }
    }
}

impl Drop for ChromecastSkill {
    fn drop(&mut self) {
        self.shutdown();
    }
}
