//! One intent, one operation.
//!
//! Device operations go through `resolve -> connect and wait -> execute ->
//! teardown`. Teardown is the drop of the [`ControllerGuard`], so it happens
//! on every path out of [`CommandDispatcher::dispatch`] once a connection
//! exists. Listing and setting the default device never connect.

use std::sync::Arc;

use pmocast::{CastConnector, CastError, ControllerGuard, DeviceRecord};
use tracing::{debug, error, info, warn};

use crate::duration::extract_duration;
use crate::intent::{Intent, IntentKind};
use crate::preferences::PreferenceCache;
use crate::resolver::{NameResolver, ResolveError};
use crate::response::Reply;
use crate::settings::SkillSettings;

/// Absolute position for a relative seek, never before the start.
pub fn seek_target(current: f64, offset: f64) -> f64 {
    (current + offset).max(0.0)
}

pub struct CommandDispatcher {
    resolver: Arc<NameResolver>,
    connector: Arc<dyn CastConnector>,
    preferences: PreferenceCache,
    settings: SkillSettings,
}

impl CommandDispatcher {
    pub fn new(
        resolver: Arc<NameResolver>,
        connector: Arc<dyn CastConnector>,
        preferences: PreferenceCache,
        settings: SkillSettings,
    ) -> Self {
        Self {
            resolver,
            connector,
            preferences,
            settings,
        }
    }

    pub fn preferences(&mut self) -> &mut PreferenceCache {
        &mut self.preferences
    }

    pub fn dispatch(&mut self, intent: &Intent) -> Reply {
        if let Some(feature) = intent.kind.feature() {
            if !self.settings.is_enabled(feature) {
                info!(intent = intent.kind.name(), ?feature, "Operation disabled");
                return Reply::FeatureDisabled {
                    operation: intent.kind.name().to_string(),
                };
            }
        }

        match intent.kind {
            IntentKind::ListDevices => self.list_devices(),
            IntentKind::SetDefaultDevice => self.set_default_device(intent),
            _ => self.run_on_device(intent),
        }
    }

    fn list_devices(&self) -> Reply {
        let names = self.resolver.snapshot().names();
        if names.is_empty() {
            return Reply::NoDevicesFound;
        }
        Reply::DeviceList {
            devices: names.join(", "),
        }
    }

    fn set_default_device(&mut self, intent: &Intent) -> Reply {
        let Some(spoken) = intent.device() else {
            return Reply::NoDevice;
        };

        let device = match self.resolver.resolve(spoken) {
            Ok(device) => device,
            Err(err) => {
                // Nothing is written for a name we could not resolve.
                warn!(device = spoken, error = %err, "Cannot set default device");
                return Reply::from(err);
            }
        };

        match self.preferences.set(&device.canonical_name) {
            Ok(()) => Reply::DefaultDeviceSet {
                device: device.display_name,
            },
            Err(err) => {
                error!(device = %device.canonical_name, error = %err, "Failed to save default device");
                Reply::CommandFailed {
                    device: device.display_name,
                }
            }
        }
    }

    fn resolve_target(&mut self, intent: &Intent) -> Result<DeviceRecord, ResolveError> {
        let default = self
            .preferences
            .get()
            .or_else(|| self.settings.fallback_device.clone());
        self.resolver
            .resolve_or_default(intent.device(), default.as_deref())
    }

    fn run_on_device(&mut self, intent: &Intent) -> Reply {
        let device = match self.resolve_target(intent) {
            Ok(device) => device,
            Err(err) => {
                info!(intent = intent.kind.name(), error = %err, "No target device");
                return Reply::from(err);
            }
        };

        let mut controller = match self
            .connector
            .connect(&device, self.settings.connect_timeout)
        {
            Ok(controller) => controller,
            Err(err) => {
                error!(device = %device, error = %err, "Connection failed, command aborted");
                return Reply::CommandFailed {
                    device: device.display_name,
                };
            }
        };

        let result = self.execute(intent, &mut controller);
        drop(controller);

        match result {
            Ok(()) => {
                info!(intent = intent.kind.name(), device = %device.display_name, "Command done");
                Reply::Done
            }
            Err(err) => {
                error!(intent = intent.kind.name(), device = %device.display_name, error = %err, "Command failed");
                Reply::CommandFailed {
                    device: device.display_name,
                }
            }
        }
    }

    fn execute(&self, intent: &Intent, controller: &mut ControllerGuard) -> Result<(), CastError> {
        debug!(intent = intent.kind.name(), device = controller.device(), "Executing");
        match intent.kind {
            IntentKind::Pause => controller.pause(),
            IntentKind::Play => controller.play(),
            IntentKind::SeekRelative => {
                let magnitude = extract_duration(&intent.utterance_remainder)
                    .unwrap_or(self.settings.default_duration);
                let offset = intent.seek_direction() * magnitude.as_secs_f64();
                let current = controller.current_time()?;
                let target = seek_target(current, offset);
                info!(device = controller.device(), offset, target, "Seek");
                controller.seek(target)
            }
            IntentKind::Beginning => controller.rewind(),
            IntentKind::SubtitlesDisable => controller.disable_subtitles(),
            IntentKind::SubtitlesEnable => {
                controller.enable_subtitles(&self.settings.subtitle_language)
            }
            IntentKind::Next => controller.queue_next(),
            IntentKind::Previous => controller.queue_prev(),
            IntentKind::ListDevices | IntentKind::SetDefaultDevice => {
                Err(CastError::unsupported(intent.kind.name()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seek_target() {
        assert_eq!(seek_target(100.0, 30.0), 130.0);
        assert_eq!(seek_target(100.0, -10.0), 90.0);
        assert_eq!(seek_target(5.0, -30.0), 0.0);
    }
}
