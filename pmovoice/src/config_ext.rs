//! Extension de pmoconfig pour le skill vocal
//!
//! Ce module fournit le trait `VoiceConfigExt` qui ajoute à
//! `pmoconfig::Config` les réglages du skill (durée de seek par défaut,
//! appareil de repli, fonctionnalités optionnelles, répertoire de données).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::Value;
use tracing::warn;

use crate::settings::{Feature, SkillSettings};

const DEFAULT_DURATION_SECS: u64 = 30;
const DEFAULT_SUBTITLE_LANGUAGE: &str = "en";
const DEFAULT_DATA_DIR: &str = "skill_data";

/// Intervalle minimal entre deux passes de découverte mDNS
pub const MIN_DISCOVERY_INTERVAL_SECS: u64 = 30;

/// Trait d'extension pour les réglages du skill dans pmoconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::get_config;
/// use pmovoice::VoiceConfigExt;
///
/// let settings = get_config().skill_settings()?;
/// println!("Seek step: {:?}", settings.default_duration);
/// ```
pub trait VoiceConfigExt {
    /// Durée de seek utilisée quand l'énoncé n'en donne pas
    fn get_default_seek_duration(&self) -> Duration;

    fn set_default_seek_duration(&self, seconds: u64) -> Result<()>;

    /// Appareil utilisé quand ni l'énoncé ni la préférence n'en désignent un
    fn get_fallback_device(&self) -> Option<String>;

    fn get_subtitle_language(&self) -> String;

    /// Indique si une fonctionnalité optionnelle est activée
    fn is_feature_enabled(&self, feature: Feature) -> bool;

    fn set_feature_enabled(&self, feature: Feature, enabled: bool) -> Result<()>;

    /// Répertoire de données du skill, créé s'il n'existe pas
    fn get_skill_data_dir(&self) -> Result<PathBuf>;

    /// Intervalle de rafraîchissement, jamais sous [`MIN_DISCOVERY_INTERVAL_SECS`]
    fn get_discovery_interval(&self) -> Result<Duration>;

    /// Lit tous les réglages du skill d'un coup
    fn skill_settings(&self) -> Result<SkillSettings>;
}

impl VoiceConfigExt for Config {
    fn get_default_seek_duration(&self) -> Duration {
        let secs = self
            .get_u64(&["skill", "default_duration"])
            .unwrap_or(DEFAULT_DURATION_SECS);
        Duration::from_secs(secs)
    }

    fn set_default_seek_duration(&self, seconds: u64) -> Result<()> {
        self.set_value(&["skill", "default_duration"], Value::from(seconds))
    }

    fn get_fallback_device(&self) -> Option<String> {
        self.get_string(&["skill", "fallback_device"])
    }

    fn get_subtitle_language(&self) -> String {
        self.get_string(&["skill", "subtitle_language"])
            .unwrap_or_else(|| DEFAULT_SUBTITLE_LANGUAGE.to_string())
    }

    fn is_feature_enabled(&self, feature: Feature) -> bool {
        self.get_bool(&["skill", "features", feature.config_key()])
            .unwrap_or(false)
    }

    fn set_feature_enabled(&self, feature: Feature, enabled: bool) -> Result<()> {
        self.set_value(
            &["skill", "features", feature.config_key()],
            Value::Bool(enabled),
        )
    }

    fn get_skill_data_dir(&self) -> Result<PathBuf> {
        let dir = self.get_managed_dir(&["skill", "data_dir"], DEFAULT_DATA_DIR)?;
        Ok(PathBuf::from(dir))
    }

    fn get_discovery_interval(&self) -> Result<Duration> {
        let secs = self.get_discovery_interval_secs()?;
        if secs < MIN_DISCOVERY_INTERVAL_SECS {
            warn!(
                configured = secs,
                minimum = MIN_DISCOVERY_INTERVAL_SECS,
                "cast.discovery_interval too short, using the minimum"
            );
            return Ok(Duration::from_secs(MIN_DISCOVERY_INTERVAL_SECS));
        }
        Ok(Duration::from_secs(secs))
    }

    fn skill_settings(&self) -> Result<SkillSettings> {
        Ok(SkillSettings {
            default_duration: self.get_default_seek_duration(),
            fallback_device: self.get_fallback_device(),
            subtitle_language: self.get_subtitle_language(),
            queue_navigation: self.is_feature_enabled(Feature::QueueNavigation),
            subtitle_enable: self.is_feature_enabled(Feature::SubtitleEnable),
            data_dir: self.get_skill_data_dir()?,
            discovery_interval: self.get_discovery_interval()?,
            discovery_window: Duration::from_secs(self.get_discovery_window_secs()?),
            connect_timeout: Duration::from_secs(self.get_connect_timeout_secs()?),
        })
    }
}
