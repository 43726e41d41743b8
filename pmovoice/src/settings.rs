use std::path::PathBuf;
use std::time::Duration;

/// Operations that exist but stay off unless enabled in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Next / previous item of the receiver queue.
    QueueNavigation,
    /// Turning subtitles on in the configured language.
    SubtitleEnable,
}

impl Feature {
    /// Key under `skill.features` in the configuration.
    pub fn config_key(&self) -> &'static str {
        match self {
            Feature::QueueNavigation => "queue_navigation",
            Feature::SubtitleEnable => "subtitle_enable",
        }
    }
}

/// Values the skill reads once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillSettings {
    /// Seek magnitude when the utterance gives none.
    pub default_duration: Duration,
    /// Device used when neither the utterance nor the preference names one.
    pub fallback_device: Option<String>,
    pub subtitle_language: String,
    pub queue_navigation: bool,
    pub subtitle_enable: bool,
    /// Directory holding the preference file.
    pub data_dir: PathBuf,
    pub discovery_interval: Duration,
    pub discovery_window: Duration,
    /// Bound on the readiness wait after connecting.
    pub connect_timeout: Duration,
}

impl SkillSettings {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::QueueNavigation => self.queue_navigation,
            Feature::SubtitleEnable => self.subtitle_enable,
        }
    }
}

impl Default for SkillSettings {
    fn default() -> Self {
        Self {
            default_duration: Duration::from_secs(30),
            fallback_device: None,
            subtitle_language: "en".to_string(),
            queue_navigation: false,
            subtitle_enable: false,
            data_dir: PathBuf::from("skill_data"),
            discovery_interval: Duration::from_secs(600),
            discovery_window: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
        }
    }
}
