//! Intents handed over by the host recognizer.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::SkillError;
use crate::settings::Feature;

/// Slot carrying the spoken device name.
pub const DEVICE_SLOT: &str = "Device";
pub const FORWARD_SLOT: &str = "Forward";
pub const BACKWARD_SLOT: &str = "Backward";
/// Key of the free text left over once the slots were matched.
pub const REMAINDER_KEY: &str = "utterance_remainder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Pause,
    Play,
    SeekRelative,
    Beginning,
    SubtitlesDisable,
    SubtitlesEnable,
    Next,
    Previous,
    ListDevices,
    SetDefaultDevice,
}

impl IntentKind {
    pub const ALL: [IntentKind; 10] = [
        IntentKind::Pause,
        IntentKind::Play,
        IntentKind::SeekRelative,
        IntentKind::Beginning,
        IntentKind::SubtitlesDisable,
        IntentKind::SubtitlesEnable,
        IntentKind::Next,
        IntentKind::Previous,
        IntentKind::ListDevices,
        IntentKind::SetDefaultDevice,
    ];

    /// Intent name as registered with the host.
    pub fn name(&self) -> &'static str {
        match self {
            IntentKind::Pause => "PauseChromecast",
            IntentKind::Play => "PlayChromecast",
            IntentKind::SeekRelative => "SeekRelativeChromecast",
            IntentKind::Beginning => "BeginningChromecast",
            IntentKind::SubtitlesDisable => "SubtitlesDisableChromecast",
            IntentKind::SubtitlesEnable => "SubtitlesEnableChromecast",
            IntentKind::Next => "NextChromecast",
            IntentKind::Previous => "PreviousChromecast",
            IntentKind::ListDevices => "ListChromecasts",
            IntentKind::SetDefaultDevice => "SetDefaultChromecast",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Flag the operation is gated behind, if any.
    pub fn feature(&self) -> Option<Feature> {
        match self {
            IntentKind::Next | IntentKind::Previous => Some(Feature::QueueNavigation),
            IntentKind::SubtitlesEnable => Some(Feature::SubtitleEnable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub kind: IntentKind,
    pub slots: HashMap<String, String>,
    pub utterance_remainder: String,
}

impl Intent {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            slots: HashMap::new(),
            utterance_remainder: String::new(),
        }
    }

    pub fn with_slot(mut self, name: &str, value: &str) -> Self {
        self.slots.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_device(self, device: &str) -> Self {
        self.with_slot(DEVICE_SLOT, device)
    }

    pub fn with_remainder(mut self, text: &str) -> Self {
        self.utterance_remainder = text.to_string();
        self
    }

    /// The spoken device name, if one was given.
    pub fn device(&self) -> Option<&str> {
        self.slots
            .get(DEVICE_SLOT)
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
    }

    /// `1.0` when the `Forward` slot matched, `-1.0` otherwise.
    pub fn seek_direction(&self) -> f64 {
        if self.slots.contains_key(FORWARD_SLOT) {
            1.0
        } else {
            -1.0
        }
    }
}

/// A message as the host bridge sends it: the intent name in `type` and the
/// matched slots in `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct HostMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub data: HashMap<String, Value>,
}

impl HostMessage {
    pub fn parse(line: &str) -> Result<Self, SkillError> {
        Ok(serde_json::from_str(line)?)
    }
}

impl TryFrom<HostMessage> for Intent {
    type Error = SkillError;

    fn try_from(message: HostMessage) -> Result<Self, Self::Error> {
        let kind = IntentKind::from_name(&message.msg_type)
            .ok_or_else(|| SkillError::UnknownIntent(message.msg_type.clone()))?;

        let mut intent = Intent::new(kind);
        for (key, value) in message.data {
            let text = match value {
                Value::String(s) => s,
                Value::Null => continue,
                other => other.to_string(),
            };
            if key == REMAINDER_KEY {
                intent.utterance_remainder = text;
            } else {
                intent.slots.insert(key, text);
            }
        }
        Ok(intent)
    }
}
