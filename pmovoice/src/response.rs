//! Replies handed back to the host, which turns them into speech.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resolver::ResolveError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The operation went through, nothing to say.
    Done,
    /// No device in the utterance and no default to fall back on.
    NoDevice,
    DeviceNotFound { device: String },
    DeviceList { devices: String },
    NoDevicesFound,
    DefaultDeviceSet { device: String },
    CommandFailed { device: String },
    FeatureDisabled { operation: String },
}

/// Wire form of a spoken reply.
#[derive(Debug, Serialize)]
pub struct SpeakMessage {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub dialog: &'static str,
    pub data: BTreeMap<&'static str, String>,
}

impl Reply {
    /// Dialog template id, `None` for a silent reply.
    pub fn dialog(&self) -> Option<&'static str> {
        match self {
            Reply::Done => None,
            Reply::NoDevice => Some("no.device"),
            Reply::DeviceNotFound { .. } => Some("device.not.found"),
            Reply::DeviceList { .. } => Some("device.list"),
            Reply::NoDevicesFound => Some("no.devices.found"),
            Reply::DefaultDeviceSet { .. } => Some("default.device.set"),
            Reply::CommandFailed { .. } => Some("command.failed"),
            Reply::FeatureDisabled { .. } => Some("feature.disabled"),
        }
    }

    /// Template variables.
    pub fn data(&self) -> BTreeMap<&'static str, String> {
        let mut data = BTreeMap::new();
        match self {
            Reply::DeviceNotFound { device }
            | Reply::DefaultDeviceSet { device }
            | Reply::CommandFailed { device } => {
                data.insert("device", device.clone());
            }
            Reply::DeviceList { devices } => {
                data.insert("devices", devices.clone());
            }
            Reply::FeatureDisabled { operation } => {
                data.insert("operation", operation.clone());
            }
            Reply::Done | Reply::NoDevice | Reply::NoDevicesFound => {}
        }
        data
    }

    pub fn to_message(&self) -> Option<SpeakMessage> {
        Some(SpeakMessage {
            msg_type: "speak",
            dialog: self.dialog()?,
            data: self.data(),
        })
    }
}

impl From<ResolveError> for Reply {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoDeviceSpecified => Reply::NoDevice,
            ResolveError::DeviceNotFound(device) => Reply::DeviceNotFound { device },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_is_silent() {
        assert!(Reply::Done.to_message().is_none());
    }

    #[test]
    fn test_device_list_message() {
        let reply = Reply::DeviceList {
            devices: "Living Room, Bedroom".into(),
        };
        let json = serde_json::to_value(reply.to_message().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "speak",
                "dialog": "device.list",
                "data": {"devices": "Living Room, Bedroom"}
            })
        );
    }

    #[test]
    fn test_resolve_errors_map_to_replies() {
        assert_eq!(Reply::from(ResolveError::NoDeviceSpecified), Reply::NoDevice);
        assert_eq!(
            Reply::from(ResolveError::DeviceNotFound("Garage".into())),
            Reply::DeviceNotFound {
                device: "Garage".into()
            }
        );
    }
}
