//! Discovery and remote control of Google Cast receivers.
//!
//! Receivers are found over mDNS (`_googlecast._tcp.local`) and driven over
//! the Cast protocol with `rust_cast`. Both sides sit behind traits
//! ([`CastDiscovery`], [`CastConnector`], [`MediaController`]) so callers can
//! swap the network for something else.

pub mod chromecast;
pub mod controller;
pub mod discovery;
pub mod errors;

use std::fmt;

pub use chromecast::RustCastConnector;
pub use controller::{CastConnector, ControllerGuard, MediaController};
pub use discovery::{CastDiscovery, MdnsDiscovery};
pub use errors::CastError;

/// Default Chromecast port.
pub const DEFAULT_CHROMECAST_PORT: u16 = 8009;

/// A receiver found on the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Name used for lookups and spoken output.
    pub display_name: String,
    /// Name the control layer designates the device with.
    pub canonical_name: String,
    pub uuid: String,
    pub host: String,
    pub port: u16,
    pub model: Option<String>,
}

impl DeviceRecord {
    /// Builds a record whose display and canonical names are the advertised
    /// friendly name.
    pub fn new(friendly_name: &str, uuid: &str, host: &str, port: u16) -> Self {
        Self {
            display_name: friendly_name.to_string(),
            canonical_name: friendly_name.to_string(),
            uuid: uuid.to_string(),
            host: host.to_string(),
            port,
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.display_name, self.host, self.port)
    }
}
