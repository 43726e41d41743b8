//! Chromecast device discovery via mDNS.
//!
//! Chromecast devices advertise themselves using mDNS (Multicast DNS) on the
//! `_googlecast._tcp.local` service. A discovery pass listens for answers
//! during a fixed window and turns them into [`DeviceRecord`]s.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use futures_util::{pin_mut, stream::StreamExt};
use tracing::{debug, info, warn};

use crate::errors::CastError;
use crate::{DEFAULT_CHROMECAST_PORT, DeviceRecord};

/// Service advertised by Cast receivers.
pub const SERVICE_NAME: &str = "_googlecast._tcp.local";

/// How often the mDNS query is re-sent during a discovery window.
const QUERY_INTERVAL: Duration = Duration::from_secs(1);

/// Source of the set of receivers currently on the network.
pub trait CastDiscovery: Send + Sync {
    /// Runs one discovery pass and returns every receiver seen, in discovery
    /// order.
    fn discover(&self) -> Result<Vec<DeviceRecord>, CastError>;
}

/// mDNS browser for `_googlecast._tcp.local`.
#[derive(Clone, Debug)]
pub struct MdnsDiscovery {
    window: Duration,
}

impl MdnsDiscovery {
    /// `window` is how long a pass listens for answers.
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

impl CastDiscovery for MdnsDiscovery {
    fn discover(&self) -> Result<Vec<DeviceRecord>, CastError> {
        let mut found = DiscoveredSet::default();

        async_std::task::block_on(async {
            let discovery = mdns::discover::all(SERVICE_NAME, QUERY_INTERVAL)
                .map_err(|e| CastError::Discovery(format!("{:?}", e)))?;
            let stream = discovery.listen();
            pin_mut!(stream);

            let collect = async {
                while let Some(response) = stream.next().await {
                    match response {
                        Ok(response) => {
                            if let Some(record) = ServiceAnswer::from_response(&response).into_record() {
                                found.insert(record);
                            }
                        }
                        Err(err) => warn!(error = ?err, "Invalid mDNS response"),
                    }
                }
            };

            // The stream never ends by itself, the window bounds the pass.
            let _ = async_std::future::timeout(self.window, collect).await;
            Ok::<(), CastError>(())
        })?;

        let devices = found.into_vec();
        info!(count = devices.len(), "Chromecast discovery pass finished");
        Ok(devices)
    }
}

/// Records collected during one pass, deduplicated by uuid.
#[derive(Default, Debug)]
pub(crate) struct DiscoveredSet {
    devices: Vec<DeviceRecord>,
}

impl DiscoveredSet {
    /// A later answer for a known uuid replaces the record in place.
    pub(crate) fn insert(&mut self, record: DeviceRecord) {
        match self.devices.iter_mut().find(|d| d.uuid == record.uuid) {
            Some(existing) => *existing = record,
            None => self.devices.push(record),
        }
    }

    pub(crate) fn into_vec(self) -> Vec<DeviceRecord> {
        self.devices
    }
}

/// The parts of an mDNS answer a receiver is built from.
#[derive(Default, Debug, Clone)]
pub(crate) struct ServiceAnswer {
    pub service_name: Option<String>,
    pub addresses: Vec<IpAddr>,
    pub port: Option<u16>,
    pub txt: Vec<String>,
}

impl ServiceAnswer {
    fn from_response(response: &mdns::Response) -> Self {
        let mut answer = ServiceAnswer::default();
        for record in response.records() {
            match record.kind {
                mdns::RecordKind::PTR(ref name) if answer.service_name.is_none() => {
                    answer.service_name = Some(name.clone());
                }
                mdns::RecordKind::A(addr) => answer.addresses.push(IpAddr::V4(addr)),
                mdns::RecordKind::AAAA(addr) => answer.addresses.push(IpAddr::V6(addr)),
                mdns::RecordKind::SRV { port, .. } if answer.port.is_none() => {
                    answer.port = Some(port);
                }
                mdns::RecordKind::TXT(ref data) => answer.txt.extend(data.iter().cloned()),
                _ => {}
            }
        }
        answer
    }

    pub(crate) fn into_record(self) -> Option<DeviceRecord> {
        let service_name = match self.service_name {
            Some(name) => name,
            None => {
                warn!("No PTR record found in mDNS response");
                return None;
            }
        };

        // Prefer IPv4 addresses
        let host = match self
            .addresses
            .iter()
            .find(|addr| addr.is_ipv4())
            .or_else(|| self.addresses.first())
        {
            Some(addr) => addr.to_string(),
            None => {
                warn!(service = %service_name, "No IP address found for Chromecast device");
                return None;
            }
        };

        let port = self.port.unwrap_or(DEFAULT_CHROMECAST_PORT);
        let txt = parse_txt_entries(&self.txt);

        let uuid = txt
            .get("id")
            .cloned()
            .unwrap_or_else(|| format!("chromecast-{}-{}", host, port));
        let friendly_name = txt
            .get("fn")
            .cloned()
            .unwrap_or_else(|| friendly_name_from_service(&service_name));

        debug!(
            "Discovered Chromecast: {} at {}:{} (UUID: {}, Model: {:?})",
            friendly_name,
            host,
            port,
            uuid,
            txt.get("md")
        );

        Some(DeviceRecord::new(&friendly_name, &uuid, &host, port).with_model(txt.get("md").cloned()))
    }
}

/// Splits `key=value` TXT strings. Entries without `=` are ignored.
pub(crate) fn parse_txt_entries(entries: &[String]) -> HashMap<String, String> {
    entries
        .iter()
        .filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Friendly name from a service instance name such as
/// `Living-Room-TV-0123456789abcdef0123456789abcdef._googlecast._tcp.local`.
pub(crate) fn friendly_name_from_service(service_name: &str) -> String {
    let instance = service_name
        .split("._googlecast._tcp.local")
        .next()
        .unwrap_or_default();

    let name = instance
        .split('-')
        .take_while(|part| part.len() != 32) // Skip 32-char hex UUID
        .collect::<Vec<_>>()
        .join("-")
        .trim()
        .to_string();

    if name.is_empty() {
        "Unknown Chromecast".to_string()
    } else {
        name
    }
}
