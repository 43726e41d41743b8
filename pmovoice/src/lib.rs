//! # pmovoice - Voice control of Chromecast receivers
//!
//! Turns the intents recognized by a voice-assistant host ("pause the
//! kitchen", "skip back ten seconds", "set the living room as default") into
//! Cast commands on the receivers discovered on the local network.
//!
//! ## Pieces
//!
//! - [`resolver`] : spoken device name to [`pmocast::DeviceRecord`],
//!   case-insensitive, replaced as a whole on each discovery
//! - [`preferences`] : the default device, cached JSON document
//! - [`dispatcher`] : one intent, one operation, connection always released
//! - [`refresh`] : periodic rediscovery thread
//! - [`skill`] : everything wired together
//! - [`bridge`] : JSON lines on stdin/stdout for the host
//!
//! ## Exemple
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pmocast::{MdnsDiscovery, RustCastConnector};
//! use pmovoice::{ChromecastSkill, Intent, IntentKind, VoiceConfigExt};
//!
//! let settings = pmoconfig::get_config().skill_settings()?;
//! let mut skill = ChromecastSkill::new(
//!     settings.clone(),
//!     Arc::new(MdnsDiscovery::new(settings.discovery_window)),
//!     Arc::new(RustCastConnector::new()),
//!     vocabulary,
//! );
//! skill.initialize()?;
//! let reply = skill.handle(&Intent::new(IntentKind::Pause).with_device("kitchen"));
//! ```

pub mod bridge;
pub mod config_ext;
pub mod dispatcher;
pub mod duration;
pub mod error;
pub mod intent;
pub mod logging;
pub mod preferences;
pub mod refresh;
pub mod resolver;
pub mod response;
pub mod settings;
pub mod skill;

pub use bridge::JsonLineWriter;
pub use config_ext::VoiceConfigExt;
pub use dispatcher::CommandDispatcher;
pub use duration::extract_duration;
pub use error::{Result, SkillError};
pub use intent::{HostMessage, Intent, IntentKind};
pub use preferences::{PreferenceCache, PreferenceError};
pub use refresh::{DiscoveryWorker, VocabularySink};
pub use resolver::{NameIndex, NameResolver, ResolveError};
pub use response::Reply;
pub use settings::{Feature, SkillSettings};
pub use skill::ChromecastSkill;
