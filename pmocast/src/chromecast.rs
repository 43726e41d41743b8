//! Chromecast backend implementation using the rust_cast library.
//!
//! [`RustCastConnector`] opens a Cast channel to a receiver and waits until
//! the running application reports a media session, then hands out a
//! [`ChromecastController`] bound to that session.

use std::sync::Once;
use std::thread;
use std::time::{Duration, Instant};

use rust_cast::CastDevice;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::DeviceRecord;
use crate::controller::{CastConnector, ControllerGuard, MediaController};
use crate::errors::CastError;

/// Destination id of the platform receiver.
const DEFAULT_DESTINATION_ID: &str = "receiver-0";

/// Delay between two status probes while waiting for readiness.
const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Namespace of the media channel.
const MEDIA_NAMESPACE: &str = "urn:x-cast:com.google.cast.media";

/// First request id of the messages built here, far above the ids rust_cast
/// hands out for its own requests.
const FIRST_REQUEST_ID: u32 = 100_000;

/// Ensures the Rustls CryptoProvider is initialized exactly once.
fn ensure_crypto_provider_initialized() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = rustls::crypto::CryptoProvider::install_default(
            rustls::crypto::aws_lc_rs::default_provider(),
        );
    });
}

/// Media session a controller is bound to.
#[derive(Clone, Debug)]
struct MediaSession {
    /// Transport id of the running application (e.g. "web-5").
    transport_id: String,
    media_session_id: i32,
}

/// Connects to receivers with rust_cast.
#[derive(Clone, Debug, Default)]
pub struct RustCastConnector;

impl RustCastConnector {
    pub fn new() -> Self {
        Self
    }
}

impl CastConnector for RustCastConnector {
    fn connect(
        &self,
        device: &DeviceRecord,
        timeout: Duration,
    ) -> Result<ControllerGuard, CastError> {
        ensure_crypto_provider_initialized();

        let name = device.canonical_name.as_str();
        debug!(device = name, "Connecting to Chromecast at {}:{}", device.host, device.port);

        let cast = CastDevice::connect_without_host_verification(device.host.clone(), device.port)
            .map_err(|e| CastError::connection(name, e))?;

        cast.connection
            .connect(DEFAULT_DESTINATION_ID.to_string())
            .map_err(|e| CastError::connection(name, e))?;

        let session = wait_until_active(&cast, name, timeout)?;
        info!(
            device = name,
            transport = %session.transport_id,
            media_session = session.media_session_id,
            "Chromecast media channel active"
        );

        let controller = ChromecastController {
            device: cast,
            session,
            next_request_id: FIRST_REQUEST_ID,
        };
        Ok(ControllerGuard::new(name, Box::new(controller)))
    }
}

/// Polls the receiver until its running application reports a media
/// session, or `timeout` elapses.
fn wait_until_active(
    cast: &CastDevice<'static>,
    name: &str,
    timeout: Duration,
) -> Result<MediaSession, CastError> {
    let deadline = Instant::now() + timeout;
    let mut connected_transport: Option<String> = None;

    loop {
        match probe_media_session(cast, &mut connected_transport) {
            Ok(Some(session)) => return Ok(session),
            Ok(None) => debug!(device = name, "No active media session yet"),
            Err(err) => debug!(device = name, error = %err, "Media status probe failed"),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(CastError::ReadinessTimeout {
                device: name.to_string(),
                timeout,
            });
        }
        thread::sleep(READINESS_POLL_INTERVAL.min(deadline - now));
    }
}

fn probe_media_session(
    cast: &CastDevice<'static>,
    connected_transport: &mut Option<String>,
) -> Result<Option<MediaSession>, CastError> {
    let status = cast
        .receiver
        .get_status()
        .map_err(|e| CastError::command("receiver_status", e))?;

    let Some(app) = status.applications.first() else {
        return Ok(None);
    };

    if connected_transport.as_deref() != Some(app.transport_id.as_str()) {
        cast.connection
            .connect(app.transport_id.clone())
            .map_err(|e| CastError::command("connect_transport", e))?;
        *connected_transport = Some(app.transport_id.clone());
    }

    let media = cast
        .media
        .get_status(app.transport_id.clone(), None)
        .map_err(|e| CastError::command("media_status", e))?;

    Ok(media.entries.first().map(|entry| MediaSession {
        transport_id: app.transport_id.clone(),
        media_session_id: entry.media_session_id,
    }))
}

/// Media channel messages rust_cast has no helper for. They are sent with
/// `ReceiverChannel::broadcast_message` and not waited on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub(crate) enum MediaCommand {
    /// Selects text tracks: an empty `activeTrackIds` turns them all off,
    /// `language` + `enableTextTracks` lets the receiver pick the track.
    #[serde(rename = "EDIT_TRACKS_INFO", rename_all = "camelCase")]
    EditTracksInfo {
        request_id: u32,
        media_session_id: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        active_track_ids: Option<Vec<u32>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        enable_text_tracks: Option<bool>,
    },
    /// Moves `jump` items forward (or backward when negative) in the queue.
    #[serde(rename = "QUEUE_UPDATE", rename_all = "camelCase")]
    QueueUpdate {
        request_id: u32,
        media_session_id: i32,
        jump: i32,
    },
}

impl MediaCommand {
    pub(crate) fn disable_text_tracks(request_id: u32, media_session_id: i32) -> Self {
        MediaCommand::EditTracksInfo {
            request_id,
            media_session_id,
            active_track_ids: Some(Vec::new()),
            language: None,
            enable_text_tracks: None,
        }
    }

    pub(crate) fn enable_text_tracks(
        request_id: u32,
        media_session_id: i32,
        language: &str,
    ) -> Self {
        MediaCommand::EditTracksInfo {
            request_id,
            media_session_id,
            active_track_ids: None,
            language: Some(language.to_string()),
            enable_text_tracks: Some(true),
        }
    }

    pub(crate) fn queue_jump(request_id: u32, media_session_id: i32, jump: i32) -> Self {
        MediaCommand::QueueUpdate {
            request_id,
            media_session_id,
            jump,
        }
    }
}

/// Controller bound to one media session of a connected receiver.
pub struct ChromecastController {
    device: CastDevice<'static>,
    session: MediaSession,
    next_request_id: u32,
}

impl ChromecastController {
    fn destination(&self) -> String {
        self.session.transport_id.clone()
    }

    fn request_id(&mut self) -> u32 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1).max(FIRST_REQUEST_ID);
        id
    }

    fn send_media_command(
        &mut self,
        operation: &str,
        build: impl FnOnce(u32, i32) -> MediaCommand,
    ) -> Result<(), CastError> {
        let command = build(self.request_id(), self.session.media_session_id);
        debug!(operation, ?command, "ChromecastController: media command");
        self.device
            .receiver
            .broadcast_message(MEDIA_NAMESPACE, &command)
            .map_err(|e| CastError::command(operation, e))
    }
}

impl MediaController for ChromecastController {
    fn pause(&mut self) -> Result<(), CastError> {
        debug!("ChromecastController: pause()");
        self.device
            .media
            .pause(self.destination(), self.session.media_session_id)
            .map_err(|e| CastError::command("pause", e))?;
        Ok(())
    }

    fn play(&mut self) -> Result<(), CastError> {
        debug!("ChromecastController: play()");
        self.device
            .media
            .play(self.destination(), self.session.media_session_id)
            .map_err(|e| CastError::command("play", e))?;
        Ok(())
    }

    fn current_time(&mut self) -> Result<f64, CastError> {
        let status = self
            .device
            .media
            .get_status(self.destination(), Some(self.session.media_session_id))
            .map_err(|e| CastError::command("media_status", e))?;

        status
            .entries
            .first()
            .and_then(|entry| entry.current_time)
            .map(f64::from)
            .ok_or_else(|| CastError::command("current_time", "no position in media status"))
    }

    fn seek(&mut self, position: f64) -> Result<(), CastError> {
        debug!("ChromecastController: seek({})", position);
        self.device
            .media
            .seek(
                self.destination(),
                self.session.media_session_id,
                Some(position.max(0.0) as f32),
                None,
            )
            .map_err(|e| CastError::command("seek", e))?;
        Ok(())
    }

    fn disable_subtitles(&mut self) -> Result<(), CastError> {
        self.send_media_command("disable_subtitles", MediaCommand::disable_text_tracks)
    }

    fn enable_subtitles(&mut self, language: &str) -> Result<(), CastError> {
        self.send_media_command("enable_subtitles", |request_id, session| {
            MediaCommand::enable_text_tracks(request_id, session, language)
        })
    }

    fn queue_next(&mut self) -> Result<(), CastError> {
        self.send_media_command("queue_next", |request_id, session| {
            MediaCommand::queue_jump(request_id, session, 1)
        })
    }

    fn queue_prev(&mut self) -> Result<(), CastError> {
        self.send_media_command("queue_prev", |request_id, session| {
            MediaCommand::queue_jump(request_id, session, -1)
        })
    }

    fn release(&mut self) {
        let transport = self.destination();
        if let Err(e) = self.device.connection.disconnect(transport) {
            warn!(error = %e, "Failed to close Chromecast transport channel");
        }
        if let Err(e) = self
            .device
            .connection
            .disconnect(DEFAULT_DESTINATION_ID.to_string())
        {
            debug!(error = %e, "Failed to close Chromecast receiver channel");
        }
    }
}
