//! Control side of the device layer.
//!
//! A [`CastConnector`] opens a connection to a [`DeviceRecord`] and waits for
//! its media channel to be ready. The connection comes back wrapped in a
//! [`ControllerGuard`], which releases it when dropped, whatever the outcome
//! of the operations run through it.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use tracing::debug;

use crate::DeviceRecord;
use crate::errors::CastError;

/// Playback operations on a connected receiver.
pub trait MediaController {
    fn pause(&mut self) -> Result<(), CastError>;

    fn play(&mut self) -> Result<(), CastError>;

    /// Current playback position in seconds.
    fn current_time(&mut self) -> Result<f64, CastError>;

    /// Absolute seek, in seconds.
    fn seek(&mut self, position: f64) -> Result<(), CastError>;

    /// Back to the start of the current item.
    fn rewind(&mut self) -> Result<(), CastError> {
        self.seek(0.0)
    }

    fn disable_subtitles(&mut self) -> Result<(), CastError>;

    /// Activates the first text track in `language`.
    fn enable_subtitles(&mut self, language: &str) -> Result<(), CastError>;

    fn queue_next(&mut self) -> Result<(), CastError>;

    fn queue_prev(&mut self) -> Result<(), CastError>;

    /// Releases the connection. Called exactly once, by [`ControllerGuard`].
    fn release(&mut self);
}

/// Opens connections to receivers.
pub trait CastConnector: Send + Sync {
    /// Connects to `device` and blocks until its media channel is active,
    /// for at most `timeout`.
    fn connect(&self, device: &DeviceRecord, timeout: Duration)
    -> Result<ControllerGuard, CastError>;
}

/// Scoped connection: the controller is released on drop.
pub struct ControllerGuard {
    device: String,
    controller: Box<dyn MediaController>,
}

impl ControllerGuard {
    pub fn new(device: &str, controller: Box<dyn MediaController>) -> Self {
        Self {
            device: device.to_string(),
            controller,
        }
    }

    /// Name of the connected device.
    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Deref for ControllerGuard {
    type Target = dyn MediaController;

    fn deref(&self) -> &Self::Target {
        self.controller.as_ref()
    }
}

impl DerefMut for ControllerGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.controller.as_mut()
    }
}

impl Drop for ControllerGuard {
    fn drop(&mut self) {
        debug!(device = %self.device, "Releasing cast connection");
        self.controller.release();
    }
}
