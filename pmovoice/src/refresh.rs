//! Periodic rediscovery of the receivers on the network.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use pmocast::{CastDiscovery, CastError};
use tracing::{debug, info, warn};

use crate::resolver::NameResolver;

/// Vocabulary kind the discovered display names are registered under.
pub const DEVICE_VOCABULARY: &str = "Device";

/// Receives the words the recognizer should know about.
pub trait VocabularySink: Send + Sync {
    fn register_vocabulary(&self, kind: &str, words: &[String]);
}

/// Runs one discovery pass and publishes its result.
///
/// On failure the previous index stays in place.
pub fn refresh_once(
    discovery: &dyn CastDiscovery,
    resolver: &NameResolver,
    vocabulary: &dyn VocabularySink,
) -> Result<usize, CastError> {
    let records = discovery.discover()?;
    let count = resolver.publish(records);
    let names = resolver.snapshot().names();
    vocabulary.register_vocabulary(DEVICE_VOCABULARY, &names);
    info!(count, "Device list refreshed");
    Ok(count)
}

/// Background thread calling [`refresh_once`] every `interval`.
pub struct DiscoveryWorker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DiscoveryWorker {
    pub fn spawn(
        discovery: Arc<dyn CastDiscovery>,
        resolver: Arc<NameResolver>,
        vocabulary: Arc<dyn VocabularySink>,
        interval: Duration,
    ) -> io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("pmovoice-discovery".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    if let Err(err) =
                        refresh_once(discovery.as_ref(), &resolver, vocabulary.as_ref())
                    {
                        warn!(error = %err, "Discovery failed, keeping previous device list");
                    }
                }
                debug!("Discovery thread exiting");
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stops the thread and waits for it. A pass already running completes
    /// first.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Discovery thread panicked");
            }
        }
    }
}

impl Drop for DiscoveryWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmocast::DeviceRecord;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        calls: AtomicUsize,
        fail_after: usize,
    }

    impl CastDiscovery for Scripted {
        fn discover(&self) -> Result<Vec<DeviceRecord>, CastError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.fail_after {
                return Err(CastError::Discovery("no network".into()));
            }
            Ok(vec![
                DeviceRecord::new("Living Room", "a", "10.0.0.2", 8009),
                DeviceRecord::new("Bedroom", "b", "10.0.0.3", 8009),
            ])
        }
    }

    #[derive(Default)]
    struct Words(Mutex<Vec<(String, Vec<String>)>>);

    impl VocabularySink for Words {
        fn register_vocabulary(&self, kind: &str, words: &[String]) {
            self.0
                .lock()
                .unwrap()
                .push((kind.to_string(), words.to_vec()));
        }
    }

    #[test]
    fn test_refresh_publishes_and_registers() {
        let discovery = Scripted {
            calls: AtomicUsize::new(0),
            fail_after: 1,
        };
        let resolver = NameResolver::new();
        let words = Words::default();

        assert_eq!(refresh_once(&discovery, &resolver, &words).unwrap(), 2);
        assert!(resolver.resolve("bedroom").is_ok());

        let registered = words.0.lock().unwrap();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].0, "Device");
        assert_eq!(registered[0].1, vec!["Living Room", "Bedroom"]);
    }

    #[test]
    fn test_failed_refresh_keeps_index() {
        let discovery = Scripted {
            calls: AtomicUsize::new(0),
            fail_after: 1,
        };
        let resolver = NameResolver::new();
        let words = Words::default();

        refresh_once(&discovery, &resolver, &words).unwrap();
        assert!(refresh_once(&discovery, &resolver, &words).is_err());
        assert_eq!(resolver.snapshot().len(), 2);
        assert_eq!(words.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_worker_refreshes_until_stopped() {
        let discovery = Arc::new(Scripted {
            calls: AtomicUsize::new(0),
            fail_after: usize::MAX,
        });
        let resolver = Arc::new(NameResolver::new());
        let words = Arc::new(Words::default());

        let mut worker = DiscoveryWorker::spawn(
            discovery.clone(),
            resolver.clone(),
            words.clone(),
            Duration::from_millis(10),
        )
        .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while discovery.calls.load(Ordering::SeqCst) < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        worker.stop();

        let calls = discovery.calls.load(Ordering::SeqCst);
        assert!(calls >= 2);
        assert_eq!(resolver.snapshot().len(), 2);

        thread::sleep(Duration::from_millis(50));
        assert_eq!(discovery.calls.load(Ordering::SeqCst), calls);
    }
}
