use std::sync::{Arc, Mutex};
use std::time::Duration;

use pmocast::{CastConnector, CastError, ControllerGuard, DeviceRecord, MediaController};
use pmovoice::intent::{BACKWARD_SLOT, FORWARD_SLOT};
use pmovoice::{
    CommandDispatcher, Intent, IntentKind, NameResolver, PreferenceCache, Reply, SkillSettings,
};
use tempfile::TempDir;

type Log = Arc<Mutex<Vec<String>>>;

/// Controller recording every call into a shared log.
struct FakeController {
    log: Log,
    position: f64,
    fail: bool,
}

impl FakeController {
    fn record(&self, call: String) -> Result<(), CastError> {
        self.log.lock().unwrap().push(call);
        if self.fail {
            Err(CastError::command("fake", "device refused"))
        } else {
            Ok(())
        }
    }
}

impl MediaController for FakeController {
    fn pause(&mut self) -> Result<(), CastError> {
        self.record("pause".into())
    }

    fn play(&mut self) -> Result<(), CastError> {
        self.record("play".into())
    }

    fn current_time(&mut self) -> Result<f64, CastError> {
        Ok(self.position)
    }

    fn seek(&mut self, position: f64) -> Result<(), CastError> {
        self.record(format!("seek {}", position))
    }

    fn disable_subtitles(&mut self) -> Result<(), CastError> {
        self.record("subtitles off".into())
    }

    fn enable_subtitles(&mut self, language: &str) -> Result<(), CastError> {
        self.record(format!("subtitles {}", language))
    }

    fn queue_next(&mut self) -> Result<(), CastError> {
        self.record("next".into())
    }

    fn queue_prev(&mut self) -> Result<(), CastError> {
        self.record("prev".into())
    }

    fn release(&mut self) {
        self.log.lock().unwrap().push("release".into());
    }
}

struct FakeConnector {
    log: Log,
    position: f64,
    fail_commands: bool,
    not_ready: bool,
}

impl CastConnector for FakeConnector {
    fn connect(
        &self,
        device: &DeviceRecord,
        timeout: Duration,
    ) -> Result<ControllerGuard, CastError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("connect {}", device.canonical_name));
        if self.not_ready {
            return Err(CastError::ReadinessTimeout {
                device: device.display_name.clone(),
                timeout,
            });
        }
        Ok(ControllerGuard::new(
            &device.display_name,
            Box::new(FakeController {
                log: self.log.clone(),
                position: self.position,
                fail: self.fail_commands,
            }),
        ))
    }
}

struct Fixture {
    _dir: TempDir,
    log: Log,
    dispatcher: CommandDispatcher,
}

fn devices() -> Vec<DeviceRecord> {
    vec![
        DeviceRecord::new("Living Room", "uuid-1", "192.168.1.20", 8009),
        DeviceRecord::new("Bedroom", "uuid-2", "192.168.1.21", 8009),
        DeviceRecord::new("Kitchen", "uuid-3", "192.168.1.22", 8009),
    ]
}

fn fixture_with(settings: SkillSettings, position: f64, fail: bool, not_ready: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let log: Log = Arc::default();
    let resolver = Arc::new(NameResolver::new());
    resolver.publish(devices());

    let connector = Arc::new(FakeConnector {
        log: log.clone(),
        position,
        fail_commands: fail,
        not_ready,
    });
    let dispatcher = CommandDispatcher::new(
        resolver,
        connector,
        PreferenceCache::in_dir(dir.path()),
        settings,
    );

    Fixture {
        _dir: dir,
        log,
        dispatcher,
    }
}

fn fixture() -> Fixture {
    fixture_with(SkillSettings::default(), 100.0, false, false)
}

fn calls(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn test_pause_resolves_case_insensitively_and_tears_down() {
    let mut f = fixture();
    let reply = f
        .dispatcher
        .dispatch(&Intent::new(IntentKind::Pause).with_device("kitchen"));

    assert_eq!(reply, Reply::Done);
    assert_eq!(calls(&f.log), vec!["connect Kitchen", "pause", "release"]);
}

#[test]
fn test_teardown_happens_when_the_operation_fails() {
    let mut f = fixture_with(SkillSettings::default(), 0.0, true, false);
    let reply = f
        .dispatcher
        .dispatch(&Intent::new(IntentKind::Pause).with_device("kitchen"));

    assert_eq!(
        reply,
        Reply::CommandFailed {
            device: "Kitchen".into()
        }
    );
    assert_eq!(calls(&f.log), vec!["connect Kitchen", "pause", "release"]);
}

#[test]
fn test_readiness_timeout_runs_nothing() {
    let mut f = fixture_with(SkillSettings::default(), 0.0, false, true);
    let reply = f
        .dispatcher
        .dispatch(&Intent::new(IntentKind::Play).with_device("Bedroom"));

    assert_eq!(
        reply,
        Reply::CommandFailed {
            device: "Bedroom".into()
        }
    );
    assert_eq!(calls(&f.log), vec!["connect Bedroom"]);
}

#[test]
fn test_unknown_device() {
    let mut f = fixture();
    let reply = f
        .dispatcher
        .dispatch(&Intent::new(IntentKind::Play).with_device("Garage"));

    assert_eq!(
        reply,
        Reply::DeviceNotFound {
            device: "Garage".into()
        }
    );
    assert!(calls(&f.log).is_empty());
}

#[test]
fn test_no_device_and_no_default() {
    let mut f = fixture();
    let reply = f.dispatcher.dispatch(&Intent::new(IntentKind::Pause));

    assert_eq!(reply, Reply::NoDevice);
    assert!(calls(&f.log).is_empty());
}

#[test]
fn test_default_device_is_used_without_slot() {
    let mut f = fixture();
    f.dispatcher.preferences().set("Bedroom").unwrap();

    let reply = f.dispatcher.dispatch(&Intent::new(IntentKind::Pause));
    assert_eq!(reply, Reply::Done);
    assert_eq!(calls(&f.log), vec!["connect Bedroom", "pause", "release"]);
}

#[test]
fn test_fallback_device_from_settings() {
    let settings = SkillSettings {
        fallback_device: Some("Living Room".into()),
        ..SkillSettings::default()
    };
    let mut f = fixture_with(settings, 0.0, false, false);

    assert_eq!(f.dispatcher.dispatch(&Intent::new(IntentKind::Play)), Reply::Done);
    assert_eq!(calls(&f.log)[0], "connect Living Room");
}

#[test]
fn test_stale_default_is_not_found() {
    let mut f = fixture();
    f.dispatcher.preferences().set("Attic").unwrap();

    assert_eq!(
        f.dispatcher.dispatch(&Intent::new(IntentKind::Pause)),
        Reply::DeviceNotFound {
            device: "Attic".into()
        }
    );
}

#[test]
fn test_seek_forward_uses_default_duration() {
    let mut f = fixture();
    let intent = Intent::new(IntentKind::SeekRelative)
        .with_device("Kitchen")
        .with_slot(FORWARD_SLOT, "forward")
        .with_remainder("the video please");

    assert_eq!(f.dispatcher.dispatch(&intent), Reply::Done);
    assert_eq!(calls(&f.log), vec!["connect Kitchen", "seek 130", "release"]);
}

#[test]
fn test_seek_backward_with_spoken_duration() {
    let mut f = fixture();
    let intent = Intent::new(IntentKind::SeekRelative)
        .with_device("Kitchen")
        .with_slot(BACKWARD_SLOT, "back")
        .with_remainder("10 seconds");

    assert_eq!(f.dispatcher.dispatch(&intent), Reply::Done);
    assert_eq!(calls(&f.log), vec!["connect Kitchen", "seek 90", "release"]);
}

#[test]
fn test_seek_with_oversized_duration_uses_default() {
    let mut f = fixture();
    let intent = Intent::new(IntentKind::SeekRelative)
        .with_device("Kitchen")
        .with_slot(FORWARD_SLOT, "forward")
        .with_remainder("99999999999999999999999 hours");

    assert_eq!(f.dispatcher.dispatch(&intent), Reply::Done);
    assert_eq!(calls(&f.log), vec!["connect Kitchen", "seek 130", "release"]);
}

#[test]
fn test_seek_backward_stops_at_start() {
    let mut f = fixture_with(SkillSettings::default(), 12.0, false, false);
    let intent = Intent::new(IntentKind::SeekRelative)
        .with_device("Kitchen")
        .with_slot(BACKWARD_SLOT, "back")
        .with_remainder("one minute");

    assert_eq!(f.dispatcher.dispatch(&intent), Reply::Done);
    assert_eq!(calls(&f.log)[1], "seek 0");
}

#[test]
fn test_beginning_seeks_to_zero() {
    let mut f = fixture();
    let intent = Intent::new(IntentKind::Beginning).with_device("Kitchen");

    assert_eq!(f.dispatcher.dispatch(&intent), Reply::Done);
    assert_eq!(calls(&f.log), vec!["connect Kitchen", "seek 0", "release"]);
}

#[test]
fn test_list_devices_in_discovery_order() {
    let mut f = fixture();
    assert_eq!(
        f.dispatcher.dispatch(&Intent::new(IntentKind::ListDevices)),
        Reply::DeviceList {
            devices: "Living Room, Bedroom, Kitchen".into()
        }
    );
    assert!(calls(&f.log).is_empty());
}

#[test]
fn test_list_without_devices() {
    let dir = tempfile::tempdir().unwrap();
    let connector = Arc::new(FakeConnector {
        log: Arc::default(),
        position: 0.0,
        fail_commands: false,
        not_ready: false,
    });
    let mut dispatcher = CommandDispatcher::new(
        Arc::new(NameResolver::new()),
        connector,
        PreferenceCache::in_dir(dir.path()),
        SkillSettings::default(),
    );

    assert_eq!(
        dispatcher.dispatch(&Intent::new(IntentKind::ListDevices)),
        Reply::NoDevicesFound
    );
}

#[test]
fn test_set_default_device() {
    let mut f = fixture();
    let reply = f
        .dispatcher
        .dispatch(&Intent::new(IntentKind::SetDefaultDevice).with_device("living room"));

    assert_eq!(
        reply,
        Reply::DefaultDeviceSet {
            device: "Living Room".into()
        }
    );
    assert_eq!(f.dispatcher.preferences().get().as_deref(), Some("Living Room"));
    assert!(calls(&f.log).is_empty());
}

#[test]
fn test_set_default_with_unknown_name_writes_nothing() {
    let mut f = fixture();
    f.dispatcher.preferences().set("Bedroom").unwrap();

    let reply = f
        .dispatcher
        .dispatch(&Intent::new(IntentKind::SetDefaultDevice).with_device("Garage"));

    assert_eq!(
        reply,
        Reply::DeviceNotFound {
            device: "Garage".into()
        }
    );
    assert_eq!(f.dispatcher.preferences().get().as_deref(), Some("Bedroom"));
}

#[test]
fn test_set_default_without_slot() {
    let mut f = fixture();
    assert_eq!(
        f.dispatcher
            .dispatch(&Intent::new(IntentKind::SetDefaultDevice)),
        Reply::NoDevice
    );
}

#[test]
fn test_gated_operations_are_disabled_by_default() {
    let mut f = fixture();
    for kind in [IntentKind::Next, IntentKind::Previous, IntentKind::SubtitlesEnable] {
        let reply = f
            .dispatcher
            .dispatch(&Intent::new(kind).with_device("Kitchen"));
        assert_eq!(
            reply,
            Reply::FeatureDisabled {
                operation: kind.name().into()
            }
        );
    }
    assert!(calls(&f.log).is_empty());
}

#[test]
fn test_gated_operations_when_enabled() {
    let settings = SkillSettings {
        queue_navigation: true,
        subtitle_enable: true,
        subtitle_language: "fr".into(),
        ..SkillSettings::default()
    };
    let mut f = fixture_with(settings, 0.0, false, false);

    for kind in [IntentKind::Next, IntentKind::Previous, IntentKind::SubtitlesEnable] {
        assert_eq!(
            f.dispatcher
                .dispatch(&Intent::new(kind).with_device("Kitchen")),
            Reply::Done
        );
    }
    assert_eq!(
        calls(&f.log),
        vec![
            "connect Kitchen",
            "next",
            "release",
            "connect Kitchen",
            "prev",
            "release",
            "connect Kitchen",
            "subtitles fr",
            "release",
        ]
    );
}

#[test]
fn test_disable_subtitles_is_not_gated() {
    let mut f = fixture();
    let reply = f
        .dispatcher
        .dispatch(&Intent::new(IntentKind::SubtitlesDisable).with_device("Kitchen"));

    assert_eq!(reply, Reply::Done);
    assert_eq!(calls(&f.log), vec!["connect Kitchen", "subtitles off", "release"]);
}
