//! Unit tests for the daemon core event loop.

use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use hotas_daemon_types::{ClockFormat, DateFormat, ErrorCode, LedId, LedState};

use super::*;
use crate::config_store::{ConfigStore, ParamValue};
use crate::device::{DeviceAdapter, DeviceCommand, ReplayReport, SimulatedDriver, ZoneClock};
use crate::telemetry::LogControl;
use crate::tests::support::{HealthEvent, RecordingHealthReporter};

struct CoreFixture {
    _dir: TempDir,
    path: Utf8PathBuf,
    gate: StateGate,
    driver: SimulatedDriver,
    reporter: Arc<RecordingHealthReporter>,
    core: DaemonCore,
    sender: EventSender,
}

#[fixture]
fn fixture() -> CoreFixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("hotasd.toml")).expect("utf8 path");
    fs::write(&path, "[led]\nfire = \"off\"\n").expect("seed config");
    let config = ConfigStore::open(path.clone()).expect("seed config loads");
    let driver = SimulatedDriver::default();
    let mut device = DeviceAdapter::new(Box::new(driver.clone()));
    device.probe().expect("device present");
    let gate = StateGate::new(DaemonState::new(
        config,
        device,
        LogControl::detached("info"),
    ));
    let reporter = Arc::new(RecordingHealthReporter::default());
    let (sender, receiver) = event_queue();
    let core = DaemonCore::new(gate.clone(), receiver, reporter.clone());
    CoreFixture {
        _dir: dir,
        path,
        gate,
        driver,
        reporter,
        core,
        sender,
    }
}

fn value(gate: &StateGate, key: &str) -> ParamValue {
    gate.read(|state| Ok(state.config().get(key)?.clone()))
        .expect("key readable")
}

#[rstest]
fn reload_event_picks_up_file_changes(fixture: CoreFixture) {
    fs::write(&fixture.path, "[led]\nfire = \"on\"\na = \"red\"\n").expect("rewrite");

    assert!(fixture.core.handle(DaemonEvent::Reload).is_continue());

    assert_eq!(value(&fixture.gate, "led.a"), ParamValue::Str("red".to_owned()));
    assert_eq!(
        fixture.reporter.events(),
        vec![HealthEvent::ConfigReloaded { keys: 2 }]
    );
}

#[rstest]
fn reload_event_pushes_new_values_to_the_device(fixture: CoreFixture) {
    fs::write(&fixture.path, "[led]\nfire = \"on\"\n").expect("rewrite");
    fixture.driver.clear_calls();

    assert!(fixture.core.handle(DaemonEvent::Reload).is_continue());

    let fire = fixture
        .gate
        .read(|state| Ok(state.device().state().led(LedId::Fire)))
        .expect("readable");
    assert_eq!(fire, Some(LedState::On));
    assert!(fixture.driver.calls().contains(&DeviceCommand::SetLed {
        led: LedId::Fire,
        state: LedState::On,
    }));
}

#[rstest]
fn reload_without_device_still_updates_the_store(fixture: CoreFixture) {
    fixture.driver.unplug();
    assert!(
        fixture
            .core
            .handle(DaemonEvent::Device(DeviceEvent::Disconnected))
            .is_continue()
    );
    fs::write(&fixture.path, "[led]\nfire = \"on\"\n").expect("rewrite");

    assert!(fixture.core.handle(DaemonEvent::Reload).is_continue());

    assert_eq!(value(&fixture.gate, "led.fire"), ParamValue::Str("on".to_owned()));
    assert!(fixture.driver.calls().is_empty());
    assert_eq!(
        fixture.reporter.events().last(),
        Some(&HealthEvent::ConfigReloaded { keys: 1 })
    );
}

#[rstest]
fn reload_accepts_the_full_clock_section(fixture: CoreFixture) {
    fs::write(
        &fixture.path,
        concat!(
            "[clock]\n",
            "enabled = true\n",
            "primary_is_local = false\n",
            "secondary = \"UTC\"\n",
            "tertiary = \"Europe/Berlin\"\n",
            "format_primary = \"24hr\"\n",
            "format_secondary = \"12hr\"\n",
            "format_tertiary = \"24hr\"\n",
            "date_format = \"yymmdd\"\n",
        ),
    )
    .expect("rewrite");

    assert!(fixture.core.handle(DaemonEvent::Reload).is_continue());

    assert_eq!(
        fixture.reporter.events(),
        vec![HealthEvent::ConfigReloaded { keys: 8 }]
    );
    assert_eq!(value(&fixture.gate, "clock.format"), ParamValue::Str("24hr".to_owned()));
    let (date, tertiary) = fixture
        .gate
        .read(|state| {
            let device = state.device().state();
            Ok((
                device.date_format(),
                device
                    .zone_clock(ZoneClock::Tertiary)
                    .map(|(timezone, format)| (timezone.to_owned(), format)),
            ))
        })
        .expect("readable");
    assert_eq!(date, Some(DateFormat::Yymmdd));
    assert_eq!(
        tertiary,
        Some(("Europe/Berlin".to_owned(), ClockFormat::TwentyFourHour))
    );
}

#[rstest]
fn failed_reload_keeps_previous_values(fixture: CoreFixture) {
    fs::write(&fixture.path, "[led\nfire = ").expect("corrupt");

    assert!(fixture.core.handle(DaemonEvent::Reload).is_continue());

    assert_eq!(value(&fixture.gate, "led.fire"), ParamValue::Str("off".to_owned()));
    assert_eq!(
        fixture.reporter.events(),
        vec![HealthEvent::ConfigReloadFailed(ErrorCode::ConfigParse)]
    );
}

#[rstest]
fn save_event_writes_current_values(fixture: CoreFixture) {
    fixture
        .gate
        .write(|state| {
            state
                .config
                .set("led.b", crate::config_store::RawValue::Text("amber"))?;
            Ok(())
        })
        .expect("set");

    assert!(fixture.core.handle(DaemonEvent::Save).is_continue());

    let text = fs::read_to_string(&fixture.path).expect("saved file");
    assert!(text.contains("b = \"amber\""));
    assert_eq!(
        fixture.reporter.events(),
        vec![HealthEvent::ConfigSaved(fixture.path.to_string())]
    );
}

#[rstest]
fn device_events_replay_state_and_track_connection(fixture: CoreFixture) {
    fixture
        .gate
        .write(|state| {
            state.device.apply(DeviceCommand::SetLed {
                led: LedId::E,
                state: LedState::Red,
            })?;
            Ok(())
        })
        .expect("led applied");

    fixture.driver.unplug();
    assert!(
        fixture
            .core
            .handle(DaemonEvent::Device(DeviceEvent::Disconnected))
            .is_continue()
    );
    assert_eq!(value(&fixture.gate, "device.connected"), ParamValue::Bool(false));

    fixture.driver.replug();
    fixture.driver.clear_calls();
    assert!(
        fixture
            .core
            .handle(DaemonEvent::Device(DeviceEvent::Connected))
            .is_continue()
    );

    assert_eq!(value(&fixture.gate, "device.connected"), ParamValue::Bool(true));
    assert_eq!(
        fixture.driver.calls(),
        vec![DeviceCommand::SetLed {
            led: LedId::E,
            state: LedState::Red,
        }]
    );
    let events = fixture.reporter.events();
    assert_eq!(events.first(), Some(&HealthEvent::DeviceDisconnected));
    assert!(matches!(
        events.get(1),
        Some(HealthEvent::DeviceConnected {
            report: ReplayReport { applied: 1, failed: 0 },
            ..
        })
    ));
}

#[rstest]
fn connect_event_without_device_reports_missing(fixture: CoreFixture) {
    fixture.driver.unplug();
    assert!(
        fixture
            .core
            .handle(DaemonEvent::Device(DeviceEvent::Connected))
            .is_continue()
    );
    assert_eq!(fixture.reporter.events(), vec![HealthEvent::DeviceMissing]);
}

#[rstest]
fn run_stops_at_shutdown(fixture: CoreFixture) {
    let CoreFixture { core, sender, reporter, .. } = fixture;
    let handle = core.spawn().expect("spawn core");
    assert!(sender.send(DaemonEvent::Save));
    assert!(sender.send(DaemonEvent::Shutdown));
    handle.join().expect("core thread exits");
    assert_eq!(reporter.events().len(), 1);
}
