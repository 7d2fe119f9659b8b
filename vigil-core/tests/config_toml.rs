//! Loading the shared configuration and watcher options from TOML

use serde::Deserialize;
use vigil_core::handshake::Forever;
use vigil_core::{ConfigError, DeviceCommands, RestartPolicy, SharedConfiguration, WatcherOptions};
use vigil_protocol::{EventMask, RegisterWrite, IMAGE_LEN};

#[derive(Deserialize)]
struct DeviceFile {
    shared: SharedConfiguration,
    #[serde(default)]
    watcher: WatcherOptions,
    #[serde(default)]
    restarts: RestartPolicy,
}

const DEVICE: &str = r#"
[shared]
addresses = [0x69]
timer_registers = [0x18, 0x19, 0x1A]
watchdog_threshold = 25640

[[shared.config_table]]
register = 0x40
value = 0x2B

[[shared.config_table]]
register = 0x41
value = 0x03

[[shared.event_masks]]
register = 0x1C
mask = 0x04

[watcher]
poll_period_cycles = 50000
wait_spin_cycles = 2500

[restarts]
max_restarts = 5
"#;

#[test]
fn device_file_parses() {
    let file: DeviceFile = toml::from_str(DEVICE).unwrap();

    let shared = file.shared;
    assert_eq!(shared.validate(), Ok(()));
    assert_eq!(
        shared.config_table.as_slice(),
        &[RegisterWrite::new(0x40, 0x2B), RegisterWrite::new(0x41, 0x03)]
    );
    assert_eq!(shared.event_masks.as_slice(), &[EventMask::new(0x1C, 0x04)]);
    assert_eq!(shared.commands, DeviceCommands::default());

    assert_eq!(file.watcher.poll_period_cycles, 50_000);
    assert_eq!(file.watcher.settle_cycles, WatcherOptions::default().settle_cycles);
    assert_eq!(file.watcher.wait_policy(), Forever::new(2500));
    assert_eq!(file.restarts.max_restarts, 5);
    assert_eq!(file.restarts.restarts(), 0);

    let mut image = [0u8; IMAGE_LEN];
    shared.write_image(&mut image).unwrap();
    assert_eq!(SharedConfiguration::from_image(&image), Ok(shared));
}

#[test]
fn parsed_but_incomplete_file_is_rejected_before_release() {
    let text = r#"
addresses = [0x69]
timer_registers = [0x18, 0x19, 0x1A]
watchdog_threshold = 0
config_table = [{ register = 0x40, value = 0x2B }]
event_masks = [{ register = 0x1C, mask = 0x04 }]
"#;
    let shared: SharedConfiguration = toml::from_str(text).unwrap();
    assert_eq!(shared.validate(), Err(ConfigError::ZeroThreshold));
}

#[test]
fn too_many_addresses_fail_to_parse() {
    let text = r#"
addresses = [0x68, 0x69, 0x6A]
timer_registers = [0x18, 0x19, 0x1A]
watchdog_threshold = 1
config_table = []
event_masks = []
"#;
    assert!(toml::from_str::<SharedConfiguration>(text).is_err());
}
