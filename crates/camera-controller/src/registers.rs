//! The CameraControllerGen2 register schema.
//!
//! Registers are data: one static table of descriptors drives the shared
//! codec and dispatch machinery. Addresses below 32 are the platform-common
//! core registers; the controller's own registers start at 32.

use bus_transport::{DeviceLink, LoopbackLink};
use register_codec::{PayloadKind, RegisterDescriptor, RegisterMap, Result};

/// Value the `WhoAmI` register must report for this device type.
pub const EXPECTED_WHO_AM_I: u16 = 1170;

pub const WHO_AM_I: RegisterDescriptor =
    RegisterDescriptor::scalar("WhoAmI", 0, PayloadKind::U16);
pub const HARDWARE_VERSION_HIGH: RegisterDescriptor =
    RegisterDescriptor::scalar("HardwareVersionHigh", 1, PayloadKind::U8);
pub const HARDWARE_VERSION_LOW: RegisterDescriptor =
    RegisterDescriptor::scalar("HardwareVersionLow", 2, PayloadKind::U8);
pub const FIRMWARE_VERSION_HIGH: RegisterDescriptor =
    RegisterDescriptor::scalar("FirmwareVersionHigh", 6, PayloadKind::U8);
pub const FIRMWARE_VERSION_LOW: RegisterDescriptor =
    RegisterDescriptor::scalar("FirmwareVersionLow", 7, PayloadKind::U8);
pub const TIMESTAMP_SECONDS: RegisterDescriptor =
    RegisterDescriptor::scalar("TimestampSeconds", 8, PayloadKind::U32);

pub const CAM0_EVENT: RegisterDescriptor =
    RegisterDescriptor::scalar("Cam0Event", 32, PayloadKind::U8);
pub const CAM1_EVENT: RegisterDescriptor =
    RegisterDescriptor::scalar("Cam1Event", 33, PayloadKind::U8);
pub const CONFIGURE_CAM0_EVENT: RegisterDescriptor =
    RegisterDescriptor::scalar("ConfigureCam0Event", 34, PayloadKind::U8);
pub const CONFIGURE_CAM1_EVENT: RegisterDescriptor =
    RegisterDescriptor::scalar("ConfigureCam1Event", 35, PayloadKind::U8);
pub const START_AND_STOP: RegisterDescriptor =
    RegisterDescriptor::scalar("StartAndStop", 36, PayloadKind::U8);
pub const START_AND_STOP_TIMESTAMPED: RegisterDescriptor =
    RegisterDescriptor::scalar("StartAndStopTimestamped", 37, PayloadKind::U8);
pub const START_TIMESTAMP: RegisterDescriptor =
    RegisterDescriptor::scalar("StartTimestamp", 38, PayloadKind::U32);
pub const STOP_TIMESTAMP: RegisterDescriptor =
    RegisterDescriptor::scalar("StopTimestamp", 39, PayloadKind::U32);
pub const TRIGGER_CONFIG_CAM0: RegisterDescriptor =
    RegisterDescriptor::scalar("TriggerConfigCam0", 40, PayloadKind::U8);
pub const TRIGGER_INVERTED_CAM0: RegisterDescriptor =
    RegisterDescriptor::scalar("TriggerInvertedCam0", 41, PayloadKind::U8);
pub const STROBE_SOURCE_CAM0: RegisterDescriptor =
    RegisterDescriptor::scalar("StrobeSourceCam0", 42, PayloadKind::U8);
pub const TRIGGER_FREQUENCY_CAM0: RegisterDescriptor =
    RegisterDescriptor::scalar("TriggerFrequencyCam0", 43, PayloadKind::U16);
pub const TRIGGER_DURATION_CAM0: RegisterDescriptor =
    RegisterDescriptor::scalar("TriggerDurationCam0", 44, PayloadKind::U16);
pub const TRIGGER_CONFIG_CAM1: RegisterDescriptor =
    RegisterDescriptor::scalar("TriggerConfigCam1", 45, PayloadKind::U8);
pub const TRIGGER_INVERTED_CAM1: RegisterDescriptor =
    RegisterDescriptor::scalar("TriggerInvertedCam1", 46, PayloadKind::U8);
pub const STROBE_SOURCE_CAM1: RegisterDescriptor =
    RegisterDescriptor::scalar("StrobeSourceCam1", 47, PayloadKind::U8);
pub const TRIGGER_FREQUENCY_CAM1: RegisterDescriptor =
    RegisterDescriptor::scalar("TriggerFrequencyCam1", 48, PayloadKind::U16);
pub const TRIGGER_DURATION_CAM1: RegisterDescriptor =
    RegisterDescriptor::scalar("TriggerDurationCam1", 49, PayloadKind::U16);
pub const CONFIGURE_OUTPUT0: RegisterDescriptor =
    RegisterDescriptor::scalar("ConfigureOutput0", 50, PayloadKind::U8);
pub const CONFIGURE_OUTPUT1: RegisterDescriptor =
    RegisterDescriptor::scalar("ConfigureOutput1", 51, PayloadKind::U8);
pub const OUTPUT_SET: RegisterDescriptor =
    RegisterDescriptor::scalar("OutputSet", 52, PayloadKind::U8);
pub const OUTPUT_CLEAR: RegisterDescriptor =
    RegisterDescriptor::scalar("OutputClear", 53, PayloadKind::U8);
pub const OUTPUT_TOGGLE: RegisterDescriptor =
    RegisterDescriptor::scalar("OutputToggle", 54, PayloadKind::U8);
pub const OUTPUT_STATE: RegisterDescriptor =
    RegisterDescriptor::scalar("OutputState", 55, PayloadKind::U8);
pub const INPUT_STATE: RegisterDescriptor =
    RegisterDescriptor::scalar("InputState", 56, PayloadKind::U8);

/// The full register table for this device type, in address order.
pub static REGISTERS: [RegisterDescriptor; 31] = [
    WHO_AM_I,
    HARDWARE_VERSION_HIGH,
    HARDWARE_VERSION_LOW,
    FIRMWARE_VERSION_HIGH,
    FIRMWARE_VERSION_LOW,
    TIMESTAMP_SECONDS,
    CAM0_EVENT,
    CAM1_EVENT,
    CONFIGURE_CAM0_EVENT,
    CONFIGURE_CAM1_EVENT,
    START_AND_STOP,
    START_AND_STOP_TIMESTAMPED,
    START_TIMESTAMP,
    STOP_TIMESTAMP,
    TRIGGER_CONFIG_CAM0,
    TRIGGER_INVERTED_CAM0,
    STROBE_SOURCE_CAM0,
    TRIGGER_FREQUENCY_CAM0,
    TRIGGER_DURATION_CAM0,
    TRIGGER_CONFIG_CAM1,
    TRIGGER_INVERTED_CAM1,
    STROBE_SOURCE_CAM1,
    TRIGGER_FREQUENCY_CAM1,
    TRIGGER_DURATION_CAM1,
    CONFIGURE_OUTPUT0,
    CONFIGURE_OUTPUT1,
    OUTPUT_SET,
    OUTPUT_CLEAR,
    OUTPUT_TOGGLE,
    OUTPUT_STATE,
    INPUT_STATE,
];

/// Build the address map for this device type.
pub fn register_map() -> Result<RegisterMap> {
    RegisterMap::from_table(&REGISTERS)
}

/// Find a register by name, case-insensitive. For tooling.
pub fn find_register(name: &str) -> Option<&'static RegisterDescriptor> {
    REGISTERS
        .iter()
        .find(|desc| desc.name.eq_ignore_ascii_case(name))
}

/// Open a loopback link seeded with this device's register file: every
/// register zeroed at its declared width, identity and version registers set
/// to plausible values. The standard test and demo target.
pub fn loopback_device(name: &str) -> bus_transport::Result<LoopbackLink> {
    let mut link = LoopbackLink::open(name)?;
    for desc in &REGISTERS {
        link.set_register(desc.address, vec![0; desc.payload_len()]);
    }
    link.set_register(WHO_AM_I.address, EXPECTED_WHO_AM_I.to_le_bytes().to_vec());
    link.set_register(HARDWARE_VERSION_HIGH.address, vec![1]);
    link.set_register(HARDWARE_VERSION_LOW.address, vec![2]);
    link.set_register(FIRMWARE_VERSION_HIGH.address, vec![3]);
    link.set_register(FIRMWARE_VERSION_LOW.address, vec![1]);
    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_builds_a_map() {
        let map = register_map().unwrap();
        assert_eq!(map.len(), REGISTERS.len());
        assert_eq!(map.lookup(36).unwrap().name, "StartAndStop");
    }

    #[test]
    fn test_find_register_is_case_insensitive() {
        assert_eq!(
            find_register("startandstop").map(|d| d.address),
            Some(START_AND_STOP.address)
        );
        assert!(find_register("NoSuchRegister").is_none());
    }

    #[test]
    fn test_loopback_device_reports_identity() {
        let link = loopback_device("loop0").unwrap();
        assert_eq!(
            link.register(WHO_AM_I.address),
            Some(&EXPECTED_WHO_AM_I.to_le_bytes()[..])
        );
    }
}
