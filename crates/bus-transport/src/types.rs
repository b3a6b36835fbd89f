use core::fmt;

/// Direction of a register message on the bus.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageKind {
    /// A read request, or the reply carrying the register contents.
    Read,
    /// A write request, or the echo acknowledging it.
    Write,
    /// An unsolicited notification emitted by the device.
    Event,
}

impl MessageKind {
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            1 => Some(MessageKind::Read),
            2 => Some(MessageKind::Write),
            3 => Some(MessageKind::Event),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            MessageKind::Read => 1,
            MessageKind::Write => 2,
            MessageKind::Event => 3,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Read => write!(f, "read"),
            MessageKind::Write => write!(f, "write"),
            MessageKind::Event => write!(f, "event"),
        }
    }
}

/// Seconds per fractional tick of the device clock.
const TICK_SECS: f64 = 32e-6;

/// Ticks per whole second.
const TICKS_PER_SEC: u32 = 31_250;

/// Fixed-point device clock value: whole seconds plus a fractional part
/// counted in 32 microsecond ticks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DeviceTime {
    seconds: u32,
    ticks: u16,
}

impl DeviceTime {
    /// Byte length of the wire form: 4-byte seconds then 2-byte ticks, LE.
    pub const WIRE_LEN: usize = 6;

    pub fn new(seconds: u32, ticks: u16) -> Self {
        Self { seconds, ticks }
    }

    /// Converts from floating seconds, rounding to the 32 us resolution.
    /// Returns `None` for negative values or values past the 32-bit range.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs < 0.0 || secs >= f64::from(u32::MAX) + 1.0 {
            return None;
        }
        let mut seconds = secs.trunc() as u32;
        let mut ticks = ((secs - secs.trunc()) / TICK_SECS).round() as u32;
        if ticks >= TICKS_PER_SEC {
            ticks -= TICKS_PER_SEC;
            seconds = seconds.checked_add(1)?;
        }
        Some(Self {
            seconds,
            ticks: ticks as u16,
        })
    }

    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.seconds) + f64::from(self.ticks) * TICK_SECS
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn ticks(&self) -> u16 {
        self.ticks
    }

    pub fn from_wire(bytes: [u8; Self::WIRE_LEN]) -> Self {
        Self {
            seconds: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            ticks: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    pub fn to_wire(&self) -> [u8; Self::WIRE_LEN] {
        let s = self.seconds.to_le_bytes();
        let t = self.ticks.to_le_bytes();
        [s[0], s[1], s[2], s[3], t[0], t[1]]
    }
}

impl fmt::Display for DeviceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

/// A framed register message. Framing, length, and checksum bytes are the
/// link's business; by the time a message reaches this type they are gone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterMessage {
    pub address: u8,
    pub kind: MessageKind,
    pub timestamp: Option<DeviceTime>,
    pub payload: Vec<u8>,
}

impl RegisterMessage {
    pub fn new(address: u8, kind: MessageKind, payload: Vec<u8>) -> Self {
        Self {
            address,
            kind,
            timestamp: None,
            payload,
        }
    }

    pub fn timestamped(
        address: u8,
        kind: MessageKind,
        timestamp: DeviceTime,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            address,
            kind,
            timestamp: Some(timestamp),
            payload,
        }
    }
}

/// Descriptive entry returned by [`DeviceLink::list`](crate::DeviceLink::list).
#[derive(Clone, Debug)]
pub struct LinkInfo {
    pub name: String,
    pub driver: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_wire_codes() {
        for kind in [MessageKind::Read, MessageKind::Write, MessageKind::Event] {
            assert_eq!(MessageKind::from_wire(kind.to_wire()), Some(kind));
        }
        assert_eq!(MessageKind::from_wire(0), None);
        assert_eq!(MessageKind::from_wire(4), None);
    }

    #[test]
    fn test_device_time_wire_round_trip() {
        let t = DeviceTime::new(0xDEAD_BEEF, 0x1234);
        assert_eq!(DeviceTime::from_wire(t.to_wire()), t);
    }

    #[test]
    fn test_device_time_secs_round_trip_at_resolution() {
        let t = DeviceTime::new(42, 625); // 42.02 s exactly
        let back = DeviceTime::from_secs_f64(t.as_secs_f64());
        assert_eq!(back, Some(t));
    }

    #[test]
    fn test_device_time_rejects_out_of_range() {
        assert_eq!(DeviceTime::from_secs_f64(-1.0), None);
        assert_eq!(DeviceTime::from_secs_f64(f64::NAN), None);
        assert_eq!(DeviceTime::from_secs_f64(f64::from(u32::MAX) + 2.0), None);
    }

    #[test]
    fn test_device_time_normalizes_tick_carry() {
        // 0.999999.. rounds up to a full second worth of ticks
        let t = DeviceTime::from_secs_f64(0.999_999_9);
        assert_eq!(t, Some(DeviceTime::new(1, 0)));
    }
}
