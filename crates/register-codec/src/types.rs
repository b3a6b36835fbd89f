use bus_transport::DeviceTime;
use serde::Serialize;

/// Primitive wire type of one register payload element.
///
/// Integers travel little-endian; signed kinds are two's complement at the
/// declared width with no sign extension beyond it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    F32,
}

impl PayloadKind {
    /// Width in bytes of one element of this kind.
    pub fn width(self) -> usize {
        match self {
            PayloadKind::U8 | PayloadKind::S8 => 1,
            PayloadKind::U16 | PayloadKind::S16 => 2,
            PayloadKind::U32 | PayloadKind::S32 | PayloadKind::F32 => 4,
        }
    }
}

/// Static metadata for one register: the single source of truth for how its
/// payload is serialized. Descriptors are process-wide static data, built
/// into a table per device type and never mutated after registration.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct RegisterDescriptor {
    pub name: &'static str,
    pub address: u8,
    pub kind: PayloadKind,
    pub count: u8,
}

impl RegisterDescriptor {
    /// A scalar register (element count 1), which is the common case.
    pub const fn scalar(name: &'static str, address: u8, kind: PayloadKind) -> Self {
        Self {
            name,
            address,
            kind,
            count: 1,
        }
    }

    pub const fn array(name: &'static str, address: u8, kind: PayloadKind, count: u8) -> Self {
        Self {
            name,
            address,
            kind,
            count,
        }
    }

    /// Expected payload byte length for this register.
    pub fn payload_len(&self) -> usize {
        self.kind.width() * usize::from(self.count)
    }
}

/// A decoded value paired with the device timestamp it was captured at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timestamped<T> {
    pub time: DeviceTime,
    pub value: T,
}

impl<T> Timestamped<T> {
    /// Timestamp as floating seconds of device uptime.
    pub fn seconds(&self) -> f64 {
        self.time.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_widths() {
        assert_eq!(PayloadKind::U8.width(), 1);
        assert_eq!(PayloadKind::S8.width(), 1);
        assert_eq!(PayloadKind::U16.width(), 2);
        assert_eq!(PayloadKind::S16.width(), 2);
        assert_eq!(PayloadKind::U32.width(), 4);
        assert_eq!(PayloadKind::S32.width(), 4);
        assert_eq!(PayloadKind::F32.width(), 4);
    }

    #[test]
    fn test_payload_len_scales_with_count() {
        let desc = RegisterDescriptor::array("pair", 10, PayloadKind::U16, 2);
        assert_eq!(desc.payload_len(), 4);
        let desc = RegisterDescriptor::scalar("one", 11, PayloadKind::U32);
        assert_eq!(desc.payload_len(), 4);
    }
}
