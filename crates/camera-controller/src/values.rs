//! Domain value types carried by the controller's registers.
//!
//! Flag and selector registers mirror real hardware fields: the raw integer
//! is reinterpreted at its declared width with no bounds validation, so
//! undocumented bit combinations coming from the device are representable
//! and preserved exactly on a round trip.

use bitflags::bitflags;
use register_codec::{PayloadKind, RegisterValue};

bitflags! {
    /// Start/stop control for both cameras, written to the `StartAndStop`
    /// register. Start and stop bits for the same camera are distinct so a
    /// single write can retire one camera while arming the other.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct CameraFlags: u8 {
        const START_CAM0 = 0x01;
        const START_CAM1 = 0x02;
        const STOP_CAM0 = 0x04;
        const STOP_CAM1 = 0x08;
        const SINGLE_FRAME_CAM0 = 0x10;
        const SINGLE_FRAME_CAM1 = 0x20;
    }
}

bitflags! {
    /// Sources reported in a camera event message.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct CameraEvents: u8 {
        const TRIGGER = 0x01;
        const STROBE = 0x02;
    }
}

bitflags! {
    /// Digital output lines addressed by the set/clear/toggle registers.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct OutputFlags: u8 {
        const OUT0 = 0x01;
        const OUT1 = 0x02;
    }
}

macro_rules! flags_register_value {
    ($ty:ty) => {
        impl RegisterValue for $ty {
            const KIND: PayloadKind = PayloadKind::U8;

            fn from_wire(bytes: &[u8]) -> Self {
                Self::from_bits_retain(bytes[0])
            }

            fn write_wire(&self, out: &mut Vec<u8>) {
                out.push(self.bits());
            }
        }
    };
}

flags_register_value!(CameraFlags);
flags_register_value!(CameraEvents);
flags_register_value!(OutputFlags);

macro_rules! selector_register_value {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
        pub struct $name(pub u8);

        impl $name {
            $($(#[$vmeta])* pub const $variant: Self = Self($value);)+
        }

        impl RegisterValue for $name {
            const KIND: PayloadKind = PayloadKind::U8;

            fn from_wire(bytes: &[u8]) -> Self {
                Self(bytes[0])
            }

            fn write_wire(&self, out: &mut Vec<u8>) {
                out.push(self.0);
            }
        }
    };
}

selector_register_value! {
    /// What a camera's `ConfigureCamNEvent` register reports events on.
    EventConfig {
        EVENT_ON_STROBE = 0,
        EVENT_ON_TRIGGER = 1,
    }
}

selector_register_value! {
    /// Trigger generator selection for one camera.
    TriggerSource {
        INTERNAL = 0,
        /// Internal generator, armed but gated by the start register.
        INTERNAL_RESERVED = 1,
        EXTERNAL = 2,
    }
}

selector_register_value! {
    /// Polarity of the external trigger input.
    TriggerInverted {
        NO = 0,
        YES = 1,
    }
}

selector_register_value! {
    /// Strobe line routed to a camera's event logic.
    StrobeSource {
        INTERNAL = 0,
        EXTERNAL = 1,
    }
}

selector_register_value! {
    /// What drives a digital output line.
    OutputConfig {
        SOFTWARE = 0,
        CAM0_STROBE = 1,
        CAM1_STROBE = 2,
        CAM0_TRIGGER = 3,
        CAM1_TRIGGER = 4,
    }
}
