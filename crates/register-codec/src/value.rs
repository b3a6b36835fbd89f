use serde::Serialize;

use crate::PayloadKind;

/// A domain value that maps onto a register payload.
///
/// One implementation per domain type replaces the per-register conversion
/// routines: the codec validates the payload length against the descriptor
/// before calling [`from_wire`](RegisterValue::from_wire), so implementations
/// may assume `bytes.len() == KIND.width() * COUNT`.
///
/// Round-trip invariant: `from_wire` of the bytes produced by `write_wire`
/// yields an equal value.
pub trait RegisterValue: Sized {
    const KIND: PayloadKind;
    const COUNT: u8 = 1;

    fn from_wire(bytes: &[u8]) -> Self;
    fn write_wire(&self, out: &mut Vec<u8>);
}

impl RegisterValue for u8 {
    const KIND: PayloadKind = PayloadKind::U8;

    fn from_wire(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn write_wire(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }
}

impl RegisterValue for i8 {
    const KIND: PayloadKind = PayloadKind::S8;

    fn from_wire(bytes: &[u8]) -> Self {
        bytes[0] as i8
    }

    fn write_wire(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }
}

impl RegisterValue for u16 {
    const KIND: PayloadKind = PayloadKind::U16;

    fn from_wire(bytes: &[u8]) -> Self {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }

    fn write_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl RegisterValue for i16 {
    const KIND: PayloadKind = PayloadKind::S16;

    fn from_wire(bytes: &[u8]) -> Self {
        i16::from_le_bytes([bytes[0], bytes[1]])
    }

    fn write_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl RegisterValue for u32 {
    const KIND: PayloadKind = PayloadKind::U32;

    fn from_wire(bytes: &[u8]) -> Self {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn write_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl RegisterValue for i32 {
    const KIND: PayloadKind = PayloadKind::S32;

    fn from_wire(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn write_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl RegisterValue for f32 {
    const KIND: PayloadKind = PayloadKind::F32;

    fn from_wire(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn write_wire(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// Dynamically typed decode result for diagnostics and tooling, where the
/// concrete domain type is selected at runtime by the descriptor rather than
/// at compile time by the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    U8(u8),
    S8(i8),
    U16(u16),
    S16(i16),
    U32(u32),
    S32(i32),
    F32(f32),
    Array(Vec<WireValue>),
}

impl WireValue {
    /// The payload kind this value serializes as. Arrays report the kind of
    /// their elements; an empty array has no kind.
    pub fn kind(&self) -> Option<PayloadKind> {
        match self {
            WireValue::U8(_) => Some(PayloadKind::U8),
            WireValue::S8(_) => Some(PayloadKind::S8),
            WireValue::U16(_) => Some(PayloadKind::U16),
            WireValue::S16(_) => Some(PayloadKind::S16),
            WireValue::U32(_) => Some(PayloadKind::U32),
            WireValue::S32(_) => Some(PayloadKind::S32),
            WireValue::F32(_) => Some(PayloadKind::F32),
            WireValue::Array(items) => items.first().and_then(WireValue::kind),
        }
    }

    pub(crate) fn decode_element(kind: PayloadKind, bytes: &[u8]) -> Self {
        match kind {
            PayloadKind::U8 => WireValue::U8(u8::from_wire(bytes)),
            PayloadKind::S8 => WireValue::S8(i8::from_wire(bytes)),
            PayloadKind::U16 => WireValue::U16(u16::from_wire(bytes)),
            PayloadKind::S16 => WireValue::S16(i16::from_wire(bytes)),
            PayloadKind::U32 => WireValue::U32(u32::from_wire(bytes)),
            PayloadKind::S32 => WireValue::S32(i32::from_wire(bytes)),
            PayloadKind::F32 => WireValue::F32(f32::from_wire(bytes)),
        }
    }

    pub(crate) fn encode_element(&self, out: &mut Vec<u8>) {
        match self {
            WireValue::U8(v) => v.write_wire(out),
            WireValue::S8(v) => v.write_wire(out),
            WireValue::U16(v) => v.write_wire(out),
            WireValue::S16(v) => v.write_wire(out),
            WireValue::U32(v) => v.write_wire(out),
            WireValue::S32(v) => v.write_wire(out),
            WireValue::F32(v) => v.write_wire(out),
            WireValue::Array(items) => {
                for item in items {
                    item.encode_element(out);
                }
            }
        }
    }
}
