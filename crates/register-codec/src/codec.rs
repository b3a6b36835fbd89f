use bus_transport::{DeviceTime, MessageKind, RegisterMessage};

use crate::{
    CodecError, RegisterDescriptor, RegisterMap, RegisterValue, Result, Timestamped, WireValue,
};

fn ensure_kind<T: RegisterValue>(desc: &RegisterDescriptor) -> Result<()> {
    if desc.kind == T::KIND && desc.count == T::COUNT {
        Ok(())
    } else {
        Err(CodecError::KindMismatch {
            register: desc.address,
            expected: desc.kind,
            expected_count: desc.count,
            requested: T::KIND,
            requested_count: T::COUNT,
        })
    }
}

fn ensure_len(desc: &RegisterDescriptor, actual: usize) -> Result<()> {
    let expected = desc.payload_len();
    if actual == expected {
        Ok(())
    } else {
        Err(CodecError::PayloadLength {
            register: desc.address,
            expected,
            actual,
        })
    }
}

/// Decode the payload of `msg` as the domain type `T`.
///
/// Fails with `UnknownRegister` if the address has no descriptor in `map`,
/// `KindMismatch` if `T` does not match the descriptor's payload shape, and
/// `PayloadLength` if the byte count is wrong for the descriptor.
pub fn decode<T: RegisterValue>(map: &RegisterMap, msg: &RegisterMessage) -> Result<T> {
    let desc = map.lookup(msg.address)?;
    ensure_kind::<T>(desc)?;
    ensure_len(desc, msg.payload.len())?;
    Ok(T::from_wire(&msg.payload))
}

/// As [`decode`], also extracting the embedded device timestamp.
///
/// Requesting a timestamped decode of a message that carries no timestamp is
/// an error, not a default.
pub fn decode_timestamped<T: RegisterValue>(
    map: &RegisterMap,
    msg: &RegisterMessage,
) -> Result<Timestamped<T>> {
    let value = decode::<T>(map, msg)?;
    let time = msg
        .timestamp
        .ok_or(CodecError::MissingTimestamp { register: msg.address })?;
    Ok(Timestamped { time, value })
}

/// Serialize `value` into a register message for `address`, untimestamped.
pub fn encode<T: RegisterValue>(
    map: &RegisterMap,
    address: u8,
    kind: MessageKind,
    value: &T,
) -> Result<RegisterMessage> {
    let desc = map.lookup(address)?;
    ensure_kind::<T>(desc)?;
    let mut payload = Vec::with_capacity(desc.payload_len());
    value.write_wire(&mut payload);
    ensure_len(desc, payload.len())?;
    Ok(RegisterMessage::new(address, kind, payload))
}

/// As [`encode`], embedding the given device timestamp.
pub fn encode_timestamped<T: RegisterValue>(
    map: &RegisterMap,
    address: u8,
    time: DeviceTime,
    kind: MessageKind,
    value: &T,
) -> Result<RegisterMessage> {
    let mut msg = encode(map, address, kind, value)?;
    msg.timestamp = Some(time);
    Ok(msg)
}

/// Descriptor-driven dynamic decode for tooling, where the concrete type is
/// not known at compile time. Scalars decode to a bare value, registers with
/// an element count above one to an array.
pub fn decode_value(map: &RegisterMap, msg: &RegisterMessage) -> Result<WireValue> {
    let desc = map.lookup(msg.address)?;
    ensure_len(desc, msg.payload.len())?;
    let width = desc.kind.width();
    if desc.count == 1 {
        return Ok(WireValue::decode_element(desc.kind, &msg.payload));
    }
    let elements = msg
        .payload
        .chunks_exact(width)
        .map(|chunk| WireValue::decode_element(desc.kind, chunk))
        .collect();
    Ok(WireValue::Array(elements))
}

/// As [`decode_value`], also extracting the embedded device timestamp.
pub fn decode_value_timestamped(
    map: &RegisterMap,
    msg: &RegisterMessage,
) -> Result<Timestamped<WireValue>> {
    let value = decode_value(map, msg)?;
    let time = msg
        .timestamp
        .ok_or(CodecError::MissingTimestamp { register: msg.address })?;
    Ok(Timestamped { time, value })
}

/// Dynamic inverse of [`decode_value`]: serialize a [`WireValue`] into a
/// register message, validating shape against the descriptor.
pub fn encode_value(
    map: &RegisterMap,
    address: u8,
    kind: MessageKind,
    value: &WireValue,
) -> Result<RegisterMessage> {
    let desc = map.lookup(address)?;
    if value.kind().is_some_and(|k| k != desc.kind) {
        return Err(CodecError::KindMismatch {
            register: address,
            expected: desc.kind,
            expected_count: desc.count,
            requested: value.kind().unwrap_or(desc.kind),
            requested_count: desc.count,
        });
    }
    let mut payload = Vec::with_capacity(desc.payload_len());
    value.encode_element(&mut payload);
    ensure_len(desc, payload.len())?;
    Ok(RegisterMessage::new(address, kind, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PayloadKind;

    static TABLE: [RegisterDescriptor; 4] = [
        RegisterDescriptor::scalar("byte_reg", 10, PayloadKind::U8),
        RegisterDescriptor::scalar("word_reg", 11, PayloadKind::U16),
        RegisterDescriptor::scalar("long_reg", 12, PayloadKind::U32),
        RegisterDescriptor::array("pair_reg", 13, PayloadKind::U16, 2),
    ];

    fn map() -> RegisterMap {
        RegisterMap::from_table(&TABLE).unwrap()
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let map = map();
        let msg = encode(&map, 11, MessageKind::Write, &0xBEEFu16).unwrap();
        assert_eq!(msg.payload, vec![0xEF, 0xBE]);
        assert!(msg.timestamp.is_none());
        let back: u16 = decode(&map, &msg).unwrap();
        assert_eq!(back, 0xBEEF);
    }

    #[test]
    fn test_timestamp_round_trip_exact() {
        let map = map();
        let time = DeviceTime::new(1234, 625);
        let msg = encode_timestamped(&map, 12, time, MessageKind::Event, &7u32).unwrap();
        let back: Timestamped<u32> = decode_timestamped(&map, &msg).unwrap();
        assert_eq!(back.value, 7);
        assert_eq!(back.time, time);
        assert!((back.seconds() - 1234.02).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_register_fails() {
        let map = map();
        let msg = RegisterMessage::new(99, MessageKind::Read, vec![0]);
        assert!(matches!(
            decode::<u8>(&map, &msg),
            Err(CodecError::UnknownRegister(99))
        ));
        assert!(matches!(
            encode(&map, 99, MessageKind::Write, &0u8),
            Err(CodecError::UnknownRegister(99))
        ));
    }

    #[test]
    fn test_short_payload_fails_length_check() {
        let map = map();
        // word_reg expects 2 bytes, supply 1
        let msg = RegisterMessage::new(11, MessageKind::Read, vec![0x01]);
        assert!(matches!(
            decode::<u16>(&map, &msg),
            Err(CodecError::PayloadLength {
                register: 11,
                expected: 2,
                actual: 1,
            })
        ));
    }

    #[test]
    fn test_wrong_type_request_fails_kind_check() {
        let map = map();
        let msg = RegisterMessage::new(11, MessageKind::Read, vec![0x01, 0x02]);
        assert!(matches!(
            decode::<u32>(&map, &msg),
            Err(CodecError::KindMismatch { register: 11, .. })
        ));
    }

    #[test]
    fn test_missing_timestamp_is_an_error() {
        let map = map();
        let msg = RegisterMessage::new(10, MessageKind::Read, vec![0x01]);
        assert!(matches!(
            decode_timestamped::<u8>(&map, &msg),
            Err(CodecError::MissingTimestamp { register: 10 })
        ));
    }

    #[test]
    fn test_dynamic_decode_scalar_and_array() {
        let map = map();
        let msg = RegisterMessage::new(10, MessageKind::Read, vec![0x2A]);
        assert_eq!(decode_value(&map, &msg).unwrap(), WireValue::U8(0x2A));

        let msg = RegisterMessage::new(13, MessageKind::Read, vec![0x01, 0x00, 0x02, 0x00]);
        assert_eq!(
            decode_value(&map, &msg).unwrap(),
            WireValue::Array(vec![WireValue::U16(1), WireValue::U16(2)])
        );
    }

    #[test]
    fn test_dynamic_encode_matches_typed_encode() {
        let map = map();
        let typed = encode(&map, 11, MessageKind::Write, &513u16).unwrap();
        let dynamic = encode_value(&map, 11, MessageKind::Write, &WireValue::U16(513)).unwrap();
        assert_eq!(typed, dynamic);
    }

    #[test]
    fn test_dynamic_encode_rejects_wrong_kind() {
        let map = map();
        let err = encode_value(&map, 11, MessageKind::Write, &WireValue::U32(1));
        assert!(matches!(err, Err(CodecError::KindMismatch { .. })));
    }
}
