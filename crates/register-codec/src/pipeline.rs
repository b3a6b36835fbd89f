//! Sequence adapters over ordered register-message streams.
//!
//! These are pure transformations: order-preserving, composable, and free of
//! shared state between invocations. Per-element decode failures are
//! surfaced as `Err` elements rather than terminating the sequence;
//! [`group_by_register`] treats an unmapped address as a hard error for the
//! whole grouping.

use std::collections::HashMap;

use bus_transport::{MessageKind, RegisterMessage};

use crate::{
    codec, RegisterDescriptor, RegisterMap, RegisterValue, Result, Timestamped,
};

/// Messages for one register, in arrival order.
#[derive(Debug)]
pub struct RegisterGroup {
    pub descriptor: &'static RegisterDescriptor,
    pub messages: Vec<RegisterMessage>,
}

/// Partition a message sequence by register identity.
///
/// Each group's messages keep the relative arrival order of that register's
/// messages in the input; groups themselves appear in first-arrival order.
/// An address with no entry in `map` fails the whole grouping, so unknown
/// traffic is never silently dropped.
pub fn group_by_register<I>(msgs: I, map: &RegisterMap) -> Result<Vec<RegisterGroup>>
where
    I: IntoIterator<Item = RegisterMessage>,
{
    let mut groups: Vec<RegisterGroup> = Vec::new();
    let mut slots: HashMap<u8, usize> = HashMap::new();
    for msg in msgs {
        let desc = map.lookup(msg.address)?;
        let slot = *slots.entry(desc.address).or_insert_with(|| {
            groups.push(RegisterGroup {
                descriptor: desc,
                messages: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].messages.push(msg);
    }
    Ok(groups)
}

/// Keep only the messages addressed to `descriptor`'s register.
pub fn filter_register<I>(
    msgs: I,
    descriptor: &RegisterDescriptor,
) -> impl Iterator<Item = RegisterMessage>
where
    I: IntoIterator<Item = RegisterMessage>,
{
    let address = descriptor.address;
    msgs.into_iter().filter(move |msg| msg.address == address)
}

/// Decode each message as `T`. A failed element yields an `Err` in place,
/// leaving the rest of the sequence intact.
pub fn parse<'a, T, I>(msgs: I, map: &'a RegisterMap) -> impl Iterator<Item = Result<T>> + 'a
where
    T: RegisterValue + 'a,
    I: IntoIterator<Item = RegisterMessage>,
    I::IntoIter: 'a,
{
    msgs.into_iter().map(move |msg| codec::decode::<T>(map, &msg))
}

/// As [`parse`], pairing each value with its device timestamp.
pub fn parse_timestamped<'a, T, I>(
    msgs: I,
    map: &'a RegisterMap,
) -> impl Iterator<Item = Result<Timestamped<T>>> + 'a
where
    T: RegisterValue + 'a,
    I: IntoIterator<Item = RegisterMessage>,
    I::IntoIter: 'a,
{
    msgs.into_iter()
        .map(move |msg| codec::decode_timestamped::<T>(map, &msg))
}

/// Write-side inverse of [`parse`]: serialize each value into a message for
/// `address` with the given message kind.
pub fn format<'a, T, I>(
    values: I,
    map: &'a RegisterMap,
    address: u8,
    kind: MessageKind,
) -> impl Iterator<Item = Result<RegisterMessage>> + 'a
where
    T: RegisterValue + 'a,
    I: IntoIterator<Item = T>,
    I::IntoIter: 'a,
{
    values
        .into_iter()
        .map(move |value| codec::encode(map, address, kind, &value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CodecError, PayloadKind};

    static TABLE: [RegisterDescriptor; 2] = [
        RegisterDescriptor::scalar("a", 40, PayloadKind::U8),
        RegisterDescriptor::scalar("b", 41, PayloadKind::U16),
    ];

    fn map() -> RegisterMap {
        RegisterMap::from_table(&TABLE).unwrap()
    }

    fn msg(address: u8, payload: Vec<u8>) -> RegisterMessage {
        RegisterMessage::new(address, MessageKind::Event, payload)
    }

    #[test]
    fn test_grouping_preserves_relative_order() {
        let map = map();
        // Interleaved a, b, a, a, b
        let input = vec![
            msg(40, vec![1]),
            msg(41, vec![1, 0]),
            msg(40, vec![2]),
            msg(40, vec![3]),
            msg(41, vec![2, 0]),
        ];
        let groups = group_by_register(input, &map).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].descriptor.address, 40);
        let a: Vec<u8> = groups[0].messages.iter().map(|m| m.payload[0]).collect();
        assert_eq!(a, vec![1, 2, 3]);
        assert_eq!(groups[1].descriptor.address, 41);
        let b: Vec<u8> = groups[1].messages.iter().map(|m| m.payload[0]).collect();
        assert_eq!(b, vec![1, 2]);
    }

    #[test]
    fn test_grouping_fails_on_unmapped_address() {
        let map = map();
        let input = vec![msg(40, vec![1]), msg(99, vec![1])];
        assert!(matches!(
            group_by_register(input, &map),
            Err(CodecError::UnknownRegister(99))
        ));
    }

    #[test]
    fn test_filter_keeps_only_matching_register() {
        let map = map();
        let desc = map.lookup(41).unwrap();
        let input = vec![msg(40, vec![1]), msg(41, vec![1, 0]), msg(40, vec![2])];
        let kept: Vec<RegisterMessage> = filter_register(input, desc).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].address, 41);
    }

    #[test]
    fn test_parse_surfaces_errors_per_element() {
        let map = map();
        let input = vec![msg(40, vec![1]), msg(40, vec![1, 2]), msg(40, vec![3])];
        let out: Vec<Result<u8>> = parse(input, &map).collect();
        assert_eq!(out.len(), 3);
        assert!(matches!(out[0], Ok(1)));
        assert!(matches!(out[1], Err(CodecError::PayloadLength { .. })));
        assert!(matches!(out[2], Ok(3)));
    }

    #[test]
    fn test_format_then_parse_is_identity() {
        let map = map();
        let values = vec![10u16, 20, 30];
        let msgs: Vec<RegisterMessage> = format(values.clone(), &map, 41, MessageKind::Write)
            .collect::<Result<_>>()
            .unwrap();
        let back: Vec<u16> = parse(msgs, &map).collect::<Result<_>>().unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_adapters_compose() {
        let map = map();
        let desc = map.lookup(40).unwrap();
        let input = vec![msg(40, vec![7]), msg(41, vec![0, 0]), msg(40, vec![8])];
        let values: Vec<u8> = parse(filter_register(input, desc), &map)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(values, vec![7, 8]);
    }
}
