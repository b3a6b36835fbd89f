use std::collections::BTreeMap;

use tracing::debug;

use crate::{CodecError, RegisterDescriptor, Result};

/// Address to descriptor table for one device type.
///
/// Built once from the device's static descriptor table and queried read-only
/// afterward; the map is safe to share across every consumer of the same
/// device type. Address uniqueness is checked here, at construction, not per
/// call.
#[derive(Clone, Debug, Default)]
pub struct RegisterMap {
    by_address: BTreeMap<u8, &'static RegisterDescriptor>,
}

impl RegisterMap {
    pub fn from_table(table: &'static [RegisterDescriptor]) -> Result<Self> {
        let mut by_address = BTreeMap::new();
        for desc in table {
            if by_address.insert(desc.address, desc).is_some() {
                return Err(CodecError::DuplicateAddress(desc.address));
            }
        }
        debug!(registers = by_address.len(), "register map built");
        Ok(Self { by_address })
    }

    /// Descriptor for `address`, failing for any unmapped address.
    pub fn lookup(&self, address: u8) -> Result<&'static RegisterDescriptor> {
        self.by_address
            .get(&address)
            .copied()
            .ok_or(CodecError::UnknownRegister(address))
    }

    /// Non-failing probe, for tooling that wants to classify unknown traffic.
    pub fn get(&self, address: u8) -> Option<&'static RegisterDescriptor> {
        self.by_address.get(&address).copied()
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    /// Descriptors in address order.
    pub fn iter(&self) -> impl Iterator<Item = &'static RegisterDescriptor> + '_ {
        self.by_address.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PayloadKind;

    static TABLE: [RegisterDescriptor; 2] = [
        RegisterDescriptor::scalar("alpha", 1, PayloadKind::U8),
        RegisterDescriptor::scalar("beta", 2, PayloadKind::U16),
    ];

    static CLASHING: [RegisterDescriptor; 2] = [
        RegisterDescriptor::scalar("alpha", 1, PayloadKind::U8),
        RegisterDescriptor::scalar("alpha_again", 1, PayloadKind::U32),
    ];

    #[test]
    fn test_lookup_hit_and_miss() {
        let map = RegisterMap::from_table(&TABLE).unwrap();
        assert_eq!(map.lookup(2).unwrap().name, "beta");
        assert!(matches!(map.lookup(3), Err(CodecError::UnknownRegister(3))));
        assert!(map.get(3).is_none());
    }

    #[test]
    fn test_duplicate_addresses_rejected() {
        let err = RegisterMap::from_table(&CLASHING);
        assert!(matches!(err, Err(CodecError::DuplicateAddress(1))));
    }

    #[test]
    fn test_iter_in_address_order() {
        let map = RegisterMap::from_table(&TABLE).unwrap();
        let addresses: Vec<u8> = map.iter().map(|d| d.address).collect();
        assert_eq!(addresses, vec![1, 2]);
    }
}
