use crate::PayloadKind;
use thiserror::Error;

pub type Result<T, E = CodecError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown register address {0}")]
    UnknownRegister(u8),
    #[error("duplicate register address {0} in map")]
    DuplicateAddress(u8),
    #[error("register {register}: expected {expected}-byte payload, got {actual}")]
    PayloadLength {
        register: u8,
        expected: usize,
        actual: usize,
    },
    #[error("register {register}: message carries no timestamp")]
    MissingTimestamp { register: u8 },
    #[error(
        "register {register}: payload is {expected:?}[{expected_count}], \
         requested {requested:?}[{requested_count}]"
    )]
    KindMismatch {
        register: u8,
        expected: PayloadKind,
        expected_count: u8,
        requested: PayloadKind,
        requested_count: u8,
    },
}
