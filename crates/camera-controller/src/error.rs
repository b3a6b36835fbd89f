use bus_transport::TransportError;
use register_codec::CodecError;
use thiserror::Error;

pub type Result<T, E = DeviceError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unexpected device at {target}: WhoAmI reported {found}, expected {expected}")]
    UnexpectedDevice {
        expected: u16,
        found: u16,
        target: String,
    },
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}
