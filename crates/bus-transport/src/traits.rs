use crate::{LinkInfo, RegisterMessage, Result};

/// A minimal blocking link carrying framed register messages.
pub trait DeviceLink {
    /// Open a link by name (e.g., "ttyACM0", "loop0").
    fn open(name: &str) -> Result<Self>
    where
        Self: Sized;

    /// Attempt to list available links for this backend.
    fn list() -> Result<Vec<LinkInfo>>;

    /// Receive one message (blocking with optional timeout in milliseconds).
    fn recv(&mut self, timeout_ms: Option<u64>) -> Result<RegisterMessage>;

    /// Send one message.
    fn send(&mut self, msg: &RegisterMessage) -> Result<()>;
}
