use crate::{DeviceLink, DeviceTime, LinkInfo, MessageKind, RegisterMessage, Result};
use tracing::trace;

/// Address of the heartbeat register the mock emits events for.
const HEARTBEAT_ADDRESS: u8 = 8;

/// A simple in-process mock link. Each instance is independent and keeps a
/// synthetic device clock that advances once per received message.
pub struct MockLink {
    name: String,
    uptime: u32,
}

impl DeviceLink for MockLink {
    fn open(name: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            uptime: 0,
        })
    }

    fn list() -> Result<Vec<LinkInfo>> {
        Ok(vec![LinkInfo {
            name: "mock0".to_string(),
            driver: "mock".to_string(),
        }])
    }

    fn recv(&mut self, _timeout_ms: Option<u64>) -> Result<RegisterMessage> {
        // Produce a timestamped heartbeat event every time we're called so
        // inbound flows are testable without hardware.
        self.uptime = self.uptime.wrapping_add(1);
        let time = DeviceTime::new(self.uptime, 0);
        let msg = RegisterMessage::timestamped(
            HEARTBEAT_ADDRESS,
            MessageKind::Event,
            time,
            self.uptime.to_le_bytes().to_vec(),
        );
        trace!(link = %self.name, uptime = self.uptime, "mock heartbeat");
        Ok(msg)
    }

    fn send(&mut self, msg: &RegisterMessage) -> Result<()> {
        // Accept any message; pretend it was sent
        trace!(link = %self.name, address = msg.address, "mock send");
        Ok(())
    }
}
