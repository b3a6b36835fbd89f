use std::collections::{BTreeMap, VecDeque};

use crate::{DeviceLink, DeviceTime, LinkInfo, MessageKind, RegisterMessage, Result, TransportError};
use tracing::trace;

/// An in-process register file that behaves like a connected device.
///
/// Reads are answered from stored state, writes are applied and echoed back,
/// and every reply carries a synthetic device timestamp. Unsolicited events
/// can be queued with [`push_event`](LoopbackLink::push_event) to exercise
/// dispatch paths.
pub struct LoopbackLink {
    name: String,
    registers: BTreeMap<u8, Vec<u8>>,
    queue: VecDeque<RegisterMessage>,
    uptime: u32,
}

impl LoopbackLink {
    /// Seed one register with an initial payload, builder style.
    pub fn with_register(mut self, address: u8, payload: Vec<u8>) -> Self {
        self.registers.insert(address, payload);
        self
    }

    /// Overwrite the stored payload of one register.
    pub fn set_register(&mut self, address: u8, payload: Vec<u8>) {
        self.registers.insert(address, payload);
    }

    /// Current stored payload of one register, if seeded.
    pub fn register(&self, address: u8) -> Option<&[u8]> {
        self.registers.get(&address).map(Vec::as_slice)
    }

    /// Queue an unsolicited event to be delivered ahead of pending replies.
    pub fn push_event(&mut self, address: u8, payload: Vec<u8>) {
        let time = self.tick();
        self.queue
            .push_back(RegisterMessage::timestamped(address, MessageKind::Event, time, payload));
    }

    fn tick(&mut self) -> DeviceTime {
        self.uptime = self.uptime.wrapping_add(1);
        DeviceTime::new(self.uptime, 0)
    }
}

impl DeviceLink for LoopbackLink {
    fn open(name: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            registers: BTreeMap::new(),
            queue: VecDeque::new(),
            uptime: 0,
        })
    }

    fn list() -> Result<Vec<LinkInfo>> {
        Ok(vec![LinkInfo {
            name: "loop0".to_string(),
            driver: "loopback".to_string(),
        }])
    }

    fn recv(&mut self, _timeout_ms: Option<u64>) -> Result<RegisterMessage> {
        self.queue.pop_front().ok_or(TransportError::Timeout)
    }

    fn send(&mut self, msg: &RegisterMessage) -> Result<()> {
        trace!(link = %self.name, address = msg.address, kind = %msg.kind, "loopback send");
        match msg.kind {
            MessageKind::Read => {
                let payload = self
                    .registers
                    .get(&msg.address)
                    .cloned()
                    .ok_or_else(|| {
                        TransportError::Io(format!("read of unmapped register {}", msg.address))
                    })?;
                let time = self.tick();
                self.queue.push_back(RegisterMessage::timestamped(
                    msg.address,
                    MessageKind::Read,
                    time,
                    payload,
                ));
                Ok(())
            }
            MessageKind::Write => {
                self.registers.insert(msg.address, msg.payload.clone());
                let time = self.tick();
                self.queue.push_back(RegisterMessage::timestamped(
                    msg.address,
                    MessageKind::Write,
                    time,
                    msg.payload.clone(),
                ));
                Ok(())
            }
            MessageKind::Event => Err(TransportError::Unsupported(
                "events originate from the device, not the host",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> LoopbackLink {
        LoopbackLink::open("loop0").unwrap()
    }

    #[test]
    fn test_read_returns_seeded_payload() {
        let mut link = open().with_register(5, vec![0xAA, 0xBB]);
        link.send(&RegisterMessage::new(5, MessageKind::Read, Vec::new()))
            .unwrap();
        let reply = link.recv(None).unwrap();
        assert_eq!(reply.kind, MessageKind::Read);
        assert_eq!(reply.address, 5);
        assert_eq!(reply.payload, vec![0xAA, 0xBB]);
        assert!(reply.timestamp.is_some());
    }

    #[test]
    fn test_write_applies_and_echoes() {
        let mut link = open().with_register(7, vec![0x00]);
        link.send(&RegisterMessage::new(7, MessageKind::Write, vec![0x42]))
            .unwrap();
        assert_eq!(link.register(7), Some(&[0x42u8][..]));
        let echo = link.recv(None).unwrap();
        assert_eq!(echo.kind, MessageKind::Write);
        assert_eq!(echo.address, 7);
    }

    #[test]
    fn test_read_of_unmapped_register_fails() {
        let mut link = open();
        let err = link.send(&RegisterMessage::new(99, MessageKind::Read, Vec::new()));
        assert!(matches!(err, Err(TransportError::Io(_))));
    }

    #[test]
    fn test_empty_queue_times_out() {
        let mut link = open();
        assert!(matches!(link.recv(Some(10)), Err(TransportError::Timeout)));
    }

    #[test]
    fn test_pushed_event_is_delivered_first() {
        let mut link = open().with_register(3, vec![0x01]);
        link.push_event(32, vec![0x02]);
        link.send(&RegisterMessage::new(3, MessageKind::Read, Vec::new()))
            .unwrap();
        let first = link.recv(None).unwrap();
        assert_eq!(first.kind, MessageKind::Event);
        assert_eq!(first.address, 32);
    }
}
