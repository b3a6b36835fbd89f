use std::collections::VecDeque;
use std::time::{Duration, Instant};

use bus_transport::{DeviceLink, MessageKind, RegisterMessage, TransportError};
use register_codec::{
    codec, RegisterDescriptor, RegisterMap, RegisterValue, Timestamped, WireValue,
};
use tracing::{debug, warn};

use crate::error::{DeviceError, Result};
use crate::metrics::MetricsHub;
use crate::registers::{self, EXPECTED_WHO_AM_I};

/// Default bound on waiting for a correlated reply, in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// The per-connection facade over one CameraControllerGen2.
///
/// `connect` validates the device identity before handing out the facade, so
/// a `Device` value is always ready; a failed identity check or transport
/// error leaves nothing behind and a fresh `connect` is the only recovery.
///
/// Every I/O method takes `&mut self`, which serializes requests on the
/// single underlying channel: two concurrent calls can never interleave one
/// request/reply pair with another's bytes. Replies are correlated by
/// address; a stale reply left over from a timed-out request is discarded,
/// and unsolicited event messages arriving mid-request are parked for
/// [`poll_event`](Device::poll_event).
pub struct Device<L: DeviceLink> {
    link: L,
    target: String,
    map: RegisterMap,
    timeout_ms: Option<u64>,
    events: VecDeque<RegisterMessage>,
    metrics: Option<MetricsHub>,
}

impl<L: DeviceLink> std::fmt::Debug for Device<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("target", &self.target)
            .field("timeout_ms", &self.timeout_ms)
            .field("registers", &self.map.len())
            .field("pending_events", &self.events.len())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl<L: DeviceLink> Device<L> {
    /// Establish a connection over an already-opened link.
    ///
    /// Reads the `WhoAmI` register exactly once and fails with
    /// [`DeviceError::UnexpectedDevice`] if the reported identity is not
    /// this binding's device type. `target` names the connection for
    /// diagnostics ("wrong device plugged into this port").
    pub fn connect(link: L, target: &str) -> Result<Self> {
        let map = registers::register_map()?;
        let mut device = Self {
            link,
            target: target.to_string(),
            map,
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            events: VecDeque::new(),
            metrics: None,
        };
        let found: u16 = device.read_register(&registers::WHO_AM_I)?;
        if found != EXPECTED_WHO_AM_I {
            return Err(DeviceError::UnexpectedDevice {
                expected: EXPECTED_WHO_AM_I,
                found,
                target: device.target,
            });
        }
        debug!(target = %device.target, who_am_i = found, "device identity verified");
        Ok(device)
    }

    /// Adjust the reply timeout. `None` blocks indefinitely, backend
    /// permitting.
    pub fn with_timeout(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Attach a metrics hub; counters are updated on every send, receive,
    /// and decode failure.
    pub fn with_metrics(mut self, metrics: MetricsHub) -> Self {
        metrics.link.registers_mapped.set(self.map.len() as i64);
        self.metrics = Some(metrics);
        self
    }

    /// The register map shared by every instance of this device type.
    pub fn map(&self) -> &RegisterMap {
        &self.map
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Read a register as the domain type `T`.
    pub fn read_register<T: RegisterValue>(&mut self, desc: &RegisterDescriptor) -> Result<T> {
        let reply = self.request(desc.address, MessageKind::Read, Vec::new())?;
        self.decode_reply(|map| codec::decode::<T>(map, &reply))
    }

    /// Read a register along with the device timestamp of the reply.
    pub fn read_register_timestamped<T: RegisterValue>(
        &mut self,
        desc: &RegisterDescriptor,
    ) -> Result<Timestamped<T>> {
        let reply = self.request(desc.address, MessageKind::Read, Vec::new())?;
        self.decode_reply(|map| codec::decode_timestamped::<T>(map, &reply))
    }

    /// Read a register dynamically, typed by its descriptor. For tooling.
    pub fn read_value(&mut self, desc: &RegisterDescriptor) -> Result<WireValue> {
        let reply = self.request(desc.address, MessageKind::Read, Vec::new())?;
        self.decode_reply(|map| codec::decode_value(map, &reply))
    }

    /// As [`read_value`](Device::read_value), with the reply's device
    /// timestamp.
    pub fn read_value_timestamped(
        &mut self,
        desc: &RegisterDescriptor,
    ) -> Result<Timestamped<WireValue>> {
        let reply = self.request(desc.address, MessageKind::Read, Vec::new())?;
        self.decode_reply(|map| codec::decode_value_timestamped(map, &reply))
    }

    /// Write a typed value to a register and wait for the device's echo.
    pub fn write_register<T: RegisterValue>(
        &mut self,
        desc: &RegisterDescriptor,
        value: &T,
    ) -> Result<()> {
        let msg = codec::encode(&self.map, desc.address, MessageKind::Write, value)?;
        self.send(&msg)?;
        self.await_reply(desc.address, MessageKind::Write)?;
        Ok(())
    }

    /// Dynamic counterpart of [`write_register`](Device::write_register).
    pub fn write_value(&mut self, desc: &RegisterDescriptor, value: &WireValue) -> Result<()> {
        let msg = codec::encode_value(&self.map, desc.address, MessageKind::Write, value)?;
        self.send(&msg)?;
        self.await_reply(desc.address, MessageKind::Write)?;
        Ok(())
    }

    /// Pop the oldest event message parked while waiting for replies.
    pub fn poll_event(&mut self) -> Option<RegisterMessage> {
        self.events.pop_front()
    }

    /// Release the underlying link, dropping any parked events.
    pub fn release(self) -> L {
        self.link
    }

    fn request(
        &mut self,
        address: u8,
        kind: MessageKind,
        payload: Vec<u8>,
    ) -> Result<RegisterMessage> {
        self.send(&RegisterMessage::new(address, kind, payload))?;
        self.await_reply(address, kind)
    }

    fn send(&mut self, msg: &RegisterMessage) -> Result<()> {
        self.link.send(msg)?;
        if let Some(m) = &self.metrics {
            m.link.tx_messages.inc();
        }
        Ok(())
    }

    fn await_reply(&mut self, address: u8, kind: MessageKind) -> Result<RegisterMessage> {
        // The timeout bounds the whole wait, not each recv: a stream of
        // events or stale replies must not extend the deadline.
        let deadline = self
            .timeout_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        loop {
            let remaining_ms = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(TransportError::Timeout.into());
                    }
                    Some(remaining.as_millis() as u64)
                }
                None => None,
            };
            let msg = self.link.recv(remaining_ms)?;
            if let Some(m) = &self.metrics {
                m.link.rx_messages.inc();
            }
            if msg.kind == MessageKind::Event {
                self.events.push_back(msg);
                continue;
            }
            if msg.address == address && msg.kind == kind {
                return Ok(msg);
            }
            // Stale reply from an earlier timed-out or abandoned request.
            warn!(
                address = msg.address,
                kind = %msg.kind,
                awaiting = address,
                "discarding uncorrelated reply"
            );
        }
    }

    fn decode_reply<T>(
        &self,
        decode: impl FnOnce(&RegisterMap) -> register_codec::Result<T>,
    ) -> Result<T> {
        match decode(&self.map) {
            Ok(value) => Ok(value),
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.link.decode_errors.inc();
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{
        loopback_device, EXPECTED_WHO_AM_I, FIRMWARE_VERSION_HIGH, START_AND_STOP, WHO_AM_I,
    };
    use crate::values::CameraFlags;

    #[test]
    fn test_connect_verifies_identity() {
        let link = loopback_device("loop0").unwrap();
        let mut device = Device::connect(link, "loop0").unwrap();
        let who: u16 = device.read_register(&WHO_AM_I).unwrap();
        assert_eq!(who, EXPECTED_WHO_AM_I);
    }

    #[test]
    fn test_connect_rejects_wrong_device() {
        let mut link = loopback_device("loop0").unwrap();
        link.set_register(WHO_AM_I.address, 9999u16.to_le_bytes().to_vec());
        let err = Device::connect(link, "loop0");
        match err {
            Err(DeviceError::UnexpectedDevice {
                expected,
                found,
                target,
            }) => {
                assert_eq!(expected, EXPECTED_WHO_AM_I);
                assert_eq!(found, 9999);
                assert_eq!(target, "loop0");
            }
            other => panic!("expected UnexpectedDevice, got {other:?}"),
        }
    }

    #[test]
    fn test_write_then_read_back_flags() {
        let link = loopback_device("loop0").unwrap();
        let mut device = Device::connect(link, "loop0").unwrap();
        let flags = CameraFlags::START_CAM0 | CameraFlags::START_CAM1;
        device.write_register(&START_AND_STOP, &flags).unwrap();
        let back: CameraFlags = device.read_register(&START_AND_STOP).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn test_timestamped_read_carries_device_time() {
        let link = loopback_device("loop0").unwrap();
        let mut device = Device::connect(link, "loop0").unwrap();
        let stamped = device
            .read_register_timestamped::<u8>(&FIRMWARE_VERSION_HIGH)
            .unwrap();
        assert_eq!(stamped.value, 3);
        assert!(stamped.seconds() > 0.0);
    }

    #[test]
    fn test_event_during_read_is_parked_not_matched() {
        let mut link = loopback_device("loop0").unwrap();
        link.push_event(32, vec![0x01]);
        let mut device = Device::connect(link, "loop0").unwrap();
        // The event arrived ahead of the identity reply and was parked.
        let event = device.poll_event();
        assert!(matches!(event, Some(RegisterMessage { address: 32, .. })));
        // Subsequent reads still correlate correctly.
        let who: u16 = device.read_register(&WHO_AM_I).unwrap();
        assert_eq!(who, EXPECTED_WHO_AM_I);
    }

    #[test]
    fn test_read_value_dispatches_on_descriptor() {
        let link = loopback_device("loop0").unwrap();
        let mut device = Device::connect(link, "loop0").unwrap();
        let value = device.read_value(&WHO_AM_I).unwrap();
        assert_eq!(value, WireValue::U16(EXPECTED_WHO_AM_I));
    }
}
