use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Clone)]
pub struct LinkMetrics {
    pub tx_messages: IntCounter,
    pub rx_messages: IntCounter,
    pub decode_errors: IntCounter,
    pub registers_mapped: IntGauge,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub link: LinkMetrics,
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();
        let tx_messages = IntCounter::new("camctl_tx_messages", "Total register messages sent")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let rx_messages = IntCounter::new("camctl_rx_messages", "Total register messages received")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let decode_errors = IntCounter::new("camctl_decode_errors", "Total payload decode failures")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let registers_mapped =
            IntGauge::new("camctl_registers_mapped", "Number of registers in the device map")
                .map_err(|e| format!("metrics init error: {e}"))?;
        let link = LinkMetrics {
            tx_messages,
            rx_messages,
            decode_errors,
            registers_mapped,
        };
        let _ = registry.register(Box::new(link.tx_messages.clone()));
        let _ = registry.register(Box::new(link.rx_messages.clone()));
        let _ = registry.register(Box::new(link.decode_errors.clone()));
        let _ = registry.register(Box::new(link.registers_mapped.clone()));
        Ok(Self { registry, link })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
