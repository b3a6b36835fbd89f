use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

use bus_transport as bus;
use bus_transport::DeviceLink;
use camera_controller::registers;
use camera_controller::{Device, MetricsHub};
use register_codec::{decode_value, PayloadKind, RegisterDescriptor, RegisterMap, WireValue};

#[derive(Parser, Debug)]
#[command(
    name = "camctl",
    version,
    about = "CameraControllerGen2 operations CLI",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Backend {
    Mock,
    Loopback,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the device register table
    Regs {
        /// Print the table as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Decode a raw payload against the register map
    Decode {
        /// Register name or address (decimal or hex like 0x24)
        #[arg(long)]
        register: String,
        /// Payload bytes as hex, space-separated (e.g., "03" or "aa bb")
        #[arg(long, value_delimiter = ' ')]
        data: Vec<String>,
    },
    /// Read one register through the device facade (loopback device)
    Read {
        /// Register name or address
        #[arg(long)]
        register: String,
        /// Link name to open
        #[arg(long, default_value = "loop0")]
        device: String,
        /// Also report the reply's device timestamp
        #[arg(long, action = ArgAction::SetTrue)]
        timestamped: bool,
    },
    /// Write one register through the device facade (loopback device)
    Write {
        /// Register name or address
        #[arg(long)]
        register: String,
        /// Value to write (decimal, hex like 0x3, or float for F32)
        #[arg(long)]
        value: String,
        /// Link name to open
        #[arg(long, default_value = "loop0")]
        device: String,
    },
    /// Sniff messages from a link
    Sniff {
        /// Number of messages to read before exiting
        #[arg(long, default_value_t = 10)]
        count: u32,
        /// Backend to use
        #[arg(long, value_enum, default_value_t = Backend::Mock)]
        backend: Backend,
        /// Link name to open
        #[arg(long, default_value = "mock0")]
        device: String,
        /// Write messages to an NDJSON log file
        #[arg(long)]
        to: Option<String>,
        /// Decode payloads against the register map and print JSON
        #[arg(long, action = ArgAction::SetTrue)]
        decode: bool,
    },
    /// Open a device, verify identity, and report versions and metrics
    Doctor {
        /// Link name to open
        #[arg(long, default_value = "loop0")]
        device: String,
    },
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Regs { json } => regs(json),
        Commands::Decode { register, data } => decode_cmd(&register, &data),
        Commands::Read {
            register,
            device,
            timestamped,
        } => read_cmd(&register, &device, timestamped),
        Commands::Write {
            register,
            value,
            device,
        } => write_cmd(&register, &value, &device),
        Commands::Sniff {
            count,
            backend,
            device,
            to,
            decode,
        } => sniff(count, backend, &device, to.as_deref(), decode),
        Commands::Doctor { device } => doctor(&device),
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn regs(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&registers::REGISTERS)?);
        return Ok(());
    }
    for desc in &registers::REGISTERS {
        println!(
            "{addr}\t{name}\t{kind:?}[{count}]",
            addr = desc.address,
            name = desc.name,
            kind = desc.kind,
            count = desc.count
        );
    }
    Ok(())
}

fn decode_cmd(register: &str, data_hex: &[String]) -> Result<()> {
    let map = registers::register_map()?;
    let desc = resolve_register(register)?;
    let bytes = parse_hex_bytes(data_hex)?;
    let msg = bus::RegisterMessage::new(desc.address, bus::MessageKind::Read, bytes);
    let value = decode_value(&map, &msg)?;
    println!(
        "{}",
        serde_json::json!({
            "register": desc.name,
            "address": desc.address,
            "value": value,
        })
    );
    Ok(())
}

fn read_cmd(register: &str, device: &str, timestamped: bool) -> Result<()> {
    let desc = resolve_register(register)?;
    let link = registers::loopback_device(device)?;
    let mut dev = Device::connect(link, device)?;
    if timestamped {
        let stamped = dev.read_value_timestamped(desc)?;
        println!(
            "{name} = {value}\t@ {secs:.6}s",
            name = desc.name,
            value = serde_json::to_string(&stamped.value)?,
            secs = stamped.seconds()
        );
    } else {
        let value = dev.read_value(desc)?;
        println!(
            "{name} = {value}",
            name = desc.name,
            value = serde_json::to_string(&value)?
        );
    }
    Ok(())
}

fn write_cmd(register: &str, raw_value: &str, device: &str) -> Result<()> {
    let desc = resolve_register(register)?;
    let value = parse_wire_value(desc, raw_value)?;
    let link = registers::loopback_device(device)?;
    let mut dev = Device::connect(link, device)?;
    dev.write_value(desc, &value)?;
    info!(register = desc.name, device, "write acknowledged");
    let back = dev.read_value(desc)?;
    println!(
        "{name} = {value}",
        name = desc.name,
        value = serde_json::to_string(&back)?
    );
    Ok(())
}

fn sniff(count: u32, backend: Backend, device: &str, to: Option<&str>, decode: bool) -> Result<()> {
    let map = registers::register_map()?;
    let mut writer = match to {
        Some(path) => {
            let file = File::create(path)?;
            let mut w = BufWriter::new(file);
            let header = camlog_header_line(backend, device);
            w.write_all(header.as_bytes())?;
            w.write_all(b"\n")?;
            Some(w)
        }
        None => None,
    };

    match backend {
        Backend::Mock => {
            let mut link = bus::MockLink::open(device)?;
            for _ in 0..count {
                handle_message(&mut writer, &map, decode, &link.recv(Some(250))?)?;
            }
        }
        Backend::Loopback => {
            let mut link = registers::loopback_device(device)?;
            for _ in 0..count {
                handle_message(&mut writer, &map, decode, &link.recv(Some(250))?)?;
            }
        }
    }
    Ok(())
}

fn handle_message(
    writer: &mut Option<BufWriter<File>>,
    map: &RegisterMap,
    decode: bool,
    msg: &bus::RegisterMessage,
) -> Result<()> {
    print_message(msg);
    if let Some(w) = writer.as_mut() {
        let line = camlog_record_line(msg);
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    if decode {
        // Unknown traffic is reported, not dropped
        match map.get(msg.address) {
            Some(desc) => {
                let value = decode_value(map, msg)?;
                println!(
                    "{}",
                    serde_json::json!({
                        "register": desc.name,
                        "address": desc.address,
                        "value": value,
                    })
                );
            }
            None => {
                println!(
                    "{}",
                    serde_json::json!({ "unknown_register": msg.address })
                );
            }
        }
    }
    Ok(())
}

fn doctor(device: &str) -> Result<()> {
    let metrics = MetricsHub::new().map_err(|e| anyhow::anyhow!(e))?;
    let link = registers::loopback_device(device)?;
    println!("open: ok");
    let mut dev = Device::connect(link, device)?.with_metrics(metrics.clone());
    println!("identity: ok ({})", registers::EXPECTED_WHO_AM_I);

    let hw_high: u8 = dev.read_register(&registers::HARDWARE_VERSION_HIGH)?;
    let hw_low: u8 = dev.read_register(&registers::HARDWARE_VERSION_LOW)?;
    let fw_high: u8 = dev.read_register(&registers::FIRMWARE_VERSION_HIGH)?;
    let fw_low: u8 = dev.read_register(&registers::FIRMWARE_VERSION_LOW)?;
    println!("hardware: {hw_high}.{hw_low}");
    println!("firmware: {fw_high}.{fw_low}");

    let uptime = dev.read_value_timestamped(&registers::TIMESTAMP_SECONDS)?;
    println!("device clock: {:.6}s", uptime.seconds());

    println!("---\n{}", metrics.encode_text());
    println!("doctor: done");
    Ok(())
}

fn resolve_register(selector: &str) -> Result<&'static RegisterDescriptor> {
    if let Some(desc) = registers::find_register(selector) {
        return Ok(desc);
    }
    let address = parse_unsigned(selector)
        .ok()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| anyhow::anyhow!("no register named or addressed '{selector}'"))?;
    registers::REGISTERS
        .iter()
        .find(|desc| desc.address == address)
        .ok_or_else(|| anyhow::anyhow!("no register at address {address}"))
}

fn parse_wire_value(desc: &RegisterDescriptor, raw: &str) -> Result<WireValue> {
    if desc.count != 1 {
        anyhow::bail!("register {} is array-valued; write one element at a time", desc.name);
    }
    let t = raw.trim();
    let value = match desc.kind {
        PayloadKind::U8 => WireValue::U8(u8::try_from(parse_unsigned(t)?)?),
        PayloadKind::U16 => WireValue::U16(u16::try_from(parse_unsigned(t)?)?),
        PayloadKind::U32 => WireValue::U32(u32::try_from(parse_unsigned(t)?)?),
        PayloadKind::S8 => WireValue::S8(i8::try_from(parse_signed(t)?)?),
        PayloadKind::S16 => WireValue::S16(i16::try_from(parse_signed(t)?)?),
        PayloadKind::S32 => WireValue::S32(i32::try_from(parse_signed(t)?)?),
        PayloadKind::F32 => WireValue::F32(t.parse()?),
    };
    Ok(value)
}

fn parse_unsigned(s: &str) -> Result<u64> {
    let t = s.trim();
    if let Some(hex) = t.strip_prefix("0x") {
        Ok(u64::from_str_radix(hex, 16)?)
    } else {
        Ok(t.parse()?)
    }
}

fn parse_signed(s: &str) -> Result<i64> {
    let t = s.trim();
    if let Some(hex) = t.strip_prefix("0x") {
        Ok(i64::from_str_radix(hex, 16)?)
    } else if let Some(hex) = t.strip_prefix("-0x") {
        Ok(-i64::from_str_radix(hex, 16)?)
    } else {
        Ok(t.parse()?)
    }
}

fn parse_hex_bytes(items: &[String]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(items.len());
    for s in items {
        let t = s.trim();
        let no_prefix = t.strip_prefix("0x").unwrap_or(t);
        let b = u8::from_str_radix(no_prefix, 16)
            .map_err(|e| anyhow::anyhow!("invalid hex byte '{t}': {e}"))?;
        out.push(b);
    }
    Ok(out)
}

fn print_message(msg: &bus::RegisterMessage) {
    let ts = msg
        .timestamp
        .map(|t| format!("{t}"))
        .unwrap_or_default();
    let mut data = String::new();
    for b in &msg.payload {
        let _ = core::fmt::Write::write_fmt(&mut data, format_args!("{b:02X} "));
    }
    println!(
        "{kind}\taddr={addr}\t{data}\t{ts}",
        kind = msg.kind,
        addr = msg.address,
        data = data.trim_end(),
        ts = ts
    );
}

fn camlog_header_line(backend: Backend, device: &str) -> String {
    let header = CamlogHeader {
        format: "camlog".to_string(),
        version: 1,
        backend: format!("{backend:?}"),
        device: device.to_string(),
    };
    serde_json::to_string(&header).unwrap_or_else(|_| "{}".to_string())
}

fn camlog_record_line(msg: &bus::RegisterMessage) -> String {
    let wall = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let mut data = String::new();
    for b in &msg.payload {
        let _ = core::fmt::Write::write_fmt(&mut data, format_args!("{b:02X}"));
    }
    let rec = CamlogRecord {
        ts: wall,
        kind: msg.kind.to_string(),
        address: msg.address,
        len: msg.payload.len(),
        data,
        device_ts: msg.timestamp.map(|t| t.as_secs_f64()),
    };
    serde_json::to_string(&rec).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Serialize, Deserialize)]
struct CamlogHeader {
    format: String,
    version: u32,
    backend: String,
    device: String,
}

#[derive(Serialize, Deserialize)]
struct CamlogRecord {
    ts: String,
    kind: String,
    address: u8,
    len: usize,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_ts: Option<f64>,
}
