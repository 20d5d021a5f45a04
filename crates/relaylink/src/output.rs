use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use relaylink::Message;
use relaylink_frame::Received;
use relaylink_transport::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    pairs: Vec<[u8; 2]>,
    checksum: u8,
    applied: usize,
    dropped: usize,
    timestamp: String,
}

pub fn print_frame(frame: &Received, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                pairs: frame.pairs().map(|(id, value)| [id, value]).collect(),
                checksum: frame.checksum,
                applied: frame.applied,
                dropped: frame.dropped,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "VALUE", "HEX"]);
            for (id, value) in frame.pairs() {
                table.add_row(vec![
                    id.to_string(),
                    value.to_string(),
                    format!("{value:#04x}"),
                ]);
            }
            println!("{table}");
            println!(
                "checksum={:#04x} applied={} dropped={}",
                frame.checksum, frame.applied, frame.dropped
            );
        }
        OutputFormat::Pretty => {
            let pairs: Vec<String> = frame
                .pairs()
                .map(|(id, value)| format!("{id}={value}"))
                .collect();
            println!(
                "frame pairs={} checksum={:#04x} dropped={} [{}]",
                frame.pair_count(),
                frame.checksum,
                frame.dropped,
                pairs.join(" ")
            );
        }
        OutputFormat::Raw => print_raw(frame.payload()),
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    kind: &'a str,
    length: usize,
    body: &'a [u8],
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<Vec<bool>>,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    let outputs = message
        .output_mask()
        .map(|mask| (0..8).map(|bit| mask & (1 << bit) != 0).collect::<Vec<_>>());

    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                kind: message.kind().name(),
                length: message.body().len(),
                body: message.body(),
                outputs,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "VALUE"]);
            for (index, value) in message.body().iter().enumerate() {
                table.add_row(vec![index.to_string(), value.to_string()]);
            }
            println!("{} ({} bytes)", message.kind().name(), message.body().len());
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "msg type={} length={}",
                message.kind().name(),
                message.body().len()
            );
            for (index, value) in message.body().iter().enumerate() {
                println!("{index} -- {value}");
            }
        }
        OutputFormat::Raw => print_raw(message.body()),
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    usb_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<&'a str>,
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|port| PortOutput {
                    name: &port.name,
                    kind: port.kind,
                    usb_id: port.usb_id.map(usb_id),
                    product: port.product.as_deref(),
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "USB ID", "PRODUCT"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    port.usb_id.map(usb_id).unwrap_or_default(),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for port in ports {
                println!("{} ({})", port.name, port.kind);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn usb_id((vid, pid): (u16, u16)) -> String {
    format!("{vid:04x}:{pid:04x}")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
