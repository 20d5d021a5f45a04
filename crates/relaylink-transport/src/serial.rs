use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortType, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::ByteStream;

/// Baud rate used by the peripheral firmware.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// How long a write may stall before the device is treated as stuck.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Serial device settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: PathBuf,
    /// Line speed in bits per second. Default: 115200.
    pub baud_rate: u32,
    /// Upper bound on a single `write_bytes` or `flush`. Default: 1s.
    pub write_timeout: Duration,
}

impl SerialConfig {
    /// Settings for `path` at the default baud rate.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Override the baud rate.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the write timeout.
    pub fn write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }
}

/// A raw serial device configured as 8N1 without flow control.
///
/// Reads never wait: the port timeout is zero, so an empty receive buffer
/// surfaces as [`TransportError::Empty`]. Writes retry while the driver
/// reports it is busy, up to [`SerialConfig::write_timeout`].
pub struct SerialStream {
    port: Box<dyn SerialPort>,
    path: PathBuf,
    write_timeout: Duration,
}

impl SerialStream {
    /// Open and configure the device, discarding anything already queued.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let path = config.path.clone();
        let port = serialport::new(path.to_string_lossy(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::ZERO)
            .open()
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        port.clear(ClearBuffer::All)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        info!(?path, baud_rate = config.baud_rate, "opened serial port");
        Ok(Self {
            port,
            path,
            write_timeout: config.write_timeout,
        })
    }

    /// The device path this stream was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the device.
    pub fn close(self) {
        debug!(path = ?self.path, "closing serial port");
        drop(self.port);
    }
}

impl ByteStream for SerialStream {
    fn available(&mut self) -> Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(1) => return Ok(byte[0]),
                Ok(_) => return Err(TransportError::Closed),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::TimedOut || err.kind() == ErrorKind::WouldBlock =>
                {
                    return Err(TransportError::Empty)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        write_all_within(&mut *self.port, buf, self.write_timeout)
    }

    fn flush(&mut self) -> Result<()> {
        flush_within(&mut *self.port, self.write_timeout)
    }
}

fn is_busy(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Write all of `buf`, giving up once the writer has been busy for `budget`.
fn write_all_within<W: Write + ?Sized>(writer: &mut W, buf: &[u8], budget: Duration) -> Result<()> {
    let start = Instant::now();
    let mut offset = 0usize;
    while offset < buf.len() {
        match writer.write(&buf[offset..]) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_busy(&err) => {
                let waited = start.elapsed();
                if waited >= budget {
                    return Err(TransportError::WriteTimeout {
                        written: offset,
                        waited,
                    });
                }
                std::thread::yield_now();
            }
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
    Ok(())
}

fn flush_within<W: Write + ?Sized>(writer: &mut W, budget: Duration) -> Result<()> {
    let start = Instant::now();
    loop {
        match writer.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if is_busy(&err) => {
                let waited = start.elapsed();
                if waited >= budget {
                    return Err(TransportError::WriteTimeout { written: 0, waited });
                }
                std::thread::yield_now();
            }
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("path", &self.path)
            .finish()
    }
}

/// A serial device found on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// `usb`, `pci`, `bluetooth` or `unknown`.
    pub kind: &'static str,
    /// USB vendor/product id, when known.
    pub usb_id: Option<(u16, u16)>,
    pub product: Option<String>,
}

/// Enumerate serial devices.
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, usb_id, product) = match port.port_type {
                SerialPortType::UsbPort(info) => ("usb", Some((info.vid, info.pid)), info.product),
                SerialPortType::PciPort => ("pci", None, None),
                SerialPortType::BluetoothPort => ("bluetooth", None, None),
                SerialPortType::Unknown => ("unknown", None, None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                usb_id,
                product,
            }
        })
        .collect())
}
