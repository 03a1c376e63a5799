//! Serial port access
//!
//! Opens the UART connection to the device as an async byte stream and lists
//! the ports the OS exposes, so a wrong `serial.port` is easy to correct.

use crate::config::SerialConfig;
use crate::error::{Error, Result};
use std::fmt;
use tokio_serial::{SerialPortBuilderExt, SerialPortType, SerialStream};

/// Open the configured serial port
///
/// Must be called from within a tokio runtime. The port is opened 8N1 with no
/// flow control.
pub fn open(config: &SerialConfig) -> Result<SerialStream> {
    let stream = tokio_serial::new(&config.port, config.baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(config.read_timeout)
        .open_native_async()
        .map_err(|source| Error::SerialOpen {
            port: config.port.clone(),
            source,
        })?;

    tracing::debug!(port = %config.port, baud_rate = config.baud_rate, "serial port opened");
    Ok(stream)
}

/// Kind of device behind a serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortKind {
    /// USB-to-UART bridge or native USB CDC (ESP32 dev boards show up here)
    Usb {
        /// USB vendor ID
        vid: u16,
        /// USB product ID
        pid: u16,
        /// Product string, if reported
        product: Option<String>,
    },
    /// PCI serial card
    Pci,
    /// Bluetooth serial profile
    Bluetooth,
    /// Anything else (built-in UARTs, virtual ports)
    Unknown,
}

/// A serial port the OS reports as available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Identifier to put in `serial.port`
    pub name: String,
    /// Device kind
    pub kind: PortKind,
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PortKind::Usb { vid, pid, product } => {
                write!(f, "{} (USB {:04x}:{:04x}", self.name, vid, pid)?;
                if let Some(product) = product {
                    write!(f, " {}", product)?;
                }
                write!(f, ")")
            }
            PortKind::Pci => write!(f, "{} (PCI)", self.name),
            PortKind::Bluetooth => write!(f, "{} (Bluetooth)", self.name),
            PortKind::Unknown => write!(f, "{}", self.name),
        }
    }
}

/// List serial ports currently available on this machine
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = tokio_serial::available_ports().map_err(Error::PortEnumeration)?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let kind = match port.port_type {
                SerialPortType::UsbPort(info) => PortKind::Usb {
                    vid: info.vid,
                    pid: info.pid,
                    product: info.product,
                },
                SerialPortType::PciPort => PortKind::Pci,
                SerialPortType::BluetoothPort => PortKind::Bluetooth,
                SerialPortType::Unknown => PortKind::Unknown,
            };
            PortInfo {
                name: port.port_name,
                kind,
            }
        })
        .collect())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Recovery;

    #[tokio::test]
    async fn opening_a_missing_port_is_fatal() {
        let config = SerialConfig {
            port: "/dev/serial-fwd-no-such-port".into(),
            ..Default::default()
        };

        let err = open(&config).unwrap_err();
        match &err {
            Error::SerialOpen { port, .. } => assert_eq!(port, "/dev/serial-fwd-no-such-port"),
            other => panic!("expected SerialOpen, got {other:?}"),
        }
        assert_eq!(err.recovery(), Recovery::Fatal);
    }

    #[test]
    fn port_info_display() {
        let usb = PortInfo {
            name: "/dev/ttyACM0".into(),
            kind: PortKind::Usb {
                vid: 0x303a,
                pid: 0x1001,
                product: Some("USB JTAG/serial debug unit".into()),
            },
        };
        assert_eq!(
            usb.to_string(),
            "/dev/ttyACM0 (USB 303a:1001 USB JTAG/serial debug unit)"
        );

        let bare = PortInfo {
            name: "COM23".into(),
            kind: PortKind::Usb {
                vid: 0x10c4,
                pid: 0xea60,
                product: None,
            },
        };
        assert_eq!(bare.to_string(), "COM23 (USB 10c4:ea60)");

        let builtin = PortInfo {
            name: "/dev/ttyS0".into(),
            kind: PortKind::Unknown,
        };
        assert_eq!(builtin.to_string(), "/dev/ttyS0");
    }
}
