//! Shell client over the device's virtual COM port.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use serialport::{SerialPort, SerialPortType};

/// USB IDs the firmware enumerates with
pub const VENDOR_ID: u16 = 0x0483;
pub const PRODUCT_ID: u16 = 0x5740;

pub const PROMPT: &str = "sh> ";
pub const BANNER: &str = "breakout shell";

/// Find the device's serial port by its USB IDs.
pub fn find_shell_port() -> Result<String> {
    let ports = serialport::available_ports()?;

    for port_info in ports {
        if let SerialPortType::UsbPort(usb) = &port_info.port_type {
            if usb.vid == VENDOR_ID && usb.pid == PRODUCT_ID {
                return Ok(port_info.port_name);
            }
        }
    }

    anyhow::bail!(
        "No device with ID {:04x}:{:04x} found - ensure it is connected",
        VENDOR_ID,
        PRODUCT_ID
    )
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str) -> Result<String> {
    if port_arg == "auto" {
        find_shell_port()
    } else {
        Ok(port_arg.to_string())
    }
}

/// Client driving one shell session.
///
/// Opening the port raises DTR, which is what makes the firmware start a
/// session; dropping the client closes it again.
pub struct ShellClient {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl ShellClient {
    /// Open the port and assert DTR.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let mut port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;
        port.write_data_terminal_ready(true)?;

        Ok(Self {
            port,
            timeout: Duration::from_secs(2),
        })
    }

    /// Read until `marker` has been seen, returning everything read.
    pub fn read_until(&mut self, marker: &str) -> Result<String> {
        let mut data = Vec::new();
        let mut buf = [0u8; 64];
        let start = Instant::now();

        while start.elapsed() < self.timeout {
            match self.port.read(&mut buf) {
                Ok(n) => {
                    data.extend_from_slice(&buf[..n]);
                    if String::from_utf8_lossy(&data).contains(marker) {
                        return Ok(String::from_utf8_lossy(&data).into_owned());
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) => return Err(e.into()),
            }
        }

        anyhow::bail!(
            "Timeout waiting for {:?}, got: {:?}",
            marker,
            String::from_utf8_lossy(&data)
        );
    }

    /// Wait for the first prompt of a new session.
    pub fn wait_for_prompt(&mut self) -> Result<String> {
        self.read_until(PROMPT)
    }

    /// Send a line and return the output up to the next prompt.
    pub fn command(&mut self, line: &str) -> Result<String> {
        self.send(line)?;
        let output = self.read_until(PROMPT)?;
        // Strip the echoed line and the trailing prompt
        let output = output
            .strip_suffix(PROMPT)
            .unwrap_or(&output)
            .trim_start_matches(line)
            .to_string();
        Ok(output)
    }

    /// Send a line without waiting for a reply.
    pub fn send(&mut self, line: &str) -> Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\r")?;
        self.port.flush()?;
        Ok(())
    }
}
