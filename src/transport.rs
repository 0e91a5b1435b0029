//! Byte transport underneath a [`Hioki3334`](crate::Hioki3334) session.

use serialport::SerialPort;
use std::io::{self, BufRead, BufReader, Write};

use crate::{Config, HiokiError, Result};

/// Line-oriented byte channel to the meter.
///
/// Closing happens when the transport is dropped.
pub trait Transport {
    /// Write all bytes to the channel.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Push buffered bytes out to the device.
    fn flush(&mut self) -> io::Result<()>;

    /// Read up to and including the next line feed.
    ///
    /// Must fail with [`io::ErrorKind::TimedOut`] when no complete line
    /// arrives within the transport's timeout.
    fn read_line(&mut self) -> io::Result<Vec<u8>>;
}

/// RS-232C transport backed by the `serialport` crate.
pub struct SerialTransport {
    port_write: Box<dyn SerialPort>,
    port_read: BufReader<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the serial port described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| HiokiError::DeviceUnavailable {
                port: config.port.clone(),
                source,
            })?;
        let (port_write, port_read) = (port.try_clone()?, BufReader::new(port));

        Ok(SerialTransport {
            port_write,
            port_read,
        })
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port_write.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port_write.flush()
    }

    fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        self.port_read.read_until(b'\n', &mut line)?;
        // read_until returns short when the port hits EOF
        if line.last() != Some(&b'\n') {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "incomplete reply line",
            ));
        }
        Ok(line)
    }
}
