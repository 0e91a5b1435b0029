#![warn(missing_docs)]
//! A crate for controlling HIOKI 3334 AC/DC Power HiTesters over RS-232C.
//!
//! ```no_run
//! use hioki3334::{Config, Hioki3334, Metric, RangeSetting};
//!
//! fn main() -> hioki3334::Result<()> {
//!     Hioki3334::with_session(Config::new("/dev/ttyUSB0"), |meter| {
//!         println!("{}", meter.identify()?);
//!         meter.voltage_range(Some(RangeSetting::Auto))?;
//!         let m = meter.measure()?;
//!         println!("{:?} W", m.get(Metric::ActivePower));
//!         Ok(())
//!     })
//! }
//! ```

mod command;
pub mod reply;
mod session;
pub mod transport;
pub mod types;

use std::{io, time::Duration};
use thiserror::Error;

pub use session::{Config, Hioki3334};
pub use transport::{SerialTransport, Transport};
pub use types::{IntegrationState, Measurement, Metric, RangeSetting, RangeStatus, Rectifier};

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum HiokiError {
    #[error("Could not open serial port {port}: {source}")]
    DeviceUnavailable {
        port: String,
        source: serialport::Error,
    },
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No reply from device within {0:?}")]
    Timeout(Duration),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("Session is closed")]
    Closed,
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, HiokiError>;

/// Default serial port.
#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";
/// Default serial port.
#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Factory default baud rate of the HIOKI 3334.
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Default time to wait for a reply line.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
