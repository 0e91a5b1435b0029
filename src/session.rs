use log::{debug, info};
use std::{io, time::Duration};

use crate::{
    DEFAULT_BAUDRATE, DEFAULT_TIMEOUT, DEFAULT_TTY, HiokiError, Result,
    command::Command,
    reply,
    transport::{SerialTransport, Transport},
    types::{
        AVERAGING_COUNTS, CURRENT_RANGES, IntegrationState, Measurement, RangeSetting, RangeStatus,
        Rectifier, VOLTAGE_RANGES,
    },
};

/// Connection settings for a meter.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Serial port, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    /// Line speed; the meter ships configured for 9600 baud.
    pub baud_rate: u32,
    /// How long to wait for a reply line.
    pub timeout: Duration,
}

impl Config {
    /// Settings for `port` with the default baud rate and timeout.
    pub fn new(port: impl Into<String>) -> Self {
        Config {
            port: port.into(),
            baud_rate: DEFAULT_BAUDRATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the baud rate.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the reply timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_TTY)
    }
}

/// Session with a HIOKI 3334 power meter.
///
/// Every operation writes one command and, for queries, blocks until the
/// matching reply line arrives. Setters always read the setting back, so the
/// value returned is what the meter reports, not what was requested.
pub struct Hioki3334<T: Transport = SerialTransport> {
    config: Config,
    transport: Option<T>,
}

impl Hioki3334<SerialTransport> {
    /// Create a session that is not yet connected.
    pub fn new(config: Config) -> Self {
        Hioki3334 {
            config,
            transport: None,
        }
    }

    /// Open the serial port. Does nothing if the session is already open.
    pub fn open(&mut self) -> Result<()> {
        if self.transport.is_none() {
            self.transport = Some(SerialTransport::open(&self.config)?);
            info!(
                "[{}] Opened at {} baud",
                self.config.port, self.config.baud_rate
            );
        }
        Ok(())
    }

    /// Open a session, run `f` with it and close it again, whatever `f` returns.
    pub fn with_session<R, F>(config: Config, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        let mut meter = Self::new(config);
        meter.open()?;
        meter.scoped(f)
    }
}

impl<T: Transport> Hioki3334<T> {
    /// Create an open session over an existing transport.
    pub fn from_transport(config: Config, transport: T) -> Self {
        Hioki3334 {
            config,
            transport: Some(transport),
        }
    }

    /// Settings this session was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// True until [`close`](Self::close) is called.
    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Release the transport. Closing a closed session is a no-op.
    ///
    /// Any further command fails with [`HiokiError::Closed`].
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("[{}] Closed", self.config.port);
        }
    }

    /// Run `f` and close the session afterwards, on success and on error.
    pub fn scoped<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        let result = f(self);
        self.close();
        result
    }

    fn transport_mut(&mut self) -> Result<&mut T> {
        self.transport.as_mut().ok_or(HiokiError::Closed)
    }

    /// Send a raw command line. CR+LF is appended.
    pub fn send(&mut self, command: &str) -> Result<()> {
        if !command.is_ascii() {
            return Err(HiokiError::InvalidParameter(format!(
                "command must be ASCII: {command:?}"
            )));
        }
        let transport = self.transport_mut()?;
        transport.write_all(command.as_bytes())?;
        transport.write_all(b"\r\n")?;
        transport.flush()?;
        debug!("[{}] Sent command: {}", self.config.port, command);
        Ok(())
    }

    /// Read one reply line, without its terminator.
    pub fn recv(&mut self) -> Result<String> {
        let timeout = self.config.timeout;
        let line = match self.transport_mut()?.read_line() {
            Ok(line) => line,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(HiokiError::Timeout(timeout));
            }
            Err(e) => return Err(e.into()),
        };
        let reply = String::from_utf8(line)
            .ok()
            .filter(|s| s.is_ascii())
            .ok_or_else(|| HiokiError::ProtocolViolation("reply is not ASCII".to_string()))?;
        let reply = reply.trim_end_matches(['\r', '\n']).to_string();
        debug!("[{}] Received reply: {}", self.config.port, reply);
        Ok(reply)
    }

    /// Send a command and read its reply.
    pub fn query(&mut self, command: &str) -> Result<String> {
        self.send(command)?;
        self.recv()
    }

    fn command(&mut self, command: Command) -> Result<()> {
        self.send(&command.to_string())
    }

    fn request(&mut self, command: Command) -> Result<String> {
        self.query(&command.to_string())
    }

    /// Get the device identification string.
    pub fn identify(&mut self) -> Result<String> {
        self.request(Command::Identify)
    }

    /// Reset the meter to its power-on settings.
    pub fn reset(&mut self) -> Result<()> {
        self.command(Command::Reset)
    }

    /// Run the built-in self test. Returns 0 on success.
    pub fn self_test(&mut self) -> Result<i32> {
        reply::self_test(&self.request(Command::SelfTest)?)
    }

    /// Averaging count, optionally setting it first.
    ///
    /// `count` must be one of [`AVERAGING_COUNTS`].
    pub fn averaging(&mut self, count: Option<u32>) -> Result<u32> {
        if let Some(count) = count {
            if !AVERAGING_COUNTS.contains(&count) {
                return Err(HiokiError::InvalidParameter(format!(
                    "averaging count must be one of {AVERAGING_COUNTS:?} (got {count})"
                )));
            }
            self.command(Command::SetAveraging(count))?;
        }
        reply::averaging(&self.request(Command::GetAveraging)?)
    }

    /// Display hold state, optionally setting it first.
    pub fn hold(&mut self, hold: Option<bool>) -> Result<bool> {
        if let Some(hold) = hold {
            self.command(Command::SetHold(hold))?;
        }
        reply::switch("hold", &self.request(Command::GetHold)?)
    }

    /// Peak hold state, optionally setting it first.
    pub fn peak_hold(&mut self, hold: Option<bool>) -> Result<bool> {
        if let Some(hold) = hold {
            self.command(Command::SetPeakHold(hold))?;
        }
        reply::switch("peak hold", &self.request(Command::GetPeakHold)?)
    }

    /// Clear the held peak values.
    pub fn reset_peak_hold(&mut self) -> Result<()> {
        self.command(Command::ResetPeakHold)
    }

    /// Rectifier mode, optionally setting it first.
    pub fn rectifier(&mut self, mode: Option<Rectifier>) -> Result<Rectifier> {
        if let Some(mode) = mode {
            self.command(Command::SetRectifier(mode))?;
        }
        reply::rectifier(&self.request(Command::GetRectifier)?)
    }

    /// Voltage range, optionally setting it first.
    ///
    /// Fixed ranges must be one of [`VOLTAGE_RANGES`] and switch auto-ranging off.
    pub fn voltage_range(
        &mut self,
        setting: Option<RangeSetting<u32>>,
    ) -> Result<RangeStatus<u32>> {
        match setting {
            Some(RangeSetting::Fixed(range)) => {
                if !VOLTAGE_RANGES.contains(&range) {
                    return Err(HiokiError::InvalidParameter(format!(
                        "voltage range must be one of {VOLTAGE_RANGES:?} or auto (got {range})"
                    )));
                }
                self.command(Command::SetVoltageRange(range))?;
            }
            Some(RangeSetting::Auto) => self.command(Command::SetVoltageAuto)?,
            None => {}
        }
        reply::range("voltage range", &self.request(Command::GetVoltage)?)
    }

    /// Current range, optionally setting it first.
    ///
    /// Fixed ranges must be one of the values in [`CURRENT_RANGES`] and switch
    /// auto-ranging off.
    pub fn current_range(
        &mut self,
        setting: Option<RangeSetting<f64>>,
    ) -> Result<RangeStatus<f64>> {
        match setting {
            Some(RangeSetting::Fixed(range)) => {
                let literal = CURRENT_RANGES
                    .iter()
                    .find(|(value, _)| *value == range)
                    .map(|(_, literal)| *literal)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> =
                            CURRENT_RANGES.iter().map(|(_, literal)| *literal).collect();
                        HiokiError::InvalidParameter(format!(
                            "current range must be one of {} or auto (got {range})",
                            allowed.join(", ")
                        ))
                    })?;
                self.command(Command::SetCurrentRange(literal))?;
            }
            Some(RangeSetting::Auto) => self.command(Command::SetCurrentAuto)?,
            None => {}
        }
        reply::range("current range", &self.request(Command::GetCurrent)?)
    }

    /// Integrator state, optionally starting, stopping or resetting it first.
    pub fn integrate(&mut self, state: Option<IntegrationState>) -> Result<IntegrationState> {
        if let Some(state) = state {
            self.command(Command::SetIntegration(state))?;
        }
        reply::integration(&self.request(Command::GetIntegration)?)
    }

    /// Read every measured and integrated quantity in one query.
    pub fn measure(&mut self) -> Result<Measurement> {
        reply::measurement(&self.request(Command::Measure)?)
    }
}
