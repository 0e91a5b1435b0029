//! Typed values exchanged with the power meter.

use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

use crate::HiokiError;

/// Averaging counts accepted by `:AVERAGING`.
pub const AVERAGING_COUNTS: [u32; 7] = [1, 2, 5, 10, 25, 50, 100];

/// Fixed voltage ranges in volts.
pub const VOLTAGE_RANGES: [u32; 4] = [15, 30, 150, 300];

/// Fixed current ranges in amperes, paired with the literal the meter expects.
pub const CURRENT_RANGES: [(f64, &str); 6] = [
    (0.1, "0.1"),
    (0.3, "0.3"),
    (1.0, "1.0"),
    (3.0, "3.0"),
    (10.0, "10.0"),
    (30.0, "30.0"),
];

/// Rectifier (coupling) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rectifier {
    /// AC+DC true RMS
    AcDc,
    /// DC only
    Dc,
    /// AC only
    Ac,
}

impl Rectifier {
    /// Token used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rectifier::AcDc => "ACDC",
            Rectifier::Dc => "DC",
            Rectifier::Ac => "AC",
        }
    }
}

impl fmt::Display for Rectifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_lowercase())
    }
}

impl FromStr for Rectifier {
    type Err = HiokiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACDC" => Ok(Rectifier::AcDc),
            "DC" => Ok(Rectifier::Dc),
            "AC" => Ok(Rectifier::Ac),
            _ => Err(HiokiError::InvalidParameter(format!(
                "rectifier mode must be one of acdc, dc, ac (got {s:?})"
            ))),
        }
    }
}

/// State of the charge/energy integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationState {
    /// Integration running
    Start,
    /// Integration halted, totals kept
    Stop,
    /// Totals cleared
    Reset,
}

impl IntegrationState {
    /// Token used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationState::Start => "START",
            IntegrationState::Stop => "STOP",
            IntegrationState::Reset => "RESET",
        }
    }
}

impl fmt::Display for IntegrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_lowercase())
    }
}

impl FromStr for IntegrationState {
    type Err = HiokiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "START" => Ok(IntegrationState::Start),
            "STOP" => Ok(IntegrationState::Stop),
            "RESET" => Ok(IntegrationState::Reset),
            _ => Err(HiokiError::InvalidParameter(format!(
                "integration state must be one of start, stop, reset (got {s:?})"
            ))),
        }
    }
}

/// Requested range for the voltage or current input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeSetting<T> {
    /// Let the meter pick the range.
    Auto,
    /// Fixed range, auto-ranging off.
    Fixed(T),
}

impl<T: FromStr> FromStr for RangeSetting<T> {
    type Err = HiokiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(RangeSetting::Auto);
        }
        s.parse::<T>()
            .map(RangeSetting::Fixed)
            .map_err(|_| HiokiError::InvalidParameter(format!("invalid range {s:?}")))
    }
}

/// Range currently selected on an input, as reported by the meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeStatus<T> {
    /// Full-scale value of the active range.
    pub range: T,
    /// Auto-ranging enabled.
    pub auto: bool,
}

/// One of the quantities returned by `:MEASURE?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Voltage, V
    Voltage,
    /// Current, A
    Current,
    /// Active power, W
    ActivePower,
    /// Apparent power, VA
    ApparentPower,
    /// Power factor
    PowerFactor,
    /// Frequency, Hz
    Frequency,
    /// Positive current integration, Ah
    PositiveCharge,
    /// Negative current integration, Ah
    NegativeCharge,
    /// Total current integration, Ah
    Charge,
    /// Positive power integration, Wh
    PositiveEnergy,
    /// Negative power integration, Wh
    NegativeEnergy,
    /// Total power integration, Wh
    Energy,
    /// Voltage waveform peak, V
    VoltagePeak,
    /// Current waveform peak, A
    CurrentPeak,
    /// Elapsed integration time, s
    Time,
}

impl Metric {
    /// Every metric, in the order they are requested.
    pub const ALL: [Metric; 15] = [
        Metric::Voltage,
        Metric::Current,
        Metric::ActivePower,
        Metric::ApparentPower,
        Metric::PowerFactor,
        Metric::Frequency,
        Metric::PositiveCharge,
        Metric::NegativeCharge,
        Metric::Charge,
        Metric::PositiveEnergy,
        Metric::NegativeEnergy,
        Metric::Energy,
        Metric::VoltagePeak,
        Metric::CurrentPeak,
        Metric::Time,
    ];

    /// Mnemonic used in the `:MEASURE?` query and its reply.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Metric::Voltage => "V",
            Metric::Current => "A",
            Metric::ActivePower => "W",
            Metric::ApparentPower => "VA",
            Metric::PowerFactor => "PF",
            Metric::Frequency => "FREQ",
            Metric::PositiveCharge => "PAH",
            Metric::NegativeCharge => "MAH",
            Metric::Charge => "AH",
            Metric::PositiveEnergy => "PWH",
            Metric::NegativeEnergy => "MWH",
            Metric::Energy => "WH",
            Metric::VoltagePeak => "VPK",
            Metric::CurrentPeak => "APK",
            Metric::Time => "TIME",
        }
    }

    /// Look a metric up by its mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.mnemonic() == mnemonic)
    }

    /// Unit suffix for display.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Voltage | Metric::VoltagePeak => "V",
            Metric::Current | Metric::CurrentPeak => "A",
            Metric::ActivePower => "W",
            Metric::ApparentPower => "VA",
            Metric::PowerFactor => "",
            Metric::Frequency => "Hz",
            Metric::PositiveCharge | Metric::NegativeCharge | Metric::Charge => "Ah",
            Metric::PositiveEnergy | Metric::NegativeEnergy | Metric::Energy => "Wh",
            Metric::Time => "s",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A snapshot of readings from a single `:MEASURE?` query.
///
/// Overrange readings are stored as positive or negative infinity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurement {
    values: BTreeMap<Metric, f64>,
}

impl Measurement {
    pub(crate) fn insert(&mut self, metric: Metric, value: f64) {
        self.values.insert(metric, value);
    }

    /// Reading for `metric`, if the meter reported it.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    /// Elapsed integration time.
    pub fn elapsed(&self) -> Option<Duration> {
        self.get(Metric::Time).map(Duration::from_secs_f64)
    }

    /// Iterate over the readings in request order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    /// Number of readings in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the meter reported nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectifier_parses_case_insensitively() {
        assert_eq!("acdc".parse::<Rectifier>().unwrap(), Rectifier::AcDc);
        assert_eq!("Dc".parse::<Rectifier>().unwrap(), Rectifier::Dc);
        assert_eq!("AC".parse::<Rectifier>().unwrap(), Rectifier::Ac);
        assert!(matches!(
            "rms".parse::<Rectifier>(),
            Err(HiokiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn integration_state_parses_case_insensitively() {
        assert_eq!(
            "start".parse::<IntegrationState>().unwrap(),
            IntegrationState::Start
        );
        assert_eq!(
            "RESET".parse::<IntegrationState>().unwrap(),
            IntegrationState::Reset
        );
        assert!(matches!(
            "pause".parse::<IntegrationState>(),
            Err(HiokiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn range_setting_from_str() {
        assert_eq!(
            "AUTO".parse::<RangeSetting<u32>>().unwrap(),
            RangeSetting::Auto
        );
        assert_eq!(
            "150".parse::<RangeSetting<u32>>().unwrap(),
            RangeSetting::Fixed(150)
        );
        assert_eq!(
            "0.3".parse::<RangeSetting<f64>>().unwrap(),
            RangeSetting::Fixed(0.3)
        );
        assert!(matches!(
            "high".parse::<RangeSetting<u32>>(),
            Err(HiokiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn metric_mnemonics_are_unique() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_mnemonic(metric.mnemonic()), Some(metric));
        }
        assert_eq!(Metric::from_mnemonic("VAR"), None);
    }

    #[test]
    fn measurement_iterates_in_request_order() {
        let mut m = Measurement::default();
        m.insert(Metric::Time, 5.0);
        m.insert(Metric::Voltage, 100.0);
        let order: Vec<_> = m.iter().map(|(metric, _)| metric).collect();
        assert_eq!(order, vec![Metric::Voltage, Metric::Time]);
        assert_eq!(m.elapsed(), Some(Duration::from_secs(5)));
    }
}
