//! Parsers for the reply lines sent back by the meter.
//!
//! Each reply grammar gets its own function so the legal-value checks can be
//! exercised without a port. Replies echo the command header followed by a
//! space and the value, e.g. `:AVERAGING 10`. Multi-field replies separate
//! fields with `;`.

use std::str::FromStr;

use log::warn;

use crate::{
    HiokiError, Result,
    types::{AVERAGING_COUNTS, IntegrationState, Measurement, Metric, RangeStatus, Rectifier},
};

/// Reading the meter sends for a positive overrange.
pub const OVERRANGE_POSITIVE: &str = "+999.99E+9";
/// Reading the meter sends for a negative overrange.
pub const OVERRANGE_NEGATIVE: &str = "-999.99E+9";

fn violation(what: &str, reply: &str) -> HiokiError {
    warn!("Unexpected {} reply: {:?}", what, reply);
    HiokiError::ProtocolViolation(format!("unexpected {what} reply {reply:?}"))
}

/// Second space-delimited token of a reply.
pub fn value_token<'a>(what: &str, reply: &'a str) -> Result<&'a str> {
    reply
        .split(' ')
        .nth(1)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| violation(what, reply))
}

/// `*TST?` reply: a bare integer result code.
pub fn self_test(reply: &str) -> Result<i32> {
    reply
        .trim()
        .parse::<i32>()
        .map_err(|_| violation("self-test", reply))
}

/// `:AVERAGING?` reply, e.g. `:AVERAGING 10`.
pub fn averaging(reply: &str) -> Result<u32> {
    value_token("averaging", reply)?
        .parse::<u32>()
        .ok()
        .filter(|n| AVERAGING_COUNTS.contains(n))
        .ok_or_else(|| violation("averaging", reply))
}

fn on_off(what: &str, token: &str, reply: &str) -> Result<bool> {
    match token {
        "ON" => Ok(true),
        "OFF" => Ok(false),
        _ => Err(violation(what, reply)),
    }
}

/// `:HOLD?` and `:PEAKHOLD?` replies, e.g. `:HOLD ON`.
pub fn switch(what: &str, reply: &str) -> Result<bool> {
    on_off(what, value_token(what, reply)?, reply)
}

/// `:RECTIFIER?` reply, e.g. `:RECTIFIER ACDC`.
pub fn rectifier(reply: &str) -> Result<Rectifier> {
    match value_token("rectifier", reply)? {
        "ACDC" => Ok(Rectifier::AcDc),
        "DC" => Ok(Rectifier::Dc),
        "AC" => Ok(Rectifier::Ac),
        _ => Err(violation("rectifier", reply)),
    }
}

/// `:INTEGRATE:STATE?` reply, e.g. `:INTEGRATE:STATE STOP`.
pub fn integration(reply: &str) -> Result<IntegrationState> {
    match value_token("integration", reply)? {
        "START" => Ok(IntegrationState::Start),
        "STOP" => Ok(IntegrationState::Stop),
        "RESET" => Ok(IntegrationState::Reset),
        _ => Err(violation("integration", reply)),
    }
}

/// `:VOLTAGE?` / `:CURRENT?` reply, e.g. `:VOLTAGE:RANGE 150;AUTO ON`.
///
/// The label of each field is the last `:` segment of its header.
pub fn range<T: FromStr>(what: &str, reply: &str) -> Result<RangeStatus<T>> {
    let mut range = None;
    let mut auto = None;
    for field in reply.split(';').map(str::trim).filter(|f| !f.is_empty()) {
        let (header, value) = field.split_once(' ').ok_or_else(|| violation(what, reply))?;
        match header.rsplit(':').next() {
            Some("RANGE") => {
                range = Some(value.parse::<T>().map_err(|_| violation(what, reply))?);
            }
            Some("AUTO") => auto = Some(on_off(what, value, reply)?),
            _ => {}
        }
    }
    match (range, auto) {
        (Some(range), Some(auto)) => Ok(RangeStatus { range, auto }),
        _ => Err(violation(what, reply)),
    }
}

/// A single numeric reading; overrange sentinels become infinities.
pub fn reading(value: &str) -> Result<f64> {
    match value {
        OVERRANGE_POSITIVE => Ok(f64::INFINITY),
        OVERRANGE_NEGATIVE => Ok(f64::NEG_INFINITY),
        _ => value.parse::<f64>().map_err(|_| violation("reading", value)),
    }
}

/// Elapsed time field `h,mm,ss` in seconds.
pub fn elapsed_seconds(value: &str) -> Result<u64> {
    let mut parts = value.split(',').map(|p| p.trim().parse::<u64>());
    let total = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(h)), Some(Ok(m)), Some(Ok(s)), None) => h
            .checked_mul(3600)
            .and_then(|t| t.checked_add(m.checked_mul(60)?))
            .and_then(|t| t.checked_add(s)),
        _ => None,
    };
    total.ok_or_else(|| violation("elapsed time", value))
}

/// `:MEASURE?` reply, e.g. `V 100.00E+0;A 1.0000E+0;...;TIME 0,00,10`.
pub fn measurement(reply: &str) -> Result<Measurement> {
    let mut measurement = Measurement::default();
    for field in reply.split(';').map(str::trim).filter(|f| !f.is_empty()) {
        let (label, value) = field
            .split_once(' ')
            .ok_or_else(|| violation("measurement", reply))?;
        let metric = Metric::from_mnemonic(label)
            .ok_or_else(|| violation("measurement", reply))?;
        let value = value.trim();
        let value = match metric {
            Metric::Time => elapsed_seconds(value)? as f64,
            _ => reading(value)?,
        };
        measurement.insert(metric, value);
    }
    Ok(measurement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_violation<T>(r: Result<T>) -> bool {
        matches!(r, Err(HiokiError::ProtocolViolation(_)))
    }

    #[test]
    fn averaging_accepts_only_legal_counts() {
        assert_eq!(averaging(":AVERAGING 50").unwrap(), 50);
        assert!(is_violation(averaging(":AVERAGING 3")));
        assert!(is_violation(averaging(":AVERAGING")));
        assert!(is_violation(averaging(":AVERAGING ten")));
    }

    #[test]
    fn switch_requires_on_or_off() {
        assert!(switch("hold", ":HOLD ON").unwrap());
        assert!(!switch("peak hold", ":PEAKHOLD OFF").unwrap());
        assert!(is_violation(switch("hold", ":HOLD on")));
        assert!(is_violation(switch("hold", ":HOLD 1")));
    }

    #[test]
    fn self_test_code() {
        assert_eq!(self_test("0").unwrap(), 0);
        assert_eq!(self_test("3").unwrap(), 3);
        assert!(is_violation(self_test("PASS")));
    }

    #[test]
    fn rectifier_and_integration_tokens() {
        assert_eq!(rectifier(":RECTIFIER DC").unwrap(), Rectifier::Dc);
        assert!(is_violation(rectifier(":RECTIFIER RMS")));
        assert_eq!(
            integration(":INTEGRATE:STATE START").unwrap(),
            IntegrationState::Start
        );
        assert!(is_violation(integration(":INTEGRATE:STATE HOLD")));
    }

    #[test]
    fn voltage_range_reply() {
        let status = range::<u32>("voltage", ":VOLTAGE:RANGE 150;AUTO ON");
        assert_eq!(
            status.unwrap(),
            RangeStatus {
                range: 150,
                auto: true
            }
        );
    }

    #[test]
    fn current_range_reply() {
        let status = range::<f64>("current", ":CURRENT:RANGE 0.3;AUTO OFF");
        assert_eq!(
            status.unwrap(),
            RangeStatus {
                range: 0.3,
                auto: false
            }
        );
    }

    #[test]
    fn range_reply_ignores_empty_fields() {
        let status = range::<u32>("voltage", ":VOLTAGE:RANGE 30;AUTO OFF;");
        assert_eq!(
            status.unwrap(),
            RangeStatus {
                range: 30,
                auto: false
            }
        );
    }

    #[test]
    fn range_reply_errors() {
        assert!(is_violation(range::<u32>(
            "voltage",
            ":VOLTAGE:RANGE 150;AUTO MAYBE"
        )));
        assert!(is_violation(range::<u32>("voltage", ":VOLTAGE:RANGE 150")));
        assert!(is_violation(range::<u32>(
            "voltage",
            ":VOLTAGE:RANGE x;AUTO ON"
        )));
        assert!(is_violation(range::<u32>("voltage", ";;")));
    }

    #[test]
    fn overrange_sentinels() {
        assert_eq!(reading("+999.99E+9").unwrap(), f64::INFINITY);
        assert_eq!(reading("-999.99E+9").unwrap(), f64::NEG_INFINITY);
        assert_eq!(reading("+12.345E+0").unwrap(), 12.345);
        assert!(is_violation(reading("----")));
    }

    #[test]
    fn elapsed_time_field() {
        assert_eq!(elapsed_seconds("1,02,03").unwrap(), 3723);
        assert_eq!(elapsed_seconds("0,00,00").unwrap(), 0);
        assert!(is_violation(elapsed_seconds("1,02")));
        assert!(is_violation(elapsed_seconds("1,02,03,04")));
        assert!(is_violation(elapsed_seconds("9999999999999999999,00,00")));
        assert!(is_violation(elapsed_seconds("0,999999999999999999,00")));
        assert!(is_violation(elapsed_seconds("1,00,18446744073709551615")));
    }

    #[test]
    fn measurement_reply() {
        let m = measurement("V +100.00E+0;W +999.99E+9;PF -999.99E+9;TIME 1,02,03;");
        let m = m.unwrap();
        assert_eq!(m.len(), 4);
        assert_eq!(m.get(Metric::Voltage), Some(100.0));
        assert_eq!(m.get(Metric::ActivePower), Some(f64::INFINITY));
        assert_eq!(m.get(Metric::PowerFactor), Some(f64::NEG_INFINITY));
        assert_eq!(m.get(Metric::Time), Some(3723.0));
        assert_eq!(m.get(Metric::Current), None);
    }

    #[test]
    fn measurement_rejects_unknown_metric() {
        assert!(is_violation(measurement("V +1.0E+0;VAR +2.0E+0")));
        assert!(is_violation(measurement("V")));
        assert!(is_violation(measurement("TIME 9999999999999999999,00,00")));
    }
}
