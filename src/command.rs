use std::fmt;

use crate::types::{IntegrationState, Metric, Rectifier};

/// Commands understood by the HIOKI 3334.
///
/// `Display` renders the ASCII text without the line terminator.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Identify,
    Reset,
    SelfTest,
    // Averaging
    SetAveraging(u32),
    GetAveraging,
    // Display hold
    SetHold(bool),
    GetHold,
    // Peak hold
    SetPeakHold(bool),
    GetPeakHold,
    ResetPeakHold,
    // Rectifier
    SetRectifier(Rectifier),
    GetRectifier,
    // Voltage range
    SetVoltageRange(u32),
    SetVoltageAuto,
    GetVoltage,
    // Current range, carried as the literal sent to the meter
    SetCurrentRange(&'static str),
    SetCurrentAuto,
    GetCurrent,
    // Integrator
    SetIntegration(IntegrationState),
    GetIntegration,
    Measure,
}

fn on_off(state: bool) -> &'static str {
    if state { "ON" } else { "OFF" }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Identify => f.write_str("*IDN?"),
            Command::Reset => f.write_str("*RST"),
            Command::SelfTest => f.write_str("*TST?"),
            Command::SetAveraging(n) => write!(f, ":AVERAGING {n}"),
            Command::GetAveraging => f.write_str(":AVERAGING?"),
            Command::SetHold(state) => write!(f, ":HOLD {}", on_off(*state)),
            Command::GetHold => f.write_str(":HOLD?"),
            Command::SetPeakHold(state) => write!(f, ":PEAKHOLD {}", on_off(*state)),
            Command::GetPeakHold => f.write_str(":PEAKHOLD?"),
            Command::ResetPeakHold => f.write_str(":PEAKHOLD RESET"),
            Command::SetRectifier(mode) => write!(f, ":RECTIFIER {}", mode.as_str()),
            Command::GetRectifier => f.write_str(":RECTIFIER?"),
            Command::SetVoltageRange(range) => write!(f, ":VOLTAGE:RANGE {range};AUTO OFF"),
            Command::SetVoltageAuto => f.write_str(":VOLTAGE:AUTO ON"),
            Command::GetVoltage => f.write_str(":VOLTAGE?"),
            Command::SetCurrentRange(range) => write!(f, ":CURRENT:RANGE {range};AUTO OFF"),
            Command::SetCurrentAuto => f.write_str(":CURRENT:AUTO ON"),
            Command::GetCurrent => f.write_str(":CURRENT?"),
            Command::SetIntegration(state) => write!(f, ":INTEGRATE:STATE {}", state.as_str()),
            Command::GetIntegration => f.write_str(":INTEGRATE:STATE?"),
            Command::Measure => {
                f.write_str(":MEASURE? ")?;
                for (i, metric) in Metric::ALL.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(metric.mnemonic())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_set_commands() {
        assert_eq!(Command::SetAveraging(25).to_string(), ":AVERAGING 25");
        assert_eq!(Command::SetHold(true).to_string(), ":HOLD ON");
        assert_eq!(Command::SetPeakHold(false).to_string(), ":PEAKHOLD OFF");
        assert_eq!(
            Command::SetRectifier(Rectifier::AcDc).to_string(),
            ":RECTIFIER ACDC"
        );
        assert_eq!(
            Command::SetVoltageRange(150).to_string(),
            ":VOLTAGE:RANGE 150;AUTO OFF"
        );
        assert_eq!(
            Command::SetCurrentRange("1.0").to_string(),
            ":CURRENT:RANGE 1.0;AUTO OFF"
        );
        assert_eq!(
            Command::SetIntegration(IntegrationState::Stop).to_string(),
            ":INTEGRATE:STATE STOP"
        );
    }

    #[test]
    fn renders_measure_query() {
        assert_eq!(
            Command::Measure.to_string(),
            ":MEASURE? V,A,W,VA,PF,FREQ,PAH,MAH,AH,PWH,MWH,WH,VPK,APK,TIME"
        );
    }
}
