use clap::{ArgAction, Parser, Subcommand};
use std::{path::PathBuf, thread, time::Duration};

use hioki3334::{
    Config, Hioki3334, IntegrationState, Measurement, Metric, RangeSetting, Rectifier,
};

#[derive(Parser)]
struct Args {
    device: PathBuf,
    #[arg(default_value_t = hioki3334::DEFAULT_BAUDRATE)]
    baud_rate: u32,
    /// Reply timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Identify,
    Reset,
    SelfTest,
    Averaging {
        count: Option<u32>,
    },
    Hold {
        #[arg(action = ArgAction::Set)]
        hold: Option<bool>,
    },
    PeakHold {
        #[arg(action = ArgAction::Set)]
        hold: Option<bool>,
    },
    ResetPeakHold,
    Rectifier {
        mode: Option<Rectifier>,
    },
    /// Range in volts, or "auto"
    VoltageRange {
        range: Option<RangeSetting<u32>>,
    },
    /// Range in amperes, or "auto"
    CurrentRange {
        range: Option<RangeSetting<f64>>,
    },
    Integrate {
        state: Option<IntegrationState>,
    },
    Measure,
    /// Configure, measure, integrate for a while and measure again
    Sequence {
        #[arg(default_value_t = 10)]
        seconds: u64,
    },
}

fn print_measurement(m: &Measurement, with_integration: bool) {
    for (metric, value) in m.iter() {
        let integrated = matches!(
            metric,
            Metric::PositiveCharge
                | Metric::NegativeCharge
                | Metric::Charge
                | Metric::PositiveEnergy
                | Metric::NegativeEnergy
                | Metric::Energy
                | Metric::Time
        );
        if integrated && !with_integration {
            continue;
        }
        println!("  {:>4}: {} {}", metric, value, metric.unit());
    }
}

fn sequence(meter: &mut Hioki3334, seconds: u64) -> hioki3334::Result<()> {
    println!("Reset HIOKI 3334");
    meter.reset()?;
    thread::sleep(Duration::from_secs(1));

    println!("Identify: {}", meter.identify()?);
    println!("Self-test: {}", meter.self_test()?);

    meter.rectifier(Some(Rectifier::AcDc))?;
    meter.averaging(Some(1))?;
    meter.voltage_range(Some(RangeSetting::Auto))?;
    meter.current_range(Some(RangeSetting::Auto))?;
    thread::sleep(Duration::from_secs(1));
    meter.reset_peak_hold()?;

    println!("Measurements:");
    print_measurement(&meter.measure()?, false);

    meter.integrate(Some(IntegrationState::Reset))?;
    meter.reset_peak_hold()?;
    meter.integrate(Some(IntegrationState::Start))?;
    println!("Integrating for {seconds} s");
    thread::sleep(Duration::from_secs(seconds));
    meter.integrate(Some(IntegrationState::Stop))?;

    println!("Measurements including integration:");
    print_measurement(&meter.measure()?, true);

    meter.integrate(Some(IntegrationState::Reset))?;
    Ok(())
}

fn run(meter: &mut Hioki3334, command: Commands) -> hioki3334::Result<()> {
    match command {
        Commands::Identify => println!("{}", meter.identify()?),
        Commands::Reset => meter.reset()?,
        Commands::SelfTest => println!("{}", meter.self_test()?),
        Commands::Averaging { count } => println!("{}", meter.averaging(count)?),
        Commands::Hold { hold } => println!("{}", meter.hold(hold)?),
        Commands::PeakHold { hold } => println!("{}", meter.peak_hold(hold)?),
        Commands::ResetPeakHold => meter.reset_peak_hold()?,
        Commands::Rectifier { mode } => println!("{}", meter.rectifier(mode)?),
        Commands::VoltageRange { range } => println!("{:?}", meter.voltage_range(range)?),
        Commands::CurrentRange { range } => println!("{:?}", meter.current_range(range)?),
        Commands::Integrate { state } => println!("{}", meter.integrate(state)?),
        Commands::Measure => print_measurement(&meter.measure()?, true),
        Commands::Sequence { seconds } => sequence(meter, seconds)?,
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = Config::new(args.device.to_string_lossy())
        .baud_rate(args.baud_rate)
        .timeout(Duration::from_secs(args.timeout));

    if let Err(e) = Hioki3334::with_session(config, |meter| run(meter, args.command)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
