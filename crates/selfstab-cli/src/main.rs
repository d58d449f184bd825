//! selfstab - console front end for the self-stabilization simulator
//!
//! Usage:
//!   selfstab [SIZE] [FAULTS] [--no-pause] [--json]
//!
//! Missing SIZE / FAULTS are prompted for. Everything else comes from the
//! `SELFSTAB_*` environment variables (see `SimulationConfig::from_env`).

mod console;

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Instant;

use selfstab_engine::{
    ConvergenceReport, Fault, FaultCount, Simulation, SimulationConfig, SystemSize,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    size: Option<i64>,
    faults: Option<i64>,
    pause: bool,
    json: bool,
    help: bool,
}

fn parse_args<I>(args: I) -> Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args {
        pause: true,
        ..Args::default()
    };
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--no-pause" => parsed.pause = false,
            "--json" => parsed.json = true,
            "-h" | "--help" => parsed.help = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
            value => positional.push(
                value
                    .parse::<i64>()
                    .map_err(|e| format!("'{}' is not an integer: {}", value, e))?,
            ),
        }
    }

    let mut positional = positional.into_iter();
    parsed.size = positional.next();
    parsed.faults = positional.next();
    if positional.next().is_some() {
        return Err("too many arguments".to_string());
    }
    Ok(parsed)
}

fn print_usage() {
    eprintln!("selfstab - simulate probabilistic fault-containing self-stabilization");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  selfstab [SIZE] [FAULTS] [--no-pause] [--json]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --no-pause   Do not wait for Enter before stabilizing");
    eprintln!("  --json       Print a JSON report instead of the console layout");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SELFSTAB_SEED               Seed for scheduling and faults (default: random)");
    eprintln!("  SELFSTAB_MAX_STEPS          Step cap, or 'unbounded' (default)");
    eprintln!("  SELFSTAB_TOPOLOGY           line (default) or ring");
    eprintln!("  SELFSTAB_INITIAL_SECONDARY  Starting secondary (default: 5)");
    eprintln!("  SELFSTAB_LEADER_MARGIN      Leader margin M (default: 20)");
    eprintln!("  SELFSTAB_TRACE              Include every step in --json output");
    eprintln!("  RUST_LOG                    Log filter (default: selfstab=info)");
}

/// Everything `--json` prints.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    seed: u64,
    size: usize,
    faults: &'a [Fault],
    report: &'a ConvergenceReport,
    elapsed_micros: u128,
}

/// Prompt for anything missing, perturb, stabilize and print.
///
/// Size and fault count are validated as soon as each is read, so a rejected
/// value never reaches the next prompt or the simulation.
fn run<R, W>(
    args: &Args,
    mut config: SimulationConfig,
    input: &mut R,
    output: &mut W,
) -> Result<(), Box<dyn Error>>
where
    R: BufRead,
    W: Write,
{
    let size = match args.size {
        Some(size) => Some(size),
        None if !args.json => Some(console::prompt_i64(input, output, "Enter system size: ")?),
        None => None,
    };
    if let Some(size) = size {
        config = config.with_size(SystemSize::try_from(size)?);
    }

    let faults = match args.faults {
        Some(faults) => Some(faults),
        None if !args.json => Some(console::prompt_i64(
            input,
            output,
            "Enter number of simulated faults: ",
        )?),
        None => None,
    };
    if let Some(faults) = faults {
        config = config.with_faults(FaultCount::try_from(faults)?);
    }

    let mut sim = Simulation::new(config)?;
    let faults = sim.inject_faults()?;

    if !args.json {
        console::write_faults(output, &faults)?;
        output.flush()?;
        if args.pause {
            console::wait_for_enter(input)?;
        }
    }

    let start = Instant::now();
    let report = sim.stabilize()?;
    let elapsed_micros = start.elapsed().as_micros();

    if args.json {
        let json = JsonReport {
            seed: sim.seed(),
            size: sim.system().len(),
            faults: &faults,
            report: &report,
            elapsed_micros,
        };
        serde_json::to_writer_pretty(&mut *output, &json)?;
        writeln!(output)?;
    } else {
        console::write_outcome(output, &report, elapsed_micros)?;
    }
    output.flush()?;

    Ok(())
}

/// [`run`] against the process environment and terminal.
fn run_console(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = SimulationConfig::from_env()?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(args, config, &mut stdin.lock(), &mut stdout.lock())
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays the report.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "selfstab=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    match run_console(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
