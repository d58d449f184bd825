//! Console prompts and report printing.

use std::io::{self, BufRead, Write};

use selfstab_engine::{Convergence, ConvergenceReport, Fault};

/// Width of the separator printed after the fault listing.
const SEPARATOR_WIDTH: usize = 64;

/// Print `prompt` and read one integer from `input`.
pub fn prompt_i64<R, W>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<i64>
where
    R: BufRead,
    W: Write,
{
    write!(output, "\n{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input"));
    }
    line.trim().parse().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not an integer: {}", line.trim(), e),
        )
    })
}

/// Block until a line (or EOF) arrives on `input`.
pub fn wait_for_enter<R: BufRead>(input: &mut R) -> io::Result<()> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

/// The status block: one snapshot line per fault, then the separator.
pub fn write_faults<W: Write>(output: &mut W, faults: &[Fault]) -> io::Result<()> {
    writeln!(output, "\nSYSTEM STATUS")?;
    for fault in faults {
        writeln!(output, "{}", fault.snapshot)?;
    }
    writeln!(output, "{}", "_".repeat(SEPARATOR_WIDTH))
}

/// The closing block: outcome marker, final primaries and elapsed time.
pub fn write_outcome<W: Write>(
    output: &mut W,
    report: &ConvergenceReport,
    elapsed_micros: u128,
) -> io::Result<()> {
    match report.convergence {
        Convergence::Converged { .. } => writeln!(output, "\nSYSTEM LEGAL")?,
        Convergence::BoundExceeded { steps } => {
            writeln!(output, "\nSTEP BOUND EXCEEDED after {} steps", steps)?
        }
    }
    writeln!(output, "{}", report.final_snapshot)?;
    writeln!(
        output,
        "\nStabilization performance: {} microseconds.\n",
        elapsed_micros
    )
}
