//! Integration tests for the breakout shell firmware.
//!
//! Run after flashing the firmware to exercise the shell over the virtual
//! COM port.

mod device;

use clap::Parser;
use colored::Colorize;

use device::resolve_port;
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the breakout shell firmware")]
struct Args {
    /// Serial port for the device (use "auto" to auto-detect by USB ID)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate (ignored by the virtual port, reported back by GET_LINE_CODING)
    #[arg(short, long, default_value = "38400")]
    baud: u32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Resolve port (auto-detect if "auto")
    let port = resolve_port(&args.port)?;

    println!("{}", "Breakout Shell Integration Tests".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);

    println!("\nRunning tests...\n");

    let results = run_all_tests(&port, args.baud);
    print_results(&results);

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
