use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ls8emu::host::TerminalHost;
use ls8emu::{loader, Cpu};

/// Run an LS-8 program image.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a program file (ASCII 0/1 binary-literal lines).
    program: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.program)
        .with_context(|| format!("reading program file {}", args.program.display()))?;
    let memory = loader::load(&text)
        .with_context(|| format!("parsing program file {}", args.program.display()))?;

    let mut cpu = Cpu::new(memory);
    let mut host = TerminalHost::new().context("initializing terminal host")?;

    cpu.run(&mut host).context("running program")?;
    Ok(())
}
