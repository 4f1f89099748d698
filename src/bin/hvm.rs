use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use honey::{bytecode, logging, vm::Vm};

/// Run a honey bytecode file
#[derive(Parser, Debug)]
#[command(name = "hvm", version)]
struct Args {
    /// Bytecode file produced by `hasm`
    input: PathBuf,

    /// Print a listing of the program instead of running it
    #[arg(long)]
    disassemble: bool,
}

fn main() -> ExitCode {
    logging::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error -> {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let bytes = fs::read(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let program = bytecode::decode(&bytes)
        .with_context(|| format!("invalid bytecode in {}", args.input.display()))?;

    if args.disassemble {
        print!("{}", bytecode::disassemble(&program));
        return Ok(());
    }

    tracing::info!(instructions = program.len(), "loaded program");
    let mut vm = Vm::new(&program);
    if let Err(fault) = vm.run() {
        eprint!("\n{}\n", fault.report());
        return Err(fault.into());
    }

    Ok(())
}
