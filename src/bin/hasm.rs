use std::{fs, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser as _;
use honey::{assembler::Parser, bytecode, lexer, logging};

/// Assemble a honey source file into bytecode
#[derive(clap::Parser, Debug)]
#[command(name = "hasm", version)]
struct Args {
    /// Assembly source to read
    input: PathBuf,

    /// Bytecode file to write
    #[arg(required_unless_present = "tokens")]
    output: Option<PathBuf>,

    /// Print the token stream instead of writing bytecode
    #[arg(long)]
    tokens: bool,
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
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;

    let tokens = lexer::tokenize(&source)?;
    if args.tokens {
        for token in &tokens {
            println!("{}", token);
        }
        return Ok(());
    }

    let program = Parser::new(tokens).parse()?;
    tracing::info!(
        instructions = program.instructions.len(),
        labels = program.labels.len(),
        "assembled"
    );

    // `output` is required unless `--tokens` was given.
    let output = args.output.context("missing output path")?;
    fs::write(&output, bytecode::encode(&program.instructions))
        .with_context(|| format!("cannot write {}", output.display()))?;

    Ok(())
}
