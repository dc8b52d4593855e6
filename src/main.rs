use std::path::PathBuf;
use std::process;

use clap::Parser as ClapParser;

use treelox::lox::Lox;

/// Tree-walking interpreter for the Lox language.
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script to run; starts a REPL when omitted.
    script: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = Cli::parse();

    match args.script.as_slice() {
        [] => {
            let mut lox: Lox = Lox::new();
            lox.run_prompt()?;
        }

        [path] => {
            let mut lox: Lox = Lox::new();
            lox.run_file(path)?;

            if lox.had_error() {
                process::exit(65);
            }

            if lox.had_runtime_error() {
                process::exit(70);
            }
        }

        _ => {
            println!("Usage: treelox [script]");
            process::exit(64);
        }
    }

    Ok(())
}
