use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap_stdin::FileOrStdin;

use cminus::compile;
use cminus::config::Config;

#[derive(Parser)]
#[command(name = "cminus")]
#[command(about = "Compile a C- program to MIPS assembly for SPIM")]
#[command(version)]
struct Cli {
    /// Source file (use '-' for stdin)
    #[arg(value_name = "FILE", default_value = "-")]
    input: FileOrStdin,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the symbol table of every scope to stderr
    #[arg(long)]
    trace_analyze: bool,

    /// Comment the generated assembly
    #[arg(long)]
    trace_code: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let source = match cli.input.contents() {
        Ok(source) => source,
        Err(e) => {
            eprintln!("cannot read input: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = Config {
        trace_analyze: cli.trace_analyze,
        trace_code: cli.trace_code,
    };

    let compilation = match compile(&source, &config) {
        Ok(compilation) => compilation,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if !compilation.trace.is_empty() {
        eprint!("{}", compilation.trace);
    }

    let written = match cli.output {
        Some(path) => File::create(&path)
            .map_err(Into::into)
            .and_then(|f| compilation.assembly.write_to(&mut BufWriter::new(f))),
        None => compilation.assembly.write_to(&mut io::stdout().lock()),
    };
    if let Err(e) = written {
        eprintln!("cannot write output: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
