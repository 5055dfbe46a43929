pub mod analyzer;
pub mod codegen;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;

use analyzer::analyze;
use codegen::{Assembly, Codegen};
use config::Config;
use error::CompileError;
use lexer::Lexer;
use parser::Parser;

#[derive(Debug)]
pub struct Compilation {
    pub assembly: Assembly,
    /// Symbol table dumps requested by `trace_analyze`.
    pub trace: String,
}

pub fn compile(user_input: &str, config: &Config) -> Result<Compilation, CompileError> {
    let tokens = Lexer::tokenize(user_input)?;
    log::debug!("lexed {} tokens", tokens.len());

    let mut parser = Parser::new(tokens);
    let program = parser.parse()?;
    log::debug!("parsed {} top-level declarations", program.decls.len());

    let analysis = analyze(&program, config)?;
    let assembly = Codegen::new(&analysis, config).generate(&program)?;

    Ok(Compilation {
        assembly,
        trace: analysis.trace,
    })
}
