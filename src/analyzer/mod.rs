mod annotations;
mod error;
mod semantic_visitor;
mod symbol_table;
mod ty;
mod type_checker;

pub use annotations::*;
pub use error::*;
pub use semantic_visitor::*;
pub use symbol_table::*;
pub use ty::*;
pub use type_checker::*;

use crate::config::Config;
use crate::parser::Program;

pub const INPUT: &str = "input";
pub const OUTPUT: &str = "output";

/// Parameters are passed in `$a0..$a3` only.
pub const MAX_PARAMS: usize = 4;

#[derive(Debug)]
pub struct Analysis {
    pub symbol_table: SymbolTable,
    pub annotations: Annotations,
    /// Symbol table dumps, empty unless `trace_analyze` is set.
    pub trace: String,
}

pub fn analyze(program: &Program, config: &Config) -> SemanticResult<Analysis> {
    log::debug!("resolving names");
    let mut analysis = SemanticVisitor::new(config).visit_program(program)?;

    log::debug!("checking types");
    TypeChecker::new(&mut analysis.symbol_table, &mut analysis.annotations)
        .check_program(program)?;

    Ok(analysis)
}
