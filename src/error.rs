use thiserror::Error;

use crate::analyzer::SemanticError;
use crate::codegen::CodegenError;
use crate::lexer::LexError;
use crate::parser::ParseError;

/// First failure of any stage. Later stages never run after one.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}
