mod codegen;
mod emitter;
mod instruction;

use std::io;

use thiserror::Error;

pub use codegen::*;
pub use emitter::*;
pub use instruction::*;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("line {line}: node was never annotated by the analyzer")]
    MissingAnnotation { line: usize },

    #[error("line {line}: '{name}' needs {count} argument registers, only 4 exist")]
    TooManyArguments {
        name: String,
        count: usize,
        line: usize,
    },

    #[error("line {line}: expression does not denote a storage location")]
    NotAddressable { line: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type CodegenResult<T> = Result<T, CodegenError>;
