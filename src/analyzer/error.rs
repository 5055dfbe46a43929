use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateDeclaration,
    UndeclaredIdentifier,
    UndeclaredFunction,
    NonIntegerDeclaration,
    StorageOverflow,
    NotArray,
    NotAFunction,
    NotAVariable,
    SubscriptTypeError,
    OperandTypeError,
    AssignmentTypeError,
    ConditionTypeError,
    ArityMismatch,
    ArgumentTypeMismatch,
    TooManyParameters,
    MainPlacementError,
    MainSignatureError,
    MissingReturn,
    UnexpectedReturn,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The first semantic error stops the compilation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at line {line}: {message}")]
pub struct SemanticError {
    pub kind: ErrorKind,
    pub line: usize,
    pub message: String,
}

impl SemanticError {
    pub fn new(kind: ErrorKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }
}

pub type SemanticResult<T> = Result<T, SemanticError>;
