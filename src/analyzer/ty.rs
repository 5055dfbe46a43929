use std::fmt;

use crate::parser::TypeSpecifier;

/// Every slot holds one 4-byte word.
pub const WORD_SIZE: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Integer,
    Void,
    Array,
}

impl Ty {
    pub fn is_integer(&self) -> bool {
        *self == Ty::Integer
    }
}

impl From<TypeSpecifier> for Ty {
    fn from(ts: TypeSpecifier) -> Self {
        match ts {
            TypeSpecifier::Int => Ty::Integer,
            TypeSpecifier::Void => Ty::Void,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Integer => write!(f, "int"),
            Ty::Void => write!(f, "void"),
            Ty::Array => write!(f, "int[]"),
        }
    }
}
