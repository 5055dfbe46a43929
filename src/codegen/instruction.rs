use std::fmt;

use crate::parser::BinOpKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Register {
    V0,
    V1,
    T0,
    A0,
    A1,
    A2,
    A3,
    Gp,
    Sp,
    Fp,
    Ra,
}

pub const ARGUMENT_REGISTERS: [Register; 4] =
    [Register::A0, Register::A1, Register::A2, Register::A3];

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::V0 => "$v0",
            Register::V1 => "$v1",
            Register::T0 => "$t0",
            Register::A0 => "$a0",
            Register::A1 => "$a1",
            Register::A2 => "$a2",
            Register::A3 => "$a3",
            Register::Gp => "$gp",
            Register::Sp => "$sp",
            Register::Fp => "$fp",
            Register::Ra => "$ra",
        };
        write!(f, "{}", name)
    }
}

/// Compare-and-set flavours, producing 0 or 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Condition {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Condition {
    pub fn from_binop(kind: BinOpKind) -> Option<Self> {
        match kind {
            BinOpKind::LessThan => Some(Condition::Lt),
            BinOpKind::LessEqual => Some(Condition::Le),
            BinOpKind::GreaterThan => Some(Condition::Gt),
            BinOpKind::GreaterEqual => Some(Condition::Ge),
            BinOpKind::Equal => Some(Condition::Eq),
            BinOpKind::NotEqual => Some(Condition::Ne),
            BinOpKind::Add | BinOpKind::Sub | BinOpKind::Mul | BinOpKind::Div => None,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Condition::Lt => "slt",
            Condition::Le => "sle",
            Condition::Gt => "sgt",
            Condition::Ge => "sge",
            Condition::Eq => "seq",
            Condition::Ne => "sne",
        }
    }

    pub fn holds(&self, lhs: i32, rhs: i32) -> bool {
        match self {
            Condition::Lt => lhs < rhs,
            Condition::Le => lhs <= rhs,
            Condition::Gt => lhs > rhs,
            Condition::Ge => lhs >= rhs,
            Condition::Eq => lhs == rhs,
            Condition::Ne => lhs != rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // --- Data movement ---
    Li { rd: Register, imm: i32 },
    La { rd: Register, label: String },
    Lw { rt: Register, offset: i32, base: Register },
    Sw { rt: Register, offset: i32, base: Register },
    Move { rd: Register, rs: Register },

    // --- Arithmetic ---
    Addiu { rt: Register, rs: Register, imm: i32 },
    Addu { rd: Register, rs: Register, rt: Register },
    Subu { rd: Register, rs: Register, rt: Register },
    Mul { rd: Register, rs: Register, rt: Register },
    Div { rd: Register, rs: Register, rt: Register },
    Sll { rd: Register, rt: Register, shamt: u32 },
    Set { cond: Condition, rd: Register, rs: Register, rt: Register },

    // --- Control flow ---
    Beqz { rs: Register, label: String },
    J { label: String },
    Jal { label: String },
    Jr { rs: Register },
    Syscall,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Li { rd, imm } => write!(f, "li\t{}, {}", rd, imm),
            Instruction::La { rd, label } => write!(f, "la\t{}, {}", rd, label),
            Instruction::Lw { rt, offset, base } => write!(f, "lw\t{}, {}({})", rt, offset, base),
            Instruction::Sw { rt, offset, base } => write!(f, "sw\t{}, {}({})", rt, offset, base),
            Instruction::Move { rd, rs } => write!(f, "move\t{}, {}", rd, rs),
            Instruction::Addiu { rt, rs, imm } => write!(f, "addiu\t{}, {}, {}", rt, rs, imm),
            Instruction::Addu { rd, rs, rt } => write!(f, "addu\t{}, {}, {}", rd, rs, rt),
            Instruction::Subu { rd, rs, rt } => write!(f, "subu\t{}, {}, {}", rd, rs, rt),
            Instruction::Mul { rd, rs, rt } => write!(f, "mul\t{}, {}, {}", rd, rs, rt),
            Instruction::Div { rd, rs, rt } => write!(f, "div\t{}, {}, {}", rd, rs, rt),
            Instruction::Sll { rd, rt, shamt } => write!(f, "sll\t{}, {}, {}", rd, rt, shamt),
            Instruction::Set { cond, rd, rs, rt } => {
                write!(f, "{}\t{}, {}, {}", cond.mnemonic(), rd, rs, rt)
            }
            Instruction::Beqz { rs, label } => write!(f, "beqz\t{}, {}", rs, label),
            Instruction::J { label } => write!(f, "j\t{}", label),
            Instruction::Jal { label } => write!(f, "jal\t{}", label),
            Instruction::Jr { rs } => write!(f, "jr\t{}", rs),
            Instruction::Syscall => write!(f, "syscall"),
        }
    }
}
