use std::fmt;
use std::io;

use super::{CodegenResult, Instruction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Directive(String),
    /// `label: .kind value`
    Data {
        label: String,
        kind: String,
        value: String,
    },
    Label(String),
    Inst(Instruction),
    Comment(String),
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Directive(d) => write!(f, "\t{}", d),
            Line::Data { label, kind, value } => write!(f, "{}:\t{}\t{}", label, kind, value),
            Line::Label(l) => write!(f, "{}:", l),
            Line::Inst(i) => write!(f, "\t{}", i),
            Line::Comment(c) => write!(f, "# {}", c),
        }
    }
}

/// A finished program, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    lines: Vec<Line>,
}

impl Assembly {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.lines.iter().filter_map(|l| match l {
            Line::Inst(i) => Some(i),
            _ => None,
        })
    }

    pub fn write_to<W: io::Write>(&self, out: &mut W) -> CodegenResult<()> {
        for line in self.lines.iter() {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines.iter() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Emitter {
    assembly: Assembly,
    trace: bool,
}

impl Emitter {
    pub fn new(trace: bool) -> Self {
        Self {
            assembly: Assembly::default(),
            trace,
        }
    }

    pub fn emit(&mut self, inst: Instruction) {
        self.assembly.lines.push(Line::Inst(inst));
    }

    pub fn label(&mut self, label: impl Into<String>) {
        self.assembly.lines.push(Line::Label(label.into()));
    }

    pub fn directive(&mut self, directive: impl Into<String>) {
        self.assembly.lines.push(Line::Directive(directive.into()));
    }

    pub fn data(&mut self, label: &str, kind: &str, value: &str) {
        self.assembly.lines.push(Line::Data {
            label: label.to_string(),
            kind: kind.to_string(),
            value: value.to_string(),
        });
    }

    /// Dropped unless code tracing is on.
    pub fn comment(&mut self, text: impl fmt::Display) {
        if self.trace {
            self.assembly.lines.push(Line::Comment(text.to_string()));
        }
    }

    pub fn finish(self) -> Assembly {
        self.assembly
    }
}
