use std::collections::HashMap;
use std::fmt::Write;

use thiserror::Error;

use super::{Ty, WORD_SIZE};

/// First local slot; locals grow downward from here.
const INITIAL_HIGH: i32 = -WORD_SIZE;

/// Saved `$ra` and caller `$fp`.
pub const SAVED_REGISTERS_SIZE: i32 = 2 * WORD_SIZE;

/// Bound on each storage region (globals, parameters, locals), so that a
/// whole frame and every offset in it stay within an `i32`.
pub const MAX_REGION_SIZE: i32 = i32::MAX / 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Array,
    Function,
    Parameter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupMode {
    /// Innermost to outermost scope, first match wins.
    Full,
    /// Current scope only.
    Local,
    /// Current scope, then only functions in the enclosing scopes.
    LocalNFunc,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("'{name}' was already declared at line {first_line}")]
    DuplicateDeclaration { name: String, first_line: usize },

    #[error("'{name}' does not fit in the {limit} bytes a storage region may use")]
    StorageOverflow { name: String, limit: i32 },

    #[error("no open scope beneath the global scope")]
    Underflow,
}

/// Storage used by one function activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub params_size: i32,
    pub locals_size: i32,
}

impl Frame {
    pub fn size(&self) -> i32 {
        SAVED_REGISTERS_SIZE + self.params_size + self.locals_size
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub value_type: Ty,
    pub is_array: bool,
    pub array_len: usize,
    pub params: Vec<Ty>,
    pub returns_value: bool,
    pub returns_bare: bool,
    pub is_global: bool,
    pub frame: Option<Frame>,
    offset: i32,
    lines: Vec<usize>,
}

impl Symbol {
    fn new(name: &str, kind: SymbolKind, value_type: Ty) -> Self {
        Self {
            name: name.to_string(),
            kind,
            value_type,
            is_array: false,
            array_len: 0,
            params: vec![],
            returns_value: false,
            returns_bare: false,
            is_global: false,
            frame: None,
            offset: 0,
            lines: vec![],
        }
    }

    pub fn function(name: &str, return_type: Ty) -> Self {
        Self::new(name, SymbolKind::Function, return_type)
    }

    pub fn variable(name: &str, ty: Ty) -> Self {
        Self::new(name, SymbolKind::Variable, ty)
    }

    pub fn array(name: &str, ty: Ty, len: usize) -> Self {
        Self {
            is_array: true,
            array_len: len,
            ..Self::new(name, SymbolKind::Array, ty)
        }
    }

    pub fn parameter(name: &str, ty: Ty, is_array: bool) -> Self {
        Self {
            is_array,
            ..Self::new(name, SymbolKind::Parameter, ty)
        }
    }

    /// Assigned once by [`SymbolTable::insert`].
    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    pub fn declaration_line(&self) -> usize {
        self.lines[0]
    }

    /// Bytes of storage the symbol occupies in its scope, or `None` for an
    /// array too long to address.
    pub fn size(&self) -> Option<i32> {
        match self.kind {
            SymbolKind::Function => Some(0),
            SymbolKind::Variable | SymbolKind::Parameter => Some(WORD_SIZE),
            SymbolKind::Array => i32::try_from(self.array_len)
                .ok()?
                .checked_mul(WORD_SIZE)
                .filter(|&size| size <= MAX_REGION_SIZE),
        }
    }

    /// The type a parameter contributes to its function's signature.
    pub fn param_type(&self) -> Ty {
        if self.is_array {
            Ty::Array
        } else {
            self.value_type
        }
    }

    /// Inferred from the return statements seen by the type checker.
    pub fn return_type(&self) -> Option<Ty> {
        if self.returns_value {
            Some(Ty::Integer)
        } else if self.returns_bare {
            Some(Ty::Void)
        } else {
            None
        }
    }

    /// An array parameter holds the address of the caller's array.
    pub fn holds_address(&self) -> bool {
        self.kind == SymbolKind::Parameter && self.is_array
    }

    fn kind_label(&self) -> &'static str {
        match self.kind {
            SymbolKind::Variable | SymbolKind::Array => "Variable",
            SymbolKind::Function => "Function",
            SymbolKind::Parameter => "Parameter",
        }
    }
}

#[derive(Debug)]
struct Scope {
    depth: usize,
    table: HashMap<String, SymbolId>,
    order: Vec<SymbolId>,
    low: i32,
    high: i32,
    starts_frame: bool,
}

impl Scope {
    fn new(depth: usize, low: i32, high: i32, starts_frame: bool) -> Self {
        Self {
            depth,
            table: HashMap::new(),
            order: vec![],
            low,
            high,
            starts_frame,
        }
    }
}

/// Scope stack over an arena of symbols. Symbols outlive the scope that
/// declared them, so annotations can keep referring to them by id.
#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    scopes: Vec<Scope>,
    function_count: i32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: vec![],
            scopes: vec![Scope::new(0, 0, INITIAL_HIGH, true)],
            function_count: 0,
        }
    }

    // The global scope is never popped.
    fn current(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.current().depth
    }

    pub fn enter_scope(&mut self, starts_new_frame: bool) {
        let parent = self.current();
        let (low, high) = if starts_new_frame {
            (0, INITIAL_HIGH)
        } else {
            (parent.low, parent.high)
        };
        let depth = parent.depth + 1;
        log::trace!("enter scope {} (new frame: {})", depth, starts_new_frame);
        self.scopes.push(Scope::new(depth, low, high, starts_new_frame));
    }

    /// Pops the current scope and returns the storage it used. A block scope
    /// hands its counters back to the enclosing scope so that later blocks of
    /// the same function get fresh slots.
    pub fn exit_scope(&mut self) -> Result<Frame, ScopeError> {
        if self.scopes.len() <= 1 {
            return Err(ScopeError::Underflow);
        }
        let scope = self.scopes.pop().ok_or(ScopeError::Underflow)?;
        if !scope.starts_frame {
            if let Some(parent) = self.scopes.last_mut() {
                parent.low = scope.low;
                parent.high = scope.high;
            }
        }
        log::trace!("exit scope {}", scope.depth);

        Ok(Frame {
            params_size: scope.low,
            locals_size: INITIAL_HIGH - scope.high,
        })
    }

    /// Declares `name` in the current scope and allocates its storage.
    pub fn insert(
        &mut self,
        name: &str,
        line: usize,
        symbol: Symbol,
    ) -> Result<SymbolId, ScopeError> {
        let index = self.scopes.len() - 1;
        self.insert_at(index, name, line, symbol)
    }

    /// Declares `name` in the global scope, whatever scope is open.
    pub fn insert_global(
        &mut self,
        name: &str,
        line: usize,
        symbol: Symbol,
    ) -> Result<SymbolId, ScopeError> {
        self.insert_at(0, name, line, symbol)
    }

    fn insert_at(
        &mut self,
        index: usize,
        name: &str,
        line: usize,
        mut symbol: Symbol,
    ) -> Result<SymbolId, ScopeError> {
        if let Some(&existing) = self.scopes[index].table.get(name) {
            return Err(ScopeError::DuplicateDeclaration {
                name: name.to_string(),
                first_line: self.symbols[existing.0].declaration_line(),
            });
        }

        let overflow = || ScopeError::StorageOverflow {
            name: name.to_string(),
            limit: MAX_REGION_SIZE,
        };
        let size = symbol.size().ok_or_else(overflow)?;
        let scope = &mut self.scopes[index];

        // Counters only move once the symbol is known to fit.
        let is_local = scope.depth > 0 && symbol.kind != SymbolKind::Parameter;
        symbol.offset = match symbol.kind {
            SymbolKind::Function => {
                self.function_count += 1;
                self.function_count - 1
            }
            _ if is_local => {
                scope.high = scope
                    .high
                    .checked_sub(size)
                    .filter(|&high| INITIAL_HIGH - high <= MAX_REGION_SIZE)
                    .ok_or_else(overflow)?;
                // Lowest slot; elements grow upward from it.
                scope.high + WORD_SIZE
            }
            _ => {
                let offset = scope.low;
                scope.low = offset
                    .checked_add(size)
                    .filter(|&low| low <= MAX_REGION_SIZE)
                    .ok_or_else(overflow)?;
                symbol.is_global = scope.depth == 0;
                offset
            }
        };
        symbol.lines = vec![line];

        let id = SymbolId(self.symbols.len());
        log::trace!(
            "insert '{}' at depth {} with offset {}",
            name,
            scope.depth,
            symbol.offset
        );
        scope.table.insert(name.to_string(), id);
        scope.order.push(id);
        self.symbols.push(symbol);
        Ok(id)
    }

    pub fn lookup_id(&self, name: &str, mode: LookupMode) -> Option<SymbolId> {
        let innermost = self.scopes.len() - 1;
        for (i, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(&id) = scope.table.get(name) {
                let outside = i != innermost;
                if !(mode == LookupMode::LocalNFunc
                    && outside
                    && self.symbols[id.0].kind != SymbolKind::Function)
                {
                    return Some(id);
                }
            }
            if mode == LookupMode::Local {
                break;
            }
        }
        None
    }

    pub fn lookup(&self, name: &str, mode: LookupMode) -> Option<(i32, &Symbol)> {
        self.lookup_id(name, mode).map(|id| {
            let symbol = self.get(id);
            (symbol.offset, symbol)
        })
    }

    pub fn lookup_declaration_line(&self, name: &str, mode: LookupMode) -> Option<usize> {
        self.lookup(name, mode).map(|(_, symbol)| symbol.declaration_line())
    }

    /// Bytes reserved for global variables so far.
    pub fn globals_size(&self) -> i32 {
        self.scopes[0].low
    }

    pub fn record_use(&mut self, id: SymbolId, line: usize) {
        let lines = &mut self.symbols[id.0].lines;
        if !lines.contains(&line) {
            lines.push(line);
        }
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    /// Renders the current scope as a trace table.
    pub fn dump_scope(&self) -> String {
        let scope = self.current();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<6}{:<12}{:<6}{:<11}{:<8}{:<11}{:<6}LineNumbers",
            "Scope", "Name", "Loc", "V/P/F", "Array?", "ArraySize", "Type"
        );
        let _ = writeln!(out, "{:-<70}", "");
        for &id in &scope.order {
            let symbol = self.get(id);
            let (is_array, size) = match (symbol.is_array, symbol.kind) {
                (true, SymbolKind::Array) => ("YES", symbol.array_len.to_string()),
                (true, _) => ("YES", "-".to_string()),
                (false, _) => ("NO", "-".to_string()),
            };
            let lines = symbol
                .lines
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(
                out,
                "{:<6}{:<12}{:<6}{:<11}{:<8}{:<11}{:<6}{}",
                scope.depth,
                symbol.name,
                symbol.offset,
                symbol.kind_label(),
                is_array,
                size,
                symbol.value_type,
                lines
            );
        }
        out
    }
}
