use std::collections::HashMap;

use crate::parser::NodeId;

use super::{ErrorKind, SemanticError, SemanticResult, SymbolId, Ty};

/// What the analyzer learned about each node, keyed by the parser's ids.
///
/// Pass 1 fills `symbols`, pass 2 fills `types`; the code generator only
/// reads.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Annotations {
    symbols: HashMap<NodeId, SymbolId>,
    types: HashMap<NodeId, Ty>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, node: NodeId, symbol: SymbolId) {
        self.symbols.insert(node, symbol);
    }

    pub fn symbol(&self, node: NodeId) -> Option<SymbolId> {
        self.symbols.get(&node).copied()
    }

    /// Like [`Annotations::symbol`], for callers that rely on pass 1 having run.
    pub fn expect_symbol(&self, node: NodeId, line: usize) -> SemanticResult<SymbolId> {
        self.symbol(node).ok_or_else(|| {
            SemanticError::new(
                ErrorKind::Internal,
                line,
                format!("node {} was never resolved", node.0),
            )
        })
    }

    pub fn set_type(&mut self, node: NodeId, ty: Ty) {
        self.types.insert(node, ty);
    }

    pub fn ty(&self, node: NodeId) -> Option<Ty> {
        self.types.get(&node).copied()
    }

    pub fn types(&self) -> &HashMap<NodeId, Ty> {
        &self.types
    }
}
