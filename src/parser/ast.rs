/// Identifies an annotatable node. The analyzer keys its side tables on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub decls: Vec<Declaration>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeSpecifier {
    Int,
    Void,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub id: NodeId,
    pub line: usize,
    pub name: String,
    pub ty: TypeSpecifier,
    pub kind: DeclarationKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeclarationKind {
    Variable,
    Array(usize),
    Function {
        params: Vec<Declaration>,
        body: CompoundStmt,
    },
    Parameter {
        is_array: bool,
    },
}

impl Declaration {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, DeclarationKind::Function { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompoundStmt {
    pub line: usize,
    pub decls: Vec<Declaration>,
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Option<Expr>),
    Compound(CompoundStmt),
    If {
        line: usize,
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        line: usize,
        cond: Expr,
        body: Box<Stmt>,
    },
    Return {
        id: NodeId,
        line: usize,
        value: Option<Expr>,
    },
    Assign {
        id: NodeId,
        line: usize,
        target: Expr,
        value: Expr,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub line: usize,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Num(i32),
    Var {
        name: String,
        index: Option<Box<Expr>>,
    },
    BinOp(BinOpKind, Box<Expr>, Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Read {
        args: Vec<Expr>,
    },
    Write {
        args: Vec<Expr>,
    },
}

impl ExprKind {
    pub fn is_addressable(&self) -> bool {
        matches!(self, ExprKind::Var { .. })
    }
}
