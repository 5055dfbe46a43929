use crate::config::Config;
use crate::parser::{CompoundStmt, Declaration, DeclarationKind, Expr, ExprKind, Program, Stmt};

use super::{
    Analysis, Annotations, ErrorKind, Frame, LookupMode, ScopeError, SemanticError, SemanticResult,
    Symbol, SymbolId, SymbolTable, Ty, INPUT, OUTPUT,
};

fn scope_error(err: ScopeError, line: usize) -> SemanticError {
    match err {
        ScopeError::DuplicateDeclaration { .. } => {
            SemanticError::new(ErrorKind::DuplicateDeclaration, line, err.to_string())
        }
        ScopeError::StorageOverflow { .. } => {
            SemanticError::new(ErrorKind::StorageOverflow, line, err.to_string())
        }
        ScopeError::Underflow => SemanticError::new(ErrorKind::Internal, line, err.to_string()),
    }
}

/// Pass 1: declares every name, allocates its storage and binds every use to
/// the symbol it resolves to.
pub struct SemanticVisitor {
    symbol_table: SymbolTable,
    annotations: Annotations,
    current_function: Option<SymbolId>,
    trace_enabled: bool,
    trace: String,
}

impl SemanticVisitor {
    pub fn new(config: &Config) -> Self {
        Self {
            symbol_table: SymbolTable::new(),
            annotations: Annotations::new(),
            current_function: None,
            trace_enabled: config.trace_analyze,
            trace: String::new(),
        }
    }

    pub fn visit_program(mut self, program: &Program) -> SemanticResult<Analysis> {
        for decl in program.decls.iter() {
            self.visit_declaration(decl)?;
        }
        self.dump("global");

        Ok(Analysis {
            symbol_table: self.symbol_table,
            annotations: self.annotations,
            trace: self.trace,
        })
    }

    fn dump(&mut self, what: &str) {
        if self.trace_enabled {
            self.trace.push_str(&format!(
                "Leaving {} scope (depth {})\n",
                what,
                self.symbol_table.depth()
            ));
            self.trace.push_str(&self.symbol_table.dump_scope());
            self.trace.push('\n');
        }
    }

    fn exit_scope(&mut self, what: &str, line: usize) -> SemanticResult<Frame> {
        self.dump(what);
        self.symbol_table
            .exit_scope()
            .map_err(|e| scope_error(e, line))
    }

    fn check_duplicate(&self, decl: &Declaration) -> SemanticResult<()> {
        let first_line = self
            .symbol_table
            .lookup_declaration_line(&decl.name, LookupMode::LocalNFunc);
        match first_line {
            Some(first_line) => {
                let err = ScopeError::DuplicateDeclaration {
                    name: decl.name.clone(),
                    first_line,
                };
                Err(scope_error(err, decl.line))
            }
            None => Ok(()),
        }
    }

    fn visit_declaration(&mut self, decl: &Declaration) -> SemanticResult<()> {
        self.check_duplicate(decl)?;

        let symbol = match &decl.kind {
            DeclarationKind::Function { params, body } => {
                return self.visit_function(decl, params, body);
            }
            _ if Ty::from(decl.ty) != Ty::Integer => {
                return Err(SemanticError::new(
                    ErrorKind::NonIntegerDeclaration,
                    decl.line,
                    format!("'{}' is declared void", decl.name),
                ));
            }
            DeclarationKind::Variable => Symbol::variable(&decl.name, Ty::Integer),
            DeclarationKind::Array(len) => Symbol::array(&decl.name, Ty::Integer, *len),
            DeclarationKind::Parameter { is_array } => {
                Symbol::parameter(&decl.name, Ty::Integer, *is_array)
            }
        };

        let param_type = symbol.param_type();
        let is_param = matches!(decl.kind, DeclarationKind::Parameter { .. });
        let id = self
            .symbol_table
            .insert(&decl.name, decl.line, symbol)
            .map_err(|e| scope_error(e, decl.line))?;
        self.annotations.bind(decl.id, id);

        if is_param {
            let function = self.current_function.ok_or_else(|| {
                SemanticError::new(
                    ErrorKind::Internal,
                    decl.line,
                    format!("parameter '{}' outside of a function", decl.name),
                )
            })?;
            self.symbol_table.get_mut(function).params.push(param_type);
        }
        Ok(())
    }

    fn visit_function(
        &mut self,
        decl: &Declaration,
        params: &[Declaration],
        body: &CompoundStmt,
    ) -> SemanticResult<()> {
        log::debug!("resolving function '{}'", decl.name);
        let id = self
            .symbol_table
            .insert(&decl.name, decl.line, Symbol::function(&decl.name, decl.ty.into()))
            .map_err(|e| scope_error(e, decl.line))?;
        self.annotations.bind(decl.id, id);

        self.current_function = Some(id);
        self.symbol_table.enter_scope(true);
        for param in params.iter() {
            self.visit_declaration(param)?;
        }
        // The body shares the function's scope.
        self.visit_compound(body, false)?;
        let frame = self.exit_scope(&format!("function '{}'", decl.name), decl.line)?;
        self.symbol_table.get_mut(id).frame = Some(frame);
        self.current_function = None;

        Ok(())
    }

    fn visit_compound(&mut self, compound: &CompoundStmt, new_scope: bool) -> SemanticResult<()> {
        if new_scope {
            self.symbol_table.enter_scope(false);
        }
        for decl in compound.decls.iter() {
            self.visit_declaration(decl)?;
        }
        for stmt in compound.stmts.iter() {
            self.visit_stmt(stmt)?;
        }
        if new_scope {
            self.exit_scope("block", compound.line)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> SemanticResult<()> {
        match stmt {
            Stmt::Expr(None) => Ok(()),
            Stmt::Expr(Some(expr)) => self.visit_expr(expr),
            Stmt::Compound(compound) => self.visit_compound(compound, true),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.visit_expr(cond)?;
                self.visit_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.visit_stmt(else_branch)?;
                }
                Ok(())
            }
            Stmt::While { cond, body, .. } => {
                self.visit_expr(cond)?;
                self.visit_stmt(body)
            }
            Stmt::Return { id, line, value } => {
                let function = self.current_function.ok_or_else(|| {
                    SemanticError::new(ErrorKind::Internal, *line, "return outside of a function")
                })?;
                self.annotations.bind(*id, function);
                if let Some(value) = value {
                    self.visit_expr(value)?;
                }
                Ok(())
            }
            Stmt::Assign { target, value, .. } => {
                self.visit_expr(target)?;
                self.visit_expr(value)
            }
        }
    }

    fn resolve(&mut self, expr: &Expr, name: &str, kind: ErrorKind) -> SemanticResult<()> {
        let id = self
            .symbol_table
            .lookup_id(name, LookupMode::Full)
            .ok_or_else(|| {
                SemanticError::new(kind, expr.line, format!("'{}' is not declared", name))
            })?;
        self.symbol_table.record_use(id, expr.line);
        self.annotations.bind(expr.id, id);
        Ok(())
    }

    /// `input` and `output` are declared globally the first time they are used.
    fn resolve_builtin(&mut self, expr: &Expr, name: &str) -> SemanticResult<()> {
        if self.symbol_table.lookup_id(name, LookupMode::Full).is_none() {
            let mut symbol = Symbol::function(name, Ty::Void);
            symbol.params.push(Ty::Integer);
            self.symbol_table
                .insert_global(name, expr.line, symbol)
                .map_err(|e| scope_error(e, expr.line))?;
        }
        self.resolve(expr, name, ErrorKind::UndeclaredFunction)
    }

    fn visit_args(&mut self, args: &[Expr]) -> SemanticResult<()> {
        for arg in args.iter() {
            self.visit_expr(arg)?;
        }
        Ok(())
    }

    fn visit_expr(&mut self, expr: &Expr) -> SemanticResult<()> {
        match &expr.kind {
            ExprKind::Num(_) => Ok(()),
            ExprKind::Var { name, index } => {
                self.resolve(expr, name, ErrorKind::UndeclaredIdentifier)?;
                if let Some(index) = index {
                    self.visit_expr(index)?;
                }
                Ok(())
            }
            ExprKind::BinOp(_, left, right) => {
                self.visit_expr(left)?;
                self.visit_expr(right)
            }
            ExprKind::Call { name, args } => {
                self.resolve(expr, name, ErrorKind::UndeclaredFunction)?;
                self.visit_args(args)
            }
            ExprKind::Read { args } => {
                self.resolve_builtin(expr, INPUT)?;
                self.visit_args(args)
            }
            ExprKind::Write { args } => {
                self.resolve_builtin(expr, OUTPUT)?;
                self.visit_args(args)
            }
        }
    }
}
