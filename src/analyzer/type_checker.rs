use crate::parser::{
    CompoundStmt, Declaration, DeclarationKind, Expr, ExprKind, NodeId, Program, Stmt,
};

use super::{
    Annotations, ErrorKind, SemanticError, SemanticResult, SymbolId, SymbolKind, SymbolTable, Ty,
    MAX_PARAMS,
};

/// Pass 2: infers the type of every expression bottom-up and enforces the
/// static rules. Works purely from the bindings pass 1 left behind.
pub struct TypeChecker<'a> {
    symbol_table: &'a mut SymbolTable,
    annotations: &'a mut Annotations,
}

impl<'a> TypeChecker<'a> {
    pub fn new(symbol_table: &'a mut SymbolTable, annotations: &'a mut Annotations) -> Self {
        Self {
            symbol_table,
            annotations,
        }
    }

    pub fn check_program(&mut self, program: &Program) -> SemanticResult<()> {
        let last = program.decls.len().saturating_sub(1);
        let mut has_main = false;

        for (i, decl) in program.decls.iter().enumerate() {
            self.check_declaration(decl, i == last)?;
            has_main |= decl.is_function() && decl.name == "main";
        }

        if !has_main {
            let line = program.decls.last().map(|d| d.line).unwrap_or(1);
            return Err(SemanticError::new(
                ErrorKind::MainPlacementError,
                line,
                "program has no 'main' function",
            ));
        }
        Ok(())
    }

    fn check_declaration(&mut self, decl: &Declaration, is_last: bool) -> SemanticResult<()> {
        match &decl.kind {
            DeclarationKind::Function { params, body } => {
                self.check_function(decl, params, body, is_last)
            }
            _ if Ty::from(decl.ty) != Ty::Integer => Err(SemanticError::new(
                ErrorKind::NonIntegerDeclaration,
                decl.line,
                format!("'{}' is declared void", decl.name),
            )),
            _ => Ok(()),
        }
    }

    fn check_function(
        &mut self,
        decl: &Declaration,
        params: &[Declaration],
        body: &CompoundStmt,
        is_last: bool,
    ) -> SemanticResult<()> {
        let id = self.annotations.expect_symbol(decl.id, decl.line)?;
        for param in params.iter() {
            self.check_declaration(param, false)?;
        }
        if params.len() > MAX_PARAMS {
            return Err(SemanticError::new(
                ErrorKind::TooManyParameters,
                decl.line,
                format!(
                    "'{}' declares {} parameters, at most {} are supported",
                    decl.name,
                    params.len(),
                    MAX_PARAMS
                ),
            ));
        }

        self.check_compound(body)?;

        let declared = Ty::from(decl.ty);
        if decl.name == "main" {
            if !is_last {
                return Err(SemanticError::new(
                    ErrorKind::MainPlacementError,
                    decl.line,
                    "'main' must be the last declaration",
                ));
            }
            if declared != Ty::Void || !params.is_empty() {
                return Err(SemanticError::new(
                    ErrorKind::MainSignatureError,
                    decl.line,
                    "'main' must be declared as 'void main(void)'",
                ));
            }
        }

        let symbol = self.symbol_table.get(id);
        match declared {
            Ty::Void if symbol.returns_value => Err(SemanticError::new(
                ErrorKind::UnexpectedReturn,
                decl.line,
                format!("void function '{}' returns a value", decl.name),
            )),
            Ty::Integer if !symbol.returns_value => Err(SemanticError::new(
                ErrorKind::MissingReturn,
                decl.line,
                format!("int function '{}' never returns a value", decl.name),
            )),
            Ty::Integer if symbol.returns_bare => Err(SemanticError::new(
                ErrorKind::MissingReturn,
                decl.line,
                format!("int function '{}' has a return without a value", decl.name),
            )),
            _ => Ok(()),
        }
    }

    fn check_compound(&mut self, compound: &CompoundStmt) -> SemanticResult<()> {
        for decl in compound.decls.iter() {
            self.check_declaration(decl, false)?;
        }
        for stmt in compound.stmts.iter() {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_condition(&mut self, cond: &Expr, what: &str) -> SemanticResult<()> {
        let ty = self.check_expr(cond)?;
        if !ty.is_integer() {
            return Err(SemanticError::new(
                ErrorKind::ConditionTypeError,
                cond.line,
                format!("{} condition must be int, found {}", what, ty),
            ));
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> SemanticResult<()> {
        match stmt {
            Stmt::Expr(None) => Ok(()),
            Stmt::Expr(Some(expr)) => self.check_expr(expr).map(|_| ()),
            Stmt::Compound(compound) => self.check_compound(compound),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(cond, "if")?;
                self.check_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch)?;
                }
                Ok(())
            }
            Stmt::While { cond, body, .. } => {
                self.check_condition(cond, "while")?;
                self.check_stmt(body)
            }
            Stmt::Return { id, line, value } => self.check_return(*id, *line, value.as_ref()),
            Stmt::Assign {
                id,
                line,
                target,
                value,
            } => {
                let target_ty = self.check_expr(target)?;
                if target_ty == Ty::Array {
                    return Err(SemanticError::new(
                        ErrorKind::AssignmentTypeError,
                        *line,
                        "cannot assign to a whole array",
                    ));
                }
                let value_ty = self.check_expr(value)?;
                if !value_ty.is_integer() {
                    return Err(SemanticError::new(
                        ErrorKind::AssignmentTypeError,
                        *line,
                        format!("cannot assign a value of type {} to an int", value_ty),
                    ));
                }
                self.annotations.set_type(*id, target_ty);
                Ok(())
            }
        }
    }

    fn check_return(
        &mut self,
        id: NodeId,
        line: usize,
        value: Option<&Expr>,
    ) -> SemanticResult<()> {
        let function = self.annotations.expect_symbol(id, line)?;
        let ty = match value {
            None => {
                self.symbol_table.get_mut(function).returns_bare = true;
                Ty::Void
            }
            Some(value) => match self.check_expr(value)? {
                Ty::Integer => {
                    self.symbol_table.get_mut(function).returns_value = true;
                    Ty::Integer
                }
                ty => {
                    return Err(SemanticError::new(
                        ErrorKind::OperandTypeError,
                        line,
                        format!("cannot return a value of type {}", ty),
                    ))
                }
            },
        };
        self.annotations.set_type(id, ty);
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr) -> SemanticResult<Ty> {
        let ty = match &expr.kind {
            ExprKind::Num(_) => Ty::Integer,
            ExprKind::Var { name, index } => self.check_var(expr, name, index.as_deref())?,
            ExprKind::BinOp(op, left, right) => {
                let left_ty = self.check_expr(left)?;
                let right_ty = self.check_expr(right)?;
                if !left_ty.is_integer() || !right_ty.is_integer() {
                    return Err(SemanticError::new(
                        ErrorKind::OperandTypeError,
                        expr.line,
                        format!(
                            "operands of {:?} must be int, found {} and {}",
                            op, left_ty, right_ty
                        ),
                    ));
                }
                Ty::Integer
            }
            ExprKind::Call { name, args } => {
                let id = self.annotations.expect_symbol(expr.id, expr.line)?;
                if self.symbol_table.get(id).kind != SymbolKind::Function {
                    return Err(SemanticError::new(
                        ErrorKind::NotAFunction,
                        expr.line,
                        format!("'{}' is not a function", name),
                    ));
                }
                self.check_args(expr, id, args)?
            }
            ExprKind::Read { args } => {
                let id = self.annotations.expect_symbol(expr.id, expr.line)?;
                if let Some(arg) = args.first() {
                    if !arg.kind.is_addressable() {
                        return Err(SemanticError::new(
                            ErrorKind::ArgumentTypeMismatch,
                            arg.line,
                            "input expects a variable or an array element",
                        ));
                    }
                }
                self.check_args(expr, id, args)?
            }
            ExprKind::Write { args } => {
                let id = self.annotations.expect_symbol(expr.id, expr.line)?;
                self.check_args(expr, id, args)?
            }
        };

        self.annotations.set_type(expr.id, ty);
        Ok(ty)
    }

    fn check_var(&mut self, expr: &Expr, name: &str, index: Option<&Expr>) -> SemanticResult<Ty> {
        let id = self.annotations.expect_symbol(expr.id, expr.line)?;
        let symbol = self.symbol_table.get(id);
        let (kind, is_array) = (symbol.kind, symbol.is_array);
        if kind == SymbolKind::Function {
            return Err(SemanticError::new(
                ErrorKind::NotAVariable,
                expr.line,
                format!("function '{}' used as a variable", name),
            ));
        }

        match (is_array, index) {
            (true, Some(index)) => {
                let index_ty = self.check_expr(index)?;
                if !index_ty.is_integer() {
                    return Err(SemanticError::new(
                        ErrorKind::SubscriptTypeError,
                        index.line,
                        format!("subscript of '{}' must be int, found {}", name, index_ty),
                    ));
                }
                Ok(Ty::Integer)
            }
            (true, None) => Ok(Ty::Array),
            (false, Some(_)) => Err(SemanticError::new(
                ErrorKind::NotArray,
                expr.line,
                format!("'{}' is not an array variable", name),
            )),
            (false, None) => Ok(Ty::Integer),
        }
    }

    /// Positional types first, then the argument count.
    fn check_args(&mut self, call: &Expr, callee: SymbolId, args: &[Expr]) -> SemanticResult<Ty> {
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args.iter() {
            arg_types.push(self.check_expr(arg)?);
        }

        let symbol = self.symbol_table.get(callee);
        for (i, (arg, param)) in arg_types.iter().zip(symbol.params.iter()).enumerate() {
            if arg != param {
                return Err(SemanticError::new(
                    ErrorKind::ArgumentTypeMismatch,
                    args[i].line,
                    format!(
                        "argument {} of '{}' must be {}, found {}",
                        i + 1,
                        symbol.name,
                        param,
                        arg
                    ),
                ));
            }
        }

        if arg_types.len() != symbol.params.len() {
            let which = if arg_types.len() < symbol.params.len() {
                "too few"
            } else {
                "too many"
            };
            return Err(SemanticError::new(
                ErrorKind::ArityMismatch,
                call.line,
                format!(
                    "{} parameters in call to '{}' (expected {}, found {})",
                    which,
                    symbol.name,
                    symbol.params.len(),
                    arg_types.len()
                ),
            ));
        }

        Ok(symbol.value_type)
    }
}
