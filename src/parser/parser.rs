use thiserror::Error;

use crate::lexer::{Token, TokenKind};

use super::{CompoundStmt, Declaration, DeclarationKind, NodeId, Program, Stmt, TypeSpecifier};

#[derive(Debug, Error, Clone, PartialEq)]
#[error("syntax error at line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    pub(super) index: usize,
    next_id: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            next_id: 0,
        }
    }

    pub fn parse(&mut self) -> ParseResult<Program> {
        self.parse_program()
    }

    pub(super) fn new_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(super) fn is_eof(&self) -> bool {
        self.index >= self.tokens.len()
    }

    pub(super) fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|t| &t.kind)
    }

    pub(super) fn peek_nth(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + n).map(|t| &t.kind)
    }

    /// Line of the next token, or of the last one at EOF.
    pub(super) fn line(&self) -> usize {
        self.tokens
            .get(self.index)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    pub(super) fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(ParseError {
            line: self.line(),
            message: message.into(),
        })
    }

    pub(super) fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek() != Some(kind) {
            return false;
        }
        self.index += 1;
        true
    }

    pub(super) fn expect(&mut self, kind: &TokenKind) -> ParseResult<()> {
        match self.peek() {
            Some(t) if t == kind => {}
            Some(t) => {
                let t = t.clone();
                return self.error(format!("unexpected token {:?} (was expecting {:?})", t, kind));
            }
            None => return self.error(format!("expected {:?}, however received EOF", kind)),
        }
        self.index += 1;
        Ok(())
    }

    pub(super) fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek().cloned() {
            Some(TokenKind::Ident(name)) => {
                self.index += 1;
                Ok(name)
            }
            Some(k) => self.error(format!("unexpected token {:?} (was expecting Ident)", k)),
            None => self.error("expected identifier, however received EOF"),
        }
    }

    fn expect_num(&mut self) -> ParseResult<i32> {
        match self.peek().cloned() {
            Some(TokenKind::Num(value)) => {
                self.index += 1;
                Ok(value)
            }
            Some(k) => self.error(format!("unexpected token {:?} (was expecting Num)", k)),
            None => self.error("expected number, however received EOF"),
        }
    }

    /// program = declaration+
    fn parse_program(&mut self) -> ParseResult<Program> {
        let mut decls = vec![];

        while !self.is_eof() {
            decls.push(self.parse_declaration()?);
        }
        if decls.is_empty() {
            return self.error("program has no declarations");
        }

        Ok(Program { decls })
    }

    fn parse_type_specifier(&mut self) -> Option<TypeSpecifier> {
        if self.consume(&TokenKind::Int) {
            Some(TypeSpecifier::Int)
        } else if self.consume(&TokenKind::Void) {
            Some(TypeSpecifier::Void)
        } else {
            None
        }
    }

    fn expect_type_specifier(&mut self) -> ParseResult<TypeSpecifier> {
        match self.parse_type_specifier() {
            Some(ty) => Ok(ty),
            None => self.error("expected type specifier 'int' or 'void'"),
        }
    }

    /// declaration = type ident ";"
    ///             | type ident "[" num "]" ";"
    ///             | type ident "(" params ")" compound_stmt
    fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        let ty = self.expect_type_specifier()?;
        let line = self.line();
        let name = self.expect_ident()?;
        let id = self.new_id();

        if self.consume(&TokenKind::OpenParen) {
            let params = self.parse_params()?;
            self.expect(&TokenKind::CloseParen)?;
            self.expect(&TokenKind::OpenCurlyBrace)?;
            let body = self.parse_compound_stmt()?;
            return Ok(Declaration {
                id,
                line,
                name,
                ty,
                kind: DeclarationKind::Function { params, body },
            });
        }

        let kind = self.parse_var_declaration_tail()?;
        Ok(Declaration {
            id,
            line,
            name,
            ty,
            kind,
        })
    }

    /// ( "[" num "]" )? ";"
    fn parse_var_declaration_tail(&mut self) -> ParseResult<DeclarationKind> {
        let kind = if self.consume(&TokenKind::OpenSquareBrace) {
            let size = self.expect_num()?;
            if size <= 0 {
                return self.error(format!("array size must be positive, got {}", size));
            }
            self.expect(&TokenKind::CloseSquareBrace)?;
            DeclarationKind::Array(size as usize)
        } else {
            DeclarationKind::Variable
        };
        self.expect(&TokenKind::SemiColon)?;
        Ok(kind)
    }

    /// params = "void" | param ("," param)* | ε
    fn parse_params(&mut self) -> ParseResult<Vec<Declaration>> {
        if self.peek() == Some(&TokenKind::CloseParen) {
            return Ok(vec![]);
        }
        if self.peek() == Some(&TokenKind::Void) && self.peek_nth(1) == Some(&TokenKind::CloseParen)
        {
            self.index += 1;
            return Ok(vec![]);
        }

        let mut params = vec![self.parse_param()?];
        while self.consume(&TokenKind::Comma) {
            params.push(self.parse_param()?);
        }
        Ok(params)
    }

    /// param = type ident ("[" "]")?
    fn parse_param(&mut self) -> ParseResult<Declaration> {
        let ty = self.expect_type_specifier()?;
        let line = self.line();
        let name = self.expect_ident()?;
        let is_array = if self.consume(&TokenKind::OpenSquareBrace) {
            self.expect(&TokenKind::CloseSquareBrace)?;
            true
        } else {
            false
        };

        Ok(Declaration {
            id: self.new_id(),
            line,
            name,
            ty,
            kind: DeclarationKind::Parameter { is_array },
        })
    }

    /// compound_stmt = "{" local_declaration* stmt* "}"
    ///
    /// The opening brace has already been consumed.
    fn parse_compound_stmt(&mut self) -> ParseResult<CompoundStmt> {
        let line = self.line();
        let mut decls = vec![];
        while matches!(self.peek(), Some(TokenKind::Int | TokenKind::Void)) {
            let ty = self.expect_type_specifier()?;
            let decl_line = self.line();
            let name = self.expect_ident()?;
            let id = self.new_id();
            let kind = self.parse_var_declaration_tail()?;
            decls.push(Declaration {
                id,
                line: decl_line,
                name,
                ty,
                kind,
            });
        }

        let mut stmts = vec![];
        while !self.consume(&TokenKind::CloseCurlyBrace) {
            if self.is_eof() {
                return self.error("expected '}', however received EOF");
            }
            stmts.push(self.parse_stmt()?);
        }

        Ok(CompoundStmt { line, decls, stmts })
    }

    /// stmt = expr? ";"
    ///      | var "=" expr ";"
    ///      | "{" compound_stmt
    ///      | "if" "(" expr ")" stmt ("else" stmt)?
    ///      | "while" "(" expr ")" stmt
    ///      | "return" expr? ";"
    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        if self.consume(&TokenKind::OpenCurlyBrace) {
            Ok(Stmt::Compound(self.parse_compound_stmt()?))
        } else if self.consume(&TokenKind::If) {
            self.expect(&TokenKind::OpenParen)?;
            let cond = self.parse_expr()?;
            self.expect(&TokenKind::CloseParen)?;
            let then_branch = Box::new(self.parse_stmt()?);
            let else_branch = if self.consume(&TokenKind::Else) {
                Some(Box::new(self.parse_stmt()?))
            } else {
                None
            };
            Ok(Stmt::If {
                line,
                cond,
                then_branch,
                else_branch,
            })
        } else if self.consume(&TokenKind::While) {
            self.expect(&TokenKind::OpenParen)?;
            let cond = self.parse_expr()?;
            self.expect(&TokenKind::CloseParen)?;
            let body = Box::new(self.parse_stmt()?);
            Ok(Stmt::While { line, cond, body })
        } else if self.consume(&TokenKind::Return) {
            let id = self.new_id();
            let value = if self.consume(&TokenKind::SemiColon) {
                None
            } else {
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::SemiColon)?;
                Some(expr)
            };
            Ok(Stmt::Return { id, line, value })
        } else if self.consume(&TokenKind::SemiColon) {
            Ok(Stmt::Expr(None))
        } else {
            let expr = self.parse_expr()?;
            if self.consume(&TokenKind::Equal) {
                if !expr.kind.is_addressable() {
                    return Err(ParseError {
                        line,
                        message: "left hand side of an assignment must be a variable".to_string(),
                    });
                }
                let value = self.parse_expr()?;
                self.expect(&TokenKind::SemiColon)?;
                return Ok(Stmt::Assign {
                    id: self.new_id(),
                    line,
                    target: expr,
                    value,
                });
            }
            self.expect(&TokenKind::SemiColon)?;
            Ok(Stmt::Expr(Some(expr)))
        }
    }
}
