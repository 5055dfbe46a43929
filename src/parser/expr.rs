use crate::lexer::TokenKind;

use super::{BinOpKind, Expr, ExprKind, ParseResult, Parser};

impl BinOpKind {
    fn relational(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::LessThan => Some(BinOpKind::LessThan),
            TokenKind::LessEqual => Some(BinOpKind::LessEqual),
            TokenKind::GreaterThan => Some(BinOpKind::GreaterThan),
            TokenKind::GreaterEqual => Some(BinOpKind::GreaterEqual),
            TokenKind::DoubleEqual => Some(BinOpKind::Equal),
            TokenKind::NotEqual => Some(BinOpKind::NotEqual),
            _ => None,
        }
    }

    fn additive(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(BinOpKind::Add),
            TokenKind::Minus => Some(BinOpKind::Sub),
            _ => None,
        }
    }

    fn multiplicative(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Star => Some(BinOpKind::Mul),
            TokenKind::Slash => Some(BinOpKind::Div),
            _ => None,
        }
    }
}

impl Parser {
    fn new_binop(&mut self, line: usize, kind: BinOpKind, left: Expr, right: Expr) -> Expr {
        Expr {
            id: self.new_id(),
            line,
            kind: ExprKind::BinOp(kind, Box::new(left), Box::new(right)),
        }
    }

    /// expr = additive (relop additive)?
    pub(super) fn parse_expr(&mut self) -> ParseResult<Expr> {
        let node = self.parse_additive()?;

        if let Some(kind) = self.peek().and_then(BinOpKind::relational) {
            let line = self.line();
            self.index += 1;
            let right = self.parse_additive()?;
            return Ok(self.new_binop(line, kind, node, right));
        }

        Ok(node)
    }

    /// additive = term (("+" | "-") term)*
    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut node = self.parse_term()?;

        while let Some(kind) = self.peek().and_then(BinOpKind::additive) {
            let line = self.line();
            self.index += 1;
            let right = self.parse_term()?;
            node = self.new_binop(line, kind, node, right);
        }

        Ok(node)
    }

    /// term = factor (("*" | "/") factor)*
    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut node = self.parse_factor()?;

        while let Some(kind) = self.peek().and_then(BinOpKind::multiplicative) {
            let line = self.line();
            self.index += 1;
            let right = self.parse_factor()?;
            node = self.new_binop(line, kind, node, right);
        }

        Ok(node)
    }

    /// factor = "(" expr ")"
    ///        | num
    ///        | ident ("[" expr "]")?
    ///        | ident "(" args ")"
    ///        | ("input" | "output") "(" args ")"
    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        match self.peek().cloned() {
            Some(TokenKind::OpenParen) => {
                self.index += 1;
                let node = self.parse_expr()?;
                self.expect(&TokenKind::CloseParen)?;
                Ok(node)
            }
            Some(TokenKind::Num(num)) => {
                self.index += 1;
                Ok(Expr {
                    id: self.new_id(),
                    line,
                    kind: ExprKind::Num(num),
                })
            }
            Some(TokenKind::Input) => {
                self.index += 1;
                let args = self.parse_args()?;
                Ok(Expr {
                    id: self.new_id(),
                    line,
                    kind: ExprKind::Read { args },
                })
            }
            Some(TokenKind::Output) => {
                self.index += 1;
                let args = self.parse_args()?;
                Ok(Expr {
                    id: self.new_id(),
                    line,
                    kind: ExprKind::Write { args },
                })
            }
            Some(TokenKind::Ident(name)) => {
                self.index += 1;
                let kind = if self.peek() == Some(&TokenKind::OpenParen) {
                    let args = self.parse_args()?;
                    ExprKind::Call { name, args }
                } else if self.consume(&TokenKind::OpenSquareBrace) {
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::CloseSquareBrace)?;
                    ExprKind::Var {
                        name,
                        index: Some(Box::new(index)),
                    }
                } else {
                    ExprKind::Var { name, index: None }
                };
                Ok(Expr {
                    id: self.new_id(),
                    line,
                    kind,
                })
            }
            Some(t) => self.error(format!("unexpected token {:?} in expression", t)),
            None => self.error("expected expression, however received EOF"),
        }
    }

    /// args = "(" (expr ("," expr)*)? ")"
    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(&TokenKind::OpenParen)?;
        let mut args = vec![];
        if self.consume(&TokenKind::CloseParen) {
            return Ok(args);
        }

        args.push(self.parse_expr()?);
        while self.consume(&TokenKind::Comma) {
            args.push(self.parse_expr()?);
        }
        self.expect(&TokenKind::CloseParen)?;
        Ok(args)
    }
}
