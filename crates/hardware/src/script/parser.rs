//! Parser for board scripts.
//!
//! Recursive descent over the spanned token stream, producing a [`Program`].
//! Semicolons are optional statement terminators. Parsing completes before any
//! statement runs, so a syntax error never leaves partial side effects.

use std::collections::HashSet;
use std::mem;
use std::rc::Rc;

use crate::common::error::ScriptError;
use crate::script::ast::{
    BinaryOp, DeclKind, Expr, FunctionBody, FunctionDef, LogicalOp, Program, Stmt, UnaryOp,
};
use crate::script::lexer::{Lexer, SpannedToken, Token};
use crate::script::value::format_number;

type Result<T> = std::result::Result<T, ScriptError>;

/// Deepest statement/expression nesting accepted before parsing is refused.
const MAX_NESTING: usize = 96;

/// Number of binary precedence levels handled by [`Parser::parse_binary`].
const BINARY_LEVELS: usize = 10;

/// Lexes and parses `source`.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = Lexer::new(source).tokenize_with_spans()?;
    Parser::new(tokens).parse()
}

/// Operator found at one binary precedence level.
enum Infix {
    Logical(LogicalOp),
    Binary(BinaryOp),
}

impl Infix {
    fn build(self, left: Expr, right: Expr) -> Expr {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            Self::Logical(op) => Expr::Logical { op, left, right },
            Self::Binary(op) => Expr::Binary { op, left, right },
        }
    }
}

/// Operators accepted at precedence `level` (0 binds loosest).
fn infix_at(level: usize, token: &Token) -> Option<Infix> {
    let op = match (level, token) {
        (0, Token::OrOr) => Infix::Logical(LogicalOp::Or),
        (0, Token::QuestionQuestion) => Infix::Logical(LogicalOp::Nullish),
        (1, Token::AndAnd) => Infix::Logical(LogicalOp::And),
        (2, Token::Pipe) => Infix::Binary(BinaryOp::BitOr),
        (3, Token::Caret) => Infix::Binary(BinaryOp::BitXor),
        (4, Token::Amp) => Infix::Binary(BinaryOp::BitAnd),
        (5, Token::EqEq) => Infix::Binary(BinaryOp::Eq),
        (5, Token::Ne) => Infix::Binary(BinaryOp::Ne),
        (5, Token::EqEqEq) => Infix::Binary(BinaryOp::StrictEq),
        (5, Token::NeEq) => Infix::Binary(BinaryOp::StrictNe),
        (6, Token::Lt) => Infix::Binary(BinaryOp::Lt),
        (6, Token::Le) => Infix::Binary(BinaryOp::Le),
        (6, Token::Gt) => Infix::Binary(BinaryOp::Gt),
        (6, Token::Ge) => Infix::Binary(BinaryOp::Ge),
        (7, Token::Shl) => Infix::Binary(BinaryOp::Shl),
        (7, Token::Shr) => Infix::Binary(BinaryOp::Shr),
        (7, Token::UShr) => Infix::Binary(BinaryOp::UShr),
        (8, Token::Plus) => Infix::Binary(BinaryOp::Add),
        (8, Token::Minus) => Infix::Binary(BinaryOp::Sub),
        (9, Token::Star) => Infix::Binary(BinaryOp::Mul),
        (9, Token::Slash) => Infix::Binary(BinaryOp::Div),
        (9, Token::Percent) => Infix::Binary(BinaryOp::Rem),
        _ => return None,
    };
    Some(op)
}

/// Maps an assignment token to its compound operator (`None` for plain `=`).
const fn assignment_op(token: &Token) -> Option<Option<BinaryOp>> {
    let op = match token {
        Token::Assign => None,
        Token::PlusAssign => Some(BinaryOp::Add),
        Token::MinusAssign => Some(BinaryOp::Sub),
        Token::StarAssign => Some(BinaryOp::Mul),
        Token::SlashAssign => Some(BinaryOp::Div),
        Token::PercentAssign => Some(BinaryOp::Rem),
        Token::AmpAssign => Some(BinaryOp::BitAnd),
        Token::PipeAssign => Some(BinaryOp::BitOr),
        Token::CaretAssign => Some(BinaryOp::BitXor),
        Token::ShlAssign => Some(BinaryOp::Shl),
        Token::ShrAssign => Some(BinaryOp::Shr),
        _ => return None,
    };
    Some(op)
}

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    /// Enclosing loops in the current function body.
    loop_depth: usize,
    /// Active statement/expression nesting.
    nesting: usize,
    /// `let`/`const` names declared in each open block.
    declared: Vec<HashSet<String>>,
    /// Position reported for "unexpected end of input".
    end: (usize, usize),
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        let end = tokens.last().map_or((1, 1), |st| {
            (st.span.line, st.span.col + (st.span.end - st.span.start))
        });
        Self {
            tokens,
            pos: 0,
            loop_depth: 0,
            nesting: 0,
            declared: vec![HashSet::new()],
            end,
        }
    }

    pub fn parse(&mut self) -> Result<Program> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    // ===== Statements =====

    fn parse_statement(&mut self) -> Result<Stmt> {
        self.enter()?;
        let stmt = self.parse_statement_inner();
        self.nesting -= 1;
        stmt
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt> {
        match self.peek_token() {
            Some(Token::LBrace) => Ok(Stmt::Block(self.parse_block()?)),
            Some(Token::Let | Token::Const | Token::Var) => {
                let stmt = self.parse_declaration()?;
                self.consume_semi();
                Ok(stmt)
            }
            Some(Token::Function) => {
                self.advance();
                let name = self.expect_ident()?;
                let def = self.parse_function_rest(Some(name))?;
                Ok(Stmt::Function(Rc::new(def)))
            }
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Do) => self.parse_do_while(),
            Some(Token::For) => self.parse_for(),
            Some(Token::Return) => {
                self.advance();
                let value = if matches!(
                    self.peek_token(),
                    None | Some(Token::Semi | Token::RBrace)
                ) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.consume_semi();
                Ok(Stmt::Return(value))
            }
            Some(Token::Break) => {
                if self.loop_depth == 0 {
                    return Err(self.error("Illegal break statement"));
                }
                self.advance();
                self.consume_semi();
                Ok(Stmt::Break)
            }
            Some(Token::Continue) => {
                if self.loop_depth == 0 {
                    return Err(self.error(
                        "Illegal continue statement: no surrounding iteration statement",
                    ));
                }
                self.advance();
                self.consume_semi();
                Ok(Stmt::Continue)
            }
            Some(Token::Throw) => {
                self.advance();
                let value = self.parse_expr()?;
                self.consume_semi();
                Ok(Stmt::Throw(value))
            }
            Some(Token::Try) => self.parse_try(),
            Some(Token::Semi) => {
                self.advance();
                Ok(Stmt::Empty)
            }
            _ => {
                let expr = self.parse_expr()?;
                self.consume_semi();
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>> {
        self.expect(&Token::LBrace)?;
        self.declared.push(HashSet::new());
        let mut stmts = Vec::new();
        while !matches!(self.peek_token(), Some(Token::RBrace) | None) {
            stmts.push(self.parse_statement()?);
        }
        let _ = self.declared.pop();
        self.expect(&Token::RBrace)?;
        Ok(stmts)
    }

    fn parse_declaration(&mut self) -> Result<Stmt> {
        let kind = match self.advance().map(|st| &st.token) {
            Some(Token::Const) => DeclKind::Const,
            Some(Token::Var) => DeclKind::Var,
            _ => DeclKind::Let,
        };
        let mut bindings = Vec::new();
        loop {
            if kind != DeclKind::Var {
                self.check_redeclaration()?;
            }
            let name = self.expect_ident()?;
            let init = if matches!(self.peek_token(), Some(Token::Assign)) {
                self.advance();
                Some(self.parse_assignment()?)
            } else if kind == DeclKind::Const {
                return Err(self.error("Missing initializer in const declaration"));
            } else {
                None
            };
            bindings.push((name, init));

            if !matches!(self.peek_token(), Some(Token::Comma)) {
                break;
            }
            self.advance();
        }
        Ok(Stmt::Declare { kind, bindings })
    }

    /// Parses `(params) { body }` after the `function` keyword and optional name.
    fn parse_function_rest(&mut self, name: Option<String>) -> Result<FunctionDef> {
        self.expect(&Token::LParen)?;
        let params = self.parse_params()?;
        self.expect(&Token::RParen)?;
        let body = self.parse_function_block()?;
        Ok(FunctionDef {
            name,
            params,
            body: FunctionBody::Block(body),
        })
    }

    /// Parses a function body; `break`/`continue` cannot reach enclosing loops.
    fn parse_function_block(&mut self) -> Result<Vec<Stmt>> {
        let saved = mem::take(&mut self.loop_depth);
        let body = self.parse_block();
        self.loop_depth = saved;
        body
    }

    fn parse_params(&mut self) -> Result<Vec<String>> {
        let mut params = Vec::new();
        while !matches!(self.peek_token(), Some(Token::RParen)) {
            params.push(self.expect_ident()?);
            if !matches!(self.peek_token(), Some(Token::Comma)) {
                break;
            }
            self.advance();
        }
        Ok(params)
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        self.expect(&Token::If)?;
        self.expect(&Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        let then = Box::new(self.parse_statement()?);
        let otherwise = if matches!(self.peek_token(), Some(Token::Else)) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    fn parse_loop_body(&mut self) -> Result<Box<Stmt>> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        Ok(Box::new(body?))
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        self.expect(&Token::While)?;
        self.expect(&Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_do_while(&mut self) -> Result<Stmt> {
        self.expect(&Token::Do)?;
        let body = self.parse_loop_body()?;
        self.expect(&Token::While)?;
        self.expect(&Token::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Token::RParen)?;
        self.consume_semi();
        Ok(Stmt::DoWhile { body, cond })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        self.expect(&Token::For)?;
        self.expect(&Token::LParen)?;
        self.declared.push(HashSet::new());

        let init = match self.peek_token() {
            Some(Token::Semi) => None,
            Some(Token::Let | Token::Const | Token::Var) => {
                Some(Box::new(self.parse_declaration()?))
            }
            _ => Some(Box::new(Stmt::Expr(self.parse_expr()?))),
        };
        self.expect(&Token::Semi)?;

        let cond = if matches!(self.peek_token(), Some(Token::Semi)) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&Token::Semi)?;

        let update = if matches!(self.peek_token(), Some(Token::RParen)) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&Token::RParen)?;

        let body = self.parse_loop_body()?;
        let _ = self.declared.pop();
        Ok(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn parse_try(&mut self) -> Result<Stmt> {
        self.expect(&Token::Try)?;
        let block = self.parse_block()?;

        let mut param = None;
        let handler = if matches!(self.peek_token(), Some(Token::Catch)) {
            self.advance();
            if matches!(self.peek_token(), Some(Token::LParen)) {
                self.advance();
                param = Some(self.expect_ident()?);
                self.expect(&Token::RParen)?;
            }
            Some(self.parse_block()?)
        } else {
            None
        };

        let finalizer = if matches!(self.peek_token(), Some(Token::Finally)) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Stmt::Try {
            block,
            param,
            handler,
            finalizer,
        })
    }

    // ===== Expressions =====

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr> {
        if self.is_arrow_ahead() {
            return self.parse_arrow();
        }

        let target = self.parse_conditional()?;
        let Some(op) = self.peek_token().and_then(assignment_op) else {
            return Ok(target);
        };
        if !target.is_assignable() {
            return Err(self.error("Invalid left-hand side in assignment"));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// Detects `ident =>` and `(a, b) =>` without consuming tokens.
    fn is_arrow_ahead(&self) -> bool {
        match self.peek_token() {
            Some(Token::Ident(_)) => matches!(self.peek_nth(1), Some(Token::Arrow)),
            Some(Token::LParen) => {
                let mut offset = 1;
                loop {
                    match self.peek_nth(offset) {
                        Some(Token::Ident(_) | Token::Comma) => offset += 1,
                        Some(Token::RParen) => {
                            return matches!(self.peek_nth(offset + 1), Some(Token::Arrow));
                        }
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }

    fn parse_arrow(&mut self) -> Result<Expr> {
        let params = if matches!(self.peek_token(), Some(Token::LParen)) {
            self.advance();
            let params = self.parse_params()?;
            self.expect(&Token::RParen)?;
            params
        } else {
            vec![self.expect_ident()?]
        };
        self.expect(&Token::Arrow)?;

        let body = if matches!(self.peek_token(), Some(Token::LBrace)) {
            FunctionBody::Block(self.parse_function_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_assignment()?))
        };
        Ok(Expr::Function(Rc::new(FunctionDef {
            name: None,
            params,
            body,
        })))
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let cond = self.parse_binary(0)?;
        if !matches!(self.peek_token(), Some(Token::Question)) {
            return Ok(cond);
        }
        self.advance();
        let then = self.parse_assignment()?;
        self.expect(&Token::Colon)?;
        let otherwise = self.parse_assignment()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Left-associative binary operators, loosest (`||`) to tightest (`*`).
    fn parse_binary(&mut self, level: usize) -> Result<Expr> {
        if level == BINARY_LEVELS {
            return self.parse_exponent();
        }
        let mut left = self.parse_binary(level + 1)?;
        while let Some(op) = self.peek_token().and_then(|t| infix_at(level, t)) {
            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = op.build(left, right);
        }
        Ok(left)
    }

    fn parse_exponent(&mut self) -> Result<Expr> {
        let base = self.parse_unary()?;
        if !matches!(self.peek_token(), Some(Token::StarStar)) {
            return Ok(base);
        }
        self.advance();
        let exponent = self.parse_exponent()?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.enter()?;
        let expr = self.parse_unary_inner();
        self.nesting -= 1;
        expr
    }

    fn parse_unary_inner(&mut self) -> Result<Expr> {
        let op = match self.peek_token() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Tilde) => UnaryOp::BitNot,
            Some(Token::Typeof) => UnaryOp::Typeof,
            Some(Token::PlusPlus | Token::MinusMinus) => {
                let increment = matches!(self.advance().map(|st| &st.token), Some(Token::PlusPlus));
                let target = self.parse_unary()?;
                if !target.is_assignable() {
                    return Err(self.error("Invalid left-hand side expression in prefix operation"));
                }
                return Ok(Expr::Update {
                    increment,
                    prefix: true,
                    target: Box::new(target),
                });
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let expr = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let expr = self.parse_call_member()?;
        let increment = match self.peek_token() {
            Some(Token::PlusPlus) => true,
            Some(Token::MinusMinus) => false,
            _ => return Ok(expr),
        };
        if !expr.is_assignable() {
            return Err(self.error("Invalid left-hand side expression in postfix operation"));
        }
        self.advance();
        Ok(Expr::Update {
            increment,
            prefix: false,
            target: Box::new(expr),
        })
    }

    fn parse_call_member(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_token() {
                Some(Token::Dot) => {
                    self.advance();
                    let property = self.expect_ident()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                Some(Token::LParen) => {
                    self.advance();
                    let args = self.parse_args()?;
                    self.expect(&Token::RParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while !matches!(self.peek_token(), Some(Token::RParen)) {
            args.push(self.parse_assignment()?);
            if !matches!(self.peek_token(), Some(Token::Comma)) {
                break;
            }
            self.advance();
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some(token) = self.peek_token().cloned() else {
            return Err(self.unexpected());
        };
        match token {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expr::Str(s.into()))
            }
            Token::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::Null => {
                self.advance();
                Ok(Expr::Null)
            }
            Token::Undefined => {
                self.advance();
                Ok(Expr::Undefined)
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Expr::Ident(name))
            }
            Token::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !matches!(self.peek_token(), Some(Token::RBracket)) {
                    elements.push(self.parse_assignment()?);
                    if !matches!(self.peek_token(), Some(Token::Comma)) {
                        break;
                    }
                    self.advance();
                }
                self.expect(&Token::RBracket)?;
                Ok(Expr::Array(elements))
            }
            Token::LBrace => self.parse_object(),
            Token::Function => {
                self.advance();
                let name = match self.peek_token() {
                    Some(Token::Ident(name)) => {
                        let name = name.clone();
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                let def = self.parse_function_rest(name)?;
                Ok(Expr::Function(Rc::new(def)))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_object(&mut self) -> Result<Expr> {
        self.expect(&Token::LBrace)?;
        let mut props = Vec::new();
        while !matches!(self.peek_token(), Some(Token::RBrace)) {
            let (key, shorthand) = match self.peek_token() {
                Some(Token::Ident(name)) => (name.clone(), true),
                Some(Token::Str(s)) => (s.clone(), false),
                Some(Token::Number(n)) => (format_number(*n), false),
                _ => return Err(self.unexpected()),
            };
            self.advance();

            let value = if matches!(self.peek_token(), Some(Token::Colon)) {
                self.advance();
                self.parse_assignment()?
            } else if shorthand {
                Expr::Ident(key.clone())
            } else {
                return Err(self.unexpected());
            };
            props.push((key, value));

            if !matches!(self.peek_token(), Some(Token::Comma)) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RBrace)?;
        Ok(Expr::Object(props))
    }

    // ===== Helper Methods =====

    fn enter(&mut self) -> Result<()> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error("Program nested too deeply"));
        }
        self.nesting += 1;
        Ok(())
    }

    /// Rejects a second `let`/`const` of the upcoming identifier in the current block.
    fn check_redeclaration(&mut self) -> Result<()> {
        let Some(Token::Ident(name)) = self.peek_token() else {
            return Ok(());
        };
        let name = name.clone();
        let Some(block) = self.declared.last_mut() else {
            return Ok(());
        };
        if block.insert(name.clone()) {
            Ok(())
        } else {
            Err(self.error(&format!("Identifier '{name}' has already been declared")))
        }
    }

    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|st| &st.token)
    }

    fn peek_nth(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|st| &st.token)
    }

    fn advance(&mut self) -> Option<&SpannedToken> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn consume_semi(&mut self) {
        if matches!(self.peek_token(), Some(Token::Semi)) {
            self.advance();
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.peek_token() {
            Some(token) if mem::discriminant(token) == mem::discriminant(expected) => {
                self.advance();
                Ok(())
            }
            Some(token) => Err(self.error(&format!("Unexpected token {token}, expected {expected}"))),
            None => Err(self.error(&format!("Unexpected end of input, expected {expected}"))),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek_token() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn unexpected(&self) -> ScriptError {
        match self.peek_token() {
            Some(token) => self.error(&format!("Unexpected token {token}")),
            None => self.error("Unexpected end of input"),
        }
    }

    fn error(&self, message: &str) -> ScriptError {
        let (line, column) = self
            .tokens
            .get(self.pos)
            .map_or(self.end, |st| (st.span.line, st.span.col));
        ScriptError::Syntax {
            message: message.to_string(),
            line,
            column,
        }
    }
}
