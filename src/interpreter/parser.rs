use std::rc::Rc;

use chumsky::Parser as _;

use super::error::ParseError;
use crate::ast::{BinaryOp, Expr, ExprKind, Stmt, UnaryOp};
use crate::diagnostic::Span;
use crate::lexer::lexer;
use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// A non-blank source line together with the more-indented lines nested
/// under it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalLine {
    /// 1-based line number in the source.
    pub number: usize,
    /// Indentation width, tabs counting as four columns.
    pub indent: usize,
    /// Bytes of leading whitespace stripped from `text`.
    pub offset: usize,
    pub text: String,
    pub body: Vec<LogicalLine>,
    /// `elif` / `else` lines attached to an `if` header.
    pub alternatives: Vec<LogicalLine>,
}

impl LogicalLine {
    pub fn new(number: usize, raw: &str) -> Self {
        let text = raw.trim();
        let offset = raw.len() - raw.trim_start().len();
        let indent = raw[..offset].chars().map(|c| if c == '\t' { 4 } else { 1 }).sum();
        Self {
            number,
            indent,
            offset,
            text: text.to_string(),
            body: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    pub fn has_block(&self) -> bool {
        !self.body.is_empty() || !self.alternatives.is_empty()
    }
}

/// Tag a parse error with the line it came from, unless a nested line
/// already claimed it.
fn locate(err: ParseError, line: &LogicalLine) -> ParseError {
    if err.line.is_some() {
        err
    } else {
        err.offset_by(line.offset).at_line(line.number)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, ParseError> {
    let tokens = lexer().parse(source).into_result().map_err(|errors| {
        match errors.into_iter().next() {
            Some(err) => {
                let span = Span::new(err.span().start, err.span().end);
                match err.found() {
                    Some(c) => ParseError::new(format!("unexpected character `{}`", c), span)
                        .with_found(format!("`{}`", c)),
                    None => ParseError::new("unterminated string literal", span),
                }
            }
            None => ParseError::new("invalid input", Span::new(0, source.len())),
        }
    })?;

    Ok(tokens
        .into_iter()
        .map(|(token, span)| SpannedToken {
            token,
            span: Span::new(span.start, span.end),
        })
        .collect())
}

/// Parse one complete expression; trailing tokens are an error.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    let mut parser = TokenParser::new(tokens, source.len());
    let expr = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a statement line (and its nested block) of the Alex dialect.
pub fn parse_statement(line: &LogicalLine) -> Result<Stmt, ParseError> {
    let tokens = tokenize(&line.text).map_err(|err| locate(err, line))?;
    let mut parser = TokenParser::new(tokens, line.text.len());
    parser.parse_line(line).map_err(|err| locate(err, line))
}

pub fn parse_block(lines: &[LogicalLine]) -> Result<Vec<Stmt>, ParseError> {
    lines.iter().map(parse_statement).collect()
}

/// Deepest nesting of parentheses, brackets, calls, lambdas and prefix
/// operators one expression may contain.
pub const MAX_NESTING: usize = 64;

pub struct TokenParser {
    tokens: Vec<SpannedToken>,
    current: usize,
    source_len: usize,
    depth: usize,
}

impl TokenParser {
    pub fn new(tokens: Vec<SpannedToken>, source_len: usize) -> Self {
        Self {
            tokens,
            current: 0,
            source_len,
            depth: 0,
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|st| &st.token)
    }

    fn peek_token(&self, distance: usize) -> Option<&Token> {
        self.tokens.get(self.current + distance).map(|st| &st.token)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.current)
            .map(|st| st.span)
            .unwrap_or_else(|| Span::new(self.source_len, self.source_len))
    }

    fn at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        if self.current < self.tokens.len() {
            let st = self.tokens[self.current].clone();
            self.current += 1;
            Some(st)
        } else {
            None
        }
    }

    fn check(&self, expected: &Token) -> bool {
        matches!(self.current_token(), Some(token) if std::mem::discriminant(token) == std::mem::discriminant(expected))
    }

    fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        match self.current_token() {
            Some(token) if std::mem::discriminant(token) == std::mem::discriminant(&expected) => {
                let span = self.current_span();
                self.advance();
                Ok(span)
            }
            Some(token) => Err(ParseError::new("unexpected token", self.current_span())
                .with_expected(vec![expected.describe()])
                .with_found(token.describe())),
            None => Err(ParseError::new("unexpected end of input", self.current_span())
                .with_expected(vec![expected.describe()])
                .with_found("end of line")),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<Rc<str>, ParseError> {
        let span = self.current_span();
        match self.advance() {
            Some(SpannedToken { token: Token::Ident(name), .. }) => Ok(Rc::from(name.as_str())),
            Some(other) => Err(ParseError::new(format!("expected {}", what), other.span)
                .with_expected(vec![what.to_string()])
                .with_found(other.token.describe())),
            None => Err(ParseError::new(format!("expected {}", what), span)
                .with_expected(vec![what.to_string()])
                .with_found("end of line")),
        }
    }

    pub fn expect_end(&self) -> Result<(), ParseError> {
        match self.tokens.get(self.current) {
            None => Ok(()),
            Some(st) => Err(ParseError::new("unexpected trailing input", st.span)
                .with_expected(vec!["end of line".to_string()])
                .with_found(st.token.describe())),
        }
    }

    // ---- statements -------------------------------------------------------

    fn parse_line(&mut self, line: &LogicalLine) -> Result<Stmt, ParseError> {
        let stmt = match self.current_token() {
            Some(Token::If) => return self.parse_if_statement(line),
            Some(Token::While) => {
                self.advance();
                let condition = self.parse_expression()?;
                self.expect(Token::Colon)?;
                let body = self.parse_suite(line)?;
                Stmt::While { condition, body }
            }
            Some(Token::For) => {
                self.advance();
                let var = self.expect_ident("loop variable")?;
                self.expect(Token::In)?;
                let iterable = self.parse_expression()?;
                self.expect(Token::Colon)?;
                let body = self.parse_suite(line)?;
                Stmt::For { var, iterable, body }
            }
            Some(Token::Def) => {
                self.advance();
                let name = self.expect_ident("function name")?;
                self.expect(Token::LParen)?;
                let params = self.parse_params(Token::RParen)?;
                self.expect(Token::RParen)?;
                self.expect(Token::Colon)?;
                let body = self.parse_suite(line)?;
                Stmt::Function {
                    name,
                    params,
                    body: body.into(),
                }
            }
            Some(Token::Elif) | Some(Token::Else) => {
                return Err(ParseError::new("`elif`/`else` without a matching `if`", self.current_span()));
            }
            _ => {
                let stmt = self.parse_simple_statement()?;
                self.expect_end()?;
                reject_block(line)?;
                stmt
            }
        };

        self.expect_end()?;
        Ok(stmt)
    }

    fn parse_if_statement(&mut self, line: &LogicalLine) -> Result<Stmt, ParseError> {
        self.expect(Token::If)?;
        let condition = self.parse_expression()?;
        self.expect(Token::Colon)?;
        let then_branch = self.parse_suite(line)?;

        let else_branch = if self.check(&Token::Elif) || self.check(&Token::Else) {
            if let Some(extra) = line.alternatives.first() {
                return Err(ParseError::new("`else` already given on the `if` line", Span::default())
                    .at_line(extra.number));
            }
            self.parse_inline_else(line)?
        } else {
            self.expect_end()?;
            parse_alternatives(&line.alternatives)?
        };

        self.expect_end()?;
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `... else: stmt` or `... elif cond: stmt ...` on the header line.
    fn parse_inline_else(&mut self, line: &LogicalLine) -> Result<Option<Vec<Stmt>>, ParseError> {
        match self.current_token() {
            Some(Token::Else) => {
                self.advance();
                self.expect(Token::Colon)?;
                Ok(Some(self.parse_suite(line)?))
            }
            Some(Token::Elif) => {
                self.advance();
                let condition = self.parse_expression()?;
                self.expect(Token::Colon)?;
                let then_branch = self.parse_suite(line)?;
                let else_branch = self.parse_inline_else(line)?;
                Ok(Some(vec![Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                }]))
            }
            _ => Ok(None),
        }
    }

    /// The statements after a header's colon: inline `;`-separated simple
    /// statements, or the indented block below the header.
    fn parse_suite(&mut self, line: &LogicalLine) -> Result<Vec<Stmt>, ParseError> {
        if self.at_end() {
            if line.body.is_empty() {
                return Err(ParseError::new("expected an indented block after `:`", self.current_span())
                    .with_expected(vec!["statement".to_string()]));
            }
            return parse_block(&line.body);
        }

        let mut stmts = vec![self.parse_simple_statement()?];
        while self.check(&Token::Semicolon) {
            self.advance();
            if self.at_end() || self.check(&Token::Else) || self.check(&Token::Elif) {
                break;
            }
            stmts.push(self.parse_simple_statement()?);
        }

        reject_block(line)?;
        Ok(stmts)
    }

    /// Remainder of an `elif cond: ...` line after the keyword.
    fn parse_elif(&mut self, line: &LogicalLine) -> Result<(Expr, Vec<Stmt>), ParseError> {
        let condition = self.parse_expression()?;
        self.expect(Token::Colon)?;
        let then_branch = self.parse_suite(line)?;
        self.expect_end()?;
        Ok((condition, then_branch))
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current_token() {
            Some(Token::Pass) => {
                self.advance();
                Ok(Stmt::Pass)
            }
            Some(Token::Break) => {
                self.advance();
                Ok(Stmt::Break)
            }
            Some(Token::Continue) => {
                self.advance();
                Ok(Stmt::Continue)
            }
            Some(Token::Return) => {
                self.advance();
                if self.at_end()
                    || self.check(&Token::Semicolon)
                    || self.check(&Token::Else)
                    || self.check(&Token::Elif)
                {
                    Ok(Stmt::Return(None))
                } else {
                    Ok(Stmt::Return(Some(self.parse_expression()?)))
                }
            }
            Some(Token::If) | Some(Token::While) | Some(Token::For) | Some(Token::Def) => Err(ParseError::new(
                "compound statements need their own line",
                self.current_span(),
            )),
            Some(Token::Ident(word))
                if word == "set"
                    && matches!(self.peek_token(1), Some(Token::Ident(_)))
                    && matches!(self.peek_token(2), Some(Token::Assign)) =>
            {
                self.advance();
                self.parse_assignment_or_expression()
            }
            Some(Token::Ident(word))
                if word == "print" && !matches!(self.peek_token(1), None | Some(Token::Assign)) =>
            {
                self.advance();
                Ok(Stmt::Print(self.parse_expression()?))
            }
            _ => self.parse_assignment_or_expression(),
        }
    }

    fn parse_assignment_or_expression(&mut self) -> Result<Stmt, ParseError> {
        if let (Some(Token::Ident(name)), Some(Token::Assign)) = (self.current_token(), self.peek_token(1)) {
            let name: Rc<str> = Rc::from(name.as_str());
            self.advance();
            self.advance();
            let value = self.parse_expression()?;
            return Ok(Stmt::Assign { name, value });
        }
        Ok(Stmt::Expr(self.parse_expression()?))
    }

    fn parse_params(&mut self, closing: Token) -> Result<Vec<Rc<str>>, ParseError> {
        let mut params = Vec::new();
        if self.check(&closing) {
            return Ok(params);
        }
        loop {
            let name = self.expect_ident("parameter name")?;
            if params.contains(&name) {
                return Err(ParseError::new(format!("duplicate parameter `{}`", name), self.previous_span()));
            }
            params.push(name);
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(params)
    }

    fn previous_span(&self) -> Span {
        if self.current > 0 {
            self.tokens[self.current - 1].span
        } else {
            Span::new(0, 0)
        }
    }

    // ---- expressions ------------------------------------------------------

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_expr(1)
    }

    fn token_to_binary_operator(token: &Token) -> Option<(u8, BinaryOp)> {
        match token {
            Token::Or => Some((1, BinaryOp::Or)),
            Token::And => Some((2, BinaryOp::And)),
            Token::Eq => Some((3, BinaryOp::Eq)),
            Token::NotEq => Some((3, BinaryOp::NotEq)),
            Token::Greater => Some((4, BinaryOp::Greater)),
            Token::Less => Some((4, BinaryOp::Less)),
            Token::GreaterEq => Some((4, BinaryOp::GreaterEq)),
            Token::LessEq => Some((4, BinaryOp::LessEq)),
            Token::Plus => Some((5, BinaryOp::Add)),
            Token::Minus => Some((5, BinaryOp::Sub)),
            Token::Star => Some((6, BinaryOp::Mul)),
            Token::Slash => Some((6, BinaryOp::Div)),
            Token::Percent => Some((6, BinaryOp::Mod)),
            _ => None,
        }
    }

    fn parse_binary_expr(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.current_token() {
            let (precedence, operator) = match Self::token_to_binary_operator(token) {
                Some((prec, op)) if prec >= min_precedence => (prec, op),
                _ => break,
            };
            self.advance();
            let right = self.parse_binary_expr(precedence + 1)?;
            let span = left.span.merge(right.span);
            left = Expr {
                kind: ExprKind::Binary {
                    left: Box::new(left),
                    op: operator,
                    right: Box::new(right),
                },
                span,
            };
        }

        Ok(left)
    }

    // Every nested sub-expression passes through here.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new("expression nested too deeply", self.current_span()));
        }
        self.depth += 1;
        let result = self.parse_prefixed();
        self.depth -= 1;
        result
    }

    fn parse_prefixed(&mut self) -> Result<Expr, ParseError> {
        let start_span = self.current_span();
        let op = match self.current_token() {
            Some(Token::Not) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let expr = self.parse_unary()?;
        let span = start_span.merge(expr.span);
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                expr: Box::new(expr),
            },
            span,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_token() {
                Some(Token::LParen) => {
                    self.advance();
                    let args = self.parse_comma_list(Token::RParen)?;
                    let end_span = self.expect(Token::RParen)?;
                    let span = expr.span.merge(end_span);
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    };
                }
                Some(Token::LBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end_span = self.expect(Token::RBracket)?;
                    let span = expr.span.merge(end_span);
                    expr = Expr {
                        kind: ExprKind::Index {
                            target: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Comma-separated expressions up to (not including) `closing`. A trailing
    /// comma is allowed.
    fn parse_comma_list(&mut self, closing: Token) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        while !self.check(&closing) {
            items.push(self.parse_expression()?);
            if self.check(&Token::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let (token, span) = match self.advance() {
            Some(SpannedToken { token, span }) => (token, span),
            None => {
                return Err(ParseError::new(
                    "unexpected end of input",
                    Span::new(self.source_len, self.source_len),
                )
                .with_expected(vec!["expression".to_string()])
                .with_found("end of line"));
            }
        };

        let literal = |value: Value| Ok(Expr { kind: ExprKind::Literal(value), span });

        match token {
            Token::Number(n) => literal(Value::Number(n)),
            Token::String(s) => literal(Value::string(s)),
            Token::True => literal(Value::Bool(true)),
            Token::False => literal(Value::Bool(false)),
            Token::None => literal(Value::None),
            Token::Ident(name) => Ok(Expr {
                kind: ExprKind::Identifier(Rc::from(name.as_str())),
                span,
            }),
            Token::LParen => {
                let inner = self.parse_expression()?;
                let end_span = self.expect(Token::RParen)?;
                Ok(Expr {
                    kind: ExprKind::Grouped(Box::new(inner)),
                    span: span.merge(end_span),
                })
            }
            Token::LBracket => {
                let elements = self.parse_comma_list(Token::RBracket)?;
                let end_span = self.expect(Token::RBracket)?;
                Ok(Expr {
                    kind: ExprKind::List { elements },
                    span: span.merge(end_span),
                })
            }
            Token::Fn => {
                self.expect(Token::LParen)?;
                let params = self.parse_params(Token::RParen)?;
                self.expect(Token::RParen)?;
                self.expect(Token::Arrow)?;
                self.finish_lambda(params, span)
            }
            Token::Lambda => {
                let params = self.parse_params(Token::Colon)?;
                self.expect(Token::Colon)?;
                self.finish_lambda(params, span)
            }
            other => Err(ParseError::new("expected expression", span)
                .with_expected(vec!["expression".to_string()])
                .with_found(other.describe())),
        }
    }

    fn finish_lambda(&mut self, params: Vec<Rc<str>>, start: Span) -> Result<Expr, ParseError> {
        let body = self.parse_expression()?;
        let span = start.merge(body.span);
        Ok(Expr {
            kind: ExprKind::Lambda {
                params,
                body: Rc::new(body),
            },
            span,
        })
    }
}

fn reject_block(line: &LogicalLine) -> Result<(), ParseError> {
    match line.body.first() {
        Some(nested) => Err(ParseError::new("unexpected indented block", Span::new(0, nested.text.len()))
            .offset_by(nested.offset)
            .at_line(nested.number)),
        None => Ok(()),
    }
}

/// Build the `else` branch from `elif` / `else` lines that follow an `if`.
fn parse_alternatives(alternatives: &[LogicalLine]) -> Result<Option<Vec<Stmt>>, ParseError> {
    let Some((first, rest)) = alternatives.split_first() else {
        return Ok(None);
    };

    let tokens = tokenize(&first.text).map_err(|err| locate(err, first))?;
    let mut parser = TokenParser::new(tokens, first.text.len());

    let branch = match parser.current_token() {
        Some(Token::Else) => {
            parser.advance();
            parser.expect(Token::Colon).map_err(|err| locate(err, first))?;
            let body = parser.parse_suite(first).map_err(|err| locate(err, first))?;
            parser.expect_end().map_err(|err| locate(err, first))?;
            if let Some(extra) = rest.first() {
                return Err(ParseError::new("nothing may follow `else`", Span::new(0, extra.text.len()))
                    .offset_by(extra.offset)
                    .at_line(extra.number));
            }
            body
        }
        Some(Token::Elif) => {
            parser.advance();
            let (condition, then_branch) = parser.parse_elif(first).map_err(|err| locate(err, first))?;
            vec![Stmt::If {
                condition,
                then_branch,
                else_branch: parse_alternatives(rest)?,
            }]
        }
        _ => {
            return Err(locate(
                ParseError::new("expected `elif` or `else`", Span::new(0, first.text.len())),
                first,
            ))
        }
    };

    Ok(Some(branch))
}
