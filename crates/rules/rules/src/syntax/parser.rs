//! Recursive descent over the token stream.
//!
//! ```text
//! Expr   := Term (OR Term)*
//! Term   := Factor (AND Factor)*
//! Factor := NOT Factor | '(' Expr ')' | Clause
//! ```
//!
//! Every clause is classified and its matcher resolved while parsing, so a
//! rule that compiles can only fail at evaluation time on table contents.

use std::sync::Arc;

use tracing::trace;

use crate::error::EvaluationError;
use crate::ir::expr::{Clause, Expr};
use crate::ir::token::{LogicalOp, Spanned, Token};
use crate::registry::MatcherRegistry;
use crate::syntax::lexer::tokenize;

/// Nesting limit for `NOT` and parentheses.
const MAX_DEPTH: usize = 128;

/// Lex, parse and classify `source` against `registry`.
pub fn compile(source: &str, registry: &MatcherRegistry) -> Result<Expr, EvaluationError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(EvaluationError::syntax(0, "empty expression"));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        end: source.len(),
        registry,
    };
    let expr = parser.parse_or()?;

    match parser.peek() {
        None => Ok(expr),
        Some(Spanned {
            token: Token::RightParen,
            span,
        }) => Err(EvaluationError::syntax(span.start, "unexpected ')'")),
        Some(Spanned { token, span }) => Err(EvaluationError::syntax(
            span.start,
            format!("unexpected `{token}` after complete expression"),
        )),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
    end: usize,
    registry: &'a MatcherRegistry,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    /// Offset of the next token, or the end of input.
    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |s| s.span.start)
    }

    fn parse_or(&mut self) -> Result<Expr, EvaluationError> {
        let mut operands = vec![self.parse_and()?];
        while self.peek_token() == Some(&Token::LogicalOp(LogicalOp::Or)) {
            self.advance();
            operands.push(self.parse_and()?);
        }
        Ok(fold(operands, Expr::Any))
    }

    fn parse_and(&mut self) -> Result<Expr, EvaluationError> {
        let mut operands = vec![self.parse_factor()?];
        while self.peek_token() == Some(&Token::LogicalOp(LogicalOp::And)) {
            self.advance();
            operands.push(self.parse_factor()?);
        }
        Ok(fold(operands, Expr::All))
    }

    fn parse_factor(&mut self) -> Result<Expr, EvaluationError> {
        let Some(next) = self.peek() else {
            return Err(EvaluationError::syntax(
                self.end,
                "unexpected end of expression",
            ));
        };

        match &next.token {
            Token::LogicalOp(LogicalOp::Not) => {
                self.advance();
                let inner = self.nested(Self::parse_factor)?;
                Ok(Expr::Not(Box::new(inner)))
            }
            Token::LeftParen => {
                let open = next.span.start;
                self.advance();
                if self.peek_token() == Some(&Token::RightParen) {
                    return Err(EvaluationError::syntax(
                        self.offset(),
                        "empty parentheses",
                    ));
                }
                let inner = self.nested(Self::parse_or)?;
                match self.peek_token() {
                    Some(Token::RightParen) => {
                        self.advance();
                        Ok(inner)
                    }
                    Some(token) => Err(EvaluationError::syntax(
                        self.offset(),
                        format!("expected ')' to close '(' at byte {open}, found `{token}`"),
                    )),
                    None => Err(EvaluationError::syntax(
                        self.end,
                        format!("unclosed '(' at byte {open}"),
                    )),
                }
            }
            Token::RightParen => Err(EvaluationError::syntax(next.span.start, "unexpected ')'")),
            Token::LogicalOp(op) => Err(EvaluationError::syntax(
                next.span.start,
                format!("unexpected {op}, expected a clause"),
            )),
            Token::Identifier(_) | Token::Number(_) | Token::Comparator(_) => self.parse_clause(),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Expr, EvaluationError>,
    ) -> Result<Expr, EvaluationError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvaluationError::syntax(
                self.offset(),
                "expression nested too deeply",
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Consume the maximal clause starting at the current token.
    ///
    /// An `AND` stays inside the clause only when the token after it cannot
    /// start a clause of any registered shape.
    fn parse_clause(&mut self) -> Result<Expr, EvaluationError> {
        let start = self.pos;
        while let Some(spanned) = self.peek() {
            let token = &spanned.token;
            if token.is_clause_content() {
                self.advance();
                continue;
            }
            let internal_and = *token == Token::LogicalOp(LogicalOp::And)
                && self.tokens.get(self.pos + 1).is_some_and(|after| {
                    after.token.is_clause_content() && !self.registry.opens_clause(&after.token)
                });
            if !internal_and {
                break;
            }
            self.advance();
        }

        let slice = &self.tokens[start..self.pos];
        let span = match (slice.first(), slice.last()) {
            (Some(first), Some(last)) => first.span.start..last.span.end,
            _ => self.offset()..self.offset(),
        };
        let tokens: Vec<Token> = slice.iter().map(|s| s.token.clone()).collect();

        let condition_type = match self.registry.classify(&tokens) {
            Ok(condition_type) => condition_type,
            Err(err) => {
                return Err(match self.registry.incomplete_match(&tokens) {
                    Some(condition_type) => EvaluationError::syntax(
                        self.offset(),
                        format!(
                            "incomplete {condition_type} clause `{}`",
                            Token::render(&tokens)
                        ),
                    ),
                    None => err,
                });
            }
        };
        let matcher = Arc::clone(self.registry.lookup(condition_type)?);
        trace!(condition_type, clause = %Token::render(&tokens), "classified clause");

        Ok(Expr::Clause(Clause {
            condition_type: condition_type.to_owned(),
            tokens,
            span,
            matcher,
        }))
    }
}

fn fold(mut operands: Vec<Expr>, join: fn(Vec<Expr>) -> Expr) -> Expr {
    if operands.len() == 1 {
        operands.remove(0)
    } else {
        join(operands)
    }
}
