//! Single-pass lexer turning rule text into [`Spanned`] tokens.
//!
//! `nom` recognises each token; the driver loop tracks byte offsets so that
//! errors and spans refer to the original input.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, recognize},
    sequence::{pair, tuple},
};

use crate::error::{LexError, LexErrorKind};
use crate::ir::token::{Comparator, LogicalOp, Spanned, Token};

/// Lex a rule expression into tokens.
///
/// Whitespace is discarded. Multi-character operators are tried before their
/// single-character prefixes, so `>=` never lexes as `>` followed by `=`.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, LexError> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let start = input.len() - rest.len();
        let (after, token) = next_token(rest).map_err(|kind| LexError {
            offset: start,
            kind,
        })?;
        let end = input.len() - after.len();
        tokens.push(Spanned {
            token,
            span: start..end,
        });
        rest = after.trim_start();
    }

    Ok(tokens)
}

fn next_token(input: &str) -> Result<(&str, Token), LexErrorKind> {
    if let Ok((rest, token)) = alt((comparator, symbol))(input) {
        return Ok((rest, token));
    }

    if let Ok((rest, literal)) = number(input) {
        if rest
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(LexErrorKind::MalformedNumber);
        }
        let value = literal
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(LexErrorKind::MalformedNumber)?;
        return Ok((rest, Token::Number(value)));
    }

    if let Ok((rest, name)) = identifier(input) {
        return Ok((rest, keyword_or_identifier(name)));
    }

    // `input` is non-empty here, the driver loop guarantees it.
    let c = input.chars().next().unwrap_or_default();
    Err(LexErrorKind::UnrecognizedCharacter(c))
}

/// Comparison operators, longest first.
fn comparator(input: &str) -> IResult<&str, Token> {
    map(
        alt((
            map(tag("<="), |_| Comparator::Le),
            map(tag(">="), |_| Comparator::Ge),
            map(tag("=="), |_| Comparator::Eq),
            map(tag("!="), |_| Comparator::Ne),
            map(tag("<"), |_| Comparator::Lt),
            map(tag(">"), |_| Comparator::Gt),
        )),
        Token::Comparator,
    )(input)
}

/// Symbolic logical operators and grouping markers.
fn symbol(input: &str) -> IResult<&str, Token> {
    alt((
        map(tag("&&"), |_| Token::LogicalOp(LogicalOp::And)),
        map(tag("||"), |_| Token::LogicalOp(LogicalOp::Or)),
        map(char('!'), |_| Token::LogicalOp(LogicalOp::Not)),
        map(char('('), |_| Token::LeftParen),
        map(char(')'), |_| Token::RightParen),
    ))(input)
}

/// `[+-]? digits ('.' digits)? ([eE] [+-]? digits)?`
fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), digit1)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn keyword_or_identifier(word: &str) -> Token {
    if word.eq_ignore_ascii_case("and") {
        Token::LogicalOp(LogicalOp::And)
    } else if word.eq_ignore_ascii_case("or") {
        Token::LogicalOp(LogicalOp::Or)
    } else if word.eq_ignore_ascii_case("not") {
        Token::LogicalOp(LogicalOp::Not)
    } else {
        Token::Identifier(word.to_owned())
    }
}
