//! Declarative clause shapes.
//!
//! A shape is the ordered list of token expectations that identifies a
//! condition type. The classifier matches whole clauses against shapes, the
//! parser uses shape prefixes to tell an incomplete clause from an unknown
//! one, and matchers destructure exactly the tokens their shape admits.

use std::borrow::Cow;
use std::fmt;

use crate::ir::token::{LogicalOp, Token};

/// One position of a clause shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeElement {
    /// Any identifier.
    Identifier,
    /// Any numeric literal.
    Number,
    /// Any comparator.
    Comparator,
    /// A clause-internal `AND`, as in `temp >= 36.5 AND <= 39.5`.
    And,
    /// An identifier spelled exactly like the keyword, ignoring ASCII case.
    Keyword(Cow<'static, str>),
}

impl ShapeElement {
    /// Build a keyword element.
    pub fn keyword(word: impl Into<Cow<'static, str>>) -> Self {
        Self::Keyword(word.into())
    }

    /// Does `token` satisfy this element?
    pub fn accepts(&self, token: &Token) -> bool {
        match (self, token) {
            (Self::Identifier, Token::Identifier(_))
            | (Self::Number, Token::Number(_))
            | (Self::Comparator, Token::Comparator(_))
            | (Self::And, Token::LogicalOp(LogicalOp::And)) => true,
            (Self::Keyword(word), Token::Identifier(name)) => name.eq_ignore_ascii_case(word),
            _ => false,
        }
    }

    /// Token kind this element accepts. Keywords are identifiers.
    pub(crate) fn kind(&self) -> TokenKind {
        match self {
            Self::Identifier | Self::Keyword(_) => TokenKind::Identifier,
            Self::Number => TokenKind::Number,
            Self::Comparator => TokenKind::Comparator,
            Self::And => TokenKind::And,
        }
    }
}

impl fmt::Display for ShapeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier => f.write_str("<identifier>"),
            Self::Number => f.write_str("<number>"),
            Self::Comparator => f.write_str("<comparator>"),
            Self::And => f.write_str("AND"),
            Self::Keyword(word) => f.write_str(&word.to_ascii_uppercase()),
        }
    }
}

/// Coarse token classes used to decide clause boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TokenKind {
    Identifier,
    Number,
    Comparator,
    And,
    Structural,
}

impl TokenKind {
    pub(crate) fn of(token: &Token) -> Self {
        match token {
            Token::Identifier(_) => Self::Identifier,
            Token::Number(_) => Self::Number,
            Token::Comparator(_) => Self::Comparator,
            Token::LogicalOp(LogicalOp::And) => Self::And,
            Token::LogicalOp(_) | Token::LeftParen | Token::RightParen => Self::Structural,
        }
    }
}

/// How a clause relates to a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeMatch {
    /// Every token matches and nothing is missing.
    Full,
    /// The clause matches the beginning of the shape but stops early.
    Prefix,
    /// The clause does not fit.
    None,
}

/// Ordered token expectations for one condition type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapePattern {
    elements: Vec<ShapeElement>,
}

impl ShapePattern {
    /// Create a shape from its elements.
    pub fn new(elements: impl IntoIterator<Item = ShapeElement>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }

    /// The shape's elements in order.
    pub fn elements(&self) -> &[ShapeElement] {
        &self.elements
    }

    /// Number of tokens a matching clause has.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the shape has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Compare a clause against this shape.
    pub fn match_tokens(&self, tokens: &[Token]) -> ShapeMatch {
        if tokens.len() > self.elements.len() {
            return ShapeMatch::None;
        }
        let fits = self
            .elements
            .iter()
            .zip(tokens)
            .all(|(element, token)| element.accepts(token));
        match (fits, tokens.len() == self.elements.len()) {
            (false, _) => ShapeMatch::None,
            (true, true) => ShapeMatch::Full,
            (true, false) => ShapeMatch::Prefix,
        }
    }

    /// Returns `true` if `tokens` is exactly this shape.
    pub fn matches(&self, tokens: &[Token]) -> bool {
        self.match_tokens(tokens) == ShapeMatch::Full
    }

    /// Reason the shape can never match a clause, if any.
    pub(crate) fn defect(&self) -> Option<&'static str> {
        match self.elements.first() {
            None => Some("shape has no elements"),
            Some(ShapeElement::And) => Some("shape cannot start with AND"),
            Some(_) if self.elements.last() == Some(&ShapeElement::And) => {
                Some("shape cannot end with AND")
            }
            Some(_) => None,
        }
    }
}

impl fmt::Display for ShapePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.elements.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" "))
    }
}
