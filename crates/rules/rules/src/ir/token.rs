use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Numeric comparison operators usable inside a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Equal, within the engine's equality tolerance.
    Eq,
    /// Not equal, within the engine's equality tolerance.
    Ne,
}

impl Comparator {
    /// Source form of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }

    /// Apply the comparison to two readings.
    ///
    /// Ordering comparisons follow IEEE-754 exactly. `Eq` and `Ne` treat two
    /// values as equal when `|lhs - rhs| <= tolerance * max(1, |lhs|, |rhs|)`.
    /// A NaN operand is unequal to everything, so only `Ne` holds for it.
    pub fn apply(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => approx_eq(lhs, rhs, tolerance),
            Self::Ne => !approx_eq(lhs, rhs, tolerance),
        }
    }
}

#[allow(clippy::float_cmp)]
fn approx_eq(lhs: f64, rhs: f64, tolerance: f64) -> bool {
    if lhs == rhs {
        return true;
    }
    if !lhs.is_finite() || !rhs.is_finite() {
        return false;
    }
    let scale = 1.0_f64.max(lhs.abs()).max(rhs.abs());
    (lhs - rhs).abs() <= tolerance * scale
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Logical connectives joining clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Conjunction (`AND`, `&&`).
    And,
    /// Disjunction (`OR`, `||`).
    Or,
    /// Negation (`NOT`, `!`).
    Not,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
            Self::Not => f.write_str("NOT"),
        }
    }
}

/// A single lexical token of a rule expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
    /// A variable (sensor) name, or a keyword recognised by a clause shape.
    Identifier(String),
    /// A numeric literal.
    Number(f64),
    /// A comparison operator.
    Comparator(Comparator),
    /// A logical connective.
    LogicalOp(LogicalOp),
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
}

impl Token {
    /// Returns `true` for tokens that can appear inside an atomic clause.
    pub fn is_clause_content(&self) -> bool {
        matches!(
            self,
            Self::Identifier(_) | Self::Number(_) | Self::Comparator(_)
        )
    }

    /// Render a clause's tokens back to source form, space separated.
    pub fn render(tokens: &[Self]) -> String {
        tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(name) => f.write_str(name),
            Self::Number(n) => write!(f, "{n}"),
            Self::Comparator(op) => write!(f, "{op}"),
            Self::LogicalOp(op) => write!(f, "{op}"),
            Self::LeftParen => f.write_str("("),
            Self::RightParen => f.write_str(")"),
        }
    }
}

/// Byte range of a token within the rule text.
pub type Span = Range<usize>;

/// A token together with the bytes it was lexed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Where it came from.
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_comparisons_are_strict_ieee() {
        assert!(Comparator::Gt.apply(39.2, 38.5, 1e-9));
        assert!(!Comparator::Gt.apply(38.5, 38.5, 1e-9));
        assert!(Comparator::Ge.apply(38.5, 38.5, 1e-9));
        assert!(Comparator::Lt.apply(-1.0, 0.0, 1e-9));
        assert!(Comparator::Le.apply(0.0, -0.0, 1e-9));
    }

    #[test]
    fn equality_uses_tolerance() {
        assert!(Comparator::Eq.apply(0.1 + 0.2, 0.3, 1e-9));
        assert!(!Comparator::Ne.apply(0.1 + 0.2, 0.3, 1e-9));
        assert!(!Comparator::Eq.apply(1.0, 1.001, 1e-9));
        assert!(Comparator::Eq.apply(1.0, 1.001, 1e-2));
    }

    #[test]
    fn equality_tolerance_scales_with_magnitude() {
        assert!(Comparator::Eq.apply(1.0e12, 1.0e12 + 1.0, 1e-9));
        assert!(!Comparator::Eq.apply(1.0e3, 1.0e3 + 1.0, 1e-9));
    }

    #[test]
    fn nan_is_only_unequal() {
        let nan = f64::NAN;
        for op in [
            Comparator::Lt,
            Comparator::Le,
            Comparator::Gt,
            Comparator::Ge,
            Comparator::Eq,
        ] {
            assert!(!op.apply(nan, 1.0, 1e-9), "{op} should be false for NaN");
        }
        assert!(Comparator::Ne.apply(nan, nan, 1e-9));
    }

    #[test]
    fn infinities_compare_equal_to_themselves() {
        assert!(Comparator::Eq.apply(f64::INFINITY, f64::INFINITY, 1e-9));
        assert!(!Comparator::Eq.apply(f64::INFINITY, f64::NEG_INFINITY, 1e-9));
    }

    #[test]
    fn render_joins_tokens() {
        let tokens = vec![
            Token::Identifier("temp".into()),
            Token::Comparator(Comparator::Ge),
            Token::Number(36.5),
            Token::LogicalOp(LogicalOp::And),
            Token::Comparator(Comparator::Le),
            Token::Number(39.5),
        ];
        assert_eq!(Token::render(&tokens), "temp >= 36.5 AND <= 39.5");
    }
}
