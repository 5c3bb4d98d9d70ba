//! Built-in condition types.
//!
//! | Type             | Example                                  |
//! |------------------|------------------------------------------|
//! | `threshold`      | `temp > 38.5`                            |
//! | `range`          | `temp >= 36.5 AND <= 39.5`               |
//! | `compare`        | `temp > ambient`                         |
//! | `delta`          | `DELTA temp temp_prev > 1.5`             |
//! | `rate-of-change` | `RATE weight weight_prev elapsed < -0.2` |

use std::sync::Arc;

use crate::engine::table::{InnerTable, lookup};
use crate::error::EvaluationError;
use crate::ir::token::{LogicalOp, Token};
use crate::registry::ConditionMatcher;
use crate::registry::shape::{ShapeElement, ShapePattern};

/// `threshold` condition type tag.
pub const THRESHOLD: &str = "threshold";
/// `range` condition type tag.
pub const RANGE: &str = "range";
/// `compare` condition type tag.
pub const COMPARE: &str = "compare";
/// `delta` condition type tag.
pub const DELTA: &str = "delta";
/// `rate-of-change` condition type tag.
pub const RATE_OF_CHANGE: &str = "rate-of-change";

/// Every built-in tag, in registration order.
pub const BUILTIN_CONDITIONS: [&str; 5] = [THRESHOLD, RANGE, COMPARE, DELTA, RATE_OF_CHANGE];

/// Instantiate all built-in matchers in registration order.
pub fn builtin_matchers(tolerance: f64) -> Vec<Arc<dyn ConditionMatcher>> {
    vec![
        Arc::new(Threshold { tolerance }),
        Arc::new(Range { tolerance }),
        Arc::new(Compare { tolerance }),
        Arc::new(Delta { tolerance }),
        Arc::new(RateOfChange { tolerance }),
    ]
}

fn malformed(condition_type: &str, tokens: &[Token]) -> EvaluationError {
    EvaluationError::MalformedClause {
        condition_type: condition_type.to_owned(),
        reason: format!("unexpected tokens `{}`", Token::render(tokens)),
    }
}

/// `<identifier> <comparator> <number>`: a reading against a literal.
#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    /// Equality tolerance for `==` and `!=`.
    pub tolerance: f64,
}

impl ConditionMatcher for Threshold {
    fn condition_type(&self) -> &str {
        THRESHOLD
    }

    fn shape(&self) -> ShapePattern {
        ShapePattern::new([
            ShapeElement::Identifier,
            ShapeElement::Comparator,
            ShapeElement::Number,
        ])
    }

    fn matches(&self, tokens: &[Token], table: &InnerTable) -> Result<bool, EvaluationError> {
        let [Token::Identifier(name), Token::Comparator(op), Token::Number(limit)] = tokens else {
            return Err(malformed(THRESHOLD, tokens));
        };
        let value = lookup(table, name)?;
        Ok(op.apply(value, *limit, self.tolerance))
    }
}

/// `<identifier> <comparator> <number> AND <comparator> <number>`: both
/// bounds hold for the same reading.
#[derive(Debug, Clone, Copy)]
pub struct Range {
    /// Equality tolerance for `==` and `!=`.
    pub tolerance: f64,
}

impl ConditionMatcher for Range {
    fn condition_type(&self) -> &str {
        RANGE
    }

    fn shape(&self) -> ShapePattern {
        ShapePattern::new([
            ShapeElement::Identifier,
            ShapeElement::Comparator,
            ShapeElement::Number,
            ShapeElement::And,
            ShapeElement::Comparator,
            ShapeElement::Number,
        ])
    }

    fn matches(&self, tokens: &[Token], table: &InnerTable) -> Result<bool, EvaluationError> {
        let [
            Token::Identifier(name),
            Token::Comparator(low_op),
            Token::Number(low),
            Token::LogicalOp(LogicalOp::And),
            Token::Comparator(high_op),
            Token::Number(high),
        ] = tokens
        else {
            return Err(malformed(RANGE, tokens));
        };
        let value = lookup(table, name)?;
        Ok(low_op.apply(value, *low, self.tolerance) && high_op.apply(value, *high, self.tolerance))
    }
}

/// `<identifier> <comparator> <identifier>`: one reading against another.
#[derive(Debug, Clone, Copy)]
pub struct Compare {
    /// Equality tolerance for `==` and `!=`.
    pub tolerance: f64,
}

impl ConditionMatcher for Compare {
    fn condition_type(&self) -> &str {
        COMPARE
    }

    fn shape(&self) -> ShapePattern {
        ShapePattern::new([
            ShapeElement::Identifier,
            ShapeElement::Comparator,
            ShapeElement::Identifier,
        ])
    }

    fn matches(&self, tokens: &[Token], table: &InnerTable) -> Result<bool, EvaluationError> {
        let [Token::Identifier(lhs), Token::Comparator(op), Token::Identifier(rhs)] = tokens else {
            return Err(malformed(COMPARE, tokens));
        };
        let lhs = lookup(table, lhs)?;
        let rhs = lookup(table, rhs)?;
        Ok(op.apply(lhs, rhs, self.tolerance))
    }
}

/// `DELTA <current> <previous> <comparator> <number>`: the signed change
/// `current - previous` against a literal.
#[derive(Debug, Clone, Copy)]
pub struct Delta {
    /// Equality tolerance for `==` and `!=`.
    pub tolerance: f64,
}

impl ConditionMatcher for Delta {
    fn condition_type(&self) -> &str {
        DELTA
    }

    fn shape(&self) -> ShapePattern {
        ShapePattern::new([
            ShapeElement::keyword("DELTA"),
            ShapeElement::Identifier,
            ShapeElement::Identifier,
            ShapeElement::Comparator,
            ShapeElement::Number,
        ])
    }

    fn matches(&self, tokens: &[Token], table: &InnerTable) -> Result<bool, EvaluationError> {
        let [
            Token::Identifier(_),
            Token::Identifier(current),
            Token::Identifier(previous),
            Token::Comparator(op),
            Token::Number(limit),
        ] = tokens
        else {
            return Err(malformed(DELTA, tokens));
        };
        let change = lookup(table, current)? - lookup(table, previous)?;
        Ok(op.apply(change, *limit, self.tolerance))
    }
}

/// `RATE <current> <previous> <interval> <comparator> <number>`: change per
/// unit of `interval` against a literal.
///
/// The interval reading must be positive and finite.
#[derive(Debug, Clone, Copy)]
pub struct RateOfChange {
    /// Equality tolerance for `==` and `!=`.
    pub tolerance: f64,
}

impl ConditionMatcher for RateOfChange {
    fn condition_type(&self) -> &str {
        RATE_OF_CHANGE
    }

    fn shape(&self) -> ShapePattern {
        ShapePattern::new([
            ShapeElement::keyword("RATE"),
            ShapeElement::Identifier,
            ShapeElement::Identifier,
            ShapeElement::Identifier,
            ShapeElement::Comparator,
            ShapeElement::Number,
        ])
    }

    fn matches(&self, tokens: &[Token], table: &InnerTable) -> Result<bool, EvaluationError> {
        let [
            Token::Identifier(_),
            Token::Identifier(current),
            Token::Identifier(previous),
            Token::Identifier(interval),
            Token::Comparator(op),
            Token::Number(limit),
        ] = tokens
        else {
            return Err(malformed(RATE_OF_CHANGE, tokens));
        };
        let elapsed = lookup(table, interval)?;
        if !(elapsed.is_finite() && elapsed > 0.0) {
            return Err(EvaluationError::InvalidReading {
                name: interval.clone(),
                reason: format!("interval must be positive and finite, got {elapsed}"),
            });
        }
        let rate = (lookup(table, current)? - lookup(table, previous)?) / elapsed;
        Ok(op.apply(rate, *limit, self.tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::token::Comparator;

    const TOL: f64 = 1e-9;

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_owned())
    }

    fn table(pairs: &[(&str, f64)]) -> InnerTable {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
    }

    #[test]
    fn shapes_accept_their_own_examples() {
        let examples: [(&dyn ConditionMatcher, Vec<Token>); 2] = [
            (
                &Threshold { tolerance: TOL },
                vec![ident("temp"), Token::Comparator(Comparator::Gt), Token::Number(1.0)],
            ),
            (
                &Compare { tolerance: TOL },
                vec![ident("a"), Token::Comparator(Comparator::Lt), ident("b")],
            ),
        ];
        for (matcher, tokens) in examples {
            assert!(matcher.shape().matches(&tokens), "{}", matcher.condition_type());
        }
    }

    #[test]
    fn threshold_compares_against_literal() {
        let m = Threshold { tolerance: TOL };
        let tokens = vec![ident("temp"), Token::Comparator(Comparator::Gt), Token::Number(38.5)];
        assert!(m.matches(&tokens, &table(&[("temp", 39.2)])).unwrap());
        assert!(!m.matches(&tokens, &table(&[("temp", 37.0)])).unwrap());
    }

    #[test]
    fn threshold_unbound_variable() {
        let m = Threshold { tolerance: TOL };
        let tokens = vec![ident("temp"), Token::Comparator(Comparator::Gt), Token::Number(38.5)];
        assert_eq!(
            m.matches(&tokens, &table(&[])).unwrap_err(),
            EvaluationError::UnboundVariable("temp".into())
        );
    }

    #[test]
    fn threshold_equality_within_tolerance() {
        let m = Threshold { tolerance: 1e-6 };
        let tokens = vec![ident("ph"), Token::Comparator(Comparator::Eq), Token::Number(7.0)];
        assert!(m.matches(&tokens, &table(&[("ph", 7.000_000_1)])).unwrap());
        assert!(!m.matches(&tokens, &table(&[("ph", 7.01)])).unwrap());
    }

    #[test]
    fn threshold_rejects_foreign_tokens() {
        let m = Threshold { tolerance: TOL };
        let tokens = vec![Token::Number(1.0)];
        assert!(matches!(
            m.matches(&tokens, &table(&[])),
            Err(EvaluationError::MalformedClause { .. })
        ));
    }

    #[test]
    fn range_requires_both_bounds() {
        let m = Range { tolerance: TOL };
        let tokens = vec![
            ident("temp"),
            Token::Comparator(Comparator::Ge),
            Token::Number(36.5),
            Token::LogicalOp(LogicalOp::And),
            Token::Comparator(Comparator::Le),
            Token::Number(39.5),
        ];
        assert!(m.matches(&tokens, &table(&[("temp", 38.0)])).unwrap());
        assert!(m.matches(&tokens, &table(&[("temp", 36.5)])).unwrap());
        assert!(!m.matches(&tokens, &table(&[("temp", 40.0)])).unwrap());
        assert!(!m.matches(&tokens, &table(&[("temp", 30.0)])).unwrap());
    }

    #[test]
    fn range_rejects_or_between_bounds() {
        let m = Range { tolerance: TOL };
        let tokens = vec![
            ident("temp"),
            Token::Comparator(Comparator::Ge),
            Token::Number(36.5),
            Token::LogicalOp(LogicalOp::Or),
            Token::Comparator(Comparator::Le),
            Token::Number(39.5),
        ];
        assert!(matches!(
            m.matches(&tokens, &table(&[("temp", 38.0)])),
            Err(EvaluationError::MalformedClause { .. })
        ));
    }

    #[test]
    fn compare_two_readings() {
        let m = Compare { tolerance: TOL };
        let tokens = vec![ident("temp"), Token::Comparator(Comparator::Gt), ident("ambient")];
        assert!(
            m.matches(&tokens, &table(&[("temp", 30.0), ("ambient", 22.0)]))
                .unwrap()
        );
        assert_eq!(
            m.matches(&tokens, &table(&[("temp", 30.0)])).unwrap_err(),
            EvaluationError::UnboundVariable("ambient".into())
        );
    }

    #[test]
    fn delta_is_signed_change() {
        let m = Delta { tolerance: TOL };
        let tokens = vec![
            ident("DELTA"),
            ident("temp"),
            ident("temp_prev"),
            Token::Comparator(Comparator::Gt),
            Token::Number(1.5),
        ];
        assert!(
            m.matches(&tokens, &table(&[("temp", 40.0), ("temp_prev", 38.0)]))
                .unwrap()
        );
        assert!(
            !m.matches(&tokens, &table(&[("temp", 36.0), ("temp_prev", 38.0)]))
                .unwrap()
        );
    }

    #[test]
    fn rate_divides_by_interval() {
        let m = RateOfChange { tolerance: TOL };
        let tokens = vec![
            ident("rate"),
            ident("weight"),
            ident("weight_prev"),
            ident("elapsed"),
            Token::Comparator(Comparator::Lt),
            Token::Number(-0.2),
        ];
        let readings = table(&[("weight", 480.0), ("weight_prev", 500.0), ("elapsed", 50.0)]);
        assert!(m.matches(&tokens, &readings).unwrap());

        let readings = table(&[("weight", 499.0), ("weight_prev", 500.0), ("elapsed", 50.0)]);
        assert!(!m.matches(&tokens, &readings).unwrap());
    }

    #[test]
    fn rate_rejects_non_positive_interval() {
        let m = RateOfChange { tolerance: TOL };
        let tokens = vec![
            ident("RATE"),
            ident("weight"),
            ident("weight_prev"),
            ident("elapsed"),
            Token::Comparator(Comparator::Lt),
            Token::Number(0.0),
        ];
        for elapsed in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let readings = table(&[("weight", 1.0), ("weight_prev", 2.0), ("elapsed", elapsed)]);
            assert!(
                matches!(
                    m.matches(&tokens, &readings),
                    Err(EvaluationError::InvalidReading { ref name, .. }) if name == "elapsed"
                ),
                "elapsed = {elapsed}"
            );
        }
    }

    #[test]
    fn builtin_tags_match_matchers() {
        let tags: Vec<String> = builtin_matchers(TOL)
            .iter()
            .map(|m| m.condition_type().to_owned())
            .collect();
        assert_eq!(tags, BUILTIN_CONDITIONS);
    }
}
