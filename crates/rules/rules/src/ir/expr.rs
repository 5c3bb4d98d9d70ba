use std::fmt;
use std::sync::Arc;

use crate::ir::token::{Span, Token};
use crate::registry::ConditionMatcher;

/// An atomic clause with its matcher already resolved.
#[derive(Clone)]
pub struct Clause {
    /// Condition type the classifier assigned.
    pub condition_type: String,
    /// The clause's tokens, exactly as the shape matched them.
    pub tokens: Vec<Token>,
    /// Byte range of the clause within the rule text.
    pub span: Span,
    /// Matcher registered for `condition_type`.
    pub matcher: Arc<dyn ConditionMatcher>,
}

impl Clause {
    /// The clause rendered back to source form.
    pub fn to_source(&self) -> String {
        Token::render(&self.tokens)
    }
}

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clause")
            .field("condition_type", &self.condition_type)
            .field("tokens", &self.tokens)
            .field("span", &self.span)
            .finish_non_exhaustive()
    }
}

/// The clause tree of a compiled rule.
///
/// `All` and `Any` hold two or more operands each and evaluate them left to
/// right with short-circuiting.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A single classified clause.
    Clause(Clause),
    /// Logical negation.
    Not(Box<Expr>),
    /// Every operand must hold (`AND`).
    All(Vec<Expr>),
    /// At least one operand must hold (`OR`).
    Any(Vec<Expr>),
}

impl Expr {
    /// Canonical source text. Re-compiling it yields an equivalent tree.
    pub fn to_source(&self) -> String {
        match self {
            Self::Clause(clause) => clause.to_source(),
            Self::Not(inner) => match inner.as_ref() {
                Self::All(_) | Self::Any(_) => format!("NOT ({})", inner.to_source()),
                _ => format!("NOT {}", inner.to_source()),
            },
            Self::All(exprs) => exprs
                .iter()
                .map(|e| match e {
                    Self::Any(_) => format!("({})", e.to_source()),
                    _ => e.to_source(),
                })
                .collect::<Vec<_>>()
                .join(" AND "),
            Self::Any(exprs) => exprs
                .iter()
                .map(Self::to_source)
                .collect::<Vec<_>>()
                .join(" OR "),
        }
    }

    /// Condition types of every clause, left to right.
    pub fn condition_types(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_condition_types(&mut out);
        out
    }

    fn collect_condition_types<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Clause(clause) => out.push(&clause.condition_type),
            Self::Not(inner) => inner.collect_condition_types(out),
            Self::All(exprs) | Self::Any(exprs) => {
                for expr in exprs {
                    expr.collect_condition_types(out);
                }
            }
        }
    }

    /// Number of clauses in the tree.
    pub fn clause_count(&self) -> usize {
        match self {
            Self::Clause(_) => 1,
            Self::Not(inner) => inner.clause_count(),
            Self::All(exprs) | Self::Any(exprs) => exprs.iter().map(Self::clause_count).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::ir::token::Comparator;
    use crate::registry::MatcherRegistry;

    fn clause(name: &str, op: Comparator, limit: f64) -> Expr {
        let registry = MatcherRegistry::builtin(&EngineConfig::default()).unwrap();
        Expr::Clause(Clause {
            condition_type: "threshold".into(),
            tokens: vec![
                Token::Identifier(name.into()),
                Token::Comparator(op),
                Token::Number(limit),
            ],
            span: 0..0,
            matcher: Arc::clone(registry.lookup("threshold").unwrap()),
        })
    }

    #[test]
    fn to_source_parenthesises_or_under_and() {
        let expr = Expr::All(vec![
            Expr::Any(vec![
                clause("a", Comparator::Gt, 1.0),
                clause("b", Comparator::Lt, 2.0),
            ]),
            clause("c", Comparator::Eq, 3.0),
        ]);
        assert_eq!(expr.to_source(), "(a > 1 OR b < 2) AND c == 3");
    }

    #[test]
    fn to_source_negation() {
        let expr = Expr::Not(Box::new(clause("a", Comparator::Ge, 0.5)));
        assert_eq!(expr.to_source(), "NOT a >= 0.5");

        let expr = Expr::Not(Box::new(Expr::All(vec![
            clause("a", Comparator::Gt, 1.0),
            clause("b", Comparator::Gt, 1.0),
        ])));
        assert_eq!(expr.to_source(), "NOT (a > 1 AND b > 1)");
    }

    #[test]
    fn condition_types_in_order() {
        let expr = Expr::Any(vec![
            clause("a", Comparator::Gt, 1.0),
            Expr::Not(Box::new(clause("b", Comparator::Gt, 1.0))),
        ]);
        assert_eq!(expr.condition_types(), vec!["threshold", "threshold"]);
        assert_eq!(expr.clause_count(), 2);
    }

    #[test]
    fn clause_debug_omits_matcher() {
        let Expr::Clause(c) = clause("temp", Comparator::Gt, 38.5) else {
            unreachable!()
        };
        let debug = format!("{c:?}");
        assert!(debug.contains("threshold"));
        assert!(!debug.contains("matcher"));
    }
}
