use tracing::trace;

use crate::engine::table::InnerTable;
use crate::error::EvaluationError;
use crate::ir::expr::Expr;

/// Evaluate a clause tree against a symbol table.
///
/// `All` stops at the first `false` operand and `Any` at the first `true`;
/// operands after that point are never evaluated, so they cannot fail.
pub fn eval(expr: &Expr, table: &InnerTable) -> Result<bool, EvaluationError> {
    match expr {
        Expr::Clause(clause) => {
            let verdict = clause.matcher.matches(&clause.tokens, table)?;
            trace!(
                condition_type = %clause.condition_type,
                clause = %clause.to_source(),
                verdict,
                "clause evaluated"
            );
            Ok(verdict)
        }

        Expr::Not(inner) => Ok(!eval(inner, table)?),

        Expr::All(exprs) => {
            for (i, e) in exprs.iter().enumerate() {
                if !eval(e, table)? {
                    trace!(skipped = exprs.len() - i - 1, "AND short-circuited");
                    return Ok(false);
                }
            }
            Ok(true)
        }

        Expr::Any(exprs) => {
            for (i, e) in exprs.iter().enumerate() {
                if eval(e, table)? {
                    trace!(skipped = exprs.len() - i - 1, "OR short-circuited");
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}
