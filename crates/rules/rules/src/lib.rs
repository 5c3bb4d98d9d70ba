//! Rule condition matching engine.
//!
//! Rules are short boolean expressions such as `temp > 38.5 AND humidity < 60`
//! evaluated against an [`InnerTable`] of numeric readings. Each atomic clause
//! is classified by its token shape and dispatched to the
//! [`ConditionMatcher`] registered for that shape, so new condition types can
//! be added without touching the evaluator.

pub mod config;
pub mod engine;
pub mod error;
pub mod ir;
pub mod registry;
pub mod syntax;

pub use config::EngineConfig;
pub use engine::global::{evaluate, global, init_global, register_matcher, register_matcher_fn};
pub use engine::table::{InnerTable, lookup};
pub use engine::{CompiledRule, RuleEngine};
pub use error::{ConfigError, EvaluationError, LexError, LexErrorKind, RegistryError};
pub use ir::expr::{Clause, Expr};
pub use ir::rule::{Rule, RuleOutcome, RuleSet};
pub use ir::token::{Comparator, LogicalOp, Span, Spanned, Token};
pub use registry::shape::{ShapeElement, ShapePattern};
pub use registry::{ConditionMatcher, ConditionType, MatcherRegistry};
