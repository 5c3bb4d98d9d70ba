//! Condition matcher registry and clause classifier.
//!
//! Each condition type registers a [`ConditionMatcher`] together with the
//! [`ShapePattern`] that identifies its clauses. Classification walks the
//! shapes in registration order and the first full match wins, so two types
//! whose shapes overlap always resolve the same way.

pub mod builtins;
pub mod shape;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::table::InnerTable;
use crate::error::{EvaluationError, RegistryError};
use crate::ir::token::Token;
use shape::{ShapeMatch, ShapePattern, TokenKind};

/// Tag identifying a category of atomic clause, e.g. `"threshold"`.
pub type ConditionType = String;

/// Semantics of one condition type.
///
/// Implementations must be pure: resolve identifiers through the table,
/// never mutate it, and keep no reference to it after returning.
pub trait ConditionMatcher: Send + Sync {
    /// The dispatch tag this matcher is registered under.
    fn condition_type(&self) -> &str;

    /// The token shape of clauses this matcher interprets.
    fn shape(&self) -> ShapePattern;

    /// Evaluate a clause whose tokens match [`shape`](Self::shape).
    fn matches(&self, tokens: &[Token], table: &InnerTable) -> Result<bool, EvaluationError>;
}

/// Adapter registering a bare closure as a matcher.
pub(crate) struct FnMatcher<F> {
    pub(crate) condition_type: ConditionType,
    pub(crate) shape: ShapePattern,
    pub(crate) f: F,
}

impl<F> ConditionMatcher for FnMatcher<F>
where
    F: Fn(&[Token], &InnerTable) -> Result<bool, EvaluationError> + Send + Sync,
{
    fn condition_type(&self) -> &str {
        &self.condition_type
    }

    fn shape(&self) -> ShapePattern {
        self.shape.clone()
    }

    fn matches(&self, tokens: &[Token], table: &InnerTable) -> Result<bool, EvaluationError> {
        (self.f)(tokens, table)
    }
}

/// Mapping from condition type to matcher, plus the ordered shape list the
/// classifier consults.
///
/// Built once, then shared read-only (typically behind an `Arc`).
#[derive(Default)]
pub struct MatcherRegistry {
    shapes: Vec<(ConditionType, ShapePattern)>,
    matchers: HashMap<ConditionType, Arc<dyn ConditionMatcher>>,
    leading_kinds: HashSet<TokenKind>,
}

impl MatcherRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in condition types enabled by
    /// `config`, in their fixed order.
    pub fn builtin(config: &EngineConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for matcher in builtins::builtin_matchers(config.equality_tolerance) {
            if config.condition_enabled(matcher.condition_type()) {
                registry.register_shared(matcher)?;
            }
        }
        Ok(registry)
    }

    /// Register a matcher under its own condition type.
    pub fn register(
        &mut self,
        matcher: impl ConditionMatcher + 'static,
    ) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(matcher))
    }

    /// Register a closure as the matcher for `condition_type`.
    pub fn register_fn<F>(
        &mut self,
        condition_type: impl Into<ConditionType>,
        shape: ShapePattern,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&[Token], &InnerTable) -> Result<bool, EvaluationError> + Send + Sync + 'static,
    {
        self.register(FnMatcher {
            condition_type: condition_type.into(),
            shape,
            f,
        })
    }

    /// Register an already shared matcher.
    ///
    /// Fails on a duplicate condition type or a shape that can never match;
    /// an existing entry is never replaced.
    pub fn register_shared(
        &mut self,
        matcher: Arc<dyn ConditionMatcher>,
    ) -> Result<(), RegistryError> {
        let condition_type = matcher.condition_type().to_owned();
        if self.matchers.contains_key(&condition_type) {
            return Err(RegistryError::DuplicateConditionType(condition_type));
        }

        let shape = matcher.shape();
        if let Some(reason) = shape.defect() {
            return Err(RegistryError::InvalidShape {
                condition_type,
                reason: reason.to_owned(),
            });
        }

        debug!(condition_type = %condition_type, shape = %shape, "registered condition matcher");
        if let Some(first) = shape.elements().first() {
            self.leading_kinds.insert(first.kind());
        }
        self.shapes.push((condition_type.clone(), shape));
        self.matchers.insert(condition_type, matcher);
        Ok(())
    }

    /// Look up the matcher for a condition type.
    pub fn lookup(&self, condition_type: &str) -> Result<&Arc<dyn ConditionMatcher>, EvaluationError> {
        self.matchers
            .get(condition_type)
            .ok_or_else(|| EvaluationError::UnknownConditionType(condition_type.to_owned()))
    }

    /// Classify an atomic clause by its token shape.
    ///
    /// Shapes are tried in registration order; the first full match wins.
    pub fn classify(&self, clause: &[Token]) -> Result<&str, EvaluationError> {
        self.shapes
            .iter()
            .find(|(_, shape)| shape.matches(clause))
            .map(|(condition_type, _)| condition_type.as_str())
            .ok_or_else(|| EvaluationError::UnclassifiableClause {
                clause: Token::render(clause),
            })
    }

    /// Returns the first condition type whose shape `clause` is a strict
    /// prefix of, meaning the clause stops before its shape is complete.
    pub fn incomplete_match(&self, clause: &[Token]) -> Option<&str> {
        self.shapes
            .iter()
            .find(|(_, shape)| shape.match_tokens(clause) == ShapeMatch::Prefix)
            .map(|(condition_type, _)| condition_type.as_str())
    }

    /// Can `token` be the first token of some registered clause shape?
    pub(crate) fn opens_clause(&self, token: &Token) -> bool {
        self.leading_kinds.contains(&TokenKind::of(token))
    }

    /// The shape registered for a condition type.
    pub fn shape(&self, condition_type: &str) -> Option<&ShapePattern> {
        self.shapes
            .iter()
            .find(|(ct, _)| ct == condition_type)
            .map(|(_, shape)| shape)
    }

    /// Registered condition types in registration order.
    pub fn condition_types(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|(ct, _)| ct.as_str())
    }

    /// Number of registered condition types.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.shapes
                    .iter()
                    .map(|(ct, shape)| format!("{ct}: {shape}")),
            )
            .finish()
    }
}
