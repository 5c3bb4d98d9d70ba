//! Process-wide engine behind [`evaluate`].
//!
//! Custom matchers are registered with [`register_matcher`] during start-up.
//! The first call to [`evaluate`] (or [`init_global`]) freezes the registry:
//! built-ins first, then custom matchers in registration order. From then on
//! the engine is read without locking and registration fails with
//! [`RegistryError::Frozen`].

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::executor::RuleEngine;
use crate::engine::table::InnerTable;
use crate::error::{EvaluationError, RegistryError};
use crate::ir::token::Token;
use crate::registry::builtins::BUILTIN_CONDITIONS;
use crate::registry::shape::ShapePattern;
use crate::registry::{ConditionMatcher, ConditionType, FnMatcher, MatcherRegistry};

struct Pending {
    frozen: bool,
    matchers: Vec<Arc<dyn ConditionMatcher>>,
}

static PENDING: Mutex<Pending> = Mutex::new(Pending {
    frozen: false,
    matchers: Vec::new(),
});

static GLOBAL: OnceLock<RuleEngine> = OnceLock::new();

/// Queue a custom matcher for the process-wide registry.
///
/// Fails if the registry is already frozen, or if the condition type is a
/// built-in or was registered before.
pub fn register_matcher(matcher: impl ConditionMatcher + 'static) -> Result<(), RegistryError> {
    let mut pending = PENDING.lock().unwrap_or_else(PoisonError::into_inner);
    if pending.frozen {
        return Err(RegistryError::Frozen);
    }

    let condition_type = matcher.condition_type();
    if BUILTIN_CONDITIONS.contains(&condition_type)
        || pending
            .matchers
            .iter()
            .any(|m| m.condition_type() == condition_type)
    {
        return Err(RegistryError::DuplicateConditionType(
            condition_type.to_owned(),
        ));
    }
    if let Some(reason) = matcher.shape().defect() {
        return Err(RegistryError::InvalidShape {
            condition_type: condition_type.to_owned(),
            reason: reason.to_owned(),
        });
    }

    debug!(condition_type, "queued custom condition matcher");
    pending.matchers.push(Arc::new(matcher));
    Ok(())
}

/// Queue a closure as the matcher for `condition_type`.
pub fn register_matcher_fn<F>(
    condition_type: impl Into<ConditionType>,
    shape: ShapePattern,
    f: F,
) -> Result<(), RegistryError>
where
    F: Fn(&[Token], &InnerTable) -> Result<bool, EvaluationError> + Send + Sync + 'static,
{
    register_matcher(FnMatcher {
        condition_type: condition_type.into(),
        shape,
        f,
    })
}

/// Freeze the process-wide registry with `config`.
///
/// Returns the global engine. If it was already initialised, `config` is
/// ignored and the existing engine is returned.
pub fn init_global(config: &EngineConfig) -> Result<&'static RuleEngine, RegistryError> {
    if let Some(engine) = GLOBAL.get() {
        return Ok(engine);
    }

    let mut pending = PENDING.lock().unwrap_or_else(PoisonError::into_inner);
    // Another thread may have won the race while we waited for the lock.
    if let Some(engine) = GLOBAL.get() {
        return Ok(engine);
    }

    let mut registry = MatcherRegistry::builtin(config)?;
    for matcher in &pending.matchers {
        registry.register_shared(Arc::clone(matcher))?;
    }
    pending.frozen = true;
    pending.matchers.clear();

    debug!(condition_types = registry.len(), "matcher registry frozen");
    Ok(GLOBAL.get_or_init(|| RuleEngine::new(registry, config)))
}

/// The process-wide engine, freezing it with the default config on first
/// use.
pub fn global() -> Result<&'static RuleEngine, RegistryError> {
    init_global(&EngineConfig::default())
}

/// Evaluate `rule_text` against `table` with the process-wide registry.
pub fn evaluate(rule_text: &str, table: &InnerTable) -> Result<bool, EvaluationError> {
    global()?.evaluate(rule_text, table)
}
