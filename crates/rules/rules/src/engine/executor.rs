use std::sync::Arc;

use moka::sync::Cache;
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::engine::eval::eval;
use crate::engine::table::InnerTable;
use crate::error::{EvaluationError, RegistryError};
use crate::ir::expr::Expr;
use crate::registry::MatcherRegistry;
use crate::syntax::compile;

/// A rule that has been lexed, parsed and classified.
///
/// Holds its matchers directly, so evaluating it never consults a registry.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    source: String,
    expr: Expr,
}

impl CompiledRule {
    /// The rule text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The clause tree.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against a symbol table.
    pub fn evaluate(&self, table: &InnerTable) -> Result<bool, EvaluationError> {
        eval(&self.expr, table)
    }
}

/// Evaluates rule text against a fixed matcher registry.
///
/// Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct RuleEngine {
    registry: Arc<MatcherRegistry>,
    cache: Option<Cache<String, Arc<CompiledRule>>>,
}

impl RuleEngine {
    /// Create an engine over `registry`, caching compiled rules as `config`
    /// allows.
    pub fn new(registry: MatcherRegistry, config: &EngineConfig) -> Self {
        let cache = (config.cache_capacity > 0).then(|| Cache::new(config.cache_capacity));
        debug!(
            condition_types = registry.len(),
            cache_capacity = config.cache_capacity,
            "rule engine created"
        );
        Self {
            registry: Arc::new(registry),
            cache,
        }
    }

    /// Create an engine holding the built-in condition types.
    pub fn from_config(config: &EngineConfig) -> Result<Self, RegistryError> {
        Ok(Self::new(MatcherRegistry::builtin(config)?, config))
    }

    /// The registry clauses are classified against.
    pub fn registry(&self) -> &MatcherRegistry {
        &self.registry
    }

    /// Compile rule text without evaluating it.
    ///
    /// Only successful compilations are cached.
    #[instrument(skip_all, fields(rule = %source))]
    pub fn compile(&self, source: &str) -> Result<Arc<CompiledRule>, EvaluationError> {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(source)) {
            return Ok(cached);
        }

        debug!("compiling rule");
        let compiled = Arc::new(CompiledRule {
            source: source.to_owned(),
            expr: compile(source, &self.registry)?,
        });
        if let Some(cache) = &self.cache {
            cache.insert(source.to_owned(), Arc::clone(&compiled));
        }
        Ok(compiled)
    }

    /// Compile and evaluate `source` against `table`.
    #[instrument(skip_all, fields(rule = %source))]
    pub fn evaluate(&self, source: &str, table: &InnerTable) -> Result<bool, EvaluationError> {
        let verdict = self.compile(source)?.evaluate(table)?;
        debug!(verdict, "rule evaluated");
        Ok(verdict)
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field("registry", &self.registry)
            .field("cached_rules", &self.cache.as_ref().map(Cache::entry_count))
            .finish()
    }
}
