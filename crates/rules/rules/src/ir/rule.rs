use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::engine::RuleEngine;
use crate::engine::table::InnerTable;
use crate::error::{ConfigError, EvaluationError};

/// A named rule expression.
///
/// Rules are evaluated in priority order (lower number = higher priority),
/// ties keeping insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// A human-readable name for the rule, unique within a [`RuleSet`].
    pub name: String,
    /// The rule expression, e.g. `temp > 39.5 AND DELTA temp temp_prev > 1`.
    pub condition: String,
    /// Priority for ordering. Lower values are evaluated first.
    #[serde(default)]
    pub priority: i32,
    /// Optional description of what this rule detects.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the rule is active.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Arbitrary key-value metadata (e.g. `severity`).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    /// Create a new enabled rule with priority 0.
    pub fn new(name: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
            priority: 0,
            description: None,
            enabled: true,
            metadata: HashMap::new(),
        }
    }

    /// Set the priority of this rule.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description of this rule.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the enabled state of this rule.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the metadata for this rule.
    #[must_use]
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Verdict of a single rule within a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    /// Name of the rule.
    pub rule: String,
    /// Its verdict, or why it could not be evaluated.
    pub result: Result<bool, EvaluationError>,
}

impl RuleOutcome {
    /// Returns `true` if the rule evaluated to `true`.
    pub fn matched(&self) -> bool {
        matches!(self.result, Ok(true))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<Rule>,
}

/// An ordered collection of named rules evaluated against one table.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build a set, ordering the rules by priority.
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut rules: Vec<Rule> = rules.into_iter().collect();
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    /// Parse a TOML document of `[[rules]]` tables.
    ///
    /// Rule names must be unique.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: RuleFile = toml::from_str(contents)?;
        let mut seen = HashSet::new();
        if let Some(dup) = file.rules.iter().find(|r| !seen.insert(r.name.as_str())) {
            return Err(ConfigError::Invalid(format!(
                "duplicate rule name `{}`",
                dup.name
            )));
        }
        Ok(Self::new(file.rules))
    }

    /// Insert a rule, keeping priority order.
    pub fn add_rule(&mut self, rule: Rule) {
        let at = self.rules.partition_point(|r| r.priority <= rule.priority);
        self.rules.insert(at, rule);
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Find a rule by name.
    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Number of rules, enabled or not.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the set holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every enabled rule. A failing rule does not stop the batch.
    pub fn evaluate_all(&self, engine: &RuleEngine, table: &InnerTable) -> Vec<RuleOutcome> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .map(|r| RuleOutcome {
                rule: r.name.clone(),
                result: engine.evaluate(&r.condition, table),
            })
            .collect()
    }

    /// First enabled rule that evaluates to `true`, stopping at the first
    /// error.
    pub fn first_match(
        &self,
        engine: &RuleEngine,
        table: &InnerTable,
    ) -> Result<Option<&Rule>, EvaluationError> {
        for rule in self.rules.iter().filter(|r| r.enabled) {
            if engine.evaluate(&rule.condition, table)? {
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }
}
