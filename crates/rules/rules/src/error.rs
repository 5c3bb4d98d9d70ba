use std::fmt;

use thiserror::Error;

/// What went wrong while lexing a rule expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A character that cannot start any token.
    UnrecognizedCharacter(char),
    /// A numeric literal running into letters, a second decimal point, a
    /// dangling exponent, or overflowing `f64`.
    MalformedNumber,
}

/// A lexing failure at a byte offset of the rule text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}")]
pub struct LexError {
    /// Byte offset of the offending input.
    pub offset: usize,
    /// Diagnosis.
    pub kind: LexErrorKind,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedCharacter(c) => write!(f, "unrecognized character {c:?}"),
            Self::MalformedNumber => f.write_str("malformed number"),
        }
    }
}

/// Errors returned when compiling or evaluating a rule.
///
/// None of these are ever folded into a `false` verdict: a rule that cannot
/// be lexed, parsed, classified, or resolved yields an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The rule text contains a malformed token.
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    /// Unbalanced parentheses, a dangling operator, or an empty or incomplete
    /// clause.
    #[error("syntax error at byte {offset}: {message}")]
    Syntax {
        /// Byte offset the problem was detected at.
        offset: usize,
        /// Human-readable description.
        message: String,
    },

    /// No registered shape matches the clause.
    #[error("unclassifiable clause: {clause}")]
    UnclassifiableClause {
        /// The clause, rendered back to source form.
        clause: String,
    },

    /// A condition type was resolved that has no registered matcher.
    #[error("unknown condition type: {0}")]
    UnknownConditionType(String),

    /// A clause referenced a variable absent from the symbol table.
    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    /// A reading is present but unusable by the matcher's arithmetic.
    #[error("invalid reading for {name}: {reason}")]
    InvalidReading {
        /// Variable name of the reading.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A matcher received tokens that do not fit its own shape.
    #[error("malformed {condition_type} clause: {reason}")]
    MalformedClause {
        /// The condition type whose matcher rejected the clause.
        condition_type: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The process-wide registry could not be built.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl EvaluationError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// Returns `true` for errors raised before any matcher runs.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            Self::Lex(_)
                | Self::Syntax { .. }
                | Self::UnclassifiableClause { .. }
                | Self::UnknownConditionType(_)
                | Self::Registry(_)
        )
    }
}

/// Errors raised while building a matcher registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The condition type is already registered.
    #[error("condition type already registered: {0}")]
    DuplicateConditionType(String),

    /// The shape can never match a clause.
    #[error("invalid shape for {condition_type}: {reason}")]
    InvalidShape {
        /// The condition type being registered.
        condition_type: String,
        /// Why the shape was rejected.
        reason: String,
    },

    /// The process-wide registry has already been frozen by first use.
    #[error("matcher registry is frozen; register matchers before the first evaluation")]
    Frozen,
}

/// Errors raised while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid TOML for [`EngineConfig`](crate::EngineConfig).
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}
