pub mod eval;
pub mod executor;
pub mod global;
pub mod table;

pub use executor::{CompiledRule, RuleEngine};
