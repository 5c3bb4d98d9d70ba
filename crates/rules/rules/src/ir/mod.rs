pub mod expr;
pub mod rule;
pub mod token;
