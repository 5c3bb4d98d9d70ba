//! Rule text to clause tree.

pub mod lexer;
pub mod parser;

pub use lexer::tokenize;
pub use parser::compile;
