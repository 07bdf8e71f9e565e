// Filter expression parser module

pub mod filter;
pub mod lexer;

// Public API re-exports
pub use filter::{parse_filter, parse_filter_expr, Clause};
