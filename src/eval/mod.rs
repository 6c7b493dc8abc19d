//! Math Evaluator — a whitelisted expression language over signals.
//!
//! Expressions reference signals by their literal SPICE-style names
//! (`V(out)`), combine them with `+ - * /` and parentheses, and apply a
//! fixed set of unary functions. The implementation never evaluates
//! expression text directly: [`lexer`] tokenizes, [`parser`] builds an
//! AST restricted to whitelisted node kinds, and [`evaluator`] walks it.
//! There is no node type capable of expressing anything outside the
//! whitelist, so validation is structural rather than a runtime blocklist.

pub mod ast;
pub mod evaluator;
pub mod lexer;
pub mod parser;

pub use evaluator::{evaluate, EvalResult};
