//! Compiles expression source text into an evaluatable tree.
//!
//! The Lexer reads source text as tokens, and the Parser assembles those
//! tokens into an [`Expression`]. Expressions are compiled fresh each time
//! a source string is evaluated, so repeated evaluations are independent.
pub mod lex;
pub mod parse;

pub use parse::{tree, Parser};

use crate::log::Error;
use parse::tree::Expression;

/// Compile the given source into an [`Expression`].
///
/// # Errors
///
/// Returns an [`Error`] when the source is not a single complete
/// expression.
#[inline]
pub(crate) fn compile(source: &str) -> Result<Expression, Error> {
    Parser::new(source).compile()
}
