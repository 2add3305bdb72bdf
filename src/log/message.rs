use super::{Code, Error};
use std::fmt::Display;

pub(crate) const UNEXPECTED_TOKEN: &str = "unexpected token";
pub(crate) const INVALID_SYNTAX: &str = "invalid syntax";

/// Return an [`Error`] explaining that the end of the expression was not
/// expected.
pub(crate) fn error_eof(source: &str) -> Error {
    let source_len = source.len();
    Error::new(Code::SyntaxError, "unexpected end of expression")
        .with_pointer(source, source_len..source_len)
        .with_help("expected additional tokens, did you close all brackets and strings?")
}

/// Return an [`Error`] describing a value of the wrong kind.
pub(crate) fn error_kind<T>(what: T, expected: &str, actual: &str) -> Error
where
    T: Display,
{
    Error::new(
        Code::TypeMismatch,
        format!("{what} expected {expected}, found {actual}"),
    )
}

/// Return an [`Error`] describing a name that is not in scope.
pub(crate) fn error_undefined(name: &str) -> Error {
    Error::new(
        Code::UndefinedVariable,
        format!("undefined variable `{name}`"),
    )
}

/// Return an [`Error`] describing a property missing from an object.
pub(crate) fn error_missing_key(name: &str) -> Error {
    Error::new(
        Code::UndefinedVariable,
        format!("property `{name}` not found"),
    )
}

/// Return an [`Error`] describing a division or modulo by zero.
pub(crate) fn error_division_by_zero() -> Error {
    Error::new(Code::DivisionByZero, "division by zero")
}

/// Return an [`Error`] describing an index outside the valid range.
pub(crate) fn error_bounds(index: i64, length: usize) -> Error {
    Error::new(
        Code::IndexOutOfBounds,
        format!("index {index} out of bounds for length {length}"),
    )
}

/// Return an [`Error`] describing a call to an unregistered function.
pub(crate) fn error_unknown_function(name: &str) -> Error {
    Error::new(
        Code::InvalidFunctionCall,
        format!("unknown function `{name}`"),
    )
}

/// Return an [`Error`] describing a call with the wrong number of arguments.
pub(crate) fn error_arity(name: &str, expected: &str) -> Error {
    Error::new(
        Code::InvalidFunctionCall,
        format!("function `{name}` expects {expected}"),
    )
}

/// Return an [`Error`] describing an operator missing a required property.
pub(crate) fn error_missing_property(operator: &str, property: &str) -> Error {
    Error::new(
        Code::InvalidTemplate,
        format!("`{operator}` requires a `{property}` property"),
    )
}

/// Return a string describing an unexpected operator character.
pub(crate) fn expected_operator<T>(received: T) -> String
where
    T: Display,
{
    format!(
        "expected operator like `==`, `!=`, `&&`, `||`, `<`, `>`, found `{}`",
        received
    )
}
