//! Expression evaluation.
//!
//! Every [`Expression`] node evaluates itself against a [`Scope`], pulling
//! built-in functions from the [`Engine`].

use crate::{
    compile::tree::{BinaryOperator, Expression, UnaryOperator},
    engine::Engine,
    log::{
        error_bounds, error_division_by_zero, error_kind, error_missing_key, error_undefined,
        error_unknown_function, Code, Error,
    },
    scope::Scope,
    value,
};
use serde_json::{Map, Value};
use std::{cmp::Ordering, fmt::Display};

impl Expression {
    /// Evaluate this expression against the given scope.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the expression references names that are
    /// not in scope, applies an operator to values of the wrong kind, or
    /// otherwise violates the evaluation rules.
    pub(crate) fn eval(&self, engine: &Engine, scope: &Scope) -> Result<Value, Error> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Identifier(name) => scope
                .get(name)
                .cloned()
                .ok_or_else(|| error_undefined(name)),
            Expression::Unary { operator, operand } => {
                eval_unary(*operator, operand.eval(engine, scope)?)
            }
            Expression::Binary {
                operator,
                left,
                right,
            } => eval_binary(engine, scope, *operator, left, right),
            Expression::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if value::is_truthy(&condition.eval(engine, scope)?) {
                    then.eval(engine, scope)
                } else {
                    otherwise.eval(engine, scope)
                }
            }
            Expression::Call { name, arguments } => {
                let function = engine
                    .get_function(name)
                    .ok_or_else(|| error_unknown_function(name))?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(argument.eval(engine, scope)?);
                }

                function(&values, scope)
            }
            Expression::Index { object, index } => {
                let object = object.eval(engine, scope)?;
                let index = index.eval(engine, scope)?;

                eval_index(object, index)
            }
            Expression::Slice {
                object,
                begin,
                end,
            } => {
                let object = object.eval(engine, scope)?;
                let begin = eval_bound(engine, scope, begin)?;
                let end = eval_bound(engine, scope, end)?;

                eval_slice(object, begin, end)
            }
            Expression::Property { object, name } => match object.eval(engine, scope)? {
                Value::Object(map) => map
                    .get(name)
                    .cloned()
                    .ok_or_else(|| error_missing_key(name)),
                other => Err(error_kind(
                    format!("property access `.{name}`"),
                    "object",
                    value::kind(&other),
                )),
            },
            Expression::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(element.eval(engine, scope)?);
                }

                Ok(Value::Array(values))
            }
            Expression::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.eval(engine, scope)?);
                }

                Ok(Value::Object(map))
            }
        }
    }
}

fn eval_unary(operator: UnaryOperator, operand: Value) -> Result<Value, Error> {
    match operator {
        UnaryOperator::Not => Ok(Value::Bool(!value::is_truthy(&operand))),
        UnaryOperator::Negative => {
            let number = require_number(operator, &operand)?;

            value::number(-number)
        }
        UnaryOperator::Positive => {
            require_number(operator, &operand)?;

            Ok(operand)
        }
    }
}

/// Evaluate an infix operation.
///
/// `&&` and `||` short-circuit, the right operand is untouched when the
/// left already decides the result.
fn eval_binary(
    engine: &Engine,
    scope: &Scope,
    operator: BinaryOperator,
    left: &Expression,
    right: &Expression,
) -> Result<Value, Error> {
    use BinaryOperator::*;

    match operator {
        And => {
            if !value::is_truthy(&left.eval(engine, scope)?) {
                return Ok(Value::Bool(false));
            }

            Ok(Value::Bool(value::is_truthy(&right.eval(engine, scope)?)))
        }
        Or => {
            if value::is_truthy(&left.eval(engine, scope)?) {
                return Ok(Value::Bool(true));
            }

            Ok(Value::Bool(value::is_truthy(&right.eval(engine, scope)?)))
        }
        _ => {
            let left = left.eval(engine, scope)?;
            let right = right.eval(engine, scope)?;

            match operator {
                Add => eval_add(left, right),
                Subtract | Multiply | Divide | Modulo | Power => {
                    eval_arithmetic(operator, left, right)
                }
                Equal => Ok(Value::Bool(value::equals(&left, &right))),
                NotEqual => Ok(Value::Bool(!value::equals(&left, &right))),
                Lesser | LesserOrEqual | Greater | GreaterOrEqual => {
                    eval_relational(operator, left, right)
                }
                In => eval_in(left, right),
                And | Or => unreachable!("logical operators are handled above"),
            }
        }
    }
}

/// Evaluate `+`.
///
/// A string on either side concatenates, two arrays concatenate, and two
/// numbers add. Any other combination is a mismatch.
fn eval_add(left: Value, right: Value) -> Result<Value, Error> {
    if left.is_string() || right.is_string() {
        return Ok(Value::String(format!(
            "{}{}",
            value::stringify(&left),
            value::stringify(&right)
        )));
    }
    if let (Value::Array(l), Value::Array(r)) = (&left, &right) {
        let mut combined = l.clone();
        combined.extend(r.iter().cloned());

        return Ok(Value::Array(combined));
    }

    let l = require_number(BinaryOperator::Add, &left)?;
    let r = require_number(BinaryOperator::Add, &right)?;

    value::number(l + r)
}

fn eval_arithmetic(operator: BinaryOperator, left: Value, right: Value) -> Result<Value, Error> {
    let l = require_number(operator, &left)?;
    let r = require_number(operator, &right)?;

    let result = match operator {
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(error_division_by_zero());
            }
            l / r
        }
        BinaryOperator::Modulo => {
            if r == 0.0 {
                return Err(error_division_by_zero());
            }
            l % r
        }
        BinaryOperator::Power => l.powf(r),
        _ => unreachable!("caller only passes arithmetic operators"),
    };

    value::number(result)
}

fn eval_relational(operator: BinaryOperator, left: Value, right: Value) -> Result<Value, Error> {
    let ordering = value::compare(&left, &right).ok_or_else(|| {
        Error::new(
            Code::TypeMismatch,
            format!(
                "cannot compare {} with {}",
                value::kind(&left),
                value::kind(&right)
            ),
        )
    })?;

    let result = match operator {
        BinaryOperator::Lesser => ordering == Ordering::Less,
        BinaryOperator::LesserOrEqual => ordering != Ordering::Greater,
        BinaryOperator::Greater => ordering == Ordering::Greater,
        BinaryOperator::GreaterOrEqual => ordering != Ordering::Less,
        _ => unreachable!("caller only passes relational operators"),
    };

    Ok(Value::Bool(result))
}

/// Evaluate `in`.
///
/// Arrays test membership by structural equality, objects test string key
/// presence, strings test for a substring.
fn eval_in(left: Value, right: Value) -> Result<Value, Error> {
    match right {
        Value::Array(array) => Ok(Value::Bool(
            array.iter().any(|item| value::equals(&left, item)),
        )),
        Value::Object(map) => match left {
            Value::String(key) => Ok(Value::Bool(map.contains_key(&key))),
            other => Err(error_kind(
                "operator `in` on an object",
                "string key",
                value::kind(&other),
            )),
        },
        Value::String(haystack) => match left {
            Value::String(needle) => Ok(Value::Bool(haystack.contains(needle.as_str()))),
            other => Err(error_kind(
                "operator `in` on a string",
                "string",
                value::kind(&other),
            )),
        },
        other => Err(error_kind(
            "operator `in`",
            "array, object or string",
            value::kind(&other),
        )),
    }
}

fn eval_index(object: Value, index: Value) -> Result<Value, Error> {
    match object {
        Value::Array(array) => {
            let number = value::as_number(&index)
                .ok_or_else(|| error_kind("array index", "number", value::kind(&index)))?;
            let position = locate(number as i64, array.len())?;

            Ok(array[position].clone())
        }
        Value::Object(map) => match index {
            Value::String(key) => map
                .get(&key)
                .cloned()
                .ok_or_else(|| error_missing_key(&key)),
            other => Err(error_kind("object key", "string", value::kind(&other))),
        },
        Value::String(string) => {
            let number = value::as_number(&index)
                .ok_or_else(|| error_kind("string index", "number", value::kind(&index)))?;
            let characters: Vec<char> = string.chars().collect();
            let position = locate(number as i64, characters.len())?;

            Ok(Value::String(characters[position].to_string()))
        }
        other => Err(error_kind(
            "index",
            "array, object or string",
            value::kind(&other),
        )),
    }
}

/// Evaluate an optional slice bound into a number.
fn eval_bound(
    engine: &Engine,
    scope: &Scope,
    bound: &Option<Box<Expression>>,
) -> Result<Option<i64>, Error> {
    match bound {
        Some(expression) => {
            let value = expression.eval(engine, scope)?;
            let number = value::as_number(&value)
                .ok_or_else(|| error_kind("slice bound", "number", value::kind(&value)))?;

            Ok(Some(number as i64))
        }
        None => Ok(None),
    }
}

fn eval_slice(object: Value, begin: Option<i64>, end: Option<i64>) -> Result<Value, Error> {
    match object {
        Value::Array(array) => {
            let (begin, end) = clamp(begin, end, array.len());

            Ok(Value::Array(array[begin..end].to_vec()))
        }
        Value::String(string) => {
            let characters: Vec<char> = string.chars().collect();
            let (begin, end) = clamp(begin, end, characters.len());

            Ok(Value::String(characters[begin..end].iter().collect()))
        }
        other => Err(error_kind(
            "slice",
            "array or string",
            value::kind(&other),
        )),
    }
}

/// Normalize a possibly negative index into `[0, length)`.
fn locate(index: i64, length: usize) -> Result<usize, Error> {
    let resolved = if index < 0 {
        index + length as i64
    } else {
        index
    };
    if resolved < 0 || resolved >= length as i64 {
        return Err(error_bounds(resolved, length));
    }

    Ok(resolved as usize)
}

/// Normalize optional slice bounds into `[0, length]` with begin before
/// end. Slices never fail, out of range bounds are clamped.
fn clamp(begin: Option<i64>, end: Option<i64>, length: usize) -> (usize, usize) {
    let length = length as i64;
    let mut begin = begin.unwrap_or(0);
    let mut end = end.unwrap_or(length);

    if begin < 0 {
        begin = (length + begin).max(0);
    }
    if end < 0 {
        end = (length + end).max(0);
    }
    begin = begin.min(length);
    end = end.min(length);
    if begin > end {
        begin = end;
    }

    (begin as usize, end as usize)
}

fn require_number<T>(operator: T, value: &Value) -> Result<f64, Error>
where
    T: Display,
{
    value::as_number(value)
        .ok_or_else(|| error_kind(format!("operator `{operator}`"), "number", value::kind(value)))
}

#[cfg(test)]
mod tests {
    use crate::{compile, engine::Engine, log::Code, scope::Scope, store::Store, Error};
    use serde_json::{json, Value};

    #[test]
    fn test_arithmetic() {
        assert_eq!(helper_eval("1 + 2 * 3"), Ok(json!(7)));
        assert_eq!(helper_eval("10 / 4"), Ok(json!(2.5)));
        assert_eq!(helper_eval("7 % 4"), Ok(json!(3)));
        assert_eq!(helper_eval("2 ** 10"), Ok(json!(1024)));
        assert_eq!(helper_eval("-(1 + 2)"), Ok(json!(-3)));
    }

    #[test]
    fn test_division_by_zero() {
        for source in ["1 / 0", "1 % 0"] {
            let error = helper_eval(source).unwrap_err();
            assert_eq!(error.code(), Code::DivisionByZero, "`{source}`");
        }
    }

    #[test]
    fn test_short_circuit() {
        assert_eq!(helper_eval("false && (1 / 0)"), Ok(json!(false)));
        assert_eq!(helper_eval("true || (1 / 0)"), Ok(json!(true)));
        assert_eq!(helper_eval("1 && 'yes'"), Ok(json!(true)));
        assert_eq!(helper_eval("0 || ''"), Ok(json!(false)));
    }

    #[test]
    fn test_add_forms() {
        assert_eq!(helper_eval("'v' + 2"), Ok(json!("v2")));
        assert_eq!(helper_eval("2.5 + 'v'"), Ok(json!("2.5v")));
        assert_eq!(helper_eval("[1] + [2, 3]"), Ok(json!([1, 2, 3])));

        let error = helper_eval("[1] + 2").unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    #[test]
    fn test_equality() {
        assert_eq!(helper_eval("1 == 1.0"), Ok(json!(true)));
        assert_eq!(helper_eval("[1, 2] == [1, 2]"), Ok(json!(true)));
        assert_eq!(helper_eval("{a: 1} == {a: 1}"), Ok(json!(true)));
        assert_eq!(helper_eval("1 != '1'"), Ok(json!(true)));
        assert_eq!(helper_eval("null == null"), Ok(json!(true)));
    }

    #[test]
    fn test_relational() {
        assert_eq!(helper_eval("1 < 2"), Ok(json!(true)));
        assert_eq!(helper_eval("'abc' <= 'abd'"), Ok(json!(true)));

        let error = helper_eval("1 < 'a'").unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    #[test]
    fn test_in() {
        assert_eq!(helper_eval("2 in [1, 2, 3]"), Ok(json!(true)));
        assert_eq!(helper_eval("'a' in {a: 1}"), Ok(json!(true)));
        assert_eq!(helper_eval("'ell' in 'hello'"), Ok(json!(true)));
        assert_eq!(helper_eval("4 in [1, 2, 3]"), Ok(json!(false)));

        let error = helper_eval("1 in {a: 1}").unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
        let error = helper_eval("1 in 5").unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    #[test]
    fn test_index() {
        let store = Store::new().with_must("items", json!(["a", "b", "c"]));

        assert_eq!(helper_eval_with("items[0]", &store), Ok(json!("a")));
        assert_eq!(helper_eval_with("items[-1]", &store), Ok(json!("c")));
        assert_eq!(helper_eval_with("'abc'[1]", &store), Ok(json!("b")));
        assert_eq!(helper_eval_with("'abc'[-3]", &store), Ok(json!("a")));

        let error = helper_eval_with("items[3]", &store).unwrap_err();
        assert_eq!(error.code(), Code::IndexOutOfBounds);
        let error = helper_eval_with("items['a']", &store).unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    #[test]
    fn test_object_lookup() {
        let store = Store::new().with_must("person", json!({"name": "taylor"}));

        assert_eq!(
            helper_eval_with("person.name", &store),
            Ok(json!("taylor"))
        );
        assert_eq!(
            helper_eval_with("person['name']", &store),
            Ok(json!("taylor"))
        );

        let error = helper_eval_with("person.age", &store).unwrap_err();
        assert_eq!(error.code(), Code::UndefinedVariable);
        let error = helper_eval_with("person.name.length", &store).unwrap_err();
        assert_eq!(error.code(), Code::TypeMismatch);
    }

    #[test]
    fn test_slice_never_fails() {
        let store = Store::new().with_must("items", json!([1, 2, 3]));

        assert_eq!(helper_eval_with("items[1:]", &store), Ok(json!([2, 3])));
        assert_eq!(helper_eval_with("items[:-1]", &store), Ok(json!([1, 2])));
        assert_eq!(helper_eval_with("items[100:200]", &store), Ok(json!([])));
        assert_eq!(helper_eval_with("items[2:1]", &store), Ok(json!([])));
        assert_eq!(helper_eval_with("'hello'[1:3]", &store), Ok(json!("el")));
    }

    #[test]
    fn test_conditional() {
        assert_eq!(helper_eval("1 < 2 ? 'yes' : 'no'"), Ok(json!("yes")));
        assert_eq!(helper_eval("[] ? 'yes' : 'no'"), Ok(json!("no")));
    }

    #[test]
    fn test_call() {
        assert_eq!(helper_eval("min(3, 1, 2)"), Ok(json!(1)));

        let error = helper_eval("nope(1)").unwrap_err();
        assert_eq!(error.code(), Code::InvalidFunctionCall);
    }

    #[test]
    fn test_undefined_variable() {
        let error = helper_eval("missing").unwrap_err();
        assert_eq!(error.code(), Code::UndefinedVariable);
    }

    #[test]
    fn test_literals() {
        assert_eq!(helper_eval("[1, 'a', true]"), Ok(json!([1, "a", true])));
        assert_eq!(
            helper_eval("{a: 1, 'b': [2]}"),
            Ok(json!({"a": 1, "b": [2]}))
        );
        assert_eq!(helper_eval("!null"), Ok(json!(true)));
    }

    fn helper_eval(source: &str) -> Result<Value, Error> {
        helper_eval_with(source, &Store::new())
    }

    fn helper_eval_with(source: &str, store: &Store) -> Result<Value, Error> {
        let engine = Engine::default();
        let expression = compile::compile(source)?;

        expression.eval(&engine, &Scope::root(store))
    }
}
