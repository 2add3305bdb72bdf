use super::Function;
use crate::{
    log::{error_arity, error_kind, Error},
    scope::Scope,
    value,
};
use serde_json::Value;

/// Math functions.
pub(crate) fn functions() -> Vec<(&'static str, Function)> {
    vec![
        ("min", min),
        ("max", max),
        ("sqrt", sqrt),
        ("ceil", ceil),
        ("floor", floor),
        ("abs", abs),
    ]
}

fn min(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    fold_extremum("min", arguments, f64::min)
}

fn max(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    fold_extremum("max", arguments, f64::max)
}

fn sqrt(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("sqrt", arguments, f64::sqrt)
}

fn ceil(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("ceil", arguments, f64::ceil)
}

fn floor(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("floor", arguments, f64::floor)
}

fn abs(arguments: &[Value], _: &Scope) -> Result<Value, Error> {
    apply_unary("abs", arguments, f64::abs)
}

/// Fold every numeric argument into one extremum.
fn fold_extremum(name: &str, arguments: &[Value], pick: fn(f64, f64) -> f64) -> Result<Value, Error> {
    let (first, rest) = arguments
        .split_first()
        .ok_or_else(|| error_arity(name, "at least one argument"))?;

    let mut result = require_number(name, first)?;
    for argument in rest {
        result = pick(result, require_number(name, argument)?);
    }

    value::number(result)
}

/// Apply a one argument numeric function.
fn apply_unary(name: &str, arguments: &[Value], apply: fn(f64) -> f64) -> Result<Value, Error> {
    let [argument] = arguments else {
        return Err(error_arity(name, "exactly one argument"));
    };

    value::number(apply(require_number(name, argument)?))
}

fn require_number(name: &str, argument: &Value) -> Result<f64, Error> {
    value::as_number(argument).ok_or_else(|| {
        error_kind(format!("function `{name}`"), "number", value::kind(argument))
    })
}

#[cfg(test)]
mod tests {
    use crate::{log::Code, Engine, Error, Store};
    use serde_json::{json, Value};

    #[test]
    fn test_extrema() {
        assert_eq!(helper_eval("min(3, 1, 2)"), Ok(json!(1)));
        assert_eq!(helper_eval("max(3, 1, 2)"), Ok(json!(3)));
        assert_eq!(helper_eval("min(4)"), Ok(json!(4)));
    }

    #[test]
    fn test_unary() {
        assert_eq!(helper_eval("sqrt(16)"), Ok(json!(4)));
        assert_eq!(helper_eval("ceil(1.2)"), Ok(json!(2)));
        assert_eq!(helper_eval("floor(-1.2)"), Ok(json!(-2)));
        assert_eq!(helper_eval("abs(-5)"), Ok(json!(5)));
    }

    #[test]
    fn test_arity_errors() {
        for source in ["min()", "sqrt()", "sqrt(1, 2)"] {
            let error = helper_eval(source).unwrap_err();
            assert_eq!(error.code(), Code::InvalidFunctionCall, "`{source}`");
        }
    }

    #[test]
    fn test_kind_errors() {
        for source in ["min(1, 'a')", "ceil('a')"] {
            let error = helper_eval(source).unwrap_err();
            assert_eq!(error.code(), Code::TypeMismatch, "`{source}`");
        }
    }

    fn helper_eval(source: &str) -> Result<Value, Error> {
        Engine::default().render(&json!({ "$eval": source }), &Store::new())
    }
}
