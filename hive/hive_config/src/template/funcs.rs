//! Built-in template functions. All of them work on integers.

use serde_json::Value;

use crate::error::TemplateErrorKind;

/// Names of the functions available to actions.
pub const FUNCTIONS: &[&str] = &["add", "sub", "mul", "div", "mod"];

pub(crate) fn call(name: &str, args: Vec<Value>) -> Result<Value, TemplateErrorKind> {
    match name {
        "add" => fold("add", &args, i64::checked_add),
        "mul" => fold("mul", &args, i64::checked_mul),
        "sub" => binary("sub", &args, |a, b| {
            a.checked_sub(b).ok_or(TemplateErrorKind::Overflow("sub"))
        }),
        "div" => binary("div", &args, |a, b| {
            if b == 0 {
                return Err(TemplateErrorKind::DivisionByZero("div"));
            }
            a.checked_div(b).ok_or(TemplateErrorKind::Overflow("div"))
        }),
        "mod" => binary("mod", &args, |a, b| {
            if b == 0 {
                return Err(TemplateErrorKind::DivisionByZero("mod"));
            }
            a.checked_rem(b).ok_or(TemplateErrorKind::Overflow("mod"))
        }),
        _ => Err(TemplateErrorKind::UnknownFunction(name.to_string())),
    }
}

fn integers(function: &'static str, args: &[Value]) -> Result<Vec<i64>, TemplateErrorKind> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            arg.as_i64().ok_or_else(|| TemplateErrorKind::BadArguments {
                function,
                message: format!("argument {} is not an integer: {arg}", i + 1),
            })
        })
        .collect()
}

fn fold(
    function: &'static str,
    args: &[Value],
    op: fn(i64, i64) -> Option<i64>,
) -> Result<Value, TemplateErrorKind> {
    if args.len() < 2 {
        return Err(TemplateErrorKind::BadArguments {
            function,
            message: format!("want at least 2 arguments, got {}", args.len()),
        });
    }
    let values = integers(function, args)?;
    let mut iter = values.into_iter();
    let first = iter.next().unwrap_or_default();
    iter.try_fold(first, op)
        .map(Value::from)
        .ok_or(TemplateErrorKind::Overflow(function))
}

fn binary(
    function: &'static str,
    args: &[Value],
    op: impl FnOnce(i64, i64) -> Result<i64, TemplateErrorKind>,
) -> Result<Value, TemplateErrorKind> {
    match integers(function, args)?.as_slice() {
        [a, b] => op(*a, *b).map(Value::from),
        other => Err(TemplateErrorKind::BadArguments {
            function,
            message: format!("want 2 arguments, got {}", other.len()),
        }),
    }
}
