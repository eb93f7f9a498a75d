//! Formula evaluation against a read-only context.

use indexmap::IndexMap;
use trellis_core::FormulaError;

use crate::ast::{BinaryOp, Expr, UnaryOp};

/// A value produced while evaluating a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f32),
    Bool(bool),
    /// Named numeric fields, e.g. `safeAreaInsets`
    Record(IndexMap<String, f32>),
}

impl FormulaValue {
    fn type_name(&self) -> &'static str {
        match self {
            FormulaValue::Number(_) => "number",
            FormulaValue::Bool(_) => "bool",
            FormulaValue::Record(_) => "record",
        }
    }

    fn as_number(&self) -> Result<f32, FormulaError> {
        match self {
            FormulaValue::Number(v) => Ok(*v),
            other => Err(mismatch("number", other)),
        }
    }

    fn as_bool(&self) -> Result<bool, FormulaError> {
        match self {
            FormulaValue::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }
}

fn mismatch(expected: &str, found: &FormulaValue) -> FormulaError {
    FormulaError::TypeMismatch {
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
}

/// Named values and functions a formula can reference.
pub trait FormulaContext {
    /// Look up a top-level field. `None` means the name is unknown.
    fn field(&self, name: &str) -> Option<FormulaValue>;

    /// Call a context function with already-evaluated numeric arguments.
    fn call(&self, name: &str, args: &[f32]) -> Result<f32, FormulaError> {
        let _ = args;
        Err(FormulaError::UnknownFunction {
            name: name.to_string(),
        })
    }
}

/// Check a function's arity.
pub fn expect_args(name: &str, args: &[f32], expected: usize) -> Result<(), FormulaError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(FormulaError::WrongArgumentCount {
            name: name.to_string(),
            expected,
            found: args.len(),
        })
    }
}

/// Evaluate an expression to a value.
pub fn evaluate(expr: &Expr, ctx: &dyn FormulaContext) -> Result<FormulaValue, FormulaError> {
    match expr {
        Expr::Number(v) => Ok(FormulaValue::Number(*v)),
        Expr::Bool(v) => Ok(FormulaValue::Bool(*v)),
        Expr::Field(name) => ctx.field(name).ok_or_else(|| FormulaError::UnknownField {
            name: name.clone(),
        }),
        Expr::Access { target, field } => match evaluate(target, ctx)? {
            FormulaValue::Record(fields) => fields
                .get(field)
                .map(|v| FormulaValue::Number(*v))
                .ok_or_else(|| FormulaError::UnknownField {
                    name: field.clone(),
                }),
            other => Err(mismatch("record", &other)),
        },
        Expr::Call { name, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, ctx)?.as_number())
                .collect::<Result<Vec<_>, _>>()?;
            ctx.call(name, &values).map(FormulaValue::Number)
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, ctx)?;
            match op {
                UnaryOp::Neg => Ok(FormulaValue::Number(-value.as_number()?)),
                UnaryOp::Not => Ok(FormulaValue::Bool(!value.as_bool()?)),
            }
        }
        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, ctx),
        Expr::When { branches, otherwise } => {
            for (condition, value) in branches {
                if evaluate(condition, ctx)?.as_bool()? {
                    return evaluate(value, ctx);
                }
            }
            evaluate(otherwise, ctx)
        }
    }
}

fn evaluate_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    ctx: &dyn FormulaContext,
) -> Result<FormulaValue, FormulaError> {
    // Logical operators short-circuit
    match op {
        BinaryOp::And => {
            let value = evaluate(left, ctx)?.as_bool()? && evaluate(right, ctx)?.as_bool()?;
            return Ok(FormulaValue::Bool(value));
        }
        BinaryOp::Or => {
            let value = evaluate(left, ctx)?.as_bool()? || evaluate(right, ctx)?.as_bool()?;
            return Ok(FormulaValue::Bool(value));
        }
        _ => {}
    }

    let lhs = evaluate(left, ctx)?;
    let rhs = evaluate(right, ctx)?;

    if matches!(op, BinaryOp::Eq | BinaryOp::NotEq) {
        let equal = match (&lhs, &rhs) {
            (FormulaValue::Number(a), FormulaValue::Number(b)) => a == b,
            (FormulaValue::Bool(a), FormulaValue::Bool(b)) => a == b,
            (a, b) => return Err(mismatch(a.type_name(), b)),
        };
        return Ok(FormulaValue::Bool(if op == BinaryOp::Eq { equal } else { !equal }));
    }

    let a = lhs.as_number()?;
    let b = rhs.as_number()?;
    let value = match op {
        BinaryOp::Add => FormulaValue::Number(a + b),
        BinaryOp::Sub => FormulaValue::Number(a - b),
        BinaryOp::Mul => FormulaValue::Number(a * b),
        BinaryOp::Div if b == 0.0 => return Err(FormulaError::DivisionByZero),
        BinaryOp::Div => FormulaValue::Number(a / b),
        BinaryOp::Mod if b == 0.0 => return Err(FormulaError::DivisionByZero),
        BinaryOp::Mod => FormulaValue::Number(a % b),
        BinaryOp::Lt => FormulaValue::Bool(a < b),
        BinaryOp::Le => FormulaValue::Bool(a <= b),
        BinaryOp::Gt => FormulaValue::Bool(a > b),
        BinaryOp::Ge => FormulaValue::Bool(a >= b),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::And | BinaryOp::Or => unreachable!(),
    };
    Ok(value)
}

/// Evaluate an expression that must produce a number.
pub fn evaluate_number(expr: &Expr, ctx: &dyn FormulaContext) -> Result<f32, FormulaError> {
    match evaluate(expr, ctx)? {
        FormulaValue::Number(v) => Ok(v),
        other => Err(FormulaError::InvalidResult {
            found: other.type_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse;

    struct TestContext;

    impl FormulaContext for TestContext {
        fn field(&self, name: &str) -> Option<FormulaValue> {
            match name {
                "parent" => Some(FormulaValue::Number(200.0)),
                "insets" => {
                    let mut fields = IndexMap::new();
                    fields.insert("left".to_string(), 10.0);
                    fields.insert("right".to_string(), 30.0);
                    Some(FormulaValue::Record(fields))
                }
                _ => None,
            }
        }

        fn call(&self, name: &str, args: &[f32]) -> Result<f32, FormulaError> {
            match name {
                "max" => {
                    expect_args(name, args, 2)?;
                    Ok(args[0].max(args[1]))
                }
                _ => Err(FormulaError::UnknownFunction { name: name.to_string() }),
            }
        }
    }

    fn eval(source: &str) -> Result<f32, FormulaError> {
        evaluate_number(&parse(source).unwrap(), &TestContext)
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("parent / 4 + 2 * 3").unwrap(), 56.0);
        assert_eq!(eval("-(parent - 50)").unwrap(), -150.0);
        assert_eq!(eval("7 % 4").unwrap(), 3.0);
    }

    #[test]
    fn test_evaluate_record_access() {
        assert_eq!(eval("parent - insets.left - insets.right").unwrap(), 160.0);
        assert_eq!(
            eval("insets.top").unwrap_err(),
            FormulaError::UnknownField { name: "top".into() }
        );
    }

    #[test]
    fn test_evaluate_when() {
        assert_eq!(eval("when parent > 100 and not false -> 1, 2").unwrap(), 1.0);
        assert_eq!(eval("when parent < 100 -> 1, parent == 200 -> 3, 2").unwrap(), 3.0);
    }

    #[test]
    fn test_evaluate_calls() {
        assert_eq!(eval("max(parent, 300)").unwrap(), 300.0);
        assert_eq!(
            eval("max(1)").unwrap_err(),
            FormulaError::WrongArgumentCount { name: "max".into(), expected: 2, found: 1 }
        );
        assert_eq!(
            eval("sqrt(4)").unwrap_err(),
            FormulaError::UnknownFunction { name: "sqrt".into() }
        );
    }

    #[test]
    fn test_evaluate_errors() {
        assert_eq!(eval("parent / 0").unwrap_err(), FormulaError::DivisionByZero);
        assert_eq!(
            eval("missing + 1").unwrap_err(),
            FormulaError::UnknownField { name: "missing".into() }
        );
        assert_eq!(
            eval("parent > 1").unwrap_err(),
            FormulaError::InvalidResult { found: "bool".into() }
        );
        assert!(matches!(eval("true + 1"), Err(FormulaError::TypeMismatch { .. })));
    }
}
