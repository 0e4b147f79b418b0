//! # Value Representation for the IPPcode21 VM
//!
//! This module defines [`Value`], the dynamically-typed value carried by
//! variables, the data stack, and instruction operands.
//!
//! ## Supported types
//! - `Int(i64)` — signed integer
//! - `Float(f64)` — IEEE-754 double, serialized as a hex float (see
//!   [`crate::hexfloat`])
//! - `Str(String)` — sequence of Unicode code points
//! - `Bool(bool)` — boolean
//! - `Nil` — the single-valued `nil` type
//! - `Uninit` — a defined-but-unassigned variable slot; not a real runtime
//!   type, never addressable by a type-checking operator
//!
//! ## Design
//! Every operator here is a total function over the sum type, returning
//! `Result<Value, IppError>` rather than panicking or silently coercing —
//! dynamic typing is modeled explicitly instead of leaning on operator
//! overloading, per the redesign notes this interpreter follows.

use crate::error::{bad_operand_type, bad_operand_val, string_err, IppError};
use crate::hexfloat::format_hex_float;

/// Dynamically-typed runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    /// A variable slot that has been defined but never assigned.
    Uninit,
}

impl Value {
    /// The type name used by `TYPE` and diagnostic messages.
    ///
    /// Returns the empty string for [`Value::Uninit`] — it has no type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::Uninit => "",
        }
    }

    /// Render this value the way `WRITE` and `DPRINT` do.
    ///
    /// `Nil` prints as the empty string; floats print in hex-float form.
    pub fn display(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_hex_float(*f),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Nil => String::new(),
            Value::Uninit => String::new(),
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// `ADD a b`: int+int, float+float, or string+string (concatenation).
pub fn add(a: &Value, b: &Value) -> Result<Value, IppError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_add(*y))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x + y)),
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{x}{y}"))),
        _ => Err(bad_operand_type(format!(
            "ADD: incompatible operand types {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// `SUB a b`: int-int or float-float only (no string variant).
pub fn sub(a: &Value, b: &Value) -> Result<Value, IppError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_sub(*y))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x - y)),
        _ => Err(bad_operand_type(format!(
            "SUB: incompatible operand types {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// `MUL a b`: int*int or float*float only.
pub fn mul(a: &Value, b: &Value) -> Result<Value, IppError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x.wrapping_mul(*y))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(x * y)),
        _ => Err(bad_operand_type(format!(
            "MUL: incompatible operand types {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// `IDIV a b`: integer division, truncating toward zero. Errors on zero divisor.
pub fn idiv(a: &Value, b: &Value) -> Result<Value, IppError> {
    let (x, y) = match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(bad_operand_type(format!(
                "IDIV: operands must both be int, got {} and {}",
                a.type_name(),
                b.type_name()
            )))
        }
    };
    if y == 0 {
        return Err(bad_operand_val("IDIV: division by zero"));
    }
    Ok(Value::Int(x.wrapping_div(y)))
}

/// `DIV a b`: IEEE-754 float division. Errors on zero divisor.
pub fn div(a: &Value, b: &Value) -> Result<Value, IppError> {
    let (x, y) = match (a.as_float(), b.as_float()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(bad_operand_type(format!(
                "DIV: operands must both be float, got {} and {}",
                a.type_name(),
                b.type_name()
            )))
        }
    };
    if y == 0.0 {
        return Err(bad_operand_val("DIV: division by zero"));
    }
    Ok(Value::Float(x / y))
}

/// `LT`/`GT`: ordering comparison. Same non-nil type required.
///
/// `false < true` for booleans; numeric ordering for int/float; lexicographic
/// by code point for strings.
fn compare(a: &Value, b: &Value) -> Result<std::cmp::Ordering, IppError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Float(x), Value::Float(y)) => {
            x.partial_cmp(y).ok_or_else(|| bad_operand_val("comparison with NaN"))
        }
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Nil, _) | (_, Value::Nil) => Err(bad_operand_type("LT/GT: operand is nil")),
        _ => Err(bad_operand_type(format!(
            "LT/GT: incompatible operand types {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

pub fn lt(a: &Value, b: &Value) -> Result<Value, IppError> {
    Ok(Value::Bool(compare(a, b)? == std::cmp::Ordering::Less))
}

pub fn gt(a: &Value, b: &Value) -> Result<Value, IppError> {
    Ok(Value::Bool(compare(a, b)? == std::cmp::Ordering::Greater))
}

/// `EQ a b`: if either side is nil, the result is `a is nil && b is nil`.
/// Otherwise both sides must share a type, compared by value.
pub fn eq(a: &Value, b: &Value) -> Result<Value, IppError> {
    if matches!(a, Value::Nil) || matches!(b, Value::Nil) {
        return Ok(Value::Bool(matches!(a, Value::Nil) && matches!(b, Value::Nil)));
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Bool(x == y)),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Bool(x == y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(Value::Bool(x == y)),
        (Value::Str(x), Value::Str(y)) => Ok(Value::Bool(x == y)),
        _ => Err(bad_operand_type(format!(
            "EQ: incompatible operand types {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// `AND`/`OR`: logical operators over booleans only.
pub fn and(a: &Value, b: &Value) -> Result<Value, IppError> {
    let (x, y) = bool_pair(a, b, "AND")?;
    Ok(Value::Bool(x && y))
}

pub fn or(a: &Value, b: &Value) -> Result<Value, IppError> {
    let (x, y) = bool_pair(a, b, "OR")?;
    Ok(Value::Bool(x || y))
}

pub fn not(a: &Value) -> Result<Value, IppError> {
    a.as_bool()
        .map(|b| Value::Bool(!b))
        .ok_or_else(|| bad_operand_type(format!("NOT: operand must be bool, got {}", a.type_name())))
}

fn bool_pair(a: &Value, b: &Value, op: &str) -> Result<(bool, bool), IppError> {
    match (a.as_bool(), b.as_bool()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(bad_operand_type(format!(
            "{op}: operands must both be bool, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// `INT2CHAR`: integer code point → one-character string.
pub fn int2char(a: &Value) -> Result<Value, IppError> {
    let i = a
        .as_int()
        .ok_or_else(|| bad_operand_type(format!("INT2CHAR: operand must be int, got {}", a.type_name())))?;
    let code = u32::try_from(i).map_err(|_| string_err("INT2CHAR: code point out of range"))?;
    let c = char::from_u32(code).ok_or_else(|| string_err("INT2CHAR: code point out of range"))?;
    Ok(Value::Str(c.to_string()))
}

/// `STRI2INT`: code point at `index` within `s`, as an int.
pub fn stri2int(s: &Value, index: &Value) -> Result<Value, IppError> {
    let s = s
        .as_str()
        .ok_or_else(|| bad_operand_type(format!("STRI2INT: first operand must be string, got {}", s.type_name())))?;
    let idx = index
        .as_int()
        .ok_or_else(|| bad_operand_type(format!("STRI2INT: index must be int, got {}", index.type_name())))?;
    let chars: Vec<char> = s.chars().collect();
    let idx = usize::try_from(idx).ok().filter(|&i| i < chars.len());
    match idx {
        Some(i) => Ok(Value::Int(chars[i] as i64)),
        None => Err(string_err("STRI2INT: index out of range")),
    }
}

/// `INT2FLOAT`: exact widening coercion.
pub fn int2float(a: &Value) -> Result<Value, IppError> {
    a.as_int()
        .map(|i| Value::Float(i as f64))
        .ok_or_else(|| bad_operand_type(format!("INT2FLOAT: operand must be int, got {}", a.type_name())))
}

/// `FLOAT2INT`: truncate toward zero.
pub fn float2int(a: &Value) -> Result<Value, IppError> {
    a.as_float()
        .map(|f| Value::Int(f as i64))
        .ok_or_else(|| bad_operand_type(format!("FLOAT2INT: operand must be float, got {}", a.type_name())))
}

/// `CONCAT`: string+string only (stricter than `ADD`, which also allows it).
pub fn concat(a: &Value, b: &Value) -> Result<Value, IppError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{x}{y}"))),
        _ => Err(bad_operand_type(format!(
            "CONCAT: operands must both be string, got {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// `STRLEN`: number of Unicode code points.
pub fn strlen(a: &Value) -> Result<Value, IppError> {
    a.as_str()
        .map(|s| Value::Int(s.chars().count() as i64))
        .ok_or_else(|| bad_operand_type(format!("STRLEN: operand must be string, got {}", a.type_name())))
}

/// `GETCHAR`: single-character string at `index` within `s`.
pub fn getchar(s: &Value, index: &Value) -> Result<Value, IppError> {
    let s = s
        .as_str()
        .ok_or_else(|| bad_operand_type(format!("GETCHAR: first operand must be string, got {}", s.type_name())))?;
    let idx = index
        .as_int()
        .ok_or_else(|| bad_operand_type(format!("GETCHAR: index must be int, got {}", index.type_name())))?;
    let chars: Vec<char> = s.chars().collect();
    let idx = usize::try_from(idx).ok().filter(|&i| i < chars.len());
    match idx {
        Some(i) => Ok(Value::Str(chars[i].to_string())),
        None => Err(string_err("GETCHAR: index out of range")),
    }
}

/// `SETCHAR`: replace the character of `base` at `index` with the first
/// character of `replacement`. `replacement` must be non-empty and `index`
/// must be in range, else `StringErr`.
pub fn setchar(base: &Value, index: &Value, replacement: &Value) -> Result<Value, IppError> {
    let base_s = base
        .as_str()
        .ok_or_else(|| bad_operand_type(format!("SETCHAR: base must be string, got {}", base.type_name())))?;
    let idx = index
        .as_int()
        .ok_or_else(|| bad_operand_type(format!("SETCHAR: index must be int, got {}", index.type_name())))?;
    let repl = replacement
        .as_str()
        .ok_or_else(|| bad_operand_type(format!("SETCHAR: replacement must be string, got {}", replacement.type_name())))?;

    let repl_first = repl.chars().next().ok_or_else(|| string_err("SETCHAR: replacement is empty"))?;
    let mut chars: Vec<char> = base_s.chars().collect();
    let idx = usize::try_from(idx).ok().filter(|&i| i < chars.len());
    match idx {
        Some(i) => {
            chars[i] = repl_first;
            Ok(Value::Str(chars.into_iter().collect()))
        }
        None => Err(string_err("SETCHAR: index out of range")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_supports_int_float_string() {
        assert_eq!(add(&Value::Int(2), &Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(add(&Value::Float(1.5), &Value::Float(2.5)).unwrap(), Value::Float(4.0));
        assert_eq!(
            add(&Value::Str("a".into()), &Value::Str("b".into())).unwrap(),
            Value::Str("ab".into())
        );
    }

    #[test]
    fn sub_rejects_strings() {
        assert!(sub(&Value::Str("a".into()), &Value::Str("b".into())).is_err());
    }

    #[test]
    fn idiv_errors_on_zero() {
        let err = idiv(&Value::Int(7), &Value::Int(0)).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::BadOperandVal);
    }

    #[test]
    fn idiv_truncates_toward_zero() {
        assert_eq!(idiv(&Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(-3));
    }

    #[test]
    fn eq_with_nil_never_type_errors() {
        assert_eq!(eq(&Value::Nil, &Value::Nil).unwrap(), Value::Bool(true));
        assert_eq!(eq(&Value::Nil, &Value::Int(1)).unwrap(), Value::Bool(false));
        assert_eq!(eq(&Value::Int(1), &Value::Nil).unwrap(), Value::Bool(false));
    }

    #[test]
    fn lt_orders_bools_false_before_true() {
        assert_eq!(lt(&Value::Bool(false), &Value::Bool(true)).unwrap(), Value::Bool(true));
        assert_eq!(lt(&Value::Bool(true), &Value::Bool(false)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn lt_rejects_nil() {
        assert!(lt(&Value::Nil, &Value::Nil).is_err());
    }

    #[test]
    fn stri2int_out_of_range_is_string_err() {
        let err = stri2int(&Value::Str("ab".into()), &Value::Int(2)).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::StringErr);
    }

    #[test]
    fn setchar_rejects_empty_replacement() {
        let err = setchar(&Value::Str("abc".into()), &Value::Int(0), &Value::Str(String::new())).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::StringErr);
    }

    #[test]
    fn int2char_rejects_out_of_range_codepoint() {
        let err = int2char(&Value::Int(0x110000)).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::StringErr);
    }

    #[test]
    fn type_name_of_uninit_is_empty() {
        assert_eq!(Value::Uninit.type_name(), "");
    }
}
