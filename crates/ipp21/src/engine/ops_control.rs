//! Data movement, frame management, stack primitives, and I/O/debug
//! opcodes: `MOVE`, `CREATEFRAME`/`PUSHFRAME`/`POPFRAME`, `DEFVAR`, `TYPE`,
//! `PUSHS`/`POPS`/`CLEARS`, `READ`/`WRITE`, `DPRINT`/`BREAK`.
//!
//! `CALL`/`RETURN`/`JUMP*` live one level up in `engine.rs`, where the
//! label table and program counter actually reside.

use std::io::Write as _;

use crate::error::IppError;
use crate::hexfloat::parse_hex_float;
use crate::instruction::Operand;
use crate::opcode::Opcode;
use crate::value::Value;

use super::{pop, push, resolve_symb, var_ref, Engine};

pub(super) fn execute(engine: &mut Engine<'_>, op: Opcode, args: &[Operand]) -> Result<(), IppError> {
    use Opcode::*;
    match op {
        Move => {
            let dest = var_ref(&args[0])?;
            let v = resolve_symb(&engine.frames, &args[1])?;
            engine.frames.write_value(dest, v)?;
        }
        CreateFrame => engine.frames.create_tf(),
        PushFrame => engine.frames.push_frame()?,
        PopFrame => engine.frames.pop_frame()?,
        DefVar => engine.frames.def_var(var_ref(&args[0])?)?,
        Type => {
            let dest = var_ref(&args[0])?;
            let v = match &args[1] {
                Operand::Var(vref) => engine.frames.get_slot(vref)?.clone(),
                Operand::Literal(v) => v.clone(),
                _ => return Err(crate::error::ErrorKind::Internal.with_msg("TYPE: expected symb operand")),
            };
            engine.frames.write_value(dest, Value::Str(v.type_name().to_string()))?;
        }
        Pushs => {
            let v = resolve_symb(&engine.frames, &args[0])?;
            push(&mut engine.data_stack, v);
        }
        Pops => {
            let dest = var_ref(&args[0])?;
            let v = pop(&mut engine.data_stack)?;
            engine.frames.write_value(dest, v)?;
        }
        Clears => engine.data_stack.clear(),
        Read => {
            let dest = var_ref(&args[0])?;
            let type_tag = match &args[1] {
                Operand::TypeTag(t) => t.as_str(),
                _ => return Err(crate::error::ErrorKind::Internal.with_msg("READ: expected type operand")),
            };
            let line = engine.input.next_line();
            let value = decode_read(type_tag, line.as_deref());
            engine.frames.write_value(dest, value)?;
        }
        Write => {
            let v = resolve_symb(&engine.frames, &args[0])?;
            write!(engine.stdout, "{}", v.display())
                .map_err(|e| crate::error::ErrorKind::WriteErr.with_msg(format!("stdout write failed: {e}")))?;
        }
        Dprint => {
            let v = resolve_symb(&engine.frames, &args[0])?;
            writeln!(engine.stderr, "{}", v.display())
                .map_err(|e| crate::error::ErrorKind::WriteErr.with_msg(format!("stderr write failed: {e}")))?;
        }
        Break => {
            writeln!(
                engine.stderr,
                "pc={} ec={} data_stack_depth={} call_stack_depth={} frames={:?}",
                engine.pc,
                engine.stats.insts(),
                engine.data_stack.len(),
                engine.call_stack.len(),
                engine.frames,
            )
            .map_err(|e| crate::error::ErrorKind::WriteErr.with_msg(format!("stderr write failed: {e}")))?;
        }
        _ => unreachable!("ops_control::execute called with an opcode it doesn't own"),
    }
    Ok(())
}

/// Decode a `READ` line per the requested type token. Any decode failure —
/// including EOF, where `line` is `None` — yields `Value::Nil` rather than
/// an error, so programs can branch on `TYPE` instead of crashing.
fn decode_read(type_tag: &str, line: Option<&str>) -> Value {
    let Some(line) = line else { return Value::Nil };
    match type_tag {
        "bool" => Value::Bool(line.eq_ignore_ascii_case("true")),
        "int" => line.parse::<i64>().map(Value::Int).unwrap_or(Value::Nil),
        "float" => parse_hex_float(line).map(Value::Float).unwrap_or(Value::Nil),
        "string" => Value::Str(line.to_string()),
        _ => Value::Nil,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_read_bool_is_case_insensitive() {
        assert_eq!(decode_read("bool", Some("TRUE")), Value::Bool(true));
        assert_eq!(decode_read("bool", Some("anything else")), Value::Bool(false));
    }

    #[test]
    fn decode_read_eof_is_nil_for_every_type() {
        for t in ["bool", "int", "float", "string"] {
            assert_eq!(decode_read(t, None), Value::Nil);
        }
    }

    #[test]
    fn decode_read_bad_int_is_nil_not_error() {
        assert_eq!(decode_read("int", Some("not a number")), Value::Nil);
        assert_eq!(decode_read("int", Some("42")), Value::Int(42));
    }
}
