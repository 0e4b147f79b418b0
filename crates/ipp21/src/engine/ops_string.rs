//! String and conversion opcodes: `CONCAT`/`STRLEN`/`GETCHAR`/`SETCHAR`,
//! `INT2CHAR`/`STRI2INT`/`INT2FLOAT`/`FLOAT2INT`, and the stack-suffixed
//! conversions (`CONCAT`/`GETCHAR`/`SETCHAR`/`STRLEN` have no `S` variant).

use crate::error::IppError;
use crate::frame::Frames;
use crate::instruction::Operand;
use crate::opcode::Opcode;
use crate::value::{self, Value};

use super::{pop, push, resolve_symb, var_ref};

pub(super) fn execute(
    op: Opcode,
    args: &[Operand],
    frames: &mut Frames,
    data_stack: &mut Vec<Value>,
) -> Result<(), IppError> {
    use Opcode::*;
    match op {
        Concat => {
            let dest = var_ref(&args[0])?;
            let a = resolve_symb(frames, &args[1])?;
            let b = resolve_symb(frames, &args[2])?;
            frames.write_value(dest, value::concat(&a, &b)?)?;
        }
        GetChar => {
            let dest = var_ref(&args[0])?;
            let s = resolve_symb(frames, &args[1])?;
            let idx = resolve_symb(frames, &args[2])?;
            frames.write_value(dest, value::getchar(&s, &idx)?)?;
        }
        Stri2Int => {
            let dest = var_ref(&args[0])?;
            let s = resolve_symb(frames, &args[1])?;
            let idx = resolve_symb(frames, &args[2])?;
            frames.write_value(dest, value::stri2int(&s, &idx)?)?;
        }
        SetChar => {
            let dest = var_ref(&args[0])?;
            let base = frames.read_value(dest)?.clone();
            let idx = resolve_symb(frames, &args[1])?;
            let repl = resolve_symb(frames, &args[2])?;
            let result = value::setchar(&base, &idx, &repl)?;
            frames.write_value(dest, result)?;
        }
        Strlen => {
            let dest = var_ref(&args[0])?;
            let s = resolve_symb(frames, &args[1])?;
            frames.write_value(dest, value::strlen(&s)?)?;
        }
        Int2Char => {
            let dest = var_ref(&args[0])?;
            let a = resolve_symb(frames, &args[1])?;
            frames.write_value(dest, value::int2char(&a)?)?;
        }
        Int2Float => {
            let dest = var_ref(&args[0])?;
            let a = resolve_symb(frames, &args[1])?;
            frames.write_value(dest, value::int2float(&a)?)?;
        }
        Float2Int => {
            let dest = var_ref(&args[0])?;
            let a = resolve_symb(frames, &args[1])?;
            frames.write_value(dest, value::float2int(&a)?)?;
        }
        Int2Chars => {
            let a = pop(data_stack)?;
            push(data_stack, value::int2char(&a)?);
        }
        Int2Floats => {
            let a = pop(data_stack)?;
            push(data_stack, value::int2float(&a)?);
        }
        Float2Ints => {
            let a = pop(data_stack)?;
            push(data_stack, value::float2int(&a)?);
        }
        Stri2Ints => {
            let idx = pop(data_stack)?;
            let s = pop(data_stack)?;
            push(data_stack, value::stri2int(&s, &idx)?);
        }
        _ => unreachable!("ops_string::execute called with non-string opcode"),
    }
    Ok(())
}
