//! Arithmetic, comparison, and logic opcodes: `ADD`/`SUB`/`MUL`/`IDIV`/`DIV`,
//! `LT`/`GT`/`EQ`, `AND`/`OR`/`NOT`, and their stack-suffixed twins.

use crate::error::IppError;
use crate::frame::Frames;
use crate::instruction::Operand;
use crate::opcode::Opcode;
use crate::value::{self, Value};

use super::{pop, push, resolve_symb, var_ref};

fn binary(op: Opcode, a: &Value, b: &Value) -> Result<Value, IppError> {
    match op {
        Opcode::Add | Opcode::Adds => value::add(a, b),
        Opcode::Sub | Opcode::Subs => value::sub(a, b),
        Opcode::Mul | Opcode::Muls => value::mul(a, b),
        Opcode::Idiv | Opcode::Idivs => value::idiv(a, b),
        Opcode::Div | Opcode::Divs => value::div(a, b),
        Opcode::Lt | Opcode::Lts => value::lt(a, b),
        Opcode::Gt | Opcode::Gts => value::gt(a, b),
        Opcode::Eq | Opcode::Eqs => value::eq(a, b),
        Opcode::And | Opcode::Ands => value::and(a, b),
        Opcode::Or | Opcode::Ors => value::or(a, b),
        _ => unreachable!("ops_arith::binary called with non-binary opcode"),
    }
}

pub(super) fn execute(
    op: Opcode,
    args: &[Operand],
    frames: &mut Frames,
    data_stack: &mut Vec<Value>,
) -> Result<(), IppError> {
    use Opcode::*;
    match op {
        Add | Sub | Mul | Idiv | Div | Lt | Gt | Eq | And | Or => {
            let dest = var_ref(&args[0])?;
            let a = resolve_symb(frames, &args[1])?;
            let b = resolve_symb(frames, &args[2])?;
            let result = binary(op, &a, &b)?;
            frames.write_value(dest, result)?;
        }
        Not => {
            let dest = var_ref(&args[0])?;
            let a = resolve_symb(frames, &args[1])?;
            frames.write_value(dest, value::not(&a)?)?;
        }
        Adds | Subs | Muls | Idivs | Divs | Lts | Gts | Eqs | Ands | Ors => {
            let b = pop(data_stack)?;
            let a = pop(data_stack)?;
            push(data_stack, binary(op, &a, &b)?);
        }
        Nots => {
            let a = pop(data_stack)?;
            push(data_stack, value::not(&a)?);
        }
        _ => unreachable!("ops_arith::execute called with non-arithmetic opcode"),
    }
    Ok(())
}
