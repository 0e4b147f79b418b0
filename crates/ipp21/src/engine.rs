//! # Execution Engine
//!
//! A dispatch loop over a program counter that manipulates the frame
//! system, call stack, and data stack built up from [`crate::loader`]'s
//! [`Program`]. Per-opcode handlers are grouped the way the teacher splits
//! its VM into sibling modules: [`ops_arith`] (arithmetic/comparison/logic),
//! [`ops_string`] (string ops and type conversions), and [`ops_control`]
//! (moves, frames, control flow, stack ops, I/O, debug).
//!
//! `CALL`/`RETURN`/`JUMP*` stay in this module rather than `ops_control`
//! since they're the only handlers that touch `pc` and the call stack
//! directly, alongside the label table owned by [`Program`].

use std::io::Write;

use crate::error::{ErrorKind, IppError};
use crate::frame::Frames;
use crate::instruction::{Instruction, Operand, Program, VarRef};
use crate::io::LineSource;
use crate::opcode::Opcode;
use crate::stats::Stats;
use crate::value::Value;

mod ops_arith;
mod ops_control;
mod ops_string;

/// How the run ended: normally (0), via `EXIT`, or the caller observed an
/// `Err(IppError)` instead and never sees this type at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: i32,
}

/// Owns every piece of mutable engine state: the program counter, frames,
/// the two LIFO stacks, statistics, and the I/O boundary.
pub struct Engine<'a> {
    program: &'a Program,
    frames: Frames,
    data_stack: Vec<Value>,
    call_stack: Vec<usize>,
    pc: usize,
    stats: Stats,
    input: Box<dyn LineSource>,
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
}

impl<'a> Engine<'a> {
    pub fn new(
        program: &'a Program,
        input: Box<dyn LineSource>,
        stdout: &'a mut dyn Write,
        stderr: &'a mut dyn Write,
    ) -> Self {
        Engine {
            program,
            frames: Frames::new(),
            data_stack: Vec::new(),
            call_stack: Vec::new(),
            pc: 0,
            stats: Stats::new(),
            input,
            stdout,
            stderr,
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Run until the program counter runs off the end or `EXIT` fires.
    pub fn run(&mut self) -> Result<ExitOutcome, IppError> {
        while self.pc < self.program.len() {
            let instr = self.program.instructions[self.pc].clone();
            self.pc += 1;

            let exit_code = self.execute(&instr)?;

            if instr.opcode.counts_toward_stats() {
                self.stats.record_instruction(instr.opcode, instr.order);
            }
            self.stats.sample_vars(self.frames.initialized_count());

            if let Some(code) = exit_code {
                return Ok(ExitOutcome { code });
            }
        }
        Ok(ExitOutcome { code: 0 })
    }

    /// Execute one instruction. Returns `Some(code)` iff it was `EXIT`.
    fn execute(&mut self, instr: &Instruction) -> Result<Option<i32>, IppError> {
        use Opcode::*;
        match instr.opcode {
            Add | Sub | Mul | Idiv | Div | Lt | Gt | Eq | And | Or | Not | Adds | Subs | Muls
            | Idivs | Divs | Lts | Gts | Eqs | Ands | Ors | Nots => {
                ops_arith::execute(instr.opcode, &instr.args, &mut self.frames, &mut self.data_stack)?;
            }
            Concat | GetChar | Stri2Int | SetChar | Strlen | Int2Char | Int2Float | Float2Int
            | Int2Chars | Int2Floats | Float2Ints | Stri2Ints => {
                ops_string::execute(instr.opcode, &instr.args, &mut self.frames, &mut self.data_stack)?;
            }
            Move | CreateFrame | PushFrame | PopFrame | DefVar | Type | Pushs | Pops | Clears
            | Read | Write | Dprint | Break => {
                ops_control::execute(self, instr.opcode, &instr.args)?;
            }
            Call => self.do_call(&instr.args[0])?,
            Return => self.do_return()?,
            Label => {}
            Jump => self.do_jump(&instr.args[0])?,
            JumpIfEq | JumpIfNeq => self.do_jump_if(instr.opcode, &instr.args)?,
            JumpIfEqs | JumpIfNeqs => self.do_jump_if_stack(instr.opcode, &instr.args)?,
            Exit => return self.do_exit(&instr.args[0]).map(Some),
        }
        Ok(None)
    }

    fn label_target(&self, name: &str) -> Result<usize, IppError> {
        self.program
            .labels
            .get(name)
            .map(|idx| idx + 1)
            .ok_or_else(|| ErrorKind::UndefRedef.with_msg(format!("undeclared label {name}")))
    }

    fn do_call(&mut self, label_arg: &Operand) -> Result<(), IppError> {
        let name = label_name(label_arg)?;
        let target = self.label_target(name)?;
        self.call_stack.push(self.pc);
        self.pc = target;
        Ok(())
    }

    fn do_return(&mut self) -> Result<(), IppError> {
        self.pc = self
            .call_stack
            .pop()
            .ok_or_else(|| ErrorKind::MissingVal.with_msg("RETURN: call stack is empty"))?;
        Ok(())
    }

    fn do_jump(&mut self, label_arg: &Operand) -> Result<(), IppError> {
        let name = label_name(label_arg)?;
        self.pc = self.label_target(name)?;
        Ok(())
    }

    fn do_jump_if(&mut self, op: Opcode, args: &[Operand]) -> Result<(), IppError> {
        let name = label_name(&args[0])?;
        let target = self.label_target(name)?;
        let a = resolve_symb(&self.frames, &args[1])?;
        let b = resolve_symb(&self.frames, &args[2])?;
        let equal = matches!(crate::value::eq(&a, &b)?, Value::Bool(true));
        let take = if op == Opcode::JumpIfEq { equal } else { !equal };
        if take {
            self.pc = target;
        }
        Ok(())
    }

    fn do_jump_if_stack(&mut self, op: Opcode, args: &[Operand]) -> Result<(), IppError> {
        let name = label_name(&args[0])?;
        let target = self.label_target(name)?;
        let b = pop(&mut self.data_stack)?;
        let a = pop(&mut self.data_stack)?;
        let equal = matches!(crate::value::eq(&a, &b)?, Value::Bool(true));
        let take = if op == Opcode::JumpIfEqs { equal } else { !equal };
        if take {
            self.pc = target;
        }
        Ok(())
    }

    fn do_exit(&mut self, arg: &Operand) -> Result<i32, IppError> {
        let v = resolve_symb(&self.frames, arg)?;
        match v {
            Value::Int(i) if (0..=49).contains(&i) => Ok(i as i32),
            Value::Int(_) => Err(ErrorKind::BadOperandVal.with_msg("EXIT: value out of range [0,49]")),
            other => Err(ErrorKind::BadOperandType.with_msg(format!("EXIT: expected int, got {}", other.type_name()))),
        }
    }
}

fn label_name(operand: &Operand) -> Result<&str, IppError> {
    match operand {
        Operand::Label(name) => Ok(name),
        _ => Err(ErrorKind::Internal.with_msg("expected label operand")),
    }
}

fn var_ref(operand: &Operand) -> Result<&VarRef, IppError> {
    match operand {
        Operand::Var(v) => Ok(v),
        _ => Err(ErrorKind::Internal.with_msg("expected var operand")),
    }
}

fn resolve_symb(frames: &Frames, operand: &Operand) -> Result<Value, IppError> {
    match operand {
        Operand::Literal(v) => Ok(v.clone()),
        Operand::Var(v) => frames.read_value(v).cloned(),
        _ => Err(ErrorKind::Internal.with_msg("expected symb operand")),
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, IppError> {
    stack.pop().ok_or_else(|| ErrorKind::MissingVal.with_msg("data stack is empty"))
}

fn push(stack: &mut Vec<Value>, v: Value) {
    stack.push(v);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::FrameTag;
    use std::collections::HashMap;

    struct NoInput;
    impl LineSource for NoInput {
        fn next_line(&mut self) -> Option<String> {
            None
        }
    }

    fn gf(name: &str) -> VarRef {
        VarRef { frame: FrameTag::Global, name: name.to_string() }
    }

    fn lit(v: Value) -> Operand {
        Operand::Literal(v)
    }

    fn run_program(instructions: Vec<Instruction>, labels: HashMap<String, usize>) -> (ExitOutcome, String) {
        let program = Program::new(instructions, labels);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = {
            let mut engine = Engine::new(&program, Box::new(NoInput), &mut out, &mut err);
            engine.run().unwrap()
        };
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn scenario_one_writes_five_and_exits_zero() {
        let instrs = vec![
            Instruction { opcode: Opcode::DefVar, args: vec![Operand::Var(gf("a"))], order: 1 },
            Instruction { opcode: Opcode::Move, args: vec![Operand::Var(gf("a")), lit(Value::Int(5))], order: 2 },
            Instruction { opcode: Opcode::Write, args: vec![Operand::Var(gf("a"))], order: 3 },
            Instruction { opcode: Opcode::Exit, args: vec![lit(Value::Int(0))], order: 4 },
        ];
        let (outcome, stdout) = run_program(instrs, HashMap::new());
        assert_eq!(outcome.code, 0);
        assert_eq!(stdout, "5");
    }

    #[test]
    fn idiv_by_zero_is_bad_operand_val() {
        let instrs = vec![
            Instruction { opcode: Opcode::DefVar, args: vec![Operand::Var(gf("x"))], order: 1 },
            Instruction { opcode: Opcode::Move, args: vec![Operand::Var(gf("x")), lit(Value::Int(7))], order: 2 },
            Instruction { opcode: Opcode::DefVar, args: vec![Operand::Var(gf("y"))], order: 3 },
            Instruction {
                opcode: Opcode::Idiv,
                args: vec![Operand::Var(gf("y")), Operand::Var(gf("x")), lit(Value::Int(0))],
                order: 4,
            },
        ];
        let program = Program::new(instrs, HashMap::new());
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut engine = Engine::new(&program, Box::new(NoInput), &mut out, &mut err);
        let e = engine.run().unwrap_err();
        assert_eq!(e.kind, ErrorKind::BadOperandVal);
    }

    #[test]
    fn call_return_restores_pc_after_call_site() {
        // LABEL sub; RETURN
        // CALL sub; WRITE GF@a (a set to 1 before call, 2 after return)
        let mut labels = HashMap::new();
        labels.insert("sub".to_string(), 6);
        let instrs = vec![
            Instruction { opcode: Opcode::DefVar, args: vec![Operand::Var(gf("a"))], order: 1 },
            Instruction { opcode: Opcode::Move, args: vec![Operand::Var(gf("a")), lit(Value::Int(1))], order: 2 },
            Instruction { opcode: Opcode::Call, args: vec![Operand::Label("sub".into())], order: 3 },
            Instruction { opcode: Opcode::Move, args: vec![Operand::Var(gf("a")), lit(Value::Int(2))], order: 4 },
            Instruction { opcode: Opcode::Write, args: vec![Operand::Var(gf("a"))], order: 5 },
            Instruction { opcode: Opcode::Exit, args: vec![lit(Value::Int(0))], order: 6 },
            Instruction { opcode: Opcode::Label, args: vec![Operand::Label("sub".into())], order: 7 },
            Instruction { opcode: Opcode::Return, args: vec![], order: 8 },
        ];
        let (outcome, stdout) = run_program(instrs, labels);
        assert_eq!(outcome.code, 0);
        assert_eq!(stdout, "2");
    }

    #[test]
    fn stack_add_matches_non_stack_add() {
        let instrs = vec![
            Instruction { opcode: Opcode::DefVar, args: vec![Operand::Var(gf("r"))], order: 1 },
            Instruction { opcode: Opcode::Pushs, args: vec![lit(Value::Int(2))], order: 2 },
            Instruction { opcode: Opcode::Pushs, args: vec![lit(Value::Int(3))], order: 3 },
            Instruction { opcode: Opcode::Adds, args: vec![], order: 4 },
            Instruction { opcode: Opcode::Pops, args: vec![Operand::Var(gf("r"))], order: 5 },
            Instruction { opcode: Opcode::Write, args: vec![Operand::Var(gf("r"))], order: 6 },
        ];
        let (_, stdout) = run_program(instrs, HashMap::new());
        assert_eq!(stdout, "5");
    }

    #[test]
    fn return_without_call_is_missing_val() {
        let instrs = vec![Instruction { opcode: Opcode::Return, args: vec![], order: 1 }];
        let program = Program::new(instrs, HashMap::new());
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut engine = Engine::new(&program, Box::new(NoInput), &mut out, &mut err);
        let e = engine.run().unwrap_err();
        assert_eq!(e.kind, ErrorKind::MissingVal);
    }

    #[test]
    fn jump_to_undeclared_label_is_undef_redef() {
        let instrs = vec![Instruction { opcode: Opcode::Jump, args: vec![Operand::Label("nope".into())], order: 1 }];
        let program = Program::new(instrs, HashMap::new());
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut engine = Engine::new(&program, Box::new(NoInput), &mut out, &mut err);
        let e = engine.run().unwrap_err();
        assert_eq!(e.kind, ErrorKind::UndefRedef);
    }

    #[test]
    fn exit_out_of_range_is_bad_operand_val() {
        let instrs = vec![Instruction { opcode: Opcode::Exit, args: vec![lit(Value::Int(50))], order: 1 }];
        let program = Program::new(instrs, HashMap::new());
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut engine = Engine::new(&program, Box::new(NoInput), &mut out, &mut err);
        let e = engine.run().unwrap_err();
        assert_eq!(e.kind, ErrorKind::BadOperandVal);
    }
}
