//! # Opcode Table
//!
//! A closed enumeration of every IPPcode21 instruction, plus the fixed
//! arity/operand-kind table the loader validates against and the engine
//! dispatches on. No reflective or string-keyed dispatch anywhere — this is
//! the single source of truth both the loader and the engine consult.

use std::fmt;

/// The operand category a single argument position accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandKind {
    /// A variable reference (`FRAME@name`); the slot itself, not its value.
    Var,
    /// A literal or variable reference (`symb`): int, float, string, bool,
    /// nil, or var.
    Symb,
    /// A label name.
    Label,
    /// A type token (`int`/`string`/`bool`/`float`), used by `READ`.
    Type,
}

/// Every IPPcode21 opcode, closed over the fixed instruction set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Move,
    CreateFrame,
    PushFrame,
    PopFrame,
    Return,
    DefVar,
    Pops,
    Call,
    Label,
    Jump,
    Pushs,
    Write,
    Exit,
    Dprint,
    Add,
    Sub,
    Mul,
    Idiv,
    Div,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Concat,
    GetChar,
    Stri2Int,
    Not,
    Int2Char,
    Int2Float,
    Float2Int,
    Strlen,
    Type,
    SetChar,
    Read,
    JumpIfEq,
    JumpIfNeq,
    Adds,
    Subs,
    Muls,
    Idivs,
    Divs,
    Lts,
    Gts,
    Eqs,
    Ands,
    Ors,
    Nots,
    Int2Chars,
    Int2Floats,
    Float2Ints,
    Stri2Ints,
    Clears,
    Break,
    JumpIfEqs,
    JumpIfNeqs,
}

impl Opcode {
    /// Parse an opcode from its uppercase mnemonic (`"MOVE"`, `"ADDS"`, ...).
    ///
    /// The caller is responsible for upper-casing the source text first, as
    /// the loader does before calling this.
    pub fn from_mnemonic(s: &str) -> Option<Opcode> {
        use Opcode::*;
        Some(match s {
            "MOVE" => Move,
            "CREATEFRAME" => CreateFrame,
            "PUSHFRAME" => PushFrame,
            "POPFRAME" => PopFrame,
            "RETURN" => Return,
            "DEFVAR" => DefVar,
            "POPS" => Pops,
            "CALL" => Call,
            "LABEL" => Label,
            "JUMP" => Jump,
            "PUSHS" => Pushs,
            "WRITE" => Write,
            "EXIT" => Exit,
            "DPRINT" => Dprint,
            "ADD" => Add,
            "SUB" => Sub,
            "MUL" => Mul,
            "IDIV" => Idiv,
            "DIV" => Div,
            "LT" => Lt,
            "GT" => Gt,
            "EQ" => Eq,
            "AND" => And,
            "OR" => Or,
            "CONCAT" => Concat,
            "GETCHAR" => GetChar,
            "STRI2INT" => Stri2Int,
            "NOT" => Not,
            "INT2CHAR" => Int2Char,
            "INT2FLOAT" => Int2Float,
            "FLOAT2INT" => Float2Int,
            "STRLEN" => Strlen,
            "TYPE" => Type,
            "SETCHAR" => SetChar,
            "READ" => Read,
            "JUMPIFEQ" => JumpIfEq,
            "JUMPIFNEQ" => JumpIfNeq,
            "ADDS" => Adds,
            "SUBS" => Subs,
            "MULS" => Muls,
            "IDIVS" => Idivs,
            "DIVS" => Divs,
            "LTS" => Lts,
            "GTS" => Gts,
            "EQS" => Eqs,
            "ANDS" => Ands,
            "ORS" => Ors,
            "NOTS" => Nots,
            "INT2CHARS" => Int2Chars,
            "INT2FLOATS" => Int2Floats,
            "FLOAT2INTS" => Float2Ints,
            "STRI2INTS" => Stri2Ints,
            "CLEARS" => Clears,
            "BREAK" => Break,
            "JUMPIFEQS" => JumpIfEqs,
            "JUMPIFNEQS" => JumpIfNeqs,
            _ => return None,
        })
    }

    /// The fixed sequence of operand kinds this opcode takes, in order.
    pub fn operand_kinds(self) -> &'static [OperandKind] {
        use OperandKind::*;
        match self {
            Opcode::Move => &[Var, Symb],
            Opcode::CreateFrame
            | Opcode::PushFrame
            | Opcode::PopFrame
            | Opcode::Return
            | Opcode::Adds
            | Opcode::Subs
            | Opcode::Muls
            | Opcode::Idivs
            | Opcode::Divs
            | Opcode::Lts
            | Opcode::Gts
            | Opcode::Eqs
            | Opcode::Ands
            | Opcode::Ors
            | Opcode::Nots
            | Opcode::Int2Chars
            | Opcode::Int2Floats
            | Opcode::Float2Ints
            | Opcode::Stri2Ints
            | Opcode::Clears
            | Opcode::Break => &[],
            Opcode::DefVar | Opcode::Pops => &[Var],
            Opcode::Call | Opcode::Label | Opcode::Jump => &[Label],
            Opcode::Pushs | Opcode::Write | Opcode::Exit | Opcode::Dprint => &[Symb],
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Idiv
            | Opcode::Div
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or
            | Opcode::Concat
            | Opcode::GetChar
            | Opcode::Stri2Int => &[Var, Symb, Symb],
            Opcode::Not | Opcode::Int2Char | Opcode::Int2Float | Opcode::Float2Int | Opcode::Strlen | Opcode::Type => {
                &[Var, Symb]
            }
            Opcode::SetChar => &[Var, Symb, Symb],
            Opcode::Read => &[Var, Type],
            Opcode::JumpIfEq | Opcode::JumpIfNeq => &[Label, Symb, Symb],
            Opcode::JumpIfEqs | Opcode::JumpIfNeqs => &[Label],
        }
    }

    /// Number of operands this opcode requires.
    pub fn arity(self) -> usize {
        self.operand_kinds().len()
    }

    /// Whether this opcode is excluded from the executed-instruction count
    /// and the hot-opcode tally (`LABEL`, `DPRINT`, `BREAK`).
    pub fn counts_toward_stats(self) -> bool {
        !matches!(self, Opcode::Label | Opcode::Dprint | Opcode::Break)
    }

    /// The canonical uppercase mnemonic, for diagnostics and `DPRINT`/`BREAK`.
    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Move => "MOVE",
            CreateFrame => "CREATEFRAME",
            PushFrame => "PUSHFRAME",
            PopFrame => "POPFRAME",
            Return => "RETURN",
            DefVar => "DEFVAR",
            Pops => "POPS",
            Call => "CALL",
            Label => "LABEL",
            Jump => "JUMP",
            Pushs => "PUSHS",
            Write => "WRITE",
            Exit => "EXIT",
            Dprint => "DPRINT",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Idiv => "IDIV",
            Div => "DIV",
            Lt => "LT",
            Gt => "GT",
            Eq => "EQ",
            And => "AND",
            Or => "OR",
            Concat => "CONCAT",
            GetChar => "GETCHAR",
            Stri2Int => "STRI2INT",
            Not => "NOT",
            Int2Char => "INT2CHAR",
            Int2Float => "INT2FLOAT",
            Float2Int => "FLOAT2INT",
            Strlen => "STRLEN",
            Type => "TYPE",
            SetChar => "SETCHAR",
            Read => "READ",
            JumpIfEq => "JUMPIFEQ",
            JumpIfNeq => "JUMPIFNEQ",
            Adds => "ADDS",
            Subs => "SUBS",
            Muls => "MULS",
            Idivs => "IDIVS",
            Divs => "DIVS",
            Lts => "LTS",
            Gts => "GTS",
            Eqs => "EQS",
            Ands => "ANDS",
            Ors => "ORS",
            Nots => "NOTS",
            Int2Chars => "INT2CHARS",
            Int2Floats => "INT2FLOATS",
            Float2Ints => "FLOAT2INTS",
            Stri2Ints => "STRI2INTS",
            Clears => "CLEARS",
            Break => "BREAK",
            JumpIfEqs => "JUMPIFEQS",
            JumpIfNeqs => "JUMPIFNEQS",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_mnemonic() {
        let all = [
            Opcode::Move, Opcode::CreateFrame, Opcode::PushFrame, Opcode::PopFrame, Opcode::Return,
            Opcode::DefVar, Opcode::Pops, Opcode::Call, Opcode::Label, Opcode::Jump, Opcode::Pushs,
            Opcode::Write, Opcode::Exit, Opcode::Dprint, Opcode::Add, Opcode::Sub, Opcode::Mul,
            Opcode::Idiv, Opcode::Div, Opcode::Lt, Opcode::Gt, Opcode::Eq, Opcode::And, Opcode::Or,
            Opcode::Concat, Opcode::GetChar, Opcode::Stri2Int, Opcode::Not, Opcode::Int2Char,
            Opcode::Int2Float, Opcode::Float2Int, Opcode::Strlen, Opcode::Type, Opcode::SetChar,
            Opcode::Read, Opcode::JumpIfEq, Opcode::JumpIfNeq, Opcode::Adds, Opcode::Subs,
            Opcode::Muls, Opcode::Idivs, Opcode::Divs, Opcode::Lts, Opcode::Gts, Opcode::Eqs,
            Opcode::Ands, Opcode::Ors, Opcode::Nots, Opcode::Int2Chars, Opcode::Int2Floats,
            Opcode::Float2Ints, Opcode::Stri2Ints, Opcode::Clears, Opcode::Break, Opcode::JumpIfEqs,
            Opcode::JumpIfNeqs,
        ];
        for op in all {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
    }

    #[test]
    fn unknown_mnemonic_is_none() {
        assert_eq!(Opcode::from_mnemonic("NOPE"), None);
    }

    #[test]
    fn arities_match_spec_table() {
        assert_eq!(Opcode::Move.arity(), 2);
        assert_eq!(Opcode::CreateFrame.arity(), 0);
        assert_eq!(Opcode::Add.arity(), 3);
        assert_eq!(Opcode::Not.arity(), 2);
        assert_eq!(Opcode::Read.arity(), 2);
        assert_eq!(Opcode::JumpIfEq.arity(), 3);
        assert_eq!(Opcode::JumpIfEqs.arity(), 1);
        assert_eq!(Opcode::Clears.arity(), 0);
    }

    #[test]
    fn label_dprint_break_excluded_from_stats() {
        assert!(!Opcode::Label.counts_toward_stats());
        assert!(!Opcode::Dprint.counts_toward_stats());
        assert!(!Opcode::Break.counts_toward_stats());
        assert!(Opcode::Add.counts_toward_stats());
    }
}
