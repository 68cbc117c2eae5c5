//! Three-address intermediate representation.
//!
//! Every instruction has an operation code, up to two source operands and a
//! destination. A function's code is a flat [`CodeList`]; control flow is
//! expressed with labels and jumps only, there is no explicit CFG.

pub mod interpreter;
mod printer;

use std::fmt;

use crate::frontend::symbol_table::{SymbolEntry, SymbolId, Symbols};

pub use printer::{InstructionDisplay, write_program};

/// Jump target. Numbers come from a single counter that is never reset, so
/// labels are unique across the whole program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Int(i32),
    Symbol(SymbolId),
    Label(Label),
}

impl Operand {
    pub fn as_symbol(self) -> Option<SymbolId> {
        match self {
            Operand::Symbol(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_label(self) -> Option<Label> {
        match self {
            Operand::Label(label) => Some(label),
            _ => None,
        }
    }

    pub fn as_int(self) -> Option<i32> {
        match self {
            Operand::Int(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Assign,
    Goto,
    // Conditional branches: jump to `dest` when `src1 <op> src2` holds
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Label,
    Enter,
    Leave,
    Param,
    Call,
    Return,
    SetRetVal,
    GetRetVal,
}

impl OpCode {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OpCode::Eq | OpCode::Ne | OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Neg => "neg",
            OpCode::Assign => "assign",
            OpCode::Goto => "goto",
            OpCode::Eq => "eq",
            OpCode::Ne => "ne",
            OpCode::Lt => "lt",
            OpCode::Le => "le",
            OpCode::Gt => "gt",
            OpCode::Ge => "ge",
            OpCode::Label => "label",
            OpCode::Enter => "enter",
            OpCode::Leave => "leave",
            OpCode::Param => "param",
            OpCode::Call => "call",
            OpCode::Return => "return",
            OpCode::SetRetVal => "set_retval",
            OpCode::GetRetVal => "get_retval",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub op: OpCode,
    pub src1: Option<Operand>,
    pub src2: Option<Operand>,
    pub dest: Option<Operand>,
}

impl Instruction {
    fn new(
        op: OpCode,
        src1: Option<Operand>,
        src2: Option<Operand>,
        dest: Option<Operand>,
    ) -> Self {
        Instruction {
            op,
            src1,
            src2,
            dest,
        }
    }

    /// `dest = lhs <op> rhs` for one of the four arithmetic operators
    pub fn binary(op: OpCode, lhs: SymbolId, rhs: SymbolId, dest: SymbolId) -> Self {
        debug_assert!(matches!(
            op,
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div
        ));
        Self::new(
            op,
            Some(Operand::Symbol(lhs)),
            Some(Operand::Symbol(rhs)),
            Some(Operand::Symbol(dest)),
        )
    }

    pub fn neg(src: SymbolId, dest: SymbolId) -> Self {
        Self::new(
            OpCode::Neg,
            Some(Operand::Symbol(src)),
            None,
            Some(Operand::Symbol(dest)),
        )
    }

    pub fn assign(src: Operand, dest: SymbolId) -> Self {
        Self::new(OpCode::Assign, Some(src), None, Some(Operand::Symbol(dest)))
    }

    pub fn goto(target: Label) -> Self {
        Self::new(OpCode::Goto, None, None, Some(Operand::Label(target)))
    }

    pub fn cond_jump(op: OpCode, lhs: SymbolId, rhs: SymbolId, target: Label) -> Self {
        debug_assert!(op.is_comparison());
        Self::new(
            op,
            Some(Operand::Symbol(lhs)),
            Some(Operand::Symbol(rhs)),
            Some(Operand::Label(target)),
        )
    }

    pub fn label(label: Label) -> Self {
        Self::new(OpCode::Label, None, None, Some(Operand::Label(label)))
    }

    pub fn enter(func: SymbolId) -> Self {
        Self::new(OpCode::Enter, None, None, Some(Operand::Symbol(func)))
    }

    pub fn leave(func: SymbolId) -> Self {
        Self::new(OpCode::Leave, None, None, Some(Operand::Symbol(func)))
    }

    pub fn param(arg: SymbolId) -> Self {
        Self::new(OpCode::Param, Some(Operand::Symbol(arg)), None, None)
    }

    pub fn call(callee: SymbolId, num_args: usize) -> Self {
        Self::new(
            OpCode::Call,
            Some(Operand::Symbol(callee)),
            Some(Operand::Int(num_args as i32)),
            None,
        )
    }

    pub fn ret() -> Self {
        Self::new(OpCode::Return, None, None, None)
    }

    pub fn set_retval(src: SymbolId) -> Self {
        Self::new(OpCode::SetRetVal, Some(Operand::Symbol(src)), None, None)
    }

    pub fn get_retval(dest: SymbolId) -> Self {
        Self::new(OpCode::GetRetVal, None, None, Some(Operand::Symbol(dest)))
    }

    pub fn display<'a>(&'a self, symbols: Symbols<'a>) -> InstructionDisplay<'a> {
        InstructionDisplay::new(self, symbols)
    }
}

/// Ordered instruction sequence owned by one syntax-tree node until its
/// parent splices it into its own list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeList {
    instrs: Vec<Instruction>,
}

impl CodeList {
    pub fn new() -> Self {
        CodeList { instrs: Vec::new() }
    }

    pub fn push(&mut self, instr: Instruction) {
        self.instrs.push(instr);
    }

    /// Moves every instruction of `other` to the end of this list.
    pub fn append(&mut self, mut other: CodeList) {
        self.instrs.append(&mut other.instrs);
    }

    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instrs.iter()
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.instrs
    }
}

impl From<Vec<Instruction>> for CodeList {
    fn from(instrs: Vec<Instruction>) -> Self {
        CodeList { instrs }
    }
}

impl FromIterator<Instruction> for CodeList {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        CodeList {
            instrs: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CodeList {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instrs.into_iter()
    }
}

impl<'a> IntoIterator for &'a CodeList {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instrs.iter()
    }
}

/// Code and result location of a value-producing subtree.
/// The place is always a variable or temporary, never a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub code: CodeList,
    pub place: SymbolId,
}

/// Code and per-element places of an expression list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFragment {
    pub code: CodeList,
    pub places: Vec<SymbolId>,
}

impl ListFragment {
    /// Place of the first element, if the list is not empty
    pub fn place(&self) -> Option<SymbolId> {
        self.places.first().copied()
    }
}

/// A lowered function together with its frame.
#[derive(Debug, Clone)]
pub struct FunctionIr {
    pub name: String,
    pub symbol: SymbolId,
    pub code: CodeList,
    /// LOCAL scope as it stood once frame offsets were assigned
    pub frame: Vec<SymbolEntry>,
}

impl FunctionIr {
    pub fn symbols<'a>(&'a self, globals: &'a [SymbolEntry]) -> Symbols<'a> {
        Symbols::new(globals, &self.frame)
    }

    /// Parameters in declaration order
    pub fn params(&self) -> impl Iterator<Item = &SymbolEntry> + '_ {
        self.frame.iter().filter(|entry| entry.is_param())
    }
}

#[derive(Debug, Clone, Default)]
pub struct IrProgram {
    pub globals: Vec<SymbolEntry>,
    pub functions: Vec<FunctionIr>,
}

impl IrProgram {
    pub fn function(&self, name: &str) -> Option<&FunctionIr> {
        self.functions.iter().find(|func| func.name == name)
    }

    pub fn symbols_of<'a>(&'a self, func: &'a FunctionIr) -> Symbols<'a> {
        func.symbols(&self.globals)
    }
}
