//! Reference interpreter for the three-address IR.
//!
//! Mirrors the machine the assembly targets: one return-value register,
//! arguments pushed one word at a time and popped by the caller after the
//! call, and a built-in `println`. Used to check lowered code without an
//! assembler or simulator.

use std::collections::HashMap;

use log::trace;
use thiserror::Error;

use super::{FunctionIr, Instruction, IrProgram, Label, OpCode, Operand};
use crate::frontend::symbol_table::{PRINTLN, Scope, SymbolId};

/// Values of the LOCAL variables of one activation
pub type Frame = HashMap<SymbolId, i32>;

const DEFAULT_STEP_LIMIT: usize = 1_000_000;
const DEFAULT_CALL_DEPTH_LIMIT: usize = 10_000;

// Headroom left before growing the host stack, and the size of each new segment
const STACK_RED_ZONE: usize = 256 * 1024;
const STACK_GROWTH: usize = 8 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("jump to {0}, which is not defined in the running code")]
    UnknownLabel(Label),

    #[error("call to undefined function `{0}`")]
    UndefinedFunction(String),

    #[error("`{op}` instruction is missing an operand or has one of the wrong kind")]
    BadOperand { op: OpCode },

    #[error("call pops {wanted} arguments but only {pushed} were pushed")]
    MissingArguments { wanted: usize, pushed: usize },

    #[error("gave up after {0} steps")]
    StepLimitExceeded(usize),

    #[error("more than {0} nested calls")]
    CallDepthExceeded(usize),
}

/// How a piece of code stopped running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    FellThrough,
    Returned,
}

pub struct Interpreter<'p> {
    program: &'p IrProgram,
    globals: HashMap<usize, i32>,
    ret_val: i32,
    pending_args: Vec<i32>,
    output: Vec<i32>,
    steps: usize,
    step_limit: usize,
    depth: usize,
    call_depth_limit: usize,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p IrProgram) -> Self {
        Interpreter {
            program,
            globals: HashMap::new(),
            ret_val: 0,
            pending_args: Vec::new(),
            output: Vec::new(),
            steps: 0,
            step_limit: DEFAULT_STEP_LIMIT,
            depth: 0,
            call_depth_limit: DEFAULT_CALL_DEPTH_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_call_depth_limit(mut self, call_depth_limit: usize) -> Self {
        self.call_depth_limit = call_depth_limit;
        self
    }

    /// Values printed with `println`, in order
    pub fn output(&self) -> &[i32] {
        &self.output
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn global(&self, name: &str) -> Option<i32> {
        let index = self.program.globals.iter().position(|g| g.name == name)?;
        Some(self.globals.get(&index).copied().unwrap_or(0))
    }

    /// Calls `name` with `args` and returns whatever it left in the
    /// return-value register.
    pub fn call(&mut self, name: &str, args: &[i32]) -> Result<i32, ExecError> {
        let func = self
            .program
            .function(name)
            .ok_or_else(|| ExecError::UndefinedFunction(name.to_string()))?;
        self.invoke(func, args)?;
        Ok(self.ret_val)
    }

    fn invoke(&mut self, func: &'p FunctionIr, args: &[i32]) -> Result<(), ExecError> {
        if self.depth >= self.call_depth_limit {
            return Err(ExecError::CallDepthExceeded(self.call_depth_limit));
        }
        trace!("entering {} with {:?}", func.name, args);
        let mut frame = Frame::new();
        let params = func
            .frame
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_param())
            .map(|(index, _)| SymbolId::new(Scope::Local, index));
        for (id, &value) in params.zip(args) {
            frame.insert(id, value);
        }

        // The caller's pushes must not leak into this activation
        let saved_args = std::mem::take(&mut self.pending_args);
        self.depth += 1;
        // Each IR call nests `invoke` and `exec` on the host stack
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            self.exec(func.code.as_slice(), &mut frame)
        });
        self.depth -= 1;
        self.pending_args = saved_args;
        result.map(|_| ())
    }

    /// Runs `code` against `frame` until it returns or falls off the end.
    pub fn exec(&mut self, code: &[Instruction], frame: &mut Frame) -> Result<Exit, ExecError> {
        let labels: HashMap<Label, usize> = code
            .iter()
            .enumerate()
            .filter(|(_, instr)| instr.op == OpCode::Label)
            .filter_map(|(pc, instr)| instr.dest.and_then(Operand::as_label).map(|l| (l, pc)))
            .collect();

        let mut pc = 0;
        while let Some(instr) = code.get(pc) {
            self.steps += 1;
            if self.steps > self.step_limit {
                return Err(ExecError::StepLimitExceeded(self.step_limit));
            }
            pc += 1;

            let op = instr.op;
            match op {
                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                    let lhs = self.read(instr.src1, frame, op)?;
                    let rhs = self.read(instr.src2, frame, op)?;
                    let value = match op {
                        OpCode::Add => lhs.wrapping_add(rhs),
                        OpCode::Sub => lhs.wrapping_sub(rhs),
                        OpCode::Mul => lhs.wrapping_mul(rhs),
                        _ if rhs == 0 => return Err(ExecError::DivisionByZero),
                        // i32::MIN / -1 wraps like the other operators
                        _ => lhs.wrapping_div(rhs),
                    };
                    self.write(instr.dest, value, frame, op)?;
                }
                OpCode::Neg => {
                    let value = self.read(instr.src1, frame, op)?;
                    self.write(instr.dest, value.wrapping_neg(), frame, op)?;
                }
                OpCode::Assign => {
                    let value = self.read(instr.src1, frame, op)?;
                    self.write(instr.dest, value, frame, op)?;
                }
                OpCode::Goto => pc = jump_target(&labels, instr, op)?,
                OpCode::Eq | OpCode::Ne | OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge => {
                    let lhs = self.read(instr.src1, frame, op)?;
                    let rhs = self.read(instr.src2, frame, op)?;
                    if compare(op, lhs, rhs) {
                        pc = jump_target(&labels, instr, op)?;
                    }
                }
                OpCode::Label | OpCode::Enter | OpCode::Leave => {}
                OpCode::Param => {
                    let value = self.read(instr.src1, frame, op)?;
                    self.pending_args.push(value);
                }
                OpCode::Call => self.exec_call(instr)?,
                OpCode::Return => return Ok(Exit::Returned),
                OpCode::SetRetVal => self.ret_val = self.read(instr.src1, frame, op)?,
                OpCode::GetRetVal => self.write(instr.dest, self.ret_val, frame, op)?,
            }
        }
        Ok(Exit::FellThrough)
    }

    fn exec_call(&mut self, instr: &Instruction) -> Result<(), ExecError> {
        let bad = ExecError::BadOperand { op: OpCode::Call };
        let callee = instr.src1.and_then(Operand::as_symbol).ok_or(bad.clone())?;
        let num_args = instr.src2.and_then(Operand::as_int).ok_or(bad)? as usize;

        let pushed = self.pending_args.len();
        if pushed < num_args {
            return Err(ExecError::MissingArguments {
                wanted: num_args,
                pushed,
            });
        }
        // The last push is the first argument
        let args: Vec<i32> = self.pending_args.drain(pushed - num_args..).rev().collect();

        let program = self.program;
        let name = match callee.scope() {
            Scope::Global => program
                .globals
                .get(callee.index())
                .map(|entry| entry.name.as_str()),
            Scope::Local => None,
        }
        .ok_or_else(|| ExecError::UndefinedFunction(format!("{:?}", callee)))?;

        if let Some(func) = program.function(name) {
            self.invoke(func, &args)
        } else if name == PRINTLN {
            self.output.extend(args.first());
            Ok(())
        } else {
            Err(ExecError::UndefinedFunction(name.to_string()))
        }
    }

    fn read(&self, operand: Option<Operand>, frame: &Frame, op: OpCode) -> Result<i32, ExecError> {
        match operand {
            Some(Operand::Int(value)) => Ok(value),
            Some(Operand::Symbol(id)) => Ok(match id.scope() {
                Scope::Global => self.globals.get(&id.index()).copied().unwrap_or(0),
                Scope::Local => frame.get(&id).copied().unwrap_or(0),
            }),
            _ => Err(ExecError::BadOperand { op }),
        }
    }

    fn write(
        &mut self,
        operand: Option<Operand>,
        value: i32,
        frame: &mut Frame,
        op: OpCode,
    ) -> Result<(), ExecError> {
        match operand.and_then(Operand::as_symbol) {
            Some(id) => {
                match id.scope() {
                    Scope::Global => self.globals.insert(id.index(), value),
                    Scope::Local => frame.insert(id, value),
                };
                Ok(())
            }
            None => Err(ExecError::BadOperand { op }),
        }
    }
}

fn jump_target(
    labels: &HashMap<Label, usize>,
    instr: &Instruction,
    op: OpCode,
) -> Result<usize, ExecError> {
    let label = instr
        .dest
        .and_then(Operand::as_label)
        .ok_or(ExecError::BadOperand { op })?;
    labels
        .get(&label)
        .copied()
        .ok_or(ExecError::UnknownLabel(label))
}

fn compare(op: OpCode, lhs: i32, rhs: i32) -> bool {
    match op {
        OpCode::Eq => lhs == rhs,
        OpCode::Ne => lhs != rhs,
        OpCode::Lt => lhs < rhs,
        OpCode::Le => lhs <= rhs,
        OpCode::Gt => lhs > rhs,
        OpCode::Ge => lhs >= rhs,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::symbol_table::SymbolTable;
    use crate::ir::{CodeList, FunctionIr};

    #[test]
    fn infinite_loop_hits_step_limit() {
        let program = IrProgram::default();
        let code: CodeList = vec![
            Instruction::label(Label(0)),
            Instruction::goto(Label(0)),
        ]
        .into();
        let mut interp = Interpreter::new(&program).with_step_limit(100);
        let err = interp.exec(code.as_slice(), &mut Frame::new()).unwrap_err();
        assert_eq!(err, ExecError::StepLimitExceeded(100));
    }

    #[test]
    fn jump_outside_code_is_reported() {
        let program = IrProgram::default();
        let code: CodeList = vec![Instruction::goto(Label(9))].into();
        let mut interp = Interpreter::new(&program);
        let err = interp.exec(code.as_slice(), &mut Frame::new()).unwrap_err();
        assert_eq!(err, ExecError::UnknownLabel(Label(9)));
    }

    #[test]
    fn println_collects_output_and_pops_its_argument() {
        let mut table = SymbolTable::with_builtins();
        let println = table.lookup(PRINTLN).unwrap();
        let x = table.declare_variable(Scope::Local, "x", false);
        let program = IrProgram {
            globals: table.globals().to_vec(),
            functions: Vec::new(),
        };

        let code: CodeList = vec![
            Instruction::assign(Operand::Int(17), x),
            Instruction::param(x),
            Instruction::call(println, 1),
            Instruction::param(x),
            Instruction::call(println, 1),
        ]
        .into();
        let mut interp = Interpreter::new(&program);
        let exit = interp.exec(code.as_slice(), &mut Frame::new()).unwrap();
        assert_eq!(exit, Exit::FellThrough);
        assert_eq!(interp.output(), [17, 17]);
    }

    #[test]
    fn call_without_enough_pushes_fails() {
        let table = SymbolTable::with_builtins();
        let println = table.lookup(PRINTLN).unwrap();
        let program = IrProgram {
            globals: table.globals().to_vec(),
            functions: Vec::new(),
        };
        let code: CodeList = vec![Instruction::call(println, 1)].into();
        let mut interp = Interpreter::new(&program);
        let err = interp.exec(code.as_slice(), &mut Frame::new()).unwrap_err();
        assert_eq!(err, ExecError::MissingArguments { wanted: 1, pushed: 0 });
    }

    fn self_calling_main() -> IrProgram {
        let mut table = SymbolTable::with_builtins();
        let main = table.declare_function("main", 0);
        let code: CodeList = vec![
            Instruction::enter(main),
            Instruction::call(main, 0),
            Instruction::leave(main),
            Instruction::ret(),
        ]
        .into();
        IrProgram {
            globals: table.globals().to_vec(),
            functions: vec![FunctionIr {
                name: "main".to_string(),
                symbol: main,
                code,
                frame: Vec::new(),
            }],
        }
    }

    #[test]
    fn unbounded_recursion_hits_call_depth_limit() {
        let program = self_calling_main();
        let mut interp = Interpreter::new(&program).with_call_depth_limit(50);
        let err = interp.call("main", &[]).unwrap_err();
        assert_eq!(err, ExecError::CallDepthExceeded(50));
    }

    #[test]
    fn default_call_depth_limit_stops_before_step_limit() {
        let program = self_calling_main();
        let mut interp = Interpreter::new(&program);
        let err = interp.call("main", &[]).unwrap_err();
        assert_eq!(err, ExecError::CallDepthExceeded(DEFAULT_CALL_DEPTH_LIMIT));
    }

    #[test]
    fn min_divided_by_minus_one_wraps() {
        let program = IrProgram::default();
        let mut table = SymbolTable::new();
        let y = table.declare_variable(Scope::Local, "y", false);
        let m = table.declare_variable(Scope::Local, "m", false);
        let x = table.declare_variable(Scope::Local, "x", false);
        let code: CodeList = vec![
            Instruction::assign(Operand::Int(i32::MIN), y),
            Instruction::assign(Operand::Int(-1), m),
            Instruction::binary(OpCode::Div, y, m, x),
        ]
        .into();
        let mut frame = Frame::new();
        Interpreter::new(&program)
            .exec(code.as_slice(), &mut frame)
            .unwrap();
        assert_eq!(frame[&x], i32::MIN);
    }
}
