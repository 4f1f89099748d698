//! Virtual machine that runs the bytecode

use std::io::{self, BufWriter, Stdout, Write};

use crate::{
    bytecode::{Instruction, Opcode},
    error::{Fault, VmError},
    word::Word,
};

/// Number of cells of the operand stack
pub const STACK_MAX: usize = 1024;

type VmResult<T> = Result<T, VmError>;

/// Outcome of a single step
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Status {
    Running,
    Halted,
}

/// Virtual machine representation
pub struct Vm<'p, W: Write = BufWriter<Stdout>> {
    program: &'p [Instruction],
    ip: usize, // index of the next instruction
    sp: usize, // count of occupied stack cells

    stack: [Word; STACK_MAX],
    out: W, // sink of `dump`
}

impl<'p> Vm<'p, BufWriter<Stdout>> {
    /// Machine that dumps to a buffered standard output
    pub fn new(program: &'p [Instruction]) -> Self {
        Vm::with_output(program, BufWriter::new(io::stdout()))
    }
}

impl<'p, W: Write> Vm<'p, W> {
    pub fn with_output(program: &'p [Instruction], out: W) -> Self {
        Vm {
            program,
            ip: 0,
            sp: 0,
            stack: [Word::ZERO; STACK_MAX],
            out,
        }
    }

    /// Run until `halt` or the first error. Output written by `dump` is flushed either way.
    pub fn run(&mut self) -> Result<(), Fault> {
        loop {
            let current = self.program.get(self.ip).copied();
            match self.step() {
                Ok(Status::Running) => {}
                Ok(Status::Halted) => {
                    return self.flush().map_err(|kind| self.fault(kind, current));
                }
                Err(kind) => {
                    // Keep what was dumped so far in front of the diagnostic.
                    let _ = self.out.flush();
                    return Err(self.fault(kind, current));
                }
            }
        }
    }

    /// Fetch, decode and execute one instruction
    pub fn step(&mut self) -> VmResult<Status> {
        let instruction = *self
            .program
            .get(self.ip)
            .ok_or(VmError::IllegalInstructionAccess)?;
        tracing::trace!(ip = self.ip, sp = self.sp, %instruction, "execute");
        self.ip += 1;

        let operand = instruction.operand;
        match instruction.opcode {
            Opcode::Push => self.push_stack(operand)?,
            Opcode::Plusi => self.binary_op(|b, a| Ok(b.wrapping_add(a)))?,
            Opcode::Minusi => self.binary_op(|b, a| Ok(b.wrapping_sub(a)))?,
            Opcode::Multi => self.binary_op(|b, a| Ok(b.wrapping_mul(a)))?,
            Opcode::Divi => self.binary_op(|b, a| match a {
                0 => Err(VmError::DivisionByZero),
                _ => Ok(b.wrapping_div(a)),
            })?,
            Opcode::Modi => self.binary_op(|b, a| match a {
                0 => Err(VmError::DivisionByZero),
                _ => Ok(b.wrapping_rem(a)),
            })?,
            Opcode::Gti => self.binary_op(|b, a| Ok((b > a) as i64))?,
            Opcode::Gtei => self.binary_op(|b, a| Ok((b >= a) as i64))?,
            Opcode::Lti => self.binary_op(|b, a| Ok((b < a) as i64))?,
            Opcode::Ltei => self.binary_op(|b, a| Ok((b <= a) as i64))?,
            Opcode::Eqi => self.binary_op(|b, a| Ok((b == a) as i64))?,
            Opcode::Neqi => self.binary_op(|b, a| Ok((b != a) as i64))?,
            Opcode::Noti => {
                let value = self.pop_stack()?;
                self.push_stack(Word::from_bool(value.as_i64() == 0))?;
            }
            Opcode::Dup => self.ins_dup(operand)?,
            Opcode::Dump => self.ins_dump()?,
            Opcode::Jump => self.jump_to(operand)?,
            Opcode::JumpIfZero => {
                if self.pop_stack()?.as_i64() == 0 {
                    self.jump_to(operand)?;
                }
            }
            Opcode::JumpIfNotZero => {
                if self.pop_stack()?.as_i64() != 0 {
                    self.jump_to(operand)?;
                }
            }
            Opcode::Halt => return Ok(Status::Halted),
        }

        Ok(Status::Running)
    }

    /// Occupied part of the stack, bottom first
    pub fn stack(&self) -> &[Word] {
        &self.stack[..self.sp]
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Pop the right-hand side first, then the left-hand side, and push `op(lhs, rhs)`.
    /// `push L; push R; op` therefore computes `L op R`.
    fn binary_op(&mut self, op: impl Fn(i64, i64) -> VmResult<i64>) -> VmResult<()> {
        let a = self.pop_stack()?;
        let b = self.pop_stack()?;

        let result = op(b.as_i64(), a.as_i64())?;
        self.push_stack(Word::from_i64(result))
    }

    /// Push a copy of the cell at the absolute index `operand`, counted from the bottom
    fn ins_dup(&mut self, operand: Word) -> VmResult<()> {
        let index = operand.as_u64();
        if index >= self.sp as u64 {
            return Err(VmError::StackIllegalAccess);
        }

        self.push_stack(self.stack[index as usize])
    }

    /// Pop a value and write all of its interpretations
    fn ins_dump(&mut self) -> VmResult<()> {
        let value = self.pop_stack()?;
        writeln!(self.out, "  {}", value).map_err(|err| VmError::Output(err.kind()))
    }

    /// Jump to an absolute instruction index
    fn jump_to(&mut self, target: Word) -> VmResult<()> {
        match usize::try_from(target.as_u64()) {
            Ok(target) if target < self.program.len() => {
                self.ip = target;
                Ok(())
            }
            _ => Err(VmError::IllegalInstructionAccess),
        }
    }

    fn flush(&mut self) -> VmResult<()> {
        self.out.flush().map_err(|err| VmError::Output(err.kind()))
    }

    fn pop_stack(&mut self) -> VmResult<Word> {
        if self.sp == 0 {
            return Err(VmError::StackUnderflow);
        }

        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    fn push_stack(&mut self, data: Word) -> VmResult<()> {
        if self.sp >= STACK_MAX {
            return Err(VmError::StackOverflow);
        }

        self.stack[self.sp] = data;
        self.sp += 1;
        Ok(())
    }

    fn fault(&self, kind: VmError, instruction: Option<Instruction>) -> Fault {
        Fault {
            kind,
            instruction,
            ip: self.ip,
            sp: self.sp,
            stack: self.stack().to_vec(),
        }
    }
}
