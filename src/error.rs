//! Error types of the assembler, the bytecode codec and the virtual machine

use std::{
    fmt::{self, Write as _},
    io,
};

use thiserror::Error;

use crate::{bytecode::Instruction, token::TokenKind, word::Word};

/// Fatal errors of the lexer and the parser. The first one stops the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("lexer (c: {offset}) -> invalid token has found: {found:?}")]
    UnrecognizedCharacter { offset: usize, found: char },

    #[error("parser (c: {cursor}) -> expects {expected}, but received {found} '{lexeme}'")]
    UnexpectedToken {
        expected: TokenKind,
        found: TokenKind,
        lexeme: String,
        cursor: usize,
    },

    #[error("parser -> expects {expected}, but received end of file")]
    UnexpectedEndOfFile { expected: TokenKind },

    #[error("parser (c: {cursor}) -> invalid instruction has found: '{mnemonic}'")]
    InvalidInstruction { mnemonic: String, cursor: usize },

    #[error("parser (c: {cursor}) -> '{literal}' does not fit the operand of '{mnemonic}'")]
    InvalidNumber {
        literal: String,
        mnemonic: &'static str,
        cursor: usize,
    },

    #[error("parser -> {name} is not a valid label")]
    UnresolvedLabel { name: String },
}

/// Errors raised while decoding a bytecode file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytecodeError {
    #[error("bytecode length {len} is not a multiple of the {record} byte record size")]
    TruncatedRecord { len: usize, record: usize },

    #[error("unknown opcode tag {tag} in instruction {index}")]
    InvalidOpcode { tag: u32, index: usize },
}

/// Recoverable execution errors. Every push, pop, dup and jump site reports one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("Stack overflow: exceeded maximum stack size")]
    StackOverflow,
    #[error("Stack underflow: attempted to pop from empty stack")]
    StackUnderflow,
    #[error("Illegal stack access out of bounds")]
    StackIllegalAccess,
    #[error("Illegal program memory access: out-of-bounds read or jump")]
    IllegalInstructionAccess,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Failed to write dump output: {0}")]
    Output(io::ErrorKind),
}

/// The first error of a run together with the machine state at the time it happened.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct Fault {
    pub kind: VmError,
    /// `None` when the fault happened while fetching.
    pub instruction: Option<Instruction>,
    pub ip: usize,
    pub sp: usize,
    pub stack: Vec<Word>,
}

impl Fault {
    /// Human readable diagnostic: error kind, instruction, registers and the whole stack.
    pub fn report(&self) -> String {
        let mut out = String::new();
        // Writing into a String never fails.
        let _ = self.write_report(&mut out);
        out
    }

    fn write_report(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "[VM ERROR] {}", self.kind)?;
        if let Some(instruction) = &self.instruction {
            writeln!(
                out,
                "  -> Instruction: {} (operand={})",
                instruction,
                instruction.operand.as_i64()
            )?;
        }
        writeln!(out, "  IP={}, SP={}", self.ip, self.sp)?;
        writeln!(out, "Stack:")?;
        if self.stack.is_empty() {
            writeln!(out, "  [ empty ]")?;
        }
        for word in &self.stack {
            writeln!(out, "  {}", word)?;
        }
        Ok(())
    }
}
