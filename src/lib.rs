//! Honey is a tiny assembler and stack-based virtual machine.
//!
//! Assembly source is turned into a flat array of instructions by [`assembler::assemble`],
//! stored as raw fixed-size records by [`bytecode::encode`] and executed by [`vm::Vm`].
//!
//! # Example
//!
//! ```text
//! # count down from 3 and print every value
//! push 3
//! loop:
//!   dup 0
//!   dump
//!   dup 0
//!   jz done
//!   push 1
//!   minusi
//!   jmp loop
//! done:
//!   halt
//! ```
//!
//! # Instructions
//!
//! | Instruction | Usage                 | Brief   |
//! |-------------|-----------------------|---------|
//! | Push        | push _number_         | Push `number` on top of the stack. |
//! | Dup         | dup _index_           | Push a copy of the cell at `index`, counted from the **bottom** of the stack. `dup 0` copies the oldest value, not the top. |
//! | Plusi       | plusi                 | Pop two integers and push `lhs + rhs`. |
//! | Minusi      | minusi                | `lhs - rhs` |
//! | Multi       | multi                 | `lhs * rhs` |
//! | Divi        | divi                  | `lhs / rhs`, fails on a zero `rhs`. |
//! | Modi        | modi                  | `lhs % rhs`, fails on a zero `rhs`. |
//! | Gti, Gtei   | gti, gtei             | Push `1` if `lhs > rhs` (`>=`), `0` otherwise. |
//! | Lti, Ltei   | lti, ltei             | `lhs < rhs` (`<=`) |
//! | Eqi, Neqi   | eqi, neqi             | `lhs == rhs` (`!=`) |
//! | Noti        | noti                  | Pop a value, push `1` if it was `0`, else `0`. |
//! | Dump        | dump                  | Pop a value and print it as `i64`, `u64`, `f64` and a pointer. |
//! | Jmp         | jmp _target_          | Jump to `target`, an instruction index or a label. |
//! | Jz          | jz _target_           | Pop a value and jump if it is zero. |
//! | Jnz         | jnz _target_          | Pop a value and jump if it is not zero. |
//! | Halt        | halt                  | Stop the machine successfully. |
//!
//! For binary instructions `lhs` is the value that was pushed first:
//! `push 10; push 3; minusi` leaves `7`.
//!
//! # Important notes
//!
//! - `#` starts a comment that runs to the end of the line.
//! - `name:` defines a label for the next instruction. Several labels may precede one instruction.
//! - Numbers are unsigned decimal literals. `push` accepts values up to `i64::MAX`.
//! - Stack cells are untagged; each instruction decides how to read the bits.
//! - The stack holds 1024 cells.

pub mod assembler;
pub mod bytecode;
pub mod error;
pub mod lexer;
pub mod logging;
pub mod token;
pub mod vm;
pub mod word;

pub use assembler::assemble;
pub use error::{AssembleError, BytecodeError, Fault, VmError};
