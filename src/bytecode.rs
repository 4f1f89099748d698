//! Bytecode representation

use std::{collections::BTreeSet, fmt, fmt::Write as _};

use crate::{error::BytecodeError, word::Word};

/// Size in bytes of one encoded instruction: `u32` opcode tag, 4 bytes of
/// padding and the 8 byte operand.
pub const RECORD_SIZE: usize = 16;

/// Supported operations of the machine. The discriminant is the tag written to bytecode files.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
#[repr(u32)]
pub enum Opcode {
    /// Push the operand on the stack
    Push = 0,
    Plusi,
    Minusi,
    Divi,
    Multi,
    Modi,
    Gti,
    Gtei,
    Lti,
    Ltei,
    Eqi,
    Neqi,
    /// Logical negation of the integer on top of the stack
    Noti,
    /// Copy the cell at the absolute stack index given by the operand
    Dup,
    /// Pop a value and print every interpretation of it
    Dump,
    Jump,
    JumpIfZero,
    JumpIfNotZero,
    Halt,
}

impl Opcode {
    pub const ALL: [Opcode; 19] = [
        Opcode::Push,
        Opcode::Plusi,
        Opcode::Minusi,
        Opcode::Divi,
        Opcode::Multi,
        Opcode::Modi,
        Opcode::Gti,
        Opcode::Gtei,
        Opcode::Lti,
        Opcode::Ltei,
        Opcode::Eqi,
        Opcode::Neqi,
        Opcode::Noti,
        Opcode::Dup,
        Opcode::Dump,
        Opcode::Jump,
        Opcode::JumpIfZero,
        Opcode::JumpIfNotZero,
        Opcode::Halt,
    ];

    /// Assembly mnemonic of the opcode
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Push => "push",
            Opcode::Plusi => "plusi",
            Opcode::Minusi => "minusi",
            Opcode::Divi => "divi",
            Opcode::Multi => "multi",
            Opcode::Modi => "modi",
            Opcode::Gti => "gti",
            Opcode::Gtei => "gtei",
            Opcode::Lti => "lti",
            Opcode::Ltei => "ltei",
            Opcode::Eqi => "eqi",
            Opcode::Neqi => "neqi",
            Opcode::Noti => "noti",
            Opcode::Dup => "dup",
            Opcode::Dump => "dump",
            Opcode::Jump => "jmp",
            Opcode::JumpIfZero => "jz",
            Opcode::JumpIfNotZero => "jnz",
            Opcode::Halt => "halt",
        }
    }

    pub fn has_operand(self) -> bool {
        matches!(self, Opcode::Push | Opcode::Dup) || self.is_jump()
    }

    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::Jump | Opcode::JumpIfZero | Opcode::JumpIfNotZero
        )
    }
}

impl TryFrom<u32> for Opcode {
    type Error = u32;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        Opcode::ALL.get(tag as usize).copied().ok_or(tag)
    }
}

/// A single instruction: an opcode and its operand word.
/// Opcodes without an operand carry [`Word::ZERO`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Word,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Instruction {
            opcode,
            operand: Word::ZERO,
        }
    }

    pub fn with_operand(opcode: Opcode, operand: Word) -> Self {
        Instruction { opcode, operand }
    }

    pub fn push(value: i64) -> Self {
        Instruction::with_operand(Opcode::Push, Word::from_i64(value))
    }

    /// `dup` takes an absolute index counted from the bottom of the stack.
    pub fn dup(index: u64) -> Self {
        Instruction::with_operand(Opcode::Dup, Word::from_u64(index))
    }

    pub fn jump(opcode: Opcode, target: u64) -> Self {
        debug_assert!(opcode.is_jump());
        Instruction::with_operand(opcode, Word::from_u64(target))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::Push => write!(f, "push {}", self.operand.as_i64()),
            op if op.has_operand() => write!(f, "{} {}", op.mnemonic(), self.operand.as_u64()),
            op => f.write_str(op.mnemonic()),
        }
    }
}

/// Serialize instructions into the flat, headerless record format.
pub fn encode(instructions: &[Instruction]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(instructions.len() * RECORD_SIZE);
    for instruction in instructions {
        bytes.extend_from_slice(&(instruction.opcode as u32).to_le_bytes());
        bytes.extend_from_slice(&[0; 4]);
        bytes.extend_from_slice(&instruction.operand.to_bytes());
    }
    bytes
}

/// Read back instructions written by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Vec<Instruction>, BytecodeError> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(BytecodeError::TruncatedRecord {
            len: bytes.len(),
            record: RECORD_SIZE,
        });
    }

    bytes
        .chunks_exact(RECORD_SIZE)
        .enumerate()
        .map(|(index, record)| -> Result<Instruction, BytecodeError> {
            let mut tag = [0; 4];
            tag.copy_from_slice(&record[0..4]);
            let tag = u32::from_le_bytes(tag);
            let opcode =
                Opcode::try_from(tag).map_err(|tag| BytecodeError::InvalidOpcode { tag, index })?;

            let mut operand = [0; 8];
            operand.copy_from_slice(&record[8..16]);
            Ok(Instruction::with_operand(opcode, Word::from_bytes(operand)))
        })
        .collect()
}

/// Numbered listing of `instructions`. Jump targets are marked with `>`.
pub fn disassemble(instructions: &[Instruction]) -> String {
    let targets: BTreeSet<u64> = instructions
        .iter()
        .filter(|instruction| instruction.opcode.is_jump())
        .map(|instruction| instruction.operand.as_u64())
        .collect();

    let mut listing = String::new();
    for (ip, instruction) in instructions.iter().enumerate() {
        let marker = if targets.contains(&(ip as u64)) { '>' } else { ' ' };
        let _ = writeln!(listing, "{:04} {} {}", ip, marker, instruction);
    }
    listing
}
