//! Untagged 64-bit stack cell

use std::fmt;

/// A single 8-byte cell of the operand stack.
///
/// A word carries no type information. Which of the four views
/// (`i64`, `u64`, `f64`, pointer bits) is meaningful is decided by the
/// opcode that consumes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Word([u8; 8]);

impl Word {
    pub const ZERO: Word = Word([0; 8]);

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Word(bytes)
    }

    pub fn from_i64(value: i64) -> Self {
        Word(value.to_le_bytes())
    }

    pub fn from_u64(value: u64) -> Self {
        Word(value.to_le_bytes())
    }

    pub fn from_f64(value: f64) -> Self {
        Word(value.to_le_bytes())
    }

    pub fn from_bool(value: bool) -> Self {
        Word::from_i64(value as i64)
    }

    pub fn to_bytes(self) -> [u8; 8] {
        self.0
    }

    pub fn as_i64(self) -> i64 {
        i64::from_le_bytes(self.0)
    }

    pub fn as_u64(self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    pub fn as_f64(self) -> f64 {
        f64::from_le_bytes(self.0)
    }

    /// Pointer-sized bit pattern. Truncates on targets narrower than 64 bits.
    pub fn as_ptr(self) -> usize {
        self.as_u64() as usize
    }
}

impl From<i64> for Word {
    fn from(value: i64) -> Self {
        Word::from_i64(value)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "i64: {}, u64: {}, f64: {:.6}, ptr: {:#x}",
            self.as_i64(),
            self.as_u64(),
            self.as_f64(),
            self.as_ptr()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_share_bits() {
        let word = Word::from_i64(-1);
        assert_eq!(word.as_u64(), u64::MAX);
        assert_eq!(word.as_i64(), -1);

        let word = Word::from_f64(1.5);
        assert_eq!(word.as_u64(), 1.5f64.to_bits());
    }

    #[test]
    fn display_all_views() {
        assert_eq!(
            Word::from_i64(7).to_string(),
            "i64: 7, u64: 7, f64: 0.000000, ptr: 0x7"
        );
    }
}
