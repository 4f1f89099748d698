//! Parser that turns tokens into instructions and resolves label references

use std::collections::HashMap;

use crate::{
    bytecode::{Instruction, Opcode},
    error::AssembleError,
    lexer,
    token::{Token, TokenKind},
    word::Word,
};

/// A label definition: `name:` bound to the index of the next instruction
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Label<'a> {
    pub name: &'a str,
    pub ip: usize,
}

/// A jump whose operand names a label that has to be patched after parsing
#[derive(Debug, Clone, Eq, PartialEq)]
struct UnresolvedReference<'a> {
    label: &'a str,
    patch_index: usize,
}

/// Result of a successful parse
#[derive(Debug)]
pub struct Program<'a> {
    /// Array of instructions from top to bottom, with every label reference resolved
    pub instructions: Vec<Instruction>,
    /// Label table in definition order
    pub labels: Vec<Label<'a>>,
}

/// Lex, parse and resolve `source` in one go.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, AssembleError> {
    let tokens = lexer::tokenize(source)?;
    Ok(Parser::new(tokens).parse()?.instructions)
}

type ParseRes = Result<Instruction, AssembleError>;
type ParseFn<'a> = fn(&mut Parser<'a>, Opcode) -> ParseRes;

macro_rules! impl_parse_fn {
    ($fn_name:ident; $word_ctor:ident($int:ty)) => {
        fn $fn_name(&mut self, opcode: Opcode) -> ParseRes {
            let token = self.expect(TokenKind::Number)?;
            let value = self.parse_number::<$int>(&token, opcode)?;
            Ok(Instruction::with_operand(opcode, Word::$word_ctor(value)))
        }
    };
}

/// Parser to generate instructions from tokens
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    cursor: usize,
    /// Index of the instruction being parsed
    ip: usize,
    labels: Vec<Label<'a>>,
    unresolved: Vec<UnresolvedReference<'a>>,
    parse_fns: HashMap<&'static str, (Opcode, ParseFn<'a>)>,
}

impl<'a> Parser<'a> {
    /// Initialize the parser and prepare the parser functions
    ///
    /// * `tokens` tokens of the program, without an end-of-file marker
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        let mut parse_fns: HashMap<&'static str, (Opcode, ParseFn<'a>)> = HashMap::new();
        for opcode in Opcode::ALL {
            let parse_fn: ParseFn<'a> = match opcode {
                Opcode::Push => Self::parse_push,
                Opcode::Dup => Self::parse_dup,
                Opcode::Jump | Opcode::JumpIfZero | Opcode::JumpIfNotZero => Self::parse_jump,
                _ => Self::parse_plain,
            };
            parse_fns.insert(opcode.mnemonic(), (opcode, parse_fn));
        }

        Parser {
            tokens,
            cursor: 0,
            ip: 0,
            labels: Vec::new(),
            unresolved: Vec::new(),
            parse_fns,
        }
    }

    /// Parse every token and resolve the label references
    pub fn parse(mut self) -> Result<Program<'a>, AssembleError> {
        let mut instructions = Vec::new();

        while self.cursor < self.tokens.len() {
            self.ip = instructions.len();
            if let Some(instruction) = self.parse_instruction()? {
                instructions.push(instruction);
            }
        }

        self.resolve(&mut instructions)?;

        Ok(Program {
            instructions,
            labels: self.labels,
        })
    }

    /// Parse a single statement: any number of `name:` labels followed by one instruction.
    /// Returns `None` when the labels are the last tokens of the program; they then
    /// point one past the last instruction.
    fn parse_instruction(&mut self) -> Result<Option<Instruction>, AssembleError> {
        let mut current = self.consume();
        while current.is_label_start(&self.peek()) {
            self.expect(TokenKind::Colon)?;
            self.push_label(current.lexeme, self.ip);
            current = self.consume();
        }

        if current.kind == TokenKind::EndOfFile {
            return Ok(None);
        }

        match self.parse_fns.get(current.lexeme).copied() {
            Some((opcode, parse_fn)) if current.kind == TokenKind::Identifier => {
                parse_fn(self, opcode).map(Some)
            }
            _ => Err(AssembleError::InvalidInstruction {
                mnemonic: current.lexeme.to_string(),
                cursor: self.cursor - 1,
            }),
        }
    }

    fn push_label(&mut self, name: &'a str, ip: usize) {
        if let Some(first) = self.labels.iter().find(|label| label.name == name) {
            tracing::warn!(
                label = name,
                first_ip = first.ip,
                ip,
                "duplicate label, references resolve to the first definition"
            );
        } else {
            tracing::debug!(label = name, ip, "label defined");
        }

        self.labels.push(Label { name, ip });
    }

    fn label(&self, name: &str) -> Option<&Label<'a>> {
        self.labels.iter().find(|label| label.name == name)
    }

    /// Patch every jump that referenced a label by name
    fn resolve(&self, instructions: &mut [Instruction]) -> Result<(), AssembleError> {
        for reference in &self.unresolved {
            let label = self
                .label(reference.label)
                .ok_or_else(|| AssembleError::UnresolvedLabel {
                    name: reference.label.to_string(),
                })?;

            tracing::debug!(
                label = label.name,
                target = label.ip,
                at = reference.patch_index,
                "resolved label reference"
            );
            instructions[reference.patch_index].operand = Word::from_u64(label.ip as u64);
        }

        Ok(())
    }

    impl_parse_fn! {parse_push; from_i64(i64)}
    // `dup` indexes from the bottom of the stack (0 is the oldest cell), not from the top.
    impl_parse_fn! {parse_dup; from_u64(u64)}

    /// `jmp`, `jz` and `jnz` take either a literal instruction index or a label name.
    fn parse_jump(&mut self, opcode: Opcode) -> ParseRes {
        let operand = self.peek();
        if operand.kind == TokenKind::Number {
            let token = self.consume();
            let target = self.parse_number::<u64>(&token, opcode)?;
            return Ok(Instruction::jump(opcode, target));
        }

        let token = self.expect(TokenKind::Identifier)?;
        self.unresolved.push(UnresolvedReference {
            label: token.lexeme,
            patch_index: self.ip,
        });
        Ok(Instruction::new(opcode))
    }

    fn parse_plain(&mut self, opcode: Opcode) -> ParseRes {
        Ok(Instruction::new(opcode))
    }

    fn parse_number<T: std::str::FromStr>(
        &self,
        token: &Token<'a>,
        opcode: Opcode,
    ) -> Result<T, AssembleError> {
        token
            .lexeme
            .parse::<T>()
            .map_err(|_| AssembleError::InvalidNumber {
                literal: token.lexeme.to_string(),
                mnemonic: opcode.mnemonic(),
                cursor: self.cursor - 1,
            })
    }

    fn peek(&self) -> Token<'a> {
        self.tokens
            .get(self.cursor)
            .copied()
            .unwrap_or_else(|| Token::eof(self.end_offset()))
    }

    fn consume(&mut self) -> Token<'a> {
        let token = self.peek();
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>, AssembleError> {
        let current = self.consume();
        if current.kind == kind {
            return Ok(current);
        }

        if current.kind == TokenKind::EndOfFile {
            return Err(AssembleError::UnexpectedEndOfFile { expected: kind });
        }

        Err(AssembleError::UnexpectedToken {
            expected: kind,
            found: current.kind,
            lexeme: current.lexeme.to_string(),
            cursor: self.cursor - 1,
        })
    }

    fn end_offset(&self) -> usize {
        self.tokens
            .last()
            .map(|token| token.offset + token.lexeme.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program<'_>, AssembleError> {
        Parser::new(lexer::tokenize(source)?).parse()
    }

    #[test]
    fn operands() {
        let program = assemble("push 10\ndup 0\njmp 1\nplusi\nhalt").unwrap();
        assert_eq!(
            program,
            vec![
                Instruction::push(10),
                Instruction::dup(0),
                Instruction::jump(Opcode::Jump, 1),
                Instruction::new(Opcode::Plusi),
                Instruction::new(Opcode::Halt),
            ]
        );
    }

    #[test]
    fn every_plain_mnemonic() {
        let source = "plusi minusi divi multi modi gti gtei lti ltei eqi neqi noti dump halt";
        let opcodes: Vec<Opcode> = assemble(source)
            .unwrap()
            .into_iter()
            .map(|instruction| instruction.opcode)
            .collect();
        assert_eq!(
            opcodes,
            vec![
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
                Opcode::Dump,
                Opcode::Halt,
            ]
        );
    }

    #[test]
    fn backward_label() {
        let program = assemble("push 0\nloop: push 1\njmp loop").unwrap();
        assert_eq!(program[2], Instruction::jump(Opcode::Jump, 1));
    }

    #[test]
    fn forward_label() {
        let program = assemble("push 0\njz done\npush 1\ndone: halt").unwrap();
        assert_eq!(program[1], Instruction::jump(Opcode::JumpIfZero, 3));
    }

    #[test]
    fn stacked_labels() {
        let program = parse("a: b:\nc: push 1\njnz b\njmp c").unwrap();
        assert_eq!(
            program.labels,
            vec![
                Label { name: "a", ip: 0 },
                Label { name: "b", ip: 0 },
                Label { name: "c", ip: 0 },
            ]
        );
        assert_eq!(program.instructions[1].operand.as_u64(), 0);
        assert_eq!(program.instructions[2].operand.as_u64(), 0);
    }

    #[test]
    fn trailing_label_points_past_end() {
        let program = parse("jmp end\nend:").unwrap();
        assert_eq!(program.labels, vec![Label { name: "end", ip: 1 }]);
        assert_eq!(program.instructions, vec![Instruction::jump(Opcode::Jump, 1)]);
    }

    #[test]
    fn duplicate_label_first_wins() {
        let program = assemble("x: push 1\nx: push 2\njmp x").unwrap();
        assert_eq!(program[2].operand.as_u64(), 0);
    }

    #[test]
    fn undefined_label() {
        assert_eq!(
            assemble("jmp nowhere").unwrap_err(),
            AssembleError::UnresolvedLabel {
                name: "nowhere".to_string()
            }
        );
    }

    #[test]
    fn invalid_instruction() {
        assert_eq!(
            assemble("push 1\npop").unwrap_err(),
            AssembleError::InvalidInstruction {
                mnemonic: "pop".to_string(),
                cursor: 2
            }
        );
        assert!(matches!(
            assemble("42"),
            Err(AssembleError::InvalidInstruction { .. })
        ));
        assert!(matches!(
            assemble("PUSH 1"),
            Err(AssembleError::InvalidInstruction { .. })
        ));
    }

    #[test]
    fn unexpected_tokens() {
        assert_eq!(
            assemble("push halt").unwrap_err(),
            AssembleError::UnexpectedToken {
                expected: TokenKind::Number,
                found: TokenKind::Identifier,
                lexeme: "halt".to_string(),
                cursor: 1
            }
        );
        assert_eq!(
            assemble("dup").unwrap_err(),
            AssembleError::UnexpectedEndOfFile {
                expected: TokenKind::Number
            }
        );
        assert_eq!(
            assemble("push 1\njmp").unwrap_err(),
            AssembleError::UnexpectedEndOfFile {
                expected: TokenKind::Identifier
            }
        );
    }

    #[test]
    fn out_of_range_literals() {
        assert_eq!(
            assemble("push 9223372036854775807").unwrap(),
            vec![Instruction::push(i64::MAX)]
        );
        assert!(matches!(
            assemble("push 9223372036854775808"),
            Err(AssembleError::InvalidNumber { mnemonic: "push", .. })
        ));
        assert!(matches!(
            assemble("jmp 18446744073709551616"),
            Err(AssembleError::InvalidNumber { mnemonic: "jmp", .. })
        ));
    }

    #[test]
    fn empty_source() {
        assert!(assemble("").unwrap().is_empty());
        assert!(assemble("# only a comment\n").unwrap().is_empty());
    }
}
