use super::error::AssembleError;
use super::token::{Token, TokenKind};

pub struct Lexer<'a> {
    program: &'a str,
    cursor: usize,
}

type LResult<'a> = Result<Option<Token<'a>>, AssembleError>;

/// Split `program` into tokens. The sequence stops at the end of input and
/// carries no explicit end-of-file token.
pub fn tokenize(program: &str) -> Result<Vec<Token<'_>>, AssembleError> {
    let mut lexer = Lexer::new(program);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }

    tracing::debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

impl<'a> Lexer<'a> {
    pub fn new(program: &'a str) -> Self {
        Lexer { program, cursor: 0 }
    }

    /// Get the next token. This consumes the tokens.
    pub fn next_token(&mut self) -> LResult<'a> {
        self.trim();
        while self.next_char(true) == Some(b'#') {
            self.skip_comment();
            self.trim();
        }

        match self.next_char(true) {
            None => Ok(None),
            Some(ch) if ch.is_ascii_digit() => {
                Ok(Some(self.read_while(TokenKind::Number, |ch| ch.is_ascii_digit())))
            }
            Some(ch) if is_ident_char(ch) => {
                Ok(Some(self.read_while(TokenKind::Identifier, is_ident_char)))
            }
            Some(b':') => {
                let start_pos = self.cursor;
                let _ = self.next_char(false);
                let lexeme = &self.program[start_pos..self.cursor];
                Ok(Some(Token::new(TokenKind::Colon, lexeme, start_pos)))
            }
            Some(_) => Err(AssembleError::UnrecognizedCharacter {
                offset: self.cursor,
                found: self.program[self.cursor..].chars().next().unwrap_or_default(),
            }),
        }
    }

    /// Trim whitespaces, tabs, carriage returns and newlines
    fn trim(&mut self) {
        while let Some(ch) = self.next_char(true) {
            if !ch.is_ascii_whitespace() {
                break;
            }
            self.cursor += 1;
        }
    }

    /// Skip a `#` comment up to, but not including, the end of the line
    fn skip_comment(&mut self) {
        while let Some(ch) = self.next_char(true) {
            if ch == b'\n' {
                break;
            }
            self.cursor += 1;
        }
    }

    /// Read the longest run of bytes accepted by `accept`
    fn read_while(&mut self, kind: TokenKind, accept: impl Fn(u8) -> bool) -> Token<'a> {
        let start_pos = self.cursor;
        while let Some(ch) = self.next_char(true) {
            if !accept(ch) {
                break;
            }
            self.cursor += 1;
        }

        Token::new(kind, &self.program[start_pos..self.cursor], start_pos)
    }

    /// Get the next char and increase the cursor if `peek` is false
    fn next_char(&mut self, peek: bool) -> Option<u8> {
        let ch = self.program.as_bytes().get(self.cursor).copied();
        if ch.is_some() && !peek {
            self.cursor += 1;
        }
        ch
    }
}

fn is_ident_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_lexemes(program: &str) -> Vec<(TokenKind, &str)> {
        tokenize(program)
            .unwrap()
            .into_iter()
            .map(|token| (token.kind, token.lexeme))
            .collect()
    }

    #[test]
    fn trim() {
        let program = "\t\r\x0C \n push 1";
        let mut lexer = Lexer::new(program);
        lexer.trim();
        assert_eq!(&lexer.program[lexer.cursor..], "push 1");
    }

    #[test]
    fn next_char_peek() {
        let mut lexer = Lexer::new("ab");
        assert_eq!(lexer.next_char(true), Some(b'a'));
        assert_eq!(lexer.next_char(false), Some(b'a'));
        assert_eq!(lexer.next_char(false), Some(b'b'));
        assert_eq!(lexer.next_char(false), None);
        assert_eq!(lexer.cursor, 2);
    }

    #[test]
    fn read_number() {
        let mut lexer = Lexer::new("123 456");
        let token = lexer.next_token().unwrap().unwrap();
        assert_eq!(token, Token::new(TokenKind::Number, "123", 0));
        let token = lexer.next_token().unwrap().unwrap();
        assert_eq!(token, Token::new(TokenKind::Number, "456", 4));
        assert_eq!(lexer.next_token().unwrap(), None);
    }

    #[test]
    fn digits_before_letters_split() {
        assert_eq!(
            kinds_and_lexemes("1abc"),
            vec![(TokenKind::Number, "1"), (TokenKind::Identifier, "abc")]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds_and_lexemes("# comment\npush 1 # trailing\nhalt"),
            vec![
                (TokenKind::Identifier, "push"),
                (TokenKind::Number, "1"),
                (TokenKind::Identifier, "halt"),
            ]
        );
    }

    #[test]
    fn consecutive_comments() {
        let program = "# some commentary here\n# another comment\n\npush 10\n#\n# x\nplusi";
        assert_eq!(
            kinds_and_lexemes(program),
            vec![
                (TokenKind::Identifier, "push"),
                (TokenKind::Number, "10"),
                (TokenKind::Identifier, "plusi"),
            ]
        );
    }

    #[test]
    fn comment_only_source() {
        assert!(tokenize("# nothing here").unwrap().is_empty());
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn read_program() {
        let program = r"
            start:
            loop_1: push 1
            jnz loop_1
        ";

        assert_eq!(
            kinds_and_lexemes(program),
            vec![
                (TokenKind::Identifier, "start"),
                (TokenKind::Colon, ":"),
                (TokenKind::Identifier, "loop_1"),
                (TokenKind::Colon, ":"),
                (TokenKind::Identifier, "push"),
                (TokenKind::Number, "1"),
                (TokenKind::Identifier, "jnz"),
                (TokenKind::Identifier, "loop_1"),
            ]
        );
    }

    #[test]
    fn unrecognized_character() {
        let err = tokenize("push 1\npush -2").unwrap_err();
        assert_eq!(
            err,
            AssembleError::UnrecognizedCharacter {
                offset: 12,
                found: '-'
            }
        );
    }
}
