use std::fmt;

/// Kinds of tokens produced by the lexer
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum TokenKind {
    Identifier,
    Number,
    Colon,
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Colon => "':'",
            TokenKind::EndOfFile => "end of file",
        };
        f.pad(name)
    }
}

/// A token borrowing its text from the source buffer.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    /// Byte offset of the lexeme in the source.
    pub offset: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, offset: usize) -> Self {
        Token {
            kind,
            lexeme,
            offset,
        }
    }

    pub fn eof(offset: usize) -> Self {
        Token::new(TokenKind::EndOfFile, "", offset)
    }

    pub fn is_label_start(&self, next: &Token<'_>) -> bool {
        self.kind == TokenKind::Identifier && next.kind == TokenKind::Colon
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}  {:<10} {:?}", self.offset, self.kind, self.lexeme)
    }
}
