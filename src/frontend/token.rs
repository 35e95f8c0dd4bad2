use std::rc::Rc;

use crate::frontend::position::{Position, SourceFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuation
    Colon,
    Semicolon,
    Question,
    LParen,
    RParen,
    LBrace,
    RBrace,

    // Assignment and comparison
    Equal,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Bitwise
    Pipe,
    Ampersand,
    Caret,
    Tilde,
    LShift,
    RShift,

    // Logical
    PipePipe,
    AmpersandAmpersand,
    Bang,

    // Arithmetic
    Plus,
    PlusPlus,
    Minus,
    MinusMinus,
    Star,
    Slash,
    Percent,

    // Keywords
    Var,
    If,
    Else,
    Goto,
    Print,

    Identifier,
    IntLiteral,

    Eof,
}

impl TokenKind {
    /// Classifies a word lexeme. Only an exact match is a keyword.
    pub fn keyword(lexeme: &str) -> Option<TokenKind> {
        match lexeme {
            "var" => Some(TokenKind::Var),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "goto" => Some(TokenKind::Goto),
            "print" => Some(TokenKind::Print),
            _ => None,
        }
    }

    /// Returns true for the reserved words.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Var | TokenKind::If | TokenKind::Else | TokenKind::Goto | TokenKind::Print
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Equal => write!(f, "="),
            TokenKind::EqualEqual => write!(f, "=="),
            TokenKind::BangEqual => write!(f, "!="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Ampersand => write!(f, "&"),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::Tilde => write!(f, "~"),
            TokenKind::LShift => write!(f, "<<"),
            TokenKind::RShift => write!(f, ">>"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::AmpersandAmpersand => write!(f, "&&"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::PlusPlus => write!(f, "++"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::MinusMinus => write!(f, "--"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Goto => write!(f, "goto"),
            TokenKind::Print => write!(f, "print"),
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::IntLiteral => write!(f, "integer literal"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

/// A lexed token. `start` is inclusive, `end` exclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: Position,
    pub end: Position,
    pub file: Rc<SourceFile>,
}

impl Token {
    pub fn new(kind: TokenKind, start: Position, end: Position, file: Rc<SourceFile>) -> Self {
        Token {
            kind,
            start,
            end,
            file,
        }
    }

    /// The exact source text this token spans.
    pub fn lexeme(&self) -> &str {
        self.file.slice(self.start, self.end)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_exact_match_only() {
        assert_eq!(TokenKind::keyword("var"), Some(TokenKind::Var));
        assert_eq!(TokenKind::keyword("print"), Some(TokenKind::Print));
        assert_eq!(TokenKind::keyword("variable"), None);
        assert_eq!(TokenKind::keyword("va"), None);
        assert_eq!(TokenKind::keyword("VAR"), None);
        assert_eq!(TokenKind::keyword("If"), None);
    }

    #[test]
    fn test_lexeme_reads_source() {
        let file = SourceFile::new("t.smol", "goto end;");
        let token = Token::new(
            TokenKind::Identifier,
            Position { line: 1, column: 6, index: 5 },
            Position { line: 1, column: 9, index: 8 },
            file,
        );
        assert_eq!(token.lexeme(), "end");
        assert!(token.is(TokenKind::Identifier));
    }
}
