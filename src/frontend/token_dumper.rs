use std::fmt::Write;

use crate::frontend::token::{Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
    pub show_spans: bool, // if true, also prints the end position and byte range
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_spans: false,
        }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";
    const BLU: &'static str = "\x1b[34m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn spans(mut self) -> Self {
        self.show_spans = true;
        self
    }

    pub fn dump(&self, tokens: &[Token]) {
        print!("{}", self.render(tokens));
    }

    pub fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for t in tokens {
            self.render_one(&mut out, t);
        }
        out
    }

    fn render_one(&self, out: &mut String, t: &Token) {
        let colr = if self.color { self.color(t.kind) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        let _ = write!(
            out,
            "[{:02}:{:02}] {}{:<8} {:?}{}",
            t.start.line,
            t.start.column,
            colr,
            self.category(t.kind),
            t.lexeme(),
            reset
        );
        if self.show_spans {
            let _ = write!(
                out,
                "  {}..{} @{}..{}",
                t.start, t.end, t.start.index, t.end.index
            );
        }
        out.push('\n');
    }

    fn category(&self, kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Eof => "EOF",
            IntLiteral => "INT",
            Identifier => "IDENT",

            Colon | Semicolon | Question | LParen | RParen | LBrace | RBrace => "PUNCT",

            EqualEqual | BangEqual | Less | LessEqual | Greater | GreaterEqual => "CMP",

            k if k.is_keyword() => "KEYWORD",

            // everything else is an operator
            _ => "OP",
        }
    }

    fn color(&self, kind: TokenKind) -> &'static str {
        use TokenKind::*;
        match kind {
            Eof => Self::DIM,
            IntLiteral => Self::CYN,
            Identifier => Self::YEL,
            k if k.is_keyword() => Self::BLU,
            Colon | Semicolon | Question | LParen | RParen | LBrace | RBrace => Self::RESET,
            _ => Self::MAG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;

    #[test]
    fn test_plain_dump() {
        let tokens = tokenize("t.smol", "var x = 1;").unwrap();
        let text = TokenDumper::new().no_color().render(&tokens);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "[01:01] KEYWORD  \"var\"");
        assert_eq!(lines[1], "[01:05] IDENT    \"x\"");
        assert_eq!(lines[2], "[01:07] OP       \"=\"");
        assert_eq!(lines[3], "[01:09] INT      \"1\"");
        assert_eq!(lines[4], "[01:10] PUNCT    \";\"");
        assert_eq!(lines[5], "[01:11] EOF      \"\"");
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("t.smol", "a").unwrap();
        let text = TokenDumper::new().no_color().spans().render(&tokens);
        assert!(text.starts_with("[01:01] IDENT    \"a\"  1:1..1:2 @0..1\n"));
    }

    #[test]
    fn test_color_wraps_entries() {
        let tokens = tokenize("t.smol", "print").unwrap();
        let text = TokenDumper::new().render(&tokens);
        assert!(text.starts_with("[01:01] \x1b[34mKEYWORD"));
        assert!(text.lines().all(|l| l.ends_with("\x1b[0m")));
    }
}
