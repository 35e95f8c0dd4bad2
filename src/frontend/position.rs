use std::rc::Rc;

/// A location in the source buffer.
///
/// `line` and `column` are 1-based, `index` is a 0-based byte offset.
/// Tabs advance the column by one; expansion happens only when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub index: usize,
}

impl Position {
    pub const START: Position = Position {
        line: 1,
        column: 1,
        index: 0,
    };

    /// Returns the position just after `ch`.
    pub fn advanced(self, ch: char) -> Position {
        if ch == '\n' {
            Position {
                line: self.line + 1,
                column: 1,
                index: self.index + 1,
            }
        } else {
            Position {
                line: self.line,
                column: self.column + 1,
                index: self.index + ch.len_utf8(),
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The file being compiled: its path and full text.
///
/// Tokens and AST nodes hold an `Rc` to the same instance, so the text is
/// never copied for the lifetime of a compilation.
#[derive(Debug, PartialEq, Eq)]
pub struct SourceFile {
    path: String,
    text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Rc<Self> {
        Rc::new(SourceFile {
            path: path.into(),
            text: text.into(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the text between two positions.
    pub fn slice(&self, start: Position, end: Position) -> &str {
        &self.text[start.index..end.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_columns_and_lines() {
        let pos = Position::START.advanced('a').advanced('\t');
        assert_eq!(pos, Position { line: 1, column: 3, index: 2 });

        let pos = pos.advanced('\n');
        assert_eq!(pos, Position { line: 2, column: 1, index: 3 });
    }

    #[test]
    fn test_slice() {
        let file = SourceFile::new("a.smol", "var abc;");
        let start = Position { line: 1, column: 5, index: 4 };
        let end = Position { line: 1, column: 8, index: 7 };
        assert_eq!(file.slice(start, end), "abc");
    }
}
