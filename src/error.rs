//! Compile-time errors.
//!
//! Rendering never fails: lookup misses and non-iterable loop sources
//! degrade to empty output. Everything here is raised by [`crate::compile`].

use std::fmt;

pub type Result<T, E = TemplateError> = std::result::Result<T, E>;

/// Location of a tag in the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset into the source.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in chars.
    pub column: usize,
}

impl Position {
    pub(crate) fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Move past `consumed`, which must be the source text directly
    /// following this position.
    pub(crate) fn advance(&mut self, consumed: &str) {
        self.offset += consumed.len();
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The three tag forms, by delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `{# ... #}`
    Comment,
    /// `{{ ... }}`
    Print,
    /// `{% ... %}`
    Instruction,
}

impl TagKind {
    pub(crate) fn delimiters(self) -> (&'static str, &'static str) {
        match self {
            TagKind::Comment => ("{#", "#}"),
            TagKind::Print => ("{{", "}}"),
            TagKind::Instruction => ("{%", "%}"),
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TagKind::Comment => "comment",
            TagKind::Print => "print",
            TagKind::Instruction => "instruction",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unclosed {kind} tag at {position}")]
    UnclosedTag { kind: TagKind, position: Position },

    #[error("malformed {{% {keyword} %}} tag `{text}` at {position}")]
    MalformedTag {
        keyword: String,
        text: String,
        position: Position,
    },

    #[error("unknown instruction `{keyword}` at {position}")]
    UnknownInstruction { keyword: String, position: Position },

    #[error("unexpected `{keyword}` at {position}: no open block")]
    UnexpectedClose { keyword: String, position: Position },

    #[error("expected `{expected}`, found `{found}` at {position}")]
    MismatchedClose {
        expected: String,
        found: String,
        position: Position,
    },

    #[error("block opened at {position} is missing `{keyword}`")]
    UnclosedBlock { keyword: String, position: Position },
}

impl TemplateError {
    /// Where in the source the error was detected.
    pub fn position(&self) -> Position {
        match self {
            TemplateError::UnclosedTag { position, .. }
            | TemplateError::MalformedTag { position, .. }
            | TemplateError::UnknownInstruction { position, .. }
            | TemplateError::UnexpectedClose { position, .. }
            | TemplateError::MismatchedClose { position, .. }
            | TemplateError::UnclosedBlock { position, .. } => *position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut pos = Position::start();
        pos.advance("ab\ncé");
        assert_eq!(
            pos,
            Position {
                offset: 6,
                line: 2,
                column: 3
            }
        );
    }

    #[test]
    fn messages_name_the_offending_tag() {
        let err = TemplateError::UnclosedTag {
            kind: TagKind::Print,
            position: Position::start(),
        };
        assert_eq!(err.to_string(), "unclosed print tag at line 1, column 1");

        let err = TemplateError::MalformedTag {
            keyword: "if".into(),
            text: "if a b".into(),
            position: Position::start(),
        };
        assert_eq!(
            err.to_string(),
            "malformed {% if %} tag `if a b` at line 1, column 1"
        );
    }
}
