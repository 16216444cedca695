use crate::error::{Position, Result, TagKind, TemplateError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Print,
    Instruction,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenKind::Text => "text",
            TokenKind::Print => "print",
            TokenKind::Instruction => "instruction",
        })
    }
}

/// A lexed piece of the template. Tag payloads are already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    /// First whitespace-separated word of the text, used to dispatch
    /// instructions. Empty for an empty tag.
    pub fn keyword(&self) -> &str {
        self.text.split_whitespace().next().unwrap_or("")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.kind, self.text)
    }
}

/// Openers in the order they are tried at each position.
const OPENERS: [TagKind; 3] = [TagKind::Comment, TagKind::Print, TagKind::Instruction];

#[derive(Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    cursor: usize,
    position: Position,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            cursor: 0,
            position: Position::start(),
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    fn advance(&mut self, n: usize) {
        self.position.advance(&self.input[self.cursor..self.cursor + n]);
        self.cursor += n;
    }

    /// Next token, skipping comments. `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Option<Result<Token>> {
        loop {
            let rest = self.remaining();
            if rest.is_empty() {
                return None;
            }

            let opener = OPENERS
                .into_iter()
                .find(|kind| rest.starts_with(kind.delimiters().0));

            let Some(kind) = opener else {
                return Some(Ok(self.read_text()));
            };

            match self.read_tag(kind) {
                Ok(Some(token)) => return Some(Ok(token)),
                Ok(None) => continue,
                Err(err) => {
                    // Nothing after an unclosed tag can be lexed.
                    self.cursor = self.input.len();
                    return Some(Err(err));
                }
            }
        }
    }

    fn read_text(&mut self) -> Token {
        let rest = self.remaining();
        // Stop at the first `{` that starts a tag; never rescans.
        let end = rest
            .match_indices('{')
            .map(|(index, _)| index)
            .find(|&index| {
                OPENERS
                    .iter()
                    .any(|kind| rest[index..].starts_with(kind.delimiters().0))
            })
            .unwrap_or(rest.len());

        let token = Token {
            kind: TokenKind::Text,
            text: rest[..end].to_string(),
            position: self.position,
        };
        self.advance(end);
        token
    }

    /// Reads one tag starting at the cursor. Comments yield `Ok(None)`.
    fn read_tag(&mut self, kind: TagKind) -> Result<Option<Token>> {
        let (open, close) = kind.delimiters();
        let start = self.position;
        let body = &self.remaining()[open.len()..];

        let Some(end) = body.find(close) else {
            return Err(TemplateError::UnclosedTag {
                kind,
                position: start,
            });
        };

        let text = body[..end].trim().to_string();
        self.advance(open.len() + end + close.len());

        let kind = match kind {
            TagKind::Comment => return Ok(None),
            TagKind::Print => TokenKind::Print,
            TagKind::Instruction => TokenKind::Instruction,
        };
        Ok(Some(Token {
            kind,
            text,
            position: start,
        }))
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Lex the whole template, stopping at the first unclosed tag.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Tokenizer::new(input).collect()
}
