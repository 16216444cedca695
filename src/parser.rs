use crate::ast::{Node, Path};
use crate::error::{Position, Result, TemplateError};
use crate::lexer::{Token, TokenKind};
use regex::Regex;
use std::sync::LazyLock;

/// `if <dotted.path>`
static IF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^if\s+(\w+(?:\.\w+)*)$").expect("valid regex"));

/// `for <name> in <dotted.path>`
static FOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^for\s+(\w+)\s+in\s+(\w+(?:\.\w+)*)$").expect("valid regex")
});

/// A block whose closing keyword has not been seen yet.
enum OpenBlock {
    If {
        condition: Path,
        position: Position,
        children: Vec<Node>,
        /// Index into `children` where the first `else` was seen.
        else_at: Option<usize>,
    },
    For {
        target: String,
        iterable: Path,
        position: Position,
        children: Vec<Node>,
    },
}

impl OpenBlock {
    fn end_keyword(&self) -> &'static str {
        match self {
            OpenBlock::If { .. } => "endif",
            OpenBlock::For { .. } => "endfor",
        }
    }

    fn children(&mut self) -> &mut Vec<Node> {
        match self {
            OpenBlock::If { children, .. } | OpenBlock::For { children, .. } => children,
        }
    }

    /// Turns the accumulated children into the finished node, splitting an
    /// `if` at its `else`.
    fn finish(self) -> Node {
        match self {
            OpenBlock::If {
                condition,
                mut children,
                else_at,
                ..
            } => {
                let else_body = match else_at {
                    Some(index) => children.split_off(index),
                    None => Vec::new(),
                };
                Node::If {
                    condition,
                    then_body: children,
                    else_body,
                }
            }
            OpenBlock::For {
                target,
                iterable,
                children,
                ..
            } => Node::For {
                target,
                iterable,
                body: children,
            },
        }
    }
}

pub struct Parser {
    tokens: std::vec::IntoIter<Token>,
    root: Vec<Node>,
    open: Vec<OpenBlock>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            root: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Children list of the innermost open block, or the root.
    fn current(&mut self) -> &mut Vec<Node> {
        match self.open.last_mut() {
            Some(block) => block.children(),
            None => &mut self.root,
        }
    }

    pub fn parse(mut self) -> Result<Vec<Node>> {
        while let Some(token) = self.tokens.next() {
            match token.kind {
                TokenKind::Text => self.current().push(Node::Text(token.text)),
                TokenKind::Print => self.current().push(Node::Print(Path::parse(&token.text))),
                TokenKind::Instruction => self.parse_instruction(token)?,
            }
        }

        if let Some(block) = self.open.last() {
            let position = match block {
                OpenBlock::If { position, .. } | OpenBlock::For { position, .. } => *position,
            };
            return Err(TemplateError::UnclosedBlock {
                keyword: block.end_keyword().to_string(),
                position,
            });
        }

        Ok(self.root)
    }

    fn parse_instruction(&mut self, token: Token) -> Result<()> {
        match token.keyword() {
            "if" => {
                let caps = IF_REGEX
                    .captures(&token.text)
                    .ok_or_else(|| malformed("if", &token))?;
                self.open.push(OpenBlock::If {
                    condition: Path::parse(&caps[1]),
                    position: token.position,
                    children: Vec::new(),
                    else_at: None,
                });
            }
            "for" => {
                let caps = FOR_REGEX
                    .captures(&token.text)
                    .ok_or_else(|| malformed("for", &token))?;
                self.open.push(OpenBlock::For {
                    target: caps[1].to_string(),
                    iterable: Path::parse(&caps[2]),
                    position: token.position,
                    children: Vec::new(),
                });
            }
            "else" => {
                // Only the first `else` splits an `if`; anywhere else it is
                // an inert marker and renders nothing.
                if let Some(OpenBlock::If {
                    children,
                    else_at: else_at @ None,
                    ..
                }) = self.open.last_mut()
                {
                    *else_at = Some(children.len());
                }
            }
            keyword @ ("endif" | "endfor") => {
                let Some(block) = self.open.pop() else {
                    return Err(TemplateError::UnexpectedClose {
                        keyword: keyword.to_string(),
                        position: token.position,
                    });
                };
                if block.end_keyword() != keyword {
                    return Err(TemplateError::MismatchedClose {
                        expected: block.end_keyword().to_string(),
                        found: keyword.to_string(),
                        position: token.position,
                    });
                }
                let node = block.finish();
                self.current().push(node);
            }
            keyword => {
                return Err(TemplateError::UnknownInstruction {
                    keyword: keyword.to_string(),
                    position: token.position,
                })
            }
        }
        Ok(())
    }
}

fn malformed(keyword: &str, token: &Token) -> TemplateError {
    TemplateError::MalformedTag {
        keyword: keyword.to_string(),
        text: token.text.clone(),
        position: token.position,
    }
}
