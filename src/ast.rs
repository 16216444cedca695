use std::fmt;

/// A dotted variable path such as `user.address.city`, pre-split into
/// segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(Vec<String>);

impl Path {
    pub fn parse(text: &str) -> Self {
        Path(text.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Print(Path),
    If {
        condition: Path,
        then_body: Vec<Node>,
        else_body: Vec<Node>,
    },
    For {
        target: String, // e.g., "item"
        iterable: Path, // e.g., "order.items"
        body: Vec<Node>,
    },
}

const INDENT: &str = "·  ";

/// Writes the one-line-per-node debug dump of `nodes` at `depth`.
pub(crate) fn dump(f: &mut fmt::Formatter<'_>, nodes: &[Node], depth: usize) -> fmt::Result {
    for node in nodes {
        let pad = INDENT.repeat(depth);
        match node {
            Node::Text(text) => writeln!(f, "{pad}Text {text:?}")?,
            Node::Print(path) => writeln!(f, "{pad}Print {path}")?,
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                writeln!(f, "{pad}If {condition}")?;
                writeln!(f, "{pad}{INDENT}Then")?;
                dump(f, then_body, depth + 2)?;
                writeln!(f, "{pad}{INDENT}Else")?;
                dump(f, else_body, depth + 2)?;
            }
            Node::For {
                target,
                iterable,
                body,
            } => {
                writeln!(f, "{pad}For {target} in {iterable}")?;
                dump(f, body, depth + 1)?;
            }
        }
    }
    Ok(())
}
