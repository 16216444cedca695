//! djinn: a minimal Jinja-like text template engine.
//!
//! A template is compiled once into a tree of nodes and can then be
//! rendered any number of times against different data.
//!
//! Supported syntax:
//! - Literal text, passed through unchanged (newlines included).
//! - `{# comment #}`, dropped from the output.
//! - `{{ dotted.path }}`, replaced by the value at that path.
//! - `{% if path %} ... {% else %} ... {% endif %}`.
//! - `{% for name in path %} ... {% endfor %}`.
//!
//! Not supported:
//! - Expressions, operators or literals inside tags. `if` and `for` take a
//!   single dotted path.
//! - Filters, includes, inheritance, autoescaping.
//!
//! Lookup rules:
//! - The first path segment is the innermost binding of that name: loop
//!   variables shadow the caller's data.
//! - Each further segment is a key of the previous value if it is a map,
//!   otherwise a field of a host [`Object`].
//! - A miss anywhere yields nothing. `{{ }}` prints an empty string, `if`
//!   takes the else branch and `for` renders no iterations. Rendering never
//!   fails.
//!
//! ```
//! use djinn::{compile, Map, Value};
//!
//! let template = compile("{% for u in users %}{{ u.name }};{% endfor %}").unwrap();
//! let mut data = Map::new();
//! data.insert(
//!     "users".into(),
//!     Value::from(serde_json::json!([{"name": "ada"}, {"name": "bob"}])),
//! );
//! assert_eq!(template.render(&data), "ada;bob;");
//! ```

pub mod ast;
mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{Node, Path};
pub use error::{Position, Result, TagKind, TemplateError};
pub use eval::{Context, Map, Object, Value};

use std::fmt;
use std::str::FromStr;

/// A compiled template. Immutable; rendering only reads it, so one
/// template can be shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

/// Tokenize and parse `source`.
pub fn compile(source: &str) -> Result<Template> {
    let tokens = lexer::tokenize(source).inspect_err(|err| {
        tracing::debug!(%err, "template failed to tokenize");
    })?;
    let token_count = tokens.len();
    let nodes = parser::Parser::new(tokens).parse().inspect_err(|err| {
        tracing::debug!(%err, "template failed to parse");
    })?;
    tracing::debug!(tokens = token_count, nodes = nodes.len(), "compiled template");
    Ok(Template { nodes })
}

impl Template {
    /// Top-level nodes of the compiled tree.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Render against `data`. Each call gets its own scope stack.
    pub fn render(&self, data: &Map) -> String {
        let _span = tracing::trace_span!("render").entered();
        let mut ctx = Context::new(data);
        let mut output = String::new();
        eval::render_nodes(&self.nodes, &mut ctx, &mut output);
        output
    }

    /// Render against a JSON document. Anything but an object renders
    /// against empty data.
    pub fn render_json(&self, data: &serde_json::Value) -> String {
        let root = match Value::from(data.clone()) {
            Value::Map(map) => map,
            _ => Map::new(),
        };
        self.render(&root)
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        compile(s)
    }
}

/// Debug dump of the tree, one node per line.
impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Root")?;
        ast::dump(f, &self.nodes, 1)
    }
}
