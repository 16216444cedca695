use crate::ast::{Node, Path};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Insertion-ordered mapping used for template data and scope layers.
pub type Map = IndexMap<String, Value>;

/// A loop layer: items of the caller's data are bound by reference.
type Scope<'a> = IndexMap<String, Cow<'a, Value>>;

/// Host data exposed through named fields rather than keys.
///
/// A dotted path falls back to [`Object::field`] when the value is not a
/// [`Value::Map`] holding the segment.
pub trait Object: fmt::Debug + Send + Sync {
    fn field(&self, name: &str) -> Option<Value>;

    /// Items produced by `{% for %}`; `None` means not iterable.
    fn iter(&self) -> Option<Vec<Value>> {
        None
    }

    fn is_truthy(&self) -> bool {
        true
    }

    fn render(&self) -> String {
        "[object]".to_string()
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
    Object(Arc<dyn Object>),
}

impl Value {
    pub fn object(object: impl Object + 'static) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Keyed access; only maps have keys.
    pub fn get_item(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Named-field access; only host objects have fields.
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(o) => o.field(name),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(a) => !a.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Object(o) => o.is_truthy(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }
}

/// Canonical string form used by `{{ ... }}`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) if *x != 0.0 && !(1e-4..1e16).contains(&x.abs()) => {
                write!(f, "{x:e}")
            }
            Value::Float(x) if x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Object(o) => f.write_str(&o.render()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Value::Int(i64::from(i))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Integers that may not fit in `i64` fall back to a float.
macro_rules! impl_from_wide_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                i64::try_from(i).map_or(Value::Float(i as f64), Value::Int)
            }
        })*
    };
}

impl_from_wide_int!(u64, usize, isize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Items for a loop: list elements, map keys, or the chars of a string.
/// Elements of a borrowed list stay borrowed.
pub fn loop_items<'v>(source: Cow<'v, Value>) -> Option<Vec<Cow<'v, Value>>> {
    let owned = |values: Vec<Value>| -> Vec<Cow<'v, Value>> {
        values.into_iter().map(Cow::Owned).collect()
    };
    match source {
        Cow::Borrowed(Value::List(items)) => Some(items.iter().map(Cow::Borrowed).collect()),
        Cow::Owned(Value::List(items)) => Some(owned(items)),
        source => match &*source {
            Value::Map(m) => Some(owned(m.keys().cloned().map(Value::String).collect())),
            Value::String(s) => Some(owned(
                s.chars().map(|c| Value::String(c.to_string())).collect(),
            )),
            Value::Object(o) => o.iter().map(owned),
            _ => None,
        },
    }
}

/// Walks `segments` from `value`: a key of the current value, else a field.
/// Borrows as long as the path stays inside maps.
fn resolve<'v>(mut value: Cow<'v, Value>, segments: &[String]) -> Option<Cow<'v, Value>> {
    for segment in segments {
        value = match value {
            Cow::Borrowed(v) => match v.get_item(segment) {
                Some(item) => Cow::Borrowed(item),
                None => Cow::Owned(v.get_attr(segment)?),
            },
            Cow::Owned(v) => Cow::Owned(
                v.get_item(segment)
                    .cloned()
                    .or_else(|| v.get_attr(segment))?,
            ),
        };
    }
    Some(value)
}

/// Variable scopes for one render: the caller's data at the bottom, one
/// layer per active loop above it.
pub struct Context<'a> {
    root: &'a Map,
    scopes: Vec<Scope<'a>>,
}

impl<'a> Context<'a> {
    pub fn new(root: &'a Map) -> Self {
        Self {
            root,
            scopes: Vec::new(),
        }
    }

    /// Innermost binding of `name`.
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .map(|value| &**value)
            .or_else(|| self.root.get(name))
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Binds `name` in the innermost pushed layer. The root data is never
    /// written; without a pushed layer this is a no-op.
    pub fn set(&mut self, name: impl Into<String>, value: Cow<'a, Value>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Runs `f` inside a freshly pushed layer, popping it afterwards.
    pub fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_scope();
        let depth = self.scopes.len();
        let result = f(self);
        debug_assert_eq!(self.scopes.len(), depth, "unbalanced scopes");
        self.pop_scope();
        result
    }

    /// Resolves a dotted path. The first segment is looked up in the scopes;
    /// each later one as a key of the previous value, then as a field.
    ///
    /// Results inside the caller's data are borrowed from it; only values
    /// produced by [`Object::field`] or owned by a loop layer are copied.
    pub fn lookup(&self, path: &Path) -> Option<Cow<'a, Value>> {
        let (first, rest) = path.segments().split_first()?;
        let root: &'a Map = self.root;
        match self.scopes.iter().rev().find_map(|scope| scope.get(first.as_str())) {
            Some(Cow::Borrowed(value)) => resolve(Cow::Borrowed(*value), rest),
            Some(Cow::Owned(value)) => {
                resolve(Cow::Borrowed(value), rest).map(|v| Cow::Owned(v.into_owned()))
            }
            None => resolve(Cow::Borrowed(root.get(first.as_str())?), rest),
        }
    }
}

pub fn render_nodes<'a>(nodes: &[Node], ctx: &mut Context<'a>, output: &mut String) {
    for node in nodes {
        match node {
            Node::Text(s) => output.push_str(s),
            Node::Print(path) => match ctx.lookup(path) {
                Some(value) => output.push_str(&value.to_string()),
                None => tracing::trace!(%path, "undefined variable"),
            },
            Node::If {
                condition,
                then_body,
                else_body,
            } => {
                let truthy = ctx.lookup(condition).is_some_and(|v| v.is_truthy());
                let body = if truthy { then_body } else { else_body };
                render_nodes(body, ctx, output);
            }
            Node::For {
                target,
                iterable,
                body,
            } => {
                let Some(source) = ctx.lookup(iterable) else {
                    tracing::trace!(%iterable, "undefined loop source");
                    continue;
                };
                let kind = source.type_name();
                let Some(items) = loop_items(source) else {
                    tracing::trace!(%iterable, kind, "loop source not iterable");
                    continue;
                };
                ctx.with_scope(|ctx| {
                    for item in items {
                        ctx.set(target.clone(), item);
                        render_nodes(body, ctx, output);
                    }
                });
            }
        }
    }
}
