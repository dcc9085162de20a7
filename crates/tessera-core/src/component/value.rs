use std::fmt;
use std::path::PathBuf;

use crate::naming::AbstractName;

/// Semantic type of an attribute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Accepts every value
    Any,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Path,
    Name,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueKind::Any => "any",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Path => "path",
            ValueKind::Name => "name",
            ValueKind::List => "list",
        };
        f.write_str(label)
    }
}

/// Value held by a component attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Path(PathBuf),
    Name(AbstractName),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Kind of this value; `None` for [`AttributeValue::Null`].
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Bool(_) => Some(ValueKind::Bool),
            AttributeValue::Int(_) => Some(ValueKind::Int),
            AttributeValue::Float(_) => Some(ValueKind::Float),
            AttributeValue::Str(_) => Some(ValueKind::Str),
            AttributeValue::Bytes(_) => Some(ValueKind::Bytes),
            AttributeValue::Path(_) => Some(ValueKind::Path),
            AttributeValue::Name(_) => Some(ValueKind::Name),
            AttributeValue::List(_) => Some(ValueKind::List),
        }
    }

    /// Null fits every slot; otherwise the kinds must agree unless the slot is `Any`.
    pub fn conforms_to(&self, kind: ValueKind) -> bool {
        match self.kind() {
            None => true,
            Some(actual) => kind == ValueKind::Any || kind == actual,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            AttributeValue::Path(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(x) => write!(f, "{}", x),
            AttributeValue::Str(s) => write!(f, "{:?}", s),
            AttributeValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            AttributeValue::Path(p) => write!(f, "{}", p.display()),
            AttributeValue::Name(n) => write!(f, "{}", n),
            AttributeValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<PathBuf> for AttributeValue {
    fn from(value: PathBuf) -> Self {
        AttributeValue::Path(value)
    }
}

impl From<AbstractName> for AttributeValue {
    fn from(value: AbstractName) -> Self {
        AttributeValue::Name(value)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(value: Vec<AttributeValue>) -> Self {
        AttributeValue::List(value)
    }
}
