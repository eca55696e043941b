use core::fmt;
use std::rc::Rc;

use itertools::Itertools;

use crate::{error::WispError, stack::ensure_sufficient_stack};

pub type BuiltinResult = Result<Option<Value>, WispError>;

/// A host function callable from programs. Programs cannot create these,
/// they are registered into the root environment before a run.
#[derive(Clone)]
pub struct Builtin {
    name: Rc<str>,
    function: Rc<dyn Fn(Vec<Value>) -> BuiltinResult>,
}

impl Builtin {
    pub fn new(name: impl Into<Rc<str>>, function: impl Fn(Vec<Value>) -> BuiltinResult + 'static) -> Self {
        Self { name: name.into(), function: Rc::new(function) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, arguments: Vec<Value>) -> BuiltinResult {
        (self.function)(arguments)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    List,
    Function,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Function => "function",
        })
    }
}

// Values produced by evaluating expressions. `Display` gives the print form
// used by `display`, [`Value::repr`] the quoted read-back form.
#[derive(Debug)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    List(Vec<Value>),
    Function(Builtin),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Number(_) => ValueKind::Number,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::List(_) => ValueKind::List,
            Self::Function(_) => ValueKind::Function,
        }
    }

    pub fn repr(&self) -> Repr<'_> {
        Repr(self)
    }

    fn mismatch(&self, expected: ValueKind) -> WispError {
        WispError::type_mismatch("value", expected.to_string(), self.kind().to_string())
    }

    pub fn as_str(&self) -> Result<&str, WispError> {
        match self {
            Self::String(string) => Ok(string),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    pub fn as_number(&self) -> Result<f64, WispError> {
        match self {
            Self::Number(number) => Ok(*number),
            other => Err(other.mismatch(ValueKind::Number)),
        }
    }

    pub fn as_boolean(&self) -> Result<bool, WispError> {
        match self {
            Self::Boolean(boolean) => Ok(*boolean),
            other => Err(other.mismatch(ValueKind::Boolean)),
        }
    }

    pub fn as_list(&self) -> Result<&[Value], WispError> {
        match self {
            Self::List(list) => Ok(list),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }

    pub fn as_function(&self) -> Result<&Builtin, WispError> {
        match self {
            Self::Function(function) => Ok(function),
            other => Err(other.mismatch(ValueKind::Function)),
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        ensure_sufficient_stack(|| match self {
            Self::String(string) => Self::String(string.clone()),
            Self::Number(number) => Self::Number(*number),
            Self::Boolean(boolean) => Self::Boolean(*boolean),
            Self::List(list) => Self::List(list.clone()),
            Self::Function(builtin) => Self::Function(builtin.clone()),
        })
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        let Self::List(list) = self else { return };

        let mut pending = std::mem::take(list);
        while let Some(mut value) = pending.pop() {
            if let Self::List(children) = &mut value {
                pending.append(children);
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self {
            Self::String(string) => f.write_str(string),
            Self::Number(number) => write_number(f, *number),
            Self::Boolean(boolean) => write_boolean(f, *boolean),
            Self::List(list) => write!(f, "({})", list.iter().join(" ")),
            Self::Function(builtin) => write!(f, "#<builtin {}>", builtin.name),
        })
    }
}

/// Read-back rendering of a [`Value`]: strings are quoted and escaped.
pub struct Repr<'v>(&'v Value);

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self.0 {
            Value::String(string) => write_quoted(f, string),
            Value::List(list) => write!(f, "({})", list.iter().map(Value::repr).join(" ")),
            other => fmt::Display::fmt(other, f),
        })
    }
}

pub(crate) fn write_number(f: &mut fmt::Formatter<'_>, number: f64) -> fmt::Result {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        write!(f, "{}", number as i64)
    } else if number.is_finite() {
        write!(f, "{:.6}", number)
    } else {
        write!(f, "{}", number)
    }
}

pub(crate) fn write_boolean(f: &mut fmt::Formatter<'_>, boolean: bool) -> fmt::Result {
    f.write_str(if boolean { "#t" } else { "#f" })
}

pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, string: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in string.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '"' => f.write_str("\\\"")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}
