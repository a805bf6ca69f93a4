use std::collections::BTreeMap;
use std::rc::Rc;

/// A host-side function: native code standing in for a script closure.
#[derive(Clone)]
pub struct NativeFunction(Rc<dyn Fn(&[ScriptValue]) -> Result<(), String>>);

impl NativeFunction {
    /// A function that can raise: an `Err` is what a script `error(...)` would be.
    pub fn fallible<F>(f: F) -> Self
    where F: Fn(&[ScriptValue]) -> Result<(), String> + 'static {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[ScriptValue]) -> Result<(), String> { (self.0)(args) }

    pub fn ptr_eq(&self, other: &NativeFunction) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "function: {:p}", Rc::as_ptr(&self.0)) }
}

/// Trait for types that can be converted into native functions.
pub trait IntoNativeFunction {
    fn into_native_function(self) -> NativeFunction;
}

impl<F> IntoNativeFunction for F
where F: Fn(&[ScriptValue]) + 'static
{
    fn into_native_function(self) -> NativeFunction {
        NativeFunction(Rc::new(move |args| {
            self(args);
            Ok(())
        }))
    }
}

impl IntoNativeFunction for NativeFunction {
    fn into_native_function(self) -> NativeFunction { self }
}

// Channel senders forward each call's arguments; a closed receiver is ignored.
#[cfg(feature = "tokio")]
impl IntoNativeFunction for tokio::sync::mpsc::UnboundedSender<Vec<ScriptValue>> {
    fn into_native_function(self) -> NativeFunction {
        NativeFunction(Rc::new(move |args| {
            let _ = self.send(args.to_vec());
            Ok(())
        }))
    }
}

impl IntoNativeFunction for std::sync::mpsc::Sender<Vec<ScriptValue>> {
    fn into_native_function(self) -> NativeFunction {
        NativeFunction(Rc::new(move |args| {
            let _ = self.send(args.to_vec());
            Ok(())
        }))
    }
}

pub type Table = Rc<BTreeMap<String, ScriptValue>>;

/// A value in the native host.
#[derive(Clone, Debug, Default)]
pub enum ScriptValue {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Function(NativeFunction),
    Table(Table),
}

impl ScriptValue {
    pub fn function(f: impl IntoNativeFunction) -> Self { ScriptValue::Function(f.into_native_function()) }

    pub fn table<K: Into<String>>(fields: impl IntoIterator<Item = (K, ScriptValue)>) -> Self {
        ScriptValue::Table(Rc::new(fields.into_iter().map(|(k, v)| (k.into(), v)).collect()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Function(_) => "function",
            ScriptValue::Table(_) => "table",
        }
    }

    /// Field lookup on a table; `None` for anything else or a missing key.
    pub fn field(&self, key: &str) -> Option<&ScriptValue> {
        match self {
            ScriptValue::Table(table) => table.get(key),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool { matches!(self, ScriptValue::Nil) }
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScriptValue::Nil, ScriptValue::Nil) => true,
            (ScriptValue::Bool(a), ScriptValue::Bool(b)) => a == b,
            (ScriptValue::Number(a), ScriptValue::Number(b)) => a == b,
            (ScriptValue::String(a), ScriptValue::String(b)) => a == b,
            (ScriptValue::Function(a), ScriptValue::Function(b)) => a.ptr_eq(b),
            (ScriptValue::Table(a), ScriptValue::Table(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self { ScriptValue::Bool(b) }
}
impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self { ScriptValue::Number(n) }
}
impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self { ScriptValue::String(s.into()) }
}
impl From<String> for ScriptValue {
    fn from(s: String) -> Self { ScriptValue::String(s.into()) }
}
impl From<NativeFunction> for ScriptValue {
    fn from(f: NativeFunction) -> Self { ScriptValue::Function(f) }
}

impl std::fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptValue::Nil => write!(f, "nil"),
            ScriptValue::Bool(b) => write!(f, "{b}"),
            ScriptValue::Number(n) => write!(f, "{n}"),
            ScriptValue::String(s) => write!(f, "{s}"),
            ScriptValue::Function(func) => write!(f, "{func:?}"),
            ScriptValue::Table(t) => write!(f, "table: {:p}", Rc::as_ptr(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_table_fields() {
        let position = ScriptValue::table([("X", ScriptValue::Number(1.0)), ("Y", ScriptValue::Number(2.0))]);
        let obj = ScriptValue::table([("Name", ScriptValue::from("A")), ("Position", position)]);
        assert_eq!(obj.field("Name").and_then(|v| v.as_str()), Some("A"));
        assert_eq!(obj.field("Position").and_then(|p| p.field("Y")).and_then(|v| v.as_number()), Some(2.0));
        assert_eq!(obj.field("Missing"), None);
        assert_eq!(ScriptValue::Nil.field("Name"), None);
    }

    #[test]
    fn test_function_identity() {
        let calls = Rc::new(Cell::new(0));
        let f = {
            let calls = calls.clone();
            ScriptValue::function(move |_: &[ScriptValue]| calls.set(calls.get() + 1))
        };
        let g = f.clone();
        assert_eq!(f, g);
        assert_ne!(f, ScriptValue::function(|_: &[ScriptValue]| {}));

        if let ScriptValue::Function(func) = &g {
            func.call(&[]).unwrap();
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(f.type_name(), "function");
    }

    #[test]
    fn test_std_channel_function() {
        let (tx, rx) = std::sync::mpsc::channel::<Vec<ScriptValue>>();
        let f = tx.into_native_function();
        f.call(&[ScriptValue::from(3.0), "x".into()]).unwrap();
        assert_eq!(rx.try_recv().unwrap(), vec![ScriptValue::Number(3.0), ScriptValue::from("x")]);
        assert!(rx.try_recv().is_err());
    }
}
