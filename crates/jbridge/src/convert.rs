//! Host values and their Java counterparts
//!
//! [`Value`] is what callers hand to and receive from the proxy layer.
//! Conversion to Java boxes scalars (`Integer.valueOf`, `Boolean.valueOf`)
//! and conversion back unboxes only `String`, `Boolean` and `Integer`; every
//! other object stays wrapped. The wrapper type is a parameter so this
//! module never depends on the proxy types.

use std::fmt;

use jbridge_sys::ValueKind;

use crate::error::{BridgeError, Result};
use crate::jni::{call_by_name, call_static_by_name, JArg, JReturn, ObjectRef};
use crate::runtime::Runtime;

/// A host-side value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<O> {
    /// Java `null`
    Null,
    /// `boolean` / `java.lang.Boolean`
    Bool(bool),
    /// Any integral value
    Int(i64),
    /// `float` / `double`
    Float(f64),
    /// `java.lang.String` (or a single `char`)
    Str(String),
    /// Any other Java object
    Object(O),
}

impl<O> Value<O> {
    /// Short name of the variant, used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Object(_) => "object",
        }
    }

    /// True for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean, if this is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The number as a float; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// The string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The wrapped object, if this is one
    pub fn as_object(&self) -> Option<&O> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl<O> From<bool> for Value<O> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<O> From<i64> for Value<O> {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl<O> From<i32> for Value<O> {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl<O> From<f64> for Value<O> {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<O> From<&str> for Value<O> {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl<O> From<String> for Value<O> {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<O: fmt::Display> fmt::Display for Value<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(o) => write!(f, "{}", o),
        }
    }
}

/// Host wrappers that carry a Java reference
pub trait AsHandle {
    /// The wrapped reference
    fn handle(&self) -> ObjectRef;
}

/// Host wrappers built around an unconverted Java reference
pub trait WrapHandle<'rt>: Sized {
    /// Wrap `handle`, which belongs to `rt`
    fn wrap(rt: &'rt Runtime, handle: ObjectRef) -> Self;
}

impl AsHandle for ObjectRef {
    fn handle(&self) -> ObjectRef {
        *self
    }
}

impl<'rt> WrapHandle<'rt> for ObjectRef {
    fn wrap(_rt: &'rt Runtime, handle: ObjectRef) -> Self {
        handle
    }
}

/// Converts values between the host and one [`Runtime`].
#[derive(Clone, Copy)]
pub struct ValueConversion<'rt> {
    rt: &'rt Runtime,
}

impl<'rt> ValueConversion<'rt> {
    /// Converter bound to `rt`
    pub fn new(rt: &'rt Runtime) -> Self {
        Self { rt }
    }

    /// Java argument for a host value.
    ///
    /// Strings and booleans become objects, integers become `Integer` (or
    /// `Long` outside the 32-bit range), floats pass through as `double`.
    pub fn to_native<O: AsHandle>(&self, value: &Value<O>) -> Result<JArg> {
        let env = self.rt.env();
        match value {
            Value::Null => Ok(JArg::null()),
            Value::Str(s) => Ok(JArg::Object(env.new_string_utf(s)?)),
            Value::Bool(b) => self.box_scalar(
                "java/lang/Boolean",
                "(Z)Ljava/lang/Boolean;",
                JArg::Bool(*b),
            ),
            Value::Int(n) => match JArg::from_host_int(*n) {
                int @ JArg::Int(_) => {
                    self.box_scalar("java/lang/Integer", "(I)Ljava/lang/Integer;", int)
                }
                long => self.box_scalar("java/lang/Long", "(J)Ljava/lang/Long;", long),
            },
            Value::Float(x) => Ok(JArg::from_host_float(*x)),
            Value::Object(o) => Ok(JArg::Object(o.handle())),
        }
    }

    /// `<class>.valueOf(arg)`
    fn box_scalar(&self, class: &str, sig: &str, arg: JArg) -> Result<JArg> {
        let class = self.rt.lookup_class(class)?;
        let boxed = call_static_by_name(self.rt.env(), class, "valueOf", sig, ValueKind::Object, &[arg])?;
        Ok(JArg::Object(boxed.object().unwrap_or(ObjectRef::NULL)))
    }

    /// Java argument for a parameter declared as `param_type`.
    ///
    /// A primitive parameter only takes a matching host scalar, and integers
    /// must fit its range. A reference parameter goes through
    /// [`to_native`](Self::to_native) but refuses floats, which have no
    /// object form there. Anything else is an error rather than a cell of
    /// the wrong kind.
    pub fn to_typed_arg<O: AsHandle>(&self, value: &Value<O>, param_type: &str) -> Result<JArg> {
        if !is_primitive(param_type) {
            return match value {
                Value::Float(_) => Err(mismatch(param_type, value)),
                _ => self.to_native(value),
            };
        }

        match (param_type, value) {
            ("boolean", Value::Bool(b)) => Ok(JArg::Bool(*b)),
            ("byte", Value::Int(n)) => narrow(param_type, *n).map(JArg::Byte),
            ("short", Value::Int(n)) => narrow(param_type, *n).map(JArg::Short),
            ("int", Value::Int(n)) => narrow(param_type, *n).map(JArg::Int),
            ("long", Value::Int(n)) => Ok(JArg::Long(*n)),
            ("float", Value::Int(n)) => Ok(JArg::Float(*n as f32)),
            ("float", Value::Float(x)) => Ok(JArg::Float(*x as f32)),
            ("double", Value::Int(n)) => Ok(JArg::Double(*n as f64)),
            ("double", Value::Float(x)) => Ok(JArg::Double(*x)),
            ("char", Value::Int(n)) => narrow(param_type, *n).map(JArg::Char),
            ("char", Value::Str(s)) => {
                let mut units = s.encode_utf16();
                match (units.next(), units.next()) {
                    (Some(unit), None) => Ok(JArg::Char(unit)),
                    _ => Err(mismatch(param_type, value)),
                }
            }
            _ => Err(mismatch(param_type, value)),
        }
    }

    /// True when `param_type` is the natural Java type of `value`, so no
    /// widening or boxing to a supertype is involved.
    pub fn matches_exactly<O>(param_type: &str, value: &Value<O>) -> bool {
        match value {
            Value::Null | Value::Object(_) => !is_primitive(param_type),
            Value::Bool(_) => matches!(param_type, "boolean" | "java.lang.Boolean"),
            Value::Int(n) if i32::try_from(*n).is_ok() => {
                matches!(param_type, "int" | "java.lang.Integer")
            }
            Value::Int(_) => matches!(param_type, "long" | "java.lang.Long"),
            Value::Float(_) => param_type == "double",
            Value::Str(_) => param_type == "java.lang.String",
        }
    }

    /// True when `value` can be passed to a parameter of `param_type`
    /// without a lossy reinterpretation.
    pub fn accepts<O>(param_type: &str, value: &Value<O>) -> bool {
        match value {
            Value::Null => !is_primitive(param_type),
            Value::Bool(_) => matches!(param_type, "boolean" | "java.lang.Boolean" | "java.lang.Object"),
            Value::Int(n) => match param_type {
                "byte" => i8::try_from(*n).is_ok(),
                "short" => i16::try_from(*n).is_ok(),
                "int" | "java.lang.Integer" => i32::try_from(*n).is_ok(),
                "long" | "float" | "double" => true,
                "java.lang.Long" => i32::try_from(*n).is_err(),
                "java.lang.Number" | "java.lang.Object" => true,
                _ => false,
            },
            Value::Float(_) => matches!(param_type, "float" | "double"),
            Value::Str(s) => match param_type {
                "char" => s.encode_utf16().count() == 1,
                "java.lang.String" | "java.lang.CharSequence" | "java.lang.Object" => true,
                _ => false,
            },
            Value::Object(_) => !is_primitive(param_type),
        }
    }

    /// Host value for a Java reference.
    ///
    /// `String`, `Boolean` and `Integer` unbox; null becomes `Null`; any
    /// other object (or one whose class cannot be read) is wrapped.
    pub fn to_host<W: WrapHandle<'rt>>(&self, handle: ObjectRef) -> Result<Value<W>> {
        if handle.is_null() {
            return Ok(Value::Null);
        }
        let env = self.rt.env();
        let class = match env.get_object_class(handle) {
            Ok(class) => class,
            Err(_) => return Ok(Value::Object(W::wrap(self.rt, handle))),
        };
        let value = self.unbox(handle);
        let _ = env.delete_local_ref(class);
        value
    }

    fn unbox<W: WrapHandle<'rt>>(&self, handle: ObjectRef) -> Result<Value<W>> {
        let env = self.rt.env();
        if self.is_instance(handle, "java/lang/String")? {
            let text = env.get_string_utf_chars(handle)?.unwrap_or_default();
            return Ok(Value::Str(text));
        }
        if self.is_instance(handle, "java/lang/Boolean")? {
            let b = call_by_name(env, handle, "booleanValue", "()Z", ValueKind::Boolean, &[])?;
            return Ok(Value::Bool(b.as_bool().unwrap_or(false)));
        }
        if self.is_instance(handle, "java/lang/Integer")? {
            let n = call_by_name(env, handle, "intValue", "()I", ValueKind::Int, &[])?;
            return Ok(Value::Int(n.as_i64().unwrap_or(0)));
        }
        Ok(Value::Object(W::wrap(self.rt, handle)))
    }

    fn is_instance(&self, handle: ObjectRef, class: &str) -> Result<bool> {
        let class = self.rt.lookup_class(class)?;
        self.rt.env().is_instance_of(handle, class)
    }

    /// Host value for a typed call result.
    pub fn from_return<W: WrapHandle<'rt>>(&self, result: JReturn) -> Result<Value<W>> {
        Ok(match result {
            JReturn::Void => Value::Null,
            JReturn::Object(r) => return self.to_host(r),
            JReturn::Boolean(b) => Value::Bool(b),
            JReturn::Byte(v) => Value::Int(v as i64),
            JReturn::Short(v) => Value::Int(v as i64),
            JReturn::Int(v) => Value::Int(v as i64),
            JReturn::Long(v) => Value::Int(v),
            JReturn::Float(v) => Value::Float(v as f64),
            JReturn::Double(v) => Value::Float(v),
            JReturn::Char(c) => Value::Str(String::from_utf16_lossy(&[c])),
        })
    }
}

fn narrow<T: TryFrom<i64>>(param_type: &str, n: i64) -> Result<T> {
    T::try_from(n).map_err(|_| BridgeError::IntegerOutOfRange {
        param: param_type.to_string(),
        value: n,
    })
}

fn mismatch<O>(param_type: &str, value: &Value<O>) -> BridgeError {
    BridgeError::ArgumentType {
        param: param_type.to_string(),
        value: value.type_name(),
    }
}

fn is_primitive(type_name: &str) -> bool {
    ValueKind::from_type_name(type_name).is_primitive()
}
