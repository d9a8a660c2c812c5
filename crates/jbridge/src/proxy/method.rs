//! Overload selection and dispatch

use std::fmt;

use jbridge_sys::ValueKind;
use log::trace;

use super::JavaValue;
use crate::convert::{Value, ValueConversion};
use crate::error::{BridgeError, Result};
use crate::jni::{JArg, NativeInterface, ObjectRef};
use crate::runtime::{MethodDescriptor, Runtime};

/// Pick the overload to call with `args`.
///
/// Only overloads with a matching parameter count are candidates. An
/// overload whose parameters are the natural types of every argument wins
/// over one that needs widening or boxing to a supertype; within each tier
/// reflection order decides. If no candidate accepts the arguments the call
/// is refused.
pub fn select_overload<'m, O>(
    name: &str,
    overloads: &'m [MethodDescriptor],
    args: &[Value<O>],
) -> Result<&'m MethodDescriptor> {
    let candidates: Vec<&MethodDescriptor> =
        overloads.iter().filter(|m| m.arity() == args.len()).collect();
    if candidates.is_empty() {
        return Err(BridgeError::NoMatchingOverload {
            method: name.to_string(),
            arity: args.len(),
        });
    }

    let all = |m: &MethodDescriptor, test: fn(&str, &Value<O>) -> bool| {
        m.parameters.iter().zip(args).all(|(param, arg)| test(param, arg))
    };
    candidates
        .iter()
        .find(|m| all(**m, ValueConversion::matches_exactly))
        .or_else(|| candidates.iter().find(|m| all(**m, ValueConversion::accepts)))
        .copied()
        .ok_or_else(|| BridgeError::IncompatibleArguments {
            method: name.to_string(),
            arity: args.len(),
        })
}

fn convert_args<'rt>(
    conv: &ValueConversion<'rt>,
    method: &MethodDescriptor,
    args: &[JavaValue<'rt>],
) -> Result<Vec<JArg>> {
    method
        .parameters
        .iter()
        .zip(args)
        .map(|(param, arg)| conv.to_typed_arg(arg, param))
        .collect()
}

fn describe_overloads(f: &mut fmt::Formatter<'_>, kind: &str, overloads: &[MethodDescriptor]) -> fmt::Result {
    let listed: Vec<String> = overloads
        .iter()
        .map(|m| format!("{}/{}", m.name, m.arity()))
        .collect();
    write!(f, "<Java {} method [{}]>", kind, listed.join(", "))
}

/// Static overloads of one name on one class.
pub struct MethodProxy<'rt> {
    rt: &'rt Runtime,
    class: ObjectRef,
    name: String,
    overloads: Vec<MethodDescriptor>,
}

impl<'rt> MethodProxy<'rt> {
    pub(crate) fn new(
        rt: &'rt Runtime,
        class: ObjectRef,
        name: impl Into<String>,
        overloads: Vec<MethodDescriptor>,
    ) -> Self {
        Self {
            rt,
            class,
            name: name.into(),
            overloads,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidate overloads in reflection order
    pub fn overloads(&self) -> &[MethodDescriptor] {
        &self.overloads
    }

    /// Call the best-matching overload
    pub fn call(&self, args: &[JavaValue<'rt>]) -> Result<JavaValue<'rt>> {
        let method = select_overload(&self.name, &self.overloads, args)?;
        self.invoke(method, args)
            .map_err(|e| BridgeError::invocation(self.name.clone(), e))
    }

    fn invoke(&self, method: &MethodDescriptor, args: &[JavaValue<'rt>]) -> Result<JavaValue<'rt>> {
        let conv = ValueConversion::new(self.rt);
        let sig = method.jni_signature();
        let ret = ValueKind::from_type_name(&method.return_type);
        trace!("static call {}{}", self.name, sig);

        let result = self.rt.with_call_frame(args.len(), |env: &dyn NativeInterface| {
            let id = env.get_static_method_id(self.class, &self.name, &sig)?;
            if id.is_null() {
                return Err(BridgeError::Resolution {
                    kind: "static method",
                    name: self.name.clone(),
                    signature: sig.clone(),
                });
            }
            let jargs = convert_args(&conv, method, args)?;
            env.call_static_method(self.class, id, ret, &jargs)
        })?;
        conv.from_return(result)
    }
}

impl fmt::Display for MethodProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe_overloads(f, "static", &self.overloads)
    }
}

/// Instance overloads of one name, bound to a receiver.
pub struct InstanceMethodProxy<'rt> {
    rt: &'rt Runtime,
    receiver: ObjectRef,
    name: String,
    overloads: Vec<MethodDescriptor>,
}

impl<'rt> InstanceMethodProxy<'rt> {
    pub(crate) fn new(
        rt: &'rt Runtime,
        receiver: ObjectRef,
        name: impl Into<String>,
        overloads: Vec<MethodDescriptor>,
    ) -> Self {
        Self {
            rt,
            receiver,
            name: name.into(),
            overloads,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidate overloads in reflection order
    pub fn overloads(&self) -> &[MethodDescriptor] {
        &self.overloads
    }

    /// Call the best-matching overload on the receiver
    pub fn call(&self, args: &[JavaValue<'rt>]) -> Result<JavaValue<'rt>> {
        let method = select_overload(&self.name, &self.overloads, args)?;
        self.invoke(method, args)
            .map_err(|e| BridgeError::invocation(self.name.clone(), e))
    }

    fn invoke(&self, method: &MethodDescriptor, args: &[JavaValue<'rt>]) -> Result<JavaValue<'rt>> {
        let conv = ValueConversion::new(self.rt);
        let sig = method.jni_signature();
        let ret = ValueKind::from_type_name(&method.return_type);
        trace!("instance call {}{}", self.name, sig);

        let result = self.rt.with_call_frame(args.len(), |env: &dyn NativeInterface| {
            // Resolved against the receiver's runtime class on every call.
            let class = env.get_object_class(self.receiver)?;
            let id = env.get_method_id(class, &self.name, &sig)?;
            if id.is_null() {
                return Err(BridgeError::Resolution {
                    kind: "method",
                    name: self.name.clone(),
                    signature: sig.clone(),
                });
            }
            let jargs = convert_args(&conv, method, args)?;
            env.call_method(self.receiver, id, ret, &jargs)
        })?;
        conv.from_return(result)
    }
}

impl fmt::Display for InstanceMethodProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe_overloads(f, "instance", &self.overloads)
    }
}
