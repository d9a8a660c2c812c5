use std::fmt;

use jbridge_sys::ValueKind;
use once_cell::unsync::OnceCell;

use super::signature::type_signature;
use super::{JavaValue, Member, MethodProxy, Resolve};
use crate::convert::ValueConversion;
use crate::error::{BridgeError, Result};
use crate::jni::{JReturn, LocalFrame, ObjectRef};
use crate::runtime::{ClassDescriptor, FieldDescriptor, Runtime};

/// Local references needed to read one static field
const FIELD_FRAME: i32 = 4;

/// A Java class. The class reference and its reflected descriptor are
/// fetched on first use and kept for the life of the proxy.
pub struct ClassProxy<'rt> {
    rt: &'rt Runtime,
    fqcn: String,
    class_ref: OnceCell<ObjectRef>,
    descriptor: OnceCell<ClassDescriptor>,
}

impl<'rt> ClassProxy<'rt> {
    /// Proxy for the dotted class name `fqcn`
    pub fn new(rt: &'rt Runtime, fqcn: impl Into<String>) -> Self {
        Self {
            rt,
            fqcn: fqcn.into(),
            class_ref: OnceCell::new(),
            descriptor: OnceCell::new(),
        }
    }

    /// Dotted class name
    pub fn name(&self) -> &str {
        &self.fqcn
    }

    /// Cached class reference
    pub fn class_ref(&self) -> Result<ObjectRef> {
        self.class_ref
            .get_or_try_init(|| self.rt.lookup_class(&self.fqcn))
            .copied()
    }

    /// Reflected members, read once
    pub fn descriptor(&self) -> Result<&ClassDescriptor> {
        self.descriptor
            .get_or_try_init(|| self.rt.find_class(&self.fqcn))
    }

    /// Resolve `name` and call it as a static method
    pub fn call(&self, name: &str, args: &[JavaValue<'rt>]) -> Result<JavaValue<'rt>> {
        self.resolve(name)?.call(args)
    }

    /// Read the static field `name`
    pub fn get(&self, name: &str) -> Result<JavaValue<'rt>> {
        match self.resolve(name)? {
            Member::Value(value) => Ok(value),
            _ => Err(BridgeError::AttributeNotFound {
                owner: self.fqcn.clone(),
                name: name.to_string(),
            }),
        }
    }

    fn read_static_field(&self, field: &FieldDescriptor) -> Result<JavaValue<'rt>> {
        let env = self.rt.env();
        let class = self.class_ref()?;
        let sig = type_signature(&field.field_type);
        let kind = ValueKind::from_type_name(&field.field_type);

        let frame = LocalFrame::push(env, FIELD_FRAME)?;
        let id = env.get_static_field_id(class, &field.name, &sig)?;
        if id.is_null() {
            return Err(BridgeError::Resolution {
                kind: "static field",
                name: field.name.clone(),
                signature: sig,
            });
        }
        let raw = env.get_static_field(class, id, kind)?;
        let raw = match raw {
            JReturn::Object(r) => JReturn::Object(frame.pop(r)),
            other => {
                frame.pop(ObjectRef::NULL);
                other
            }
        };
        ValueConversion::new(self.rt).from_return(raw)
    }
}

impl<'rt> Resolve<'rt> for ClassProxy<'rt> {
    /// Static field first, then static methods.
    fn resolve(&self, name: &str) -> Result<Member<'rt>> {
        let descriptor = self.descriptor()?;

        if let Some(field) = descriptor.static_field(name) {
            return self
                .read_static_field(field)
                .map(Member::Value)
                .map_err(|e| BridgeError::FieldAccess {
                    field: name.to_string(),
                    source: Box::new(e),
                });
        }

        let overloads = descriptor.static_methods(name);
        if !overloads.is_empty() {
            let class = self.class_ref()?;
            return Ok(Member::StaticMethod(MethodProxy::new(
                self.rt, class, name, overloads,
            )));
        }

        Err(BridgeError::AttributeNotFound {
            owner: self.fqcn.clone(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for ClassProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Java class {}>", self.fqcn)
    }
}
