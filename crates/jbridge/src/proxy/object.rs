use std::fmt;

use log::debug;
use once_cell::unsync::OnceCell;

use super::{InstanceMethodProxy, JavaValue, Member, Resolve};
use crate::convert::{AsHandle, WrapHandle};
use crate::error::{BridgeError, Result};
use crate::jni::ObjectRef;
use crate::runtime::{ClassDescriptor, Runtime};

/// A Java object that did not convert to a host scalar.
///
/// Only instance methods are reachable through it. The runtime class is
/// reflected on first access; if that fails the object exposes nothing.
#[derive(Clone)]
pub struct ObjectProxy<'rt> {
    rt: &'rt Runtime,
    handle: ObjectRef,
    descriptor: OnceCell<ClassDescriptor>,
}

impl<'rt> ObjectProxy<'rt> {
    /// Wrap `handle`
    pub fn new(rt: &'rt Runtime, handle: ObjectRef) -> Self {
        Self {
            rt,
            handle,
            descriptor: OnceCell::new(),
        }
    }

    /// Reflected runtime class, empty if it could not be read
    pub fn descriptor(&self) -> &ClassDescriptor {
        self.descriptor.get_or_init(|| {
            self.rt.describe_object(self.handle).unwrap_or_else(|e| {
                debug!("cannot reflect {:?}: {}", self.handle, e);
                ClassDescriptor::default()
            })
        })
    }

    /// Dotted name of the runtime class, if reflection succeeded
    pub fn class_name(&self) -> Option<&str> {
        let name = self.descriptor().name.as_str();
        (!name.is_empty()).then_some(name)
    }

    /// Resolve `name` and call it
    pub fn call(&self, name: &str, args: &[JavaValue<'rt>]) -> Result<JavaValue<'rt>> {
        self.resolve(name)?.call(args)
    }
}

impl<'rt> Resolve<'rt> for ObjectProxy<'rt> {
    fn resolve(&self, name: &str) -> Result<Member<'rt>> {
        let overloads = self.descriptor().instance_methods(name);
        if overloads.is_empty() {
            return Err(BridgeError::AttributeNotFound {
                owner: self.to_string(),
                name: name.to_string(),
            });
        }
        Ok(Member::InstanceMethod(InstanceMethodProxy::new(
            self.rt,
            self.handle,
            name,
            overloads,
        )))
    }
}

impl AsHandle for ObjectProxy<'_> {
    fn handle(&self) -> ObjectRef {
        self.handle
    }
}

impl<'rt> WrapHandle<'rt> for ObjectProxy<'rt> {
    fn wrap(rt: &'rt Runtime, handle: ObjectRef) -> Self {
        ObjectProxy::new(rt, handle)
    }
}

impl PartialEq for ObjectProxy<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl fmt::Debug for ObjectProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProxy")
            .field("handle", &self.handle)
            .finish()
    }
}

impl fmt::Display for ObjectProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Java object>")
    }
}
