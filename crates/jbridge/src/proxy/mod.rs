//! Dynamic proxies over Java packages, classes and objects
//!
//! Attribute access is [`Resolve::resolve`]: a package resolves names to
//! classes or sub-packages, a class to static fields and static methods, an
//! object to instance methods. Method proxies pick an overload when called.

mod class;
mod method;
mod object;
mod package;
pub mod signature;

use std::fmt;

pub use class::ClassProxy;
pub use method::{InstanceMethodProxy, MethodProxy};
pub use object::ObjectProxy;
pub use package::PackageProxy;

use crate::convert::Value;
use crate::error::{BridgeError, Result};

/// Host value whose objects are live proxies
pub type JavaValue<'rt> = Value<ObjectProxy<'rt>>;

/// Attribute lookup on a proxy.
pub trait Resolve<'rt> {
    /// Resolve `name` to the member it denotes
    fn resolve(&self, name: &str) -> Result<Member<'rt>>;

    /// Resolve a dotted path one segment at a time
    fn resolve_path(&self, path: &str) -> Result<Member<'rt>> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let first = match segments.next() {
            Some(first) => first,
            None => {
                return Err(BridgeError::AttributeNotFound {
                    owner: String::new(),
                    name: path.to_string(),
                })
            }
        };
        segments.try_fold(self.resolve(first)?, |member, segment| member.resolve(segment))
    }
}

/// What an attribute lookup produced.
pub enum Member<'rt> {
    /// A (possibly nonexistent) package
    Package(PackageProxy<'rt>),
    /// A class that was found
    Class(ClassProxy<'rt>),
    /// A static field value
    Value(JavaValue<'rt>),
    /// Static overloads of one name
    StaticMethod(MethodProxy<'rt>),
    /// Instance overloads bound to a receiver
    InstanceMethod(InstanceMethodProxy<'rt>),
}

impl<'rt> Member<'rt> {
    /// The package proxy, if this is one
    pub fn into_package(self) -> Option<PackageProxy<'rt>> {
        match self {
            Member::Package(p) => Some(p),
            _ => None,
        }
    }

    /// The class proxy, if this is one
    pub fn into_class(self) -> Option<ClassProxy<'rt>> {
        match self {
            Member::Class(c) => Some(c),
            _ => None,
        }
    }

    /// The value, if this is one
    pub fn into_value(self) -> Option<JavaValue<'rt>> {
        match self {
            Member::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Call a method member with `args`
    pub fn call(&self, args: &[JavaValue<'rt>]) -> Result<JavaValue<'rt>> {
        match self {
            Member::StaticMethod(m) => m.call(args),
            Member::InstanceMethod(m) => m.call(args),
            other => Err(BridgeError::AttributeNotFound {
                owner: other.to_string(),
                name: "<call>".to_string(),
            }),
        }
    }
}

impl<'rt> Resolve<'rt> for Member<'rt> {
    fn resolve(&self, name: &str) -> Result<Member<'rt>> {
        match self {
            Member::Package(p) => p.resolve(name),
            Member::Class(c) => c.resolve(name),
            Member::Value(Value::Object(o)) => o.resolve(name),
            other => Err(BridgeError::AttributeNotFound {
                owner: other.to_string(),
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Package(p) => p.fmt(f),
            Member::Class(c) => c.fmt(f),
            Member::Value(v) => v.fmt(f),
            Member::StaticMethod(m) => m.fmt(f),
            Member::InstanceMethod(m) => m.fmt(f),
        }
    }
}

impl fmt::Debug for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
