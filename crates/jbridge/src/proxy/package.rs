use std::fmt;

use log::debug;

use super::{ClassProxy, Member, Resolve};
use crate::error::Result;
use crate::runtime::Runtime;

/// A dotted package name. Holds no state; every lookup goes to the runtime.
#[derive(Clone)]
pub struct PackageProxy<'rt> {
    rt: &'rt Runtime,
    name: String,
}

impl<'rt> PackageProxy<'rt> {
    /// Proxy for `name` (e.g. `java.util`)
    pub fn new(rt: &'rt Runtime, name: impl Into<String>) -> Self {
        Self {
            rt,
            name: name.into(),
        }
    }

    /// Dotted package name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classes discovered in this package (best effort)
    pub fn classes(&self) -> Vec<String> {
        self.rt.discover_package_classes(&self.name)
    }
}

impl<'rt> Resolve<'rt> for PackageProxy<'rt> {
    /// `name` is a class if the VM can find `package.name`, otherwise a
    /// sub-package. Nothing is cached for misses.
    fn resolve(&self, name: &str) -> Result<Member<'rt>> {
        let candidate = if self.name.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.name, name)
        };
        match self.rt.lookup_class(&candidate) {
            Ok(_) => Ok(Member::Class(ClassProxy::new(self.rt, candidate))),
            Err(e) => {
                debug!("{} is not a class ({}), treating as package", candidate, e);
                Ok(Member::Package(PackageProxy::new(self.rt, candidate)))
            }
        }
    }
}

impl fmt::Display for PackageProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Java package {}>", self.name)
    }
}
