//! Reflected class, method and field descriptions

use std::fmt;

use crate::proxy::signature;

/// Name given to a method whose metadata could not be read
pub const UNKNOWN_METHOD: &str = "unknown_method";
/// Name given to a field whose metadata could not be read
pub const UNKNOWN_FIELD: &str = "unknown_field";
/// Type name substituted for an unreadable parameter or field type
pub const UNKNOWN_TYPE: &str = "Object";
/// Parameter list recorded for methods with too many parameters to list
pub const ELIDED_PARAMETERS: &str = "...";

/// One reflected method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// Parameter type names in declaration order (`int`, `java.lang.String`, `[I`)
    pub parameters: Vec<String>,
    /// Return type name (`void` for none)
    pub return_type: String,
    /// Declared `static`
    pub is_static: bool,
}

impl MethodDescriptor {
    /// Create a descriptor
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<String>,
        return_type: impl Into<String>,
        is_static: bool,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type: return_type.into(),
            is_static,
        }
    }

    /// Stand-in for a method that could not be introspected
    pub fn placeholder() -> Self {
        Self::new(UNKNOWN_METHOD, Vec::new(), "void", false)
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// De-duplication key: `name(p1,p2,...)`
    pub fn key(&self) -> String {
        format!("{}({})", self.name, self.parameters.join(","))
    }

    /// JNI method descriptor, e.g. `(Ljava/lang/String;I)V`
    pub fn jni_signature(&self) -> String {
        signature::method_signature(&self.parameters, &self.return_type)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            write!(f, "static ")?;
        }
        write!(
            f,
            "{} {}({})",
            self.return_type,
            self.name,
            self.parameters.join(", ")
        )
    }
}

/// One reflected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Field type name
    pub field_type: String,
    /// Declared `static`
    pub is_static: bool,
}

impl FieldDescriptor {
    /// Create a descriptor
    pub fn new(name: impl Into<String>, field_type: impl Into<String>, is_static: bool) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            is_static,
        }
    }

    /// Stand-in for a field that could not be introspected
    pub fn placeholder() -> Self {
        Self::new(UNKNOWN_FIELD, UNKNOWN_TYPE, false)
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            write!(f, "static ")?;
        }
        write!(f, "{} {}", self.field_type, self.name)
    }
}

/// Snapshot of a class's methods and fields.
///
/// Declared members come first, followed by inherited public ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDescriptor {
    /// Dotted class name
    pub name: String,
    /// Methods, de-duplicated by name and parameter types
    pub methods: Vec<MethodDescriptor>,
    /// Fields, de-duplicated by name
    pub fields: Vec<FieldDescriptor>,
}

impl ClassDescriptor {
    /// Create a descriptor
    pub fn new(
        name: impl Into<String>,
        methods: Vec<MethodDescriptor>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            methods,
            fields,
        }
    }

    /// Descriptor with no members
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new(), Vec::new())
    }

    /// Every overload named `name`
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDescriptor> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Static overloads named `name`
    pub fn static_methods(&self, name: &str) -> Vec<MethodDescriptor> {
        self.methods_named(name).filter(|m| m.is_static).cloned().collect()
    }

    /// Instance overloads named `name`
    pub fn instance_methods(&self, name: &str) -> Vec<MethodDescriptor> {
        self.methods_named(name).filter(|m| !m.is_static).cloned().collect()
    }

    /// Static field named `name`
    pub fn static_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.is_static && f.name == name)
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} methods, {} fields)",
            self.name,
            self.methods.len(),
            self.fields.len()
        )
    }
}
