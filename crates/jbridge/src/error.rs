//! Error types for the bridge

use jbridge_sys::JniFn;
use thiserror::Error;

use crate::loader::LoadError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Every failure the bridge can report.
///
/// Variants fall into four families: native exceptions raised inside the
/// VM, resolution failures (absent classes or members), configuration
/// failures at startup, and argument-buffer alignment faults. The proxy
/// layer adds its own attribute and overload errors on top.
#[derive(Debug, Error)]
pub enum BridgeError {
    // ========================================================================
    // Native invocation
    // ========================================================================
    /// A Java exception was pending after a JNI call. It has already been
    /// described to stderr and cleared.
    #[error("native exception occurred in {operation}")]
    NativeException {
        /// JNI function that raised
        operation: &'static str,
    },

    // ========================================================================
    // Resolution
    // ========================================================================
    /// `FindClass` returned nothing for this name
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// A method or field ID lookup returned null
    #[error("{kind} not found: {name} {signature}")]
    Resolution {
        /// "method", "static method" or "static field"
        kind: &'static str,
        /// Member name
        name: String,
        /// JNI type signature that was looked up
        signature: String,
    },

    // ========================================================================
    // Configuration
    // ========================================================================
    /// No `libjvm` in any probed location
    #[error("could not find libjvm for Java {version} on {platform}")]
    LibraryNotFound {
        /// Requested Java version
        version: String,
        /// Host platform name
        platform: String,
    },

    /// The host OS has no probe table
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// `JNI_CreateJavaVM` returned a non-zero code
    #[error("JVM init failed, code {code}")]
    CreateVm {
        /// Raw JNI return code
        code: i32,
    },

    /// The shared library could not be opened or lacks the entry point
    #[error(transparent)]
    Load(#[from] LoadError),

    // ========================================================================
    // Alignment
    // ========================================================================
    /// The jvalue buffer does not start on an 8-byte boundary
    #[error("jvalue array misaligned on ARM64: {address:#x} (must be 8-byte aligned)")]
    Alignment {
        /// Offending buffer address
        address: usize,
    },

    // ========================================================================
    // Native misuse
    // ========================================================================
    /// A function-table entry is null
    #[error("JNI function table slot {} ({}) is null", .0.index(), .0.name())]
    NullSlot(JniFn),

    /// A `JNIEnv` is only valid on the thread it belongs to
    #[error("JNI environment used off its owning thread")]
    WrongThread,

    /// A required pointer was null
    #[error("null {0} passed to JNI")]
    NullArgument(&'static str),

    /// `PushLocalFrame` failed (out of memory in the VM)
    #[error("failed to push local frame of capacity {capacity}")]
    LocalFrame {
        /// Requested capacity
        capacity: i32,
    },

    /// A Rust string contained an interior NUL and cannot be passed as
    /// modified UTF-8
    #[error("string contains an interior NUL byte: {0:?}")]
    InvalidString(String),

    // ========================================================================
    // Proxy layer
    // ========================================================================
    /// Attribute access resolved to nothing
    #[error("'{owner}' has no attribute '{name}'")]
    AttributeNotFound {
        /// Proxy being accessed
        owner: String,
        /// Requested attribute
        name: String,
    },

    /// No overload has the requested number of parameters
    #[error("no matching method for {arity} arguments")]
    NoMatchingOverload {
        /// Method name
        method: String,
        /// Number of arguments supplied
        arity: usize,
    },

    /// Overloads of the right arity exist but none takes these argument types
    #[error("no overload of {method} accepts the given {arity} arguments")]
    IncompatibleArguments {
        /// Method name
        method: String,
        /// Number of arguments supplied
        arity: usize,
    },

    /// A host value cannot be passed to a parameter of this type
    #[error("cannot pass {value} value as {param}")]
    ArgumentType {
        /// Declared parameter type
        param: String,
        /// Host value kind (`int`, `float`, `str`, ...)
        value: &'static str,
    },

    /// A host integer does not fit the parameter's primitive type
    #[error("integer {value} out of range for {param}")]
    IntegerOutOfRange {
        /// Declared parameter type
        param: String,
        /// Offending value
        value: i64,
    },

    /// A call failed after an overload was chosen
    #[error("failed to call method {method}: {source}")]
    Invocation {
        /// Method name
        method: String,
        /// Underlying failure
        #[source]
        source: Box<BridgeError>,
    },

    /// Reading a static field failed
    #[error("failed to access static field {field}: {source}")]
    FieldAccess {
        /// Field name
        field: String,
        /// Underlying failure
        #[source]
        source: Box<BridgeError>,
    },

    /// Dotted path outside the bridged namespaces
    #[error("'{0}' is not a bridged Java package")]
    NotBridged(String),
}

impl BridgeError {
    /// Errors that mean the bridge itself is unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::NullSlot(_)
                | BridgeError::Alignment { .. }
                | BridgeError::LibraryNotFound { .. }
                | BridgeError::UnsupportedPlatform(_)
                | BridgeError::CreateVm { .. }
                | BridgeError::Load(_)
        )
    }

    /// True for a missing class, looking through invocation wrappers
    pub fn is_class_not_found(&self) -> bool {
        match self {
            BridgeError::ClassNotFound(_) => true,
            BridgeError::Invocation { source, .. } | BridgeError::FieldAccess { source, .. } => {
                source.is_class_not_found()
            }
            _ => false,
        }
    }

    pub(crate) fn invocation(method: impl Into<String>, source: BridgeError) -> Self {
        BridgeError::Invocation {
            method: method.into(),
            source: Box::new(source),
        }
    }
}
