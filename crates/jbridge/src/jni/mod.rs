//! Native call layer
//!
//! [`NativeInterface`] is the seam between the bridge and a JVM. [`JniEnv`]
//! implements it by indexing the real JNI function table; tests implement it
//! with an in-memory fake. Every method that can raise a Java exception
//! checks for one right after the call and reports it as
//! [`BridgeError::NativeException`](crate::BridgeError::NativeException).

mod env;
mod frame;
pub mod marshal;
mod mutf8;

use std::ffi::c_void;
use std::fmt;

use jbridge_sys::{jfieldID, jmethodID, jobject, ValueKind};

use crate::error::{BridgeError, Result};

pub use env::JniEnv;
pub use frame::{call_frame_capacity, LocalFrame};
pub use marshal::{marshal_args, JValueArray};

// ============================================================================
// Handles
// ============================================================================

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident($raw:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name($raw);

        // Handles are plain addresses; the JVM owns what they point to.
        unsafe impl Send for $name {}
        unsafe impl Sync for $name {}

        impl $name {
            /// The null handle
            pub const NULL: Self = Self(std::ptr::null_mut());

            /// Wrap a raw JNI pointer
            #[inline]
            pub const fn from_raw(raw: $raw) -> Self {
                Self(raw)
            }

            /// Build a handle from an address. Used by non-JNI implementations
            /// of [`NativeInterface`] that hand out synthetic ids.
            #[inline]
            pub fn from_addr(addr: usize) -> Self {
                Self(addr as *mut c_void)
            }

            /// Raw JNI pointer
            #[inline]
            pub const fn as_raw(self) -> $raw {
                self.0
            }

            /// Address of the handle
            #[inline]
            pub fn addr(self) -> usize {
                self.0 as usize
            }

            /// True for the null handle
            #[inline]
            pub fn is_null(self) -> bool {
                self.0.is_null()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.addr())
            }
        }
    };
}

opaque_handle!(
    /// Reference to a Java object, class, string or array (local or global)
    ObjectRef(jobject)
);
opaque_handle!(
    /// Resolved method identifier
    MethodId(jmethodID)
);
opaque_handle!(
    /// Resolved field identifier
    FieldId(jfieldID)
);

// ============================================================================
// Call arguments and results
// ============================================================================

/// One argument to a `Call*MethodA` invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JArg {
    /// `boolean`
    Bool(bool),
    /// `byte`
    Byte(i8),
    /// `char`
    Char(u16),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Any reference, possibly null
    Object(ObjectRef),
}

impl JArg {
    /// Host integer: `int` when it fits in 32 bits, `long` otherwise.
    pub fn from_host_int(n: i64) -> Self {
        match i32::try_from(n) {
            Ok(i) => JArg::Int(i),
            Err(_) => JArg::Long(n),
        }
    }

    /// Host floats are always passed as `double`.
    pub fn from_host_float(x: f64) -> Self {
        JArg::Double(x)
    }

    /// The null reference
    pub const fn null() -> Self {
        JArg::Object(ObjectRef::NULL)
    }
}

impl From<bool> for JArg {
    fn from(b: bool) -> Self {
        JArg::Bool(b)
    }
}

impl From<i64> for JArg {
    fn from(n: i64) -> Self {
        JArg::from_host_int(n)
    }
}

impl From<f64> for JArg {
    fn from(x: f64) -> Self {
        JArg::from_host_float(x)
    }
}

impl From<ObjectRef> for JArg {
    fn from(r: ObjectRef) -> Self {
        JArg::Object(r)
    }
}

/// Result of a typed call or field read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JReturn {
    /// `void`
    Void,
    /// Reference result (possibly null)
    Object(ObjectRef),
    /// `boolean`
    Boolean(bool),
    /// `byte`
    Byte(i8),
    /// `char`
    Char(u16),
    /// `short`
    Short(i16),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
}

impl JReturn {
    /// The reference carried by an object result
    pub fn object(self) -> Option<ObjectRef> {
        match self {
            JReturn::Object(r) => Some(r),
            _ => None,
        }
    }

    /// Integral results widened to `i64`
    pub fn as_i64(self) -> Option<i64> {
        match self {
            JReturn::Byte(v) => Some(v as i64),
            JReturn::Short(v) => Some(v as i64),
            JReturn::Int(v) => Some(v as i64),
            JReturn::Long(v) => Some(v),
            _ => None,
        }
    }

    /// `boolean` result
    pub fn as_bool(self) -> Option<bool> {
        match self {
            JReturn::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Kind of this result
    pub fn kind(self) -> ValueKind {
        match self {
            JReturn::Void => ValueKind::Void,
            JReturn::Object(_) => ValueKind::Object,
            JReturn::Boolean(_) => ValueKind::Boolean,
            JReturn::Byte(_) => ValueKind::Byte,
            JReturn::Char(_) => ValueKind::Char,
            JReturn::Short(_) => ValueKind::Short,
            JReturn::Int(_) => ValueKind::Int,
            JReturn::Long(_) => ValueKind::Long,
            JReturn::Float(_) => ValueKind::Float,
            JReturn::Double(_) => ValueKind::Double,
        }
    }
}

// ============================================================================
// Native Interface
// ============================================================================

/// The subset of JNI the bridge drives.
///
/// Class names use the slash form (`java/lang/String`). Signatures are JNI
/// type descriptors (`(I)Ljava/lang/String;`).
pub trait NativeInterface: Send + Sync {
    // ========================================================================
    // Version and classes
    // ========================================================================

    /// `GetVersion`
    fn version(&self) -> Result<i32>;

    /// `FindClass`; null when the VM reports nothing without raising
    fn find_class(&self, name: &str) -> Result<ObjectRef>;

    /// `GetObjectClass`
    fn get_object_class(&self, obj: ObjectRef) -> Result<ObjectRef>;

    /// `IsInstanceOf`
    fn is_instance_of(&self, obj: ObjectRef, class: ObjectRef) -> Result<bool>;

    // ========================================================================
    // Member IDs
    // ========================================================================

    /// `GetMethodID`
    fn get_method_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<MethodId>;

    /// `GetStaticMethodID`
    fn get_static_method_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<MethodId>;

    /// `GetStaticFieldID`
    fn get_static_field_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<FieldId>;

    // ========================================================================
    // Calls and field reads
    // ========================================================================

    /// `Call<kind>MethodA` on an instance
    fn call_method(
        &self,
        obj: ObjectRef,
        method: MethodId,
        ret: ValueKind,
        args: &[JArg],
    ) -> Result<JReturn>;

    /// `CallStatic<kind>MethodA` on a class
    fn call_static_method(
        &self,
        class: ObjectRef,
        method: MethodId,
        ret: ValueKind,
        args: &[JArg],
    ) -> Result<JReturn>;

    /// `GetStatic<kind>Field`
    fn get_static_field(&self, class: ObjectRef, field: FieldId, kind: ValueKind)
        -> Result<JReturn>;

    // ========================================================================
    // Strings and arrays
    // ========================================================================

    /// `NewStringUTF`
    fn new_string_utf(&self, s: &str) -> Result<ObjectRef>;

    /// `GetStringUTFChars` + `ReleaseStringUTFChars`; `None` when the VM
    /// hands back no buffer
    fn get_string_utf_chars(&self, s: ObjectRef) -> Result<Option<String>>;

    /// `GetArrayLength`
    fn get_array_length(&self, array: ObjectRef) -> Result<i32>;

    /// `GetObjectArrayElement`
    fn get_object_array_element(&self, array: ObjectRef, index: i32) -> Result<ObjectRef>;

    // ========================================================================
    // References and frames
    // ========================================================================

    /// `NewGlobalRef`; null on failure
    fn new_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef>;

    /// `DeleteGlobalRef`
    fn delete_global_ref(&self, obj: ObjectRef) -> Result<()>;

    /// `DeleteLocalRef`
    fn delete_local_ref(&self, obj: ObjectRef) -> Result<()>;

    /// `PushLocalFrame`
    fn push_local_frame(&self, capacity: i32) -> Result<()>;

    /// `PopLocalFrame`; `result` survives as a new local reference in the
    /// enclosing frame
    fn pop_local_frame(&self, result: ObjectRef) -> ObjectRef;
}

// ============================================================================
// Named calls
// ============================================================================

/// Call an instance method by name on `obj`.
///
/// The method ID is resolved from the receiver's runtime class on every
/// call, so overriding methods dispatch correctly.
pub fn call_by_name(
    env: &dyn NativeInterface,
    obj: ObjectRef,
    name: &str,
    sig: &str,
    ret: ValueKind,
    args: &[JArg],
) -> Result<JReturn> {
    let class = env.get_object_class(obj)?;
    let method = env.get_method_id(class, name, sig);
    let _ = env.delete_local_ref(class);
    let method = method?;
    if method.is_null() {
        return Err(BridgeError::Resolution {
            kind: "method",
            name: name.to_string(),
            signature: sig.to_string(),
        });
    }
    env.call_method(obj, method, ret, args)
}

/// Call a static method by name on `class`.
pub fn call_static_by_name(
    env: &dyn NativeInterface,
    class: ObjectRef,
    name: &str,
    sig: &str,
    ret: ValueKind,
    args: &[JArg],
) -> Result<JReturn> {
    let method = env.get_static_method_id(class, name, sig)?;
    if method.is_null() {
        return Err(BridgeError::Resolution {
            kind: "static method",
            name: name.to_string(),
            signature: sig.to_string(),
        });
    }
    env.call_static_method(class, method, ret, args)
}

/// Call a no-argument method returning an object; a null result is `None`.
pub fn call_object_getter(
    env: &dyn NativeInterface,
    obj: ObjectRef,
    name: &str,
    sig: &str,
) -> Result<Option<ObjectRef>> {
    let result = call_by_name(env, obj, name, sig, ValueKind::Object, &[])?;
    Ok(result.object().filter(|r| !r.is_null()))
}
