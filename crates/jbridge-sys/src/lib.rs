//! jbridge-sys - raw JNI ABI surface
//!
//! Plain `#[repr(C)]` mirrors of the types in `jni.h` (JNI 1.8) together with
//! the complete function-table slot index. Nothing here calls into a JVM;
//! the safe layer lives in the `jbridge` crate.

#![warn(missing_docs)]
#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_void};

mod slots;

pub use slots::{CallMode, JniFn, ValueKind, JNI_FUNCTION_COUNT};

// ============================================================================
// Primitive Types
// ============================================================================

/// Java `int`
pub type jint = i32;
/// Java `long`
pub type jlong = i64;
/// Java `byte`
pub type jbyte = i8;
/// Java `boolean` (one byte, 0 or 1)
pub type jboolean = u8;
/// Java `char` (UTF-16 code unit)
pub type jchar = u16;
/// Java `short`
pub type jshort = i16;
/// Java `float`
pub type jfloat = f32;
/// Java `double`
pub type jdouble = f64;
/// Array sizes and indices
pub type jsize = jint;

/// `JNI_TRUE`
pub const JNI_TRUE: jboolean = 1;
/// `JNI_FALSE`
pub const JNI_FALSE: jboolean = 0;

/// Success return code of the invocation API
pub const JNI_OK: jint = 0;

/// Version requested when creating a VM (`JNI_VERSION_1_8`)
pub const JNI_VERSION_1_8: jint = 0x0001_0008;

// ============================================================================
// Reference Types
// ============================================================================

/// Opaque object reference. Every other reference type is an alias of this.
pub type jobject = *mut c_void;
/// `java.lang.Class` reference
pub type jclass = jobject;
/// `java.lang.String` reference
pub type jstring = jobject;
/// `java.lang.Throwable` reference
pub type jthrowable = jobject;
/// Any Java array reference
pub type jarray = jobject;
/// `Object[]` reference
pub type jobjectArray = jarray;

/// Opaque method identifier
pub type jmethodID = *mut c_void;
/// Opaque field identifier
pub type jfieldID = *mut c_void;

// ============================================================================
// Environment
// ============================================================================

/// The function table reachable from an environment pointer.
pub type JniFunctionTable = [*const c_void; JNI_FUNCTION_COUNT];

/// `JNIEnv` as seen from C: a pointer to the function table.
///
/// Every JNI function receives a `*mut JNIEnv` as its first argument.
pub type JNIEnv = *const JniFunctionTable;

/// Opaque `JavaVM` (invocation interface). Only its address is used.
pub type JavaVM = c_void;

// ============================================================================
// Argument Union
// ============================================================================

/// One argument cell for the `Call*MethodA` family.
///
/// The union is 8 bytes wide; narrower members leave the remaining bytes
/// untouched, so cells must be zeroed before a member is written.
#[repr(C)]
#[derive(Clone, Copy)]
pub union jvalue {
    /// boolean
    pub z: jboolean,
    /// byte
    pub b: jbyte,
    /// char
    pub c: jchar,
    /// short
    pub s: jshort,
    /// int
    pub i: jint,
    /// long
    pub j: jlong,
    /// float
    pub f: jfloat,
    /// double
    pub d: jdouble,
    /// object reference
    pub l: jobject,
}

impl jvalue {
    /// All-zero cell
    #[inline]
    pub const fn zeroed() -> Self {
        jvalue { j: 0 }
    }
}

impl Default for jvalue {
    fn default() -> Self {
        Self::zeroed()
    }
}

// ============================================================================
// Invocation API
// ============================================================================

/// A single `-D`/`-X` option passed to `JNI_CreateJavaVM`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JavaVMOption {
    /// NUL-terminated option text
    pub option_string: *mut c_char,
    /// Hook data, unused
    pub extra_info: *mut c_void,
}

/// Arguments block for `JNI_CreateJavaVM`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JavaVMInitArgs {
    /// Requested JNI version
    pub version: jint,
    /// Number of entries in `options`
    pub n_options: jint,
    /// Pointer to the option array (may be null when `n_options == 0`)
    pub options: *mut JavaVMOption,
    /// Whether unknown options are ignored rather than rejected
    pub ignore_unrecognized: jboolean,
}

/// Signature of the exported `JNI_CreateJavaVM` symbol.
pub type CreateJavaVmFn = unsafe extern "system" fn(
    pvm: *mut *mut JavaVM,
    penv: *mut *mut c_void,
    args: *mut c_void,
) -> jint;

/// Exported symbol name of the VM factory.
pub const CREATE_JAVA_VM_SYMBOL: &str = "JNI_CreateJavaVM";
