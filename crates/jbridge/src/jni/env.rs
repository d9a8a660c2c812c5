//! `NativeInterface` over a real JNI function table

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr;
use std::thread::{self, ThreadId};

use jbridge_sys::{
    jboolean, jbyte, jchar, jclass, jdouble, jfieldID, jfloat, jint, jlong, jmethodID, jobject,
    jshort, jsize, jstring, jvalue, CallMode, JNIEnv, JniFn, ValueKind, JNI_FALSE,
};
use log::error;

use super::marshal::{ensure_aligned, marshal_args};
use super::mutf8;
use super::{FieldId, JArg, JReturn, MethodId, NativeInterface, ObjectRef};
use crate::error::{BridgeError, Result};

type GetVersionFn = unsafe extern "system" fn(*mut JNIEnv) -> jint;
type FindClassFn = unsafe extern "system" fn(*mut JNIEnv, *const c_char) -> jclass;
type GetObjectClassFn = unsafe extern "system" fn(*mut JNIEnv, jobject) -> jclass;
type IsInstanceOfFn = unsafe extern "system" fn(*mut JNIEnv, jobject, jclass) -> jboolean;
type GetMemberIdFn =
    unsafe extern "system" fn(*mut JNIEnv, jclass, *const c_char, *const c_char) -> *mut c_void;
type NewStringUtfFn = unsafe extern "system" fn(*mut JNIEnv, *const c_char) -> jstring;
type GetStringUtfCharsFn =
    unsafe extern "system" fn(*mut JNIEnv, jstring, *mut jboolean) -> *const c_char;
type ReleaseStringUtfCharsFn = unsafe extern "system" fn(*mut JNIEnv, jstring, *const c_char);
type GetArrayLengthFn = unsafe extern "system" fn(*mut JNIEnv, jobject) -> jsize;
type GetObjectArrayElementFn = unsafe extern "system" fn(*mut JNIEnv, jobject, jsize) -> jobject;
type RefFn = unsafe extern "system" fn(*mut JNIEnv, jobject) -> jobject;
type DeleteRefFn = unsafe extern "system" fn(*mut JNIEnv, jobject);
type PushLocalFrameFn = unsafe extern "system" fn(*mut JNIEnv, jint) -> jint;
type ExceptionCheckFn = unsafe extern "system" fn(*mut JNIEnv) -> jboolean;
type ExceptionVoidFn = unsafe extern "system" fn(*mut JNIEnv);

/// A JNI environment pointer with typed, exception-checked access to its
/// function table.
///
/// A `JNIEnv*` is only valid on the thread it belongs to. `JniEnv` records
/// that thread when it is wrapped and refuses every call made from any
/// other thread with [`BridgeError::WrongThread`].
pub struct JniEnv {
    raw: *mut JNIEnv,
    owner: ThreadId,
}

// Every table access goes through `slot`, which rejects foreign threads.
unsafe impl Send for JniEnv {}
unsafe impl Sync for JniEnv {}

impl JniEnv {
    /// Wrap a raw `JNIEnv*`.
    ///
    /// # Safety
    ///
    /// `raw` must point to a live JNI environment whose function table
    /// follows the JNI 1.8 layout, must belong to the calling thread, and
    /// must outlive the returned value.
    pub unsafe fn from_raw(raw: *mut JNIEnv) -> Result<Self> {
        if raw.is_null() {
            return Err(BridgeError::NullArgument("JNIEnv"));
        }
        Ok(JniEnv {
            raw,
            owner: thread::current().id(),
        })
    }

    /// Thread the environment belongs to
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Raw environment pointer
    pub fn as_raw(&self) -> *mut JNIEnv {
        self.raw
    }

    fn slot(&self, f: JniFn) -> Result<*const c_void> {
        if thread::current().id() != self.owner {
            return Err(BridgeError::WrongThread);
        }
        // SAFETY: `raw` is non-null and points at the table pointer.
        let table = unsafe { *self.raw };
        if table.is_null() {
            return Err(BridgeError::NullArgument("JNI function table"));
        }
        // SAFETY: every JniFn index is below JNI_FUNCTION_COUNT.
        let entry = unsafe { (*table)[f.index()] };
        if entry.is_null() {
            return Err(BridgeError::NullSlot(f));
        }
        Ok(entry)
    }

    /// Read slot `f` as a function pointer of type `T`.
    ///
    /// # Safety
    ///
    /// `T` must be the `extern "system"` signature JNI defines for `f`.
    unsafe fn function<T: Copy>(&self, f: JniFn) -> Result<T> {
        let entry = self.slot(f)?;
        Ok(std::mem::transmute_copy(&entry))
    }

    /// Fail with `NativeException` if a Java exception is pending, after
    /// describing and clearing it.
    fn check(&self, operation: JniFn) -> Result<()> {
        unsafe {
            let pending: ExceptionCheckFn = self.function(JniFn::ExceptionCheck)?;
            if pending(self.raw) == JNI_FALSE {
                return Ok(());
            }
            let describe: ExceptionVoidFn = self.function(JniFn::ExceptionDescribe)?;
            describe(self.raw);
            let clear: ExceptionVoidFn = self.function(JniFn::ExceptionClear)?;
            clear(self.raw);
        }
        Err(BridgeError::NativeException {
            operation: operation.name(),
        })
    }

    fn member_id(&self, f: JniFn, class: ObjectRef, name: &str, sig: &str) -> Result<*mut c_void> {
        if class.is_null() {
            return Err(BridgeError::NullArgument("class"));
        }
        let name = c_string(name)?;
        let sig = c_string(sig)?;
        let id = unsafe {
            let get: GetMemberIdFn = self.function(f)?;
            get(self.raw, class.as_raw(), name.as_ptr(), sig.as_ptr())
        };
        self.check(f)?;
        Ok(id)
    }

    /// Invoke a `Call*MethodA` slot whose return type matches `kind`.
    ///
    /// # Safety
    ///
    /// `slot` must be the jvalue-array call variant for `kind`, and `args`
    /// must hold as many cells as the method takes parameters.
    unsafe fn dispatch(
        &self,
        slot: JniFn,
        kind: ValueKind,
        target: jobject,
        method: jmethodID,
        args: *const jvalue,
    ) -> Result<JReturn> {
        macro_rules! call {
            ($ret:ty) => {{
                let f: unsafe extern "system" fn(*mut JNIEnv, jobject, jmethodID, *const jvalue) -> $ret =
                    self.function(slot)?;
                f(self.raw, target, method, args)
            }};
        }

        Ok(match kind {
            ValueKind::Object => JReturn::Object(ObjectRef::from_raw(call!(jobject))),
            ValueKind::Boolean => JReturn::Boolean(call!(jboolean) != JNI_FALSE),
            ValueKind::Byte => JReturn::Byte(call!(jbyte)),
            ValueKind::Char => JReturn::Char(call!(jchar)),
            ValueKind::Short => JReturn::Short(call!(jshort)),
            ValueKind::Int => JReturn::Int(call!(jint)),
            ValueKind::Long => JReturn::Long(call!(jlong)),
            ValueKind::Float => JReturn::Float(call!(jfloat)),
            ValueKind::Double => JReturn::Double(call!(jdouble)),
            ValueKind::Void => {
                call!(());
                JReturn::Void
            }
        })
    }

    fn invoke(
        &self,
        mode: CallMode,
        target: ObjectRef,
        method: MethodId,
        ret: ValueKind,
        args: &[JArg],
    ) -> Result<JReturn> {
        if target.is_null() {
            return Err(BridgeError::NullArgument(match mode {
                CallMode::Static => "class",
                _ => "receiver",
            }));
        }
        if method.is_null() {
            return Err(BridgeError::NullArgument("method id"));
        }

        let array = marshal_args(args)?;
        let ptr = array.as_ref().map_or(ptr::null(), |a| a.as_ptr());
        ensure_aligned(ptr)?;

        let slot = JniFn::call_method(mode, ret);
        let value = unsafe { self.dispatch(slot, ret, target.as_raw(), method.as_raw(), ptr)? };
        self.check(slot)?;
        Ok(value)
    }
}

fn c_string(s: &str) -> Result<CString> {
    CString::new(mutf8::encode(s)).map_err(|_| BridgeError::InvalidString(s.to_string()))
}

impl NativeInterface for JniEnv {
    fn version(&self) -> Result<i32> {
        unsafe {
            let get: GetVersionFn = self.function(JniFn::GetVersion)?;
            Ok(get(self.raw))
        }
    }

    fn find_class(&self, name: &str) -> Result<ObjectRef> {
        let name = c_string(name)?;
        let class = unsafe {
            let find: FindClassFn = self.function(JniFn::FindClass)?;
            find(self.raw, name.as_ptr())
        };
        self.check(JniFn::FindClass)?;
        Ok(ObjectRef::from_raw(class))
    }

    fn get_object_class(&self, obj: ObjectRef) -> Result<ObjectRef> {
        if obj.is_null() {
            return Err(BridgeError::NullArgument("object"));
        }
        let class = unsafe {
            let get: GetObjectClassFn = self.function(JniFn::GetObjectClass)?;
            get(self.raw, obj.as_raw())
        };
        self.check(JniFn::GetObjectClass)?;
        Ok(ObjectRef::from_raw(class))
    }

    fn is_instance_of(&self, obj: ObjectRef, class: ObjectRef) -> Result<bool> {
        unsafe {
            let test: IsInstanceOfFn = self.function(JniFn::IsInstanceOf)?;
            Ok(test(self.raw, obj.as_raw(), class.as_raw()) != JNI_FALSE)
        }
    }

    fn get_method_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<MethodId> {
        self.member_id(JniFn::GetMethodID, class, name, sig)
            .map(MethodId::from_raw)
    }

    fn get_static_method_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<MethodId> {
        self.member_id(JniFn::GetStaticMethodID, class, name, sig)
            .map(MethodId::from_raw)
    }

    fn get_static_field_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<FieldId> {
        self.member_id(JniFn::GetStaticFieldID, class, name, sig)
            .map(|id| FieldId::from_raw(id as jfieldID))
    }

    fn call_method(
        &self,
        obj: ObjectRef,
        method: MethodId,
        ret: ValueKind,
        args: &[JArg],
    ) -> Result<JReturn> {
        self.invoke(CallMode::Virtual, obj, method, ret, args)
    }

    fn call_static_method(
        &self,
        class: ObjectRef,
        method: MethodId,
        ret: ValueKind,
        args: &[JArg],
    ) -> Result<JReturn> {
        self.invoke(CallMode::Static, class, method, ret, args)
    }

    fn get_static_field(
        &self,
        class: ObjectRef,
        field: FieldId,
        kind: ValueKind,
    ) -> Result<JReturn> {
        let slot = match JniFn::get_static_field(kind) {
            Some(slot) => slot,
            None => return Ok(JReturn::Void),
        };
        if class.is_null() || field.is_null() {
            return Err(BridgeError::NullArgument("static field"));
        }

        macro_rules! read {
            ($ret:ty) => {{
                let f: unsafe extern "system" fn(*mut JNIEnv, jclass, jfieldID) -> $ret =
                    self.function(slot)?;
                f(self.raw, class.as_raw(), field.as_raw())
            }};
        }

        let value = unsafe {
            match kind {
                ValueKind::Object => JReturn::Object(ObjectRef::from_raw(read!(jobject))),
                ValueKind::Boolean => JReturn::Boolean(read!(jboolean) != JNI_FALSE),
                ValueKind::Byte => JReturn::Byte(read!(jbyte)),
                ValueKind::Char => JReturn::Char(read!(jchar)),
                ValueKind::Short => JReturn::Short(read!(jshort)),
                ValueKind::Int => JReturn::Int(read!(jint)),
                ValueKind::Long => JReturn::Long(read!(jlong)),
                ValueKind::Float => JReturn::Float(read!(jfloat)),
                ValueKind::Double => JReturn::Double(read!(jdouble)),
                ValueKind::Void => JReturn::Void,
            }
        };
        self.check(slot)?;
        Ok(value)
    }

    fn new_string_utf(&self, s: &str) -> Result<ObjectRef> {
        let bytes = c_string(s)?;
        let string = unsafe {
            let new: NewStringUtfFn = self.function(JniFn::NewStringUTF)?;
            new(self.raw, bytes.as_ptr())
        };
        self.check(JniFn::NewStringUTF)?;
        Ok(ObjectRef::from_raw(string))
    }

    fn get_string_utf_chars(&self, s: ObjectRef) -> Result<Option<String>> {
        if s.is_null() {
            return Err(BridgeError::NullArgument("string"));
        }
        unsafe {
            let get: GetStringUtfCharsFn = self.function(JniFn::GetStringUTFChars)?;
            let release: ReleaseStringUtfCharsFn = self.function(JniFn::ReleaseStringUTFChars)?;
            let chars = get(self.raw, s.as_raw(), ptr::null_mut());
            self.check(JniFn::GetStringUTFChars)?;
            if chars.is_null() {
                return Ok(None);
            }
            let text = mutf8::decode(CStr::from_ptr(chars).to_bytes());
            release(self.raw, s.as_raw(), chars);
            Ok(Some(text))
        }
    }

    fn get_array_length(&self, array: ObjectRef) -> Result<i32> {
        if array.is_null() {
            return Err(BridgeError::NullArgument("array"));
        }
        unsafe {
            let len: GetArrayLengthFn = self.function(JniFn::GetArrayLength)?;
            Ok(len(self.raw, array.as_raw()))
        }
    }

    fn get_object_array_element(&self, array: ObjectRef, index: i32) -> Result<ObjectRef> {
        if array.is_null() {
            return Err(BridgeError::NullArgument("array"));
        }
        let element = unsafe {
            let get: GetObjectArrayElementFn = self.function(JniFn::GetObjectArrayElement)?;
            get(self.raw, array.as_raw(), index)
        };
        self.check(JniFn::GetObjectArrayElement)?;
        Ok(ObjectRef::from_raw(element))
    }

    fn new_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef> {
        unsafe {
            let new: RefFn = self.function(JniFn::NewGlobalRef)?;
            Ok(ObjectRef::from_raw(new(self.raw, obj.as_raw())))
        }
    }

    fn delete_global_ref(&self, obj: ObjectRef) -> Result<()> {
        unsafe {
            let delete: DeleteRefFn = self.function(JniFn::DeleteGlobalRef)?;
            delete(self.raw, obj.as_raw());
        }
        Ok(())
    }

    fn delete_local_ref(&self, obj: ObjectRef) -> Result<()> {
        unsafe {
            let delete: DeleteRefFn = self.function(JniFn::DeleteLocalRef)?;
            delete(self.raw, obj.as_raw());
        }
        Ok(())
    }

    fn push_local_frame(&self, capacity: i32) -> Result<()> {
        let rc = unsafe {
            let push: PushLocalFrameFn = self.function(JniFn::PushLocalFrame)?;
            push(self.raw, capacity)
        };
        self.check(JniFn::PushLocalFrame)?;
        if rc != 0 {
            return Err(BridgeError::LocalFrame { capacity });
        }
        Ok(())
    }

    fn pop_local_frame(&self, result: ObjectRef) -> ObjectRef {
        match unsafe { self.function::<RefFn>(JniFn::PopLocalFrame) } {
            Ok(pop) => ObjectRef::from_raw(unsafe { pop(self.raw, result.as_raw()) }),
            Err(e) => {
                error!("cannot pop local frame: {}", e);
                ObjectRef::NULL
            }
        }
    }
}
