//! The runtime handle
//!
//! A [`Runtime`] owns one JNI environment and everything cached against it:
//! global references to looked-up classes, the classpath used for package
//! scans, and (when booted from a real VM) the loaded `libjvm`. Reflection
//! and discovery hang off it as further `impl Runtime` blocks.

mod classpath;
mod descriptor;
mod discovery;
pub mod reflect;

use std::collections::hash_map::Entry;
use std::path::PathBuf;

use jbridge_sys::ValueKind;
use log::{debug, info, warn};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub use descriptor::{
    ClassDescriptor, FieldDescriptor, MethodDescriptor, ELIDED_PARAMETERS, UNKNOWN_FIELD,
    UNKNOWN_METHOD, UNKNOWN_TYPE,
};
pub use discovery::probe_candidates;
pub use reflect::Reflector;

use crate::error::{BridgeError, Result};
use crate::jni::{call_by_name, call_frame_capacity, JArg, JReturn, LocalFrame, NativeInterface, ObjectRef};
use crate::loader::LoadedVm;

/// Local references needed by the shutdown sequence
const SHUTDOWN_FRAME: i32 = 16;

/// Handle to one JVM environment.
///
/// All entry points take `&self`; the class cache and the shutdown flag are
/// behind their own locks, so a `Runtime` can be shared through a `static`.
/// A runtime over a booted VM still only answers on the thread that booted
/// it; calls from elsewhere fail with `WrongThread`.
pub struct Runtime {
    env: Box<dyn NativeInterface>,
    /// Slash-form class name -> global reference
    class_cache: Mutex<FxHashMap<String, ObjectRef>>,
    /// Set once `graceful_shutdown` has run
    shutdown: Mutex<bool>,
    classpath: Vec<PathBuf>,
    /// Keeps `libjvm` mapped for as long as the environment is in use.
    /// Declared last so it is dropped after `env`.
    vm: Option<LoadedVm>,
}

impl Runtime {
    /// Runtime over an existing environment
    pub fn new(env: Box<dyn NativeInterface>) -> Self {
        Self {
            env,
            class_cache: Mutex::new(FxHashMap::default()),
            shutdown: Mutex::new(false),
            classpath: Vec::new(),
            vm: None,
        }
    }

    /// Classpath entries scanned by [`discover_package_classes`](Runtime::discover_package_classes)
    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    pub(crate) fn with_vm(mut self, vm: LoadedVm) -> Self {
        self.vm = Some(vm);
        self
    }

    /// The underlying environment
    pub fn env(&self) -> &dyn NativeInterface {
        self.env.as_ref()
    }

    /// Configured classpath entries
    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    /// True when this runtime booted its own VM
    pub fn owns_vm(&self) -> bool {
        self.vm.is_some()
    }

    /// Number of classes held as global references
    pub fn cached_class_count(&self) -> usize {
        self.class_cache.lock().len()
    }

    /// True once [`graceful_shutdown`](Runtime::graceful_shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.lock()
    }

    /// JNI version reported by the environment
    pub fn version(&self) -> Result<i32> {
        self.env.version()
    }

    // ========================================================================
    // Class lookup
    // ========================================================================

    /// Class reference for `name` (dotted or slash form), cached as a global
    /// reference after the first successful lookup.
    ///
    /// Repeated lookups of a cached class return the identical reference.
    /// If promotion to a global reference fails, the local reference is
    /// returned uncached and is only valid in the current frame.
    pub fn lookup_class(&self, name: &str) -> Result<ObjectRef> {
        let key = name.replace('.', "/");
        if let Some(&class) = self.class_cache.lock().get(&key) {
            return Ok(class);
        }

        let local = match self.env.find_class(&key) {
            Ok(class) if !class.is_null() => class,
            Ok(_) | Err(BridgeError::NativeException { .. }) => {
                return Err(BridgeError::ClassNotFound(key));
            }
            Err(e) => return Err(e),
        };

        let global = match self.env.new_global_ref(local) {
            Ok(global) if !global.is_null() => global,
            Ok(_) => {
                warn!("Failed to create global reference for {}", key);
                return Ok(local);
            }
            Err(e) => {
                warn!("Failed to create global reference for {}: {}", key, e);
                return Ok(local);
            }
        };

        // Another thread may have cached the class while the lock was released.
        let cached = match self.class_cache.lock().entry(key.clone()) {
            Entry::Occupied(existing) => {
                let _ = self.env.delete_global_ref(global);
                *existing.get()
            }
            Entry::Vacant(slot) => *slot.insert(global),
        };
        let _ = self.env.delete_local_ref(local);
        debug!("Cached class {} as global reference", key);
        Ok(cached)
    }

    /// Reflect `name` into a fresh descriptor.
    ///
    /// The class reference is cached; the descriptor is rebuilt on every call.
    pub fn find_class(&self, name: &str) -> Result<ClassDescriptor> {
        let class = self.lookup_class(name)?;
        let dotted = name.replace('/', ".");
        Ok(Reflector::new(self.env()).describe(class, &dotted))
    }

    /// Reflect the runtime class of `obj`.
    pub fn describe_object(&self, obj: ObjectRef) -> Result<ClassDescriptor> {
        let env = self.env();
        let class = env.get_object_class(obj)?;
        let reflector = Reflector::new(env);
        let name = reflector
            .class_name(class)
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
        let descriptor = reflector.describe(class, &name);
        let _ = env.delete_local_ref(class);
        Ok(descriptor)
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Run `call` inside a local frame sized for `argc` arguments.
    ///
    /// Every local reference `call` creates is released when the frame pops,
    /// except an object result, which is carried out into the caller's frame.
    pub fn with_call_frame<F>(&self, argc: usize, call: F) -> Result<JReturn>
    where
        F: FnOnce(&dyn NativeInterface) -> Result<JReturn>,
    {
        let env = self.env();
        let frame = LocalFrame::push(env, call_frame_capacity(argc))?;
        match call(env)? {
            JReturn::Object(result) => Ok(JReturn::Object(frame.pop(result))),
            other => {
                frame.pop(ObjectRef::NULL);
                Ok(other)
            }
        }
    }

    // ========================================================================
    // Shutdown
    // ========================================================================

    /// Release cached classes and halt the VM. Safe to call repeatedly.
    ///
    /// Never fails: each problem is logged and the runtime is marked shut
    /// down regardless. `Runtime.halt` ends the process on a real VM, so
    /// callers should flush their output first.
    pub fn graceful_shutdown(&self) {
        let mut done = self.shutdown.lock();
        if *done {
            debug!("Shutdown already completed");
            return;
        }

        let cached: Vec<(String, ObjectRef)> = self.class_cache.lock().drain().collect();
        for (name, class) in &cached {
            if let Err(e) = self.env.delete_global_ref(*class) {
                warn!("Failed to delete global reference for {}: {}", name, e);
            }
        }
        debug!("Released {} cached classes", cached.len());

        match self.halt() {
            Ok(()) => info!("JVM halted"),
            Err(e) => warn!("Error during graceful shutdown: {}", e),
        }
        *done = true;
    }

    fn halt(&self) -> Result<()> {
        let env = self.env();
        let frame = LocalFrame::push(env, SHUTDOWN_FRAME)?;

        let runtime_class = env.find_class("java/lang/Runtime")?;
        if runtime_class.is_null() {
            return Err(BridgeError::ClassNotFound("java/lang/Runtime".to_string()));
        }
        let get_runtime = env.get_static_method_id(runtime_class, "getRuntime", "()Ljava/lang/Runtime;")?;
        if get_runtime.is_null() {
            return Err(BridgeError::Resolution {
                kind: "static method",
                name: "getRuntime".to_string(),
                signature: "()Ljava/lang/Runtime;".to_string(),
            });
        }
        let runtime = env
            .call_static_method(runtime_class, get_runtime, ValueKind::Object, &[])?
            .object()
            .filter(|r| !r.is_null())
            .ok_or(BridgeError::NullArgument("java.lang.Runtime instance"))?;

        call_by_name(env, runtime, "halt", "(I)V", ValueKind::Void, &[JArg::Int(0)])?;
        frame.pop(ObjectRef::NULL);
        Ok(())
    }
}
