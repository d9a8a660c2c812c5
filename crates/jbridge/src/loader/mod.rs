//! Booting a JVM in-process
//!
//! [`JvmLoader::start`] finds `libjvm` for the configured Java version,
//! calls `JNI_CreateJavaVM` with the classpath (and platform tuning flags),
//! and wraps the resulting environment in a [`Runtime`].

mod library;
pub mod probe;

use std::ffi::{c_void, CString};
use std::ptr;

use jbridge_config::Config;
use jbridge_sys::{
    CreateJavaVmFn, JNIEnv, JavaVM, JavaVMInitArgs, JavaVMOption, CREATE_JAVA_VM_SYMBOL,
    JNI_FALSE, JNI_OK, JNI_VERSION_1_8,
};
use log::{debug, info};

pub use library::{Library, LoadError};

use crate::error::{BridgeError, Result};
use crate::jni::{JniEnv, NativeInterface};
use crate::runtime::Runtime;

/// A VM created by [`JvmLoader`] together with the library that hosts it.
pub struct LoadedVm {
    vm: *mut JavaVM,
    library: Library,
}

// The VM pointer is process-global; JNI allows it to be shared across threads.
unsafe impl Send for LoadedVm {}
unsafe impl Sync for LoadedVm {}

impl LoadedVm {
    /// Raw `JavaVM*`
    pub fn as_raw(&self) -> *mut JavaVM {
        self.vm
    }

    /// Path of the loaded `libjvm`
    pub fn library_path(&self) -> &str {
        self.library.path()
    }
}

/// VM options passed to `JNI_CreateJavaVM` for `config`.
///
/// `-Djava.class.path` only appears for a non-empty classpath. Apple
/// Silicon hosts also get headless mode and G1 pause tuning.
pub fn vm_options(config: &Config) -> Vec<String> {
    let mut options = Vec::new();
    if !config.classpath.is_empty() {
        options.push(format!("-Djava.class.path={}", config.classpath_string()));
    }
    if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        options.extend(
            [
                "-Djava.awt.headless=true",
                "-XX:+UseG1GC",
                "-XX:MaxGCPauseMillis=200",
                "-XX:+ExplicitGCInvokesConcurrent",
            ]
            .map(String::from),
        );
    }
    options
}

/// Creates JVMs from a [`Config`].
pub struct JvmLoader {
    config: Config,
}

impl JvmLoader {
    /// Loader for `config`
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The settings this loader boots with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Locate `libjvm`, create a VM and return a runtime over it.
    ///
    /// A process can host only one JVM; calling this twice fails with the
    /// VM's own error code.
    pub fn start(&self) -> Result<Runtime> {
        let path = probe::find_libjvm(&self.config.java_version)?;
        info!("Using libjvm at: {}", path.display());
        let library = Library::open(&path)?;
        let create: CreateJavaVmFn = unsafe { library.get(CREATE_JAVA_VM_SYMBOL)? };

        let options = vm_options(&self.config);
        if options.is_empty() {
            debug!("No JVM options (empty classpath)");
        }
        let option_strings = options
            .iter()
            .map(|o| {
                debug!("JVM option: {}", o);
                CString::new(o.as_str()).map_err(|_| BridgeError::InvalidString(o.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut raw_options: Vec<JavaVMOption> = option_strings
            .iter()
            .map(|s| JavaVMOption {
                option_string: s.as_ptr() as *mut _,
                extra_info: ptr::null_mut(),
            })
            .collect();

        let mut args = JavaVMInitArgs {
            version: JNI_VERSION_1_8,
            n_options: raw_options.len() as i32,
            options: if raw_options.is_empty() {
                ptr::null_mut()
            } else {
                raw_options.as_mut_ptr()
            },
            ignore_unrecognized: JNI_FALSE,
        };

        let mut vm: *mut JavaVM = ptr::null_mut();
        let mut env: *mut c_void = ptr::null_mut();
        let rc = unsafe { create(&mut vm, &mut env, &mut args as *mut JavaVMInitArgs as *mut c_void) };
        if rc != JNI_OK {
            return Err(BridgeError::CreateVm { code: rc });
        }

        let env = unsafe { JniEnv::from_raw(env as *mut JNIEnv)? };
        info!("JVM started (JNI version {:#x})", env.version().unwrap_or_default());
        Ok(Runtime::new(Box::new(env))
            .with_classpath(self.config.classpath_entries())
            .with_vm(LoadedVm { vm, library }))
    }
}
