//! Shared-library handles for `libjvm`
//!
//! `dlopen(RTLD_NOW | RTLD_LOCAL)` on Unix, `LoadLibraryW` on Windows.

use std::ffi::{c_void, CString};
use std::path::Path;
use thiserror::Error;

/// Failures opening `libjvm` or resolving its entry point
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be loaded
    #[error("failed to load {path}: {reason}")]
    Open {
        /// Path that was attempted
        path: String,
        /// Loader diagnostic
        reason: String,
    },

    /// The library loaded but lacks the symbol
    #[error("symbol {symbol} not found in {library}: {reason}")]
    SymbolNotFound {
        /// Symbol that was looked up
        symbol: String,
        /// Library path
        library: String,
        /// Loader diagnostic
        reason: String,
    },

    /// Path or symbol cannot be passed to the platform loader
    #[error("invalid name: {0}")]
    InvalidName(String),
}

/// An open shared library. Closed when dropped.
pub struct Library {
    handle: PlatformHandle,
    path: String,
}

impl Library {
    /// Open the library at `path`, resolving all symbols eagerly.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let path = path
            .to_str()
            .ok_or_else(|| LoadError::InvalidName(format!("{:?}", path)))?;
        let handle = PlatformHandle::load(path)?;
        Ok(Library {
            handle,
            path: path.to_string(),
        })
    }

    /// Resolve `symbol` as a value of type `T`.
    ///
    /// # Safety
    ///
    /// `T` must be a function pointer type matching the symbol's real
    /// signature, and must not be used after this library is dropped.
    pub unsafe fn get<T: Copy>(&self, symbol: &str) -> Result<T, LoadError> {
        let address = self.handle.symbol(symbol, &self.path)?;
        Ok(std::mem::transmute_copy(&address))
    }

    /// Path the library was opened from
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(unix)]
type PlatformHandle = UnixHandle;

#[cfg(windows)]
type PlatformHandle = WindowsHandle;

// ============================================================================
// Unix
// ============================================================================

#[cfg(unix)]
struct UnixHandle(*mut c_void);

#[cfg(unix)]
fn last_dl_error() -> Option<String> {
    // SAFETY: dlerror returns null or a thread-local NUL-terminated string.
    unsafe {
        let err = libc::dlerror();
        (!err.is_null()).then(|| std::ffi::CStr::from_ptr(err).to_string_lossy().into_owned())
    }
}

#[cfg(unix)]
impl UnixHandle {
    fn load(path: &str) -> Result<Self, LoadError> {
        let c_path = CString::new(path).map_err(|_| LoadError::InvalidName(path.to_string()))?;
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(LoadError::Open {
                path: path.to_string(),
                reason: last_dl_error().unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        Ok(UnixHandle(handle))
    }

    fn symbol(&self, name: &str, library: &str) -> Result<*mut c_void, LoadError> {
        let c_name = CString::new(name).map_err(|_| LoadError::InvalidName(name.to_string()))?;
        // Clear stale state so a null symbol can be told apart from an error.
        let _ = last_dl_error();
        let address = unsafe { libc::dlsym(self.0, c_name.as_ptr()) };
        if let Some(reason) = last_dl_error() {
            return Err(LoadError::SymbolNotFound {
                symbol: name.to_string(),
                library: library.to_string(),
                reason,
            });
        }
        if address.is_null() {
            return Err(LoadError::SymbolNotFound {
                symbol: name.to_string(),
                library: library.to_string(),
                reason: "resolved to null".to_string(),
            });
        }
        Ok(address)
    }
}

#[cfg(unix)]
impl Drop for UnixHandle {
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.0);
        }
    }
}

#[cfg(unix)]
unsafe impl Send for UnixHandle {}
#[cfg(unix)]
unsafe impl Sync for UnixHandle {}

// ============================================================================
// Windows
// ============================================================================

#[cfg(windows)]
struct WindowsHandle(*mut c_void);

#[cfg(windows)]
impl WindowsHandle {
    fn load(path: &str) -> Result<Self, LoadError> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;

        let wide: Vec<u16> = OsStr::new(path)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
        if handle.is_null() {
            return Err(LoadError::Open {
                path: path.to_string(),
                reason: format!("error code {}", unsafe { GetLastError() }),
            });
        }
        Ok(WindowsHandle(handle))
    }

    fn symbol(&self, name: &str, library: &str) -> Result<*mut c_void, LoadError> {
        let c_name = CString::new(name).map_err(|_| LoadError::InvalidName(name.to_string()))?;
        let address = unsafe { GetProcAddress(self.0, c_name.as_ptr()) };
        if address.is_null() {
            return Err(LoadError::SymbolNotFound {
                symbol: name.to_string(),
                library: library.to_string(),
                reason: format!("error code {}", unsafe { GetLastError() }),
            });
        }
        Ok(address)
    }
}

#[cfg(windows)]
impl Drop for WindowsHandle {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.0);
        }
    }
}

#[cfg(windows)]
unsafe impl Send for WindowsHandle {}
#[cfg(windows)]
unsafe impl Sync for WindowsHandle {}

#[cfg(windows)]
extern "system" {
    fn LoadLibraryW(filename: *const u16) -> *mut c_void;
    fn GetProcAddress(module: *mut c_void, procname: *const std::ffi::c_char) -> *mut c_void;
    fn FreeLibrary(module: *mut c_void) -> i32;
    fn GetLastError() -> u32;
}
