//! jbridge - call into a Java virtual machine from Rust
//!
//! The crate is layered bottom-up:
//!
//! - [`jni`]: raw function-table dispatch, argument marshaling and
//!   exception-checked calls behind the [`NativeInterface`] trait
//! - [`runtime`]: the [`Runtime`] handle with its class-reference cache,
//!   reflection, package discovery and shutdown
//! - [`convert`]: host value <-> Java object conversion
//! - [`proxy`]: package/class/object proxies that turn attribute access into
//!   overload-resolved calls
//! - [`loader`]: locating `libjvm` and booting a VM
//! - [`bridge`]: the single process-wide runtime and dotted-path imports
//!
//! # Example
//!
//! ```ignore
//! use jbridge::{bridge, Member, Resolve, Value};
//!
//! let system = bridge::import("java.lang.System")?;
//! if let Member::Class(system) = system {
//!     let millis = system.call("currentTimeMillis", &[])?;
//!     println!("{millis}");
//! }
//! bridge::shutdown();
//! ```

#![warn(missing_docs)]

pub mod bridge;
pub mod convert;
pub mod error;
pub mod jni;
pub mod loader;
pub mod logging;
pub mod proxy;
pub mod runtime;

pub use convert::{Value, ValueConversion};
pub use error::{BridgeError, Result};
pub use jni::{JArg, JReturn, JniEnv, NativeInterface, ObjectRef};
pub use loader::JvmLoader;
pub use proxy::{
    ClassProxy, InstanceMethodProxy, JavaValue, Member, MethodProxy, ObjectProxy, PackageProxy,
    Resolve,
};
pub use runtime::{ClassDescriptor, FieldDescriptor, MethodDescriptor, Runtime};

pub use jbridge_sys as sys;
