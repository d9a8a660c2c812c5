//! The process-wide runtime and dotted-path imports
//!
//! A process hosts at most one JVM. [`runtime`] boots it on first use from
//! the `jbridge.toml` found above the current directory; [`init_with`]
//! installs a runtime built elsewhere instead. Everything else here resolves
//! dotted Java paths against that runtime.

use std::env;
use std::path::PathBuf;

use jbridge_config::Config;
use log::info;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::{BridgeError, Result};
use crate::loader::JvmLoader;
use crate::proxy::{Member, PackageProxy, Resolve};
use crate::runtime::Runtime;

static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static INIT_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Top-level namespaces reachable through [`import`]
pub const BRIDGED_ROOTS: &[&str] = &["java", "javax", "jdk"];

/// The shared runtime, booting a JVM on first call.
///
/// Concurrent first calls boot exactly one VM. A failed boot is not
/// remembered; the next call tries again.
pub fn runtime() -> Result<&'static Runtime> {
    if let Some(rt) = RUNTIME.get() {
        return Ok(rt);
    }

    let _guard = INIT_LOCK.lock();
    if let Some(rt) = RUNTIME.get() {
        return Ok(rt);
    }

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = Config::discover(&cwd);
    info!("Starting JVM (Java {})", config.java_version);
    let rt = JvmLoader::new(config).start()?;
    Ok(RUNTIME.get_or_init(|| rt))
}

/// Install `rt` as the shared runtime.
///
/// Hands `rt` back if a runtime is already installed.
pub fn init_with(rt: Runtime) -> std::result::Result<&'static Runtime, Runtime> {
    let _guard = INIT_LOCK.lock();
    RUNTIME.try_insert(rt).map_err(|(_, rejected)| rejected)
}

/// True once the shared runtime exists
pub fn is_initialized() -> bool {
    RUNTIME.get().is_some()
}

/// The `java` root package of the shared runtime
pub fn java() -> Result<PackageProxy<'static>> {
    Ok(PackageProxy::new(runtime()?, "java"))
}

/// True for `java`, `javax`, `jdk` and paths below them
pub fn is_bridged(path: &str) -> bool {
    let root = path.split('.').next().unwrap_or_default();
    BRIDGED_ROOTS.contains(&root)
}

/// Resolve a dotted path against `rt`, one segment at a time.
///
/// Each segment is a class if the VM can load it, otherwise a package; once
/// a class is reached, later segments name its static members.
pub fn resolve_path<'rt>(rt: &'rt Runtime, path: &str) -> Result<Member<'rt>> {
    if !is_bridged(path) {
        return Err(BridgeError::NotBridged(path.to_string()));
    }
    PackageProxy::new(rt, "").resolve_path(path)
}

/// [`resolve_path`] against the shared runtime
pub fn import(path: &str) -> Result<Member<'static>> {
    if !is_bridged(path) {
        return Err(BridgeError::NotBridged(path.to_string()));
    }
    resolve_path(runtime()?, path)
}

/// Shut the shared runtime down, if one was started.
pub fn shutdown() {
    if let Some(rt) = RUNTIME.get() {
        rt.graceful_shutdown();
    }
}
