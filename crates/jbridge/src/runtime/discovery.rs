//! Best-effort package class discovery
//!
//! The JVM has no API that lists the classes of a package. Two strategies
//! are combined:
//!
//! 1. **Curated probe** (authoritative for JDK packages): confirm the package
//!    is loaded via `Package.getPackages()`, then try `Class.forName` on a
//!    fixed list of well-known simple names.
//! 2. **Classpath scan** (secondary, for application packages): list
//!    `.class` entries under the package path in each configured classpath
//!    directory or jar. See [`super::classpath`].
//!
//! Neither is complete. A class is only reported if its simple name is on
//! the curated list or it sits physically on the configured classpath.

use jbridge_sys::ValueKind;
use log::{debug, info, warn};

use super::classpath;
use super::Runtime;
use crate::error::Result;
use crate::jni::{
    call_frame_capacity, call_object_getter, call_static_by_name, JArg, LocalFrame, ObjectRef,
};

const SCAN_FRAME: i32 = 16;

const JAVA_LANG: &[&str] = &[
    "Object",
    "String",
    "System",
    "Class",
    "Thread",
    "Runtime",
    "Integer",
    "Long",
    "Double",
    "Float",
    "Boolean",
    "Byte",
    "Short",
    "Character",
    "Number",
    "Math",
    "StrictMath",
    "StringBuffer",
    "StringBuilder",
    "Throwable",
    "Exception",
    "RuntimeException",
    "Error",
    "ClassLoader",
    "Package",
    "Process",
    "ProcessBuilder",
    "SecurityManager",
    "Void",
    "Enum",
    "Deprecated",
    "Override",
    "SuppressWarnings",
    "SafeVarargs",
    "FunctionalInterface",
    "Cloneable",
    "Comparable",
    "Iterable",
    "Readable",
    "Runnable",
];

const JAVA_UTIL: &[&str] = &[
    "List",
    "ArrayList",
    "LinkedList",
    "Vector",
    "Stack",
    "Set",
    "HashSet",
    "LinkedHashSet",
    "TreeSet",
    "Map",
    "HashMap",
    "LinkedHashMap",
    "TreeMap",
    "Hashtable",
    "Collection",
    "Collections",
    "Arrays",
    "Objects",
    "Iterator",
    "ListIterator",
    "Enumeration",
    "Queue",
    "Deque",
    "ArrayDeque",
    "PriorityQueue",
    "Date",
    "Calendar",
    "GregorianCalendar",
    "TimeZone",
    "Random",
    "Scanner",
    "Timer",
    "TimerTask",
    "Properties",
    "ResourceBundle",
    "Locale",
    "UUID",
    "Currency",
    "Formatter",
    "StringTokenizer",
    "Observer",
    "Observable",
    "EventListener",
    "EventObject",
];

const JAVA_IO: &[&str] = &[
    "File",
    "InputStream",
    "OutputStream",
    "Reader",
    "Writer",
    "FileInputStream",
    "FileOutputStream",
    "FileReader",
    "FileWriter",
    "BufferedInputStream",
    "BufferedOutputStream",
    "BufferedReader",
    "BufferedWriter",
    "ByteArrayInputStream",
    "ByteArrayOutputStream",
    "StringReader",
    "StringWriter",
    "PrintWriter",
    "PrintStream",
    "DataInputStream",
    "DataOutputStream",
    "ObjectInputStream",
    "ObjectOutputStream",
    "RandomAccessFile",
    "FileDescriptor",
    "FilePermission",
    "IOException",
    "FileNotFoundException",
    "EOFException",
    "Serializable",
    "Externalizable",
    "ObjectInput",
    "ObjectOutput",
    "Closeable",
    "Flushable",
    "FilterInputStream",
    "FilterOutputStream",
];

const GENERIC: &[&str] = &[
    "Object",
    "Exception",
    "Utils",
    "Helper",
    "Manager",
    "Factory",
    "Builder",
    "Handler",
    "Listener",
    "Event",
    "Constants",
];

/// Simple names probed for `package`
pub fn probe_candidates(package: &str) -> &'static [&'static str] {
    match package {
        "java.lang" => JAVA_LANG,
        "java.util" => JAVA_UTIL,
        "java.io" => JAVA_IO,
        _ => GENERIC,
    }
}

impl Runtime {
    /// Dotted names of classes found in `package`. Never fails.
    ///
    /// Probe results come first, followed by classpath hits not already
    /// reported. An empty result means neither strategy found anything, not
    /// that the package is empty.
    pub fn discover_package_classes(&self, package: &str) -> Vec<String> {
        let mut found = match self.probe_package(package) {
            Ok(found) => found,
            Err(e) => {
                warn!("Failed to discover classes via Class.forName for {}: {}", package, e);
                Vec::new()
            }
        };

        for name in classpath::scan(&self.classpath, package) {
            if !found.contains(&name) {
                found.push(name);
            }
        }

        if found.is_empty() {
            warn!("No classes discovered for package {}", package);
        } else {
            info!("Discovered {} classes in {}", found.len(), package);
        }
        found
    }

    fn probe_package(&self, package: &str) -> Result<Vec<String>> {
        if !self.package_loaded(package)? {
            debug!("Package {} not found in loaded packages", package);
            return Ok(Vec::new());
        }

        let found = probe_candidates(package)
            .iter()
            .map(|simple| format!("{}.{}", package, simple))
            .filter(|fqcn| self.class_loadable(fqcn))
            .collect();
        Ok(found)
    }

    /// True when `Package.getPackages()` lists `package`.
    fn package_loaded(&self, package: &str) -> Result<bool> {
        let env = self.env();
        let package_class = self.lookup_class("java/lang/Package")?;

        let frame = LocalFrame::push(env, SCAN_FRAME)?;
        let packages = call_static_by_name(
            env,
            package_class,
            "getPackages",
            "()[Ljava/lang/Package;",
            ValueKind::Object,
            &[],
        )?
        .object()
        .filter(|r| !r.is_null());

        let Some(packages) = packages else {
            frame.pop(ObjectRef::NULL);
            return Ok(false);
        };

        let mut loaded = false;
        for i in 0..env.get_array_length(packages)? {
            let pkg = env.get_object_array_element(packages, i)?;
            if pkg.is_null() {
                continue;
            }
            let name = call_object_getter(env, pkg, "getName", "()Ljava/lang/String;")
                .ok()
                .flatten()
                .and_then(|s| {
                    let text = env.get_string_utf_chars(s).ok().flatten();
                    let _ = env.delete_local_ref(s);
                    text
                });
            let _ = env.delete_local_ref(pkg);
            if name.as_deref() == Some(package) {
                loaded = true;
                break;
            }
        }

        frame.pop(ObjectRef::NULL);
        Ok(loaded)
    }

    /// True when `Class.forName(fqcn)` returns without raising.
    fn class_loadable(&self, fqcn: &str) -> bool {
        let env = self.env();
        let attempt = || -> Result<bool> {
            let class_class = self.lookup_class("java/lang/Class")?;
            let frame = LocalFrame::push(env, call_frame_capacity(1))?;
            let name = env.new_string_utf(fqcn)?;
            let loaded = call_static_by_name(
                env,
                class_class,
                "forName",
                "(Ljava/lang/String;)Ljava/lang/Class;",
                ValueKind::Object,
                &[JArg::Object(name)],
            )?;
            frame.pop(ObjectRef::NULL);
            Ok(loaded.object().map_or(false, |r| !r.is_null()))
        };

        match attempt() {
            Ok(loaded) => loaded,
            Err(e) => {
                debug!("Class.forName({}) failed: {}", fqcn, e);
                false
            }
        }
    }
}
