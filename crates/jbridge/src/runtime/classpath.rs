//! Host-side classpath scanning
//!
//! Lists top-level classes of a package straight from the configured
//! classpath: directories are read with `std::fs`, jars with `zip`. Nested
//! classes (`Outer$Inner`) and sub-packages are left out.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use zip::ZipArchive;

/// Top-level classes of `package` found on `entries`, sorted per entry and
/// in classpath order overall. Unreadable entries are skipped.
pub fn scan(entries: &[PathBuf], package: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for entry in expand_wildcards(entries) {
        let hits = if is_archive(&entry) {
            scan_jar(&entry, package).map_err(|e| e.to_string())
        } else if entry.is_dir() {
            scan_directory(&entry, package).map_err(|e| e.to_string())
        } else {
            debug!("Skipping classpath entry {}", entry.display());
            continue;
        };

        match hits {
            Ok(names) => {
                for name in names {
                    if !found.contains(&name) {
                        found.push(name);
                    }
                }
            }
            Err(e) => warn!("Failed to scan {}: {}", entry.display(), e),
        }
    }
    found
}

/// Expand `dir/*` entries into the jars inside `dir`, as the JVM does.
fn expand_wildcards(entries: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    for entry in entries {
        if entry.file_name().map_or(false, |name| name == "*") {
            let dir = entry.parent().unwrap_or_else(|| Path::new("."));
            let mut jars: Vec<PathBuf> = match fs::read_dir(dir) {
                Ok(listing) => listing
                    .filter_map(|e| e.ok().map(|e| e.path()))
                    .filter(|p| is_archive(p))
                    .collect(),
                Err(e) => {
                    warn!("Failed to expand {}: {}", entry.display(), e);
                    Vec::new()
                }
            };
            jars.sort();
            expanded.extend(jars);
        } else {
            expanded.push(entry.clone());
        }
    }
    expanded
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
}

/// Simple class name for a `.class` file name, if it is a top-level class
fn top_level_class(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".class")?;
    if stem.is_empty() || stem.contains('$') || stem == "package-info" || stem == "module-info" {
        return None;
    }
    Some(stem)
}

fn scan_directory(root: &Path, package: &str) -> io::Result<Vec<String>> {
    let dir = package.split('.').fold(root.to_path_buf(), |dir, part| dir.join(part));
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(simple) = entry.file_name().to_str().and_then(top_level_class) {
            names.push(format!("{}.{}", package, simple));
        }
    }
    names.sort();
    Ok(names)
}

fn scan_jar(path: &Path, package: &str) -> zip::result::ZipResult<Vec<String>> {
    let archive = ZipArchive::new(File::open(path)?)?;
    let prefix = format!("{}/", package.replace('.', "/"));

    let mut names: Vec<String> = archive
        .file_names()
        .filter_map(|entry| entry.strip_prefix(prefix.as_str()))
        .filter(|rest| !rest.contains('/'))
        .filter_map(top_level_class)
        .map(|simple| format!("{}.{}", package, simple))
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}
