//! Where to look for `libjvm`
//!
//! Each platform has a fixed table of install locations for the common JDK
//! distributions, parameterized by the Java version. `JAVA_HOME` is only
//! consulted when no table entry exists on disk.

use std::env;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{BridgeError, Result};

/// Host platform name as used in probe tables and error messages
pub fn platform_name() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Install locations probed for `version` on `platform`, in order.
pub fn candidate_paths(platform: &str, version: &str) -> Result<Vec<PathBuf>> {
    let v = version;
    let paths: Vec<String> = match platform {
        "linux" => [
            "java-{v}-openjdk",
            "java-{v}-openjdk-amd64",
            "java-{v}-openjdk-arm64",
            "java-{v}",
            "temurin-{v}-jdk",
            "temurin-{v}-jdk-amd64",
            "amazon-corretto-{v}-jdk",
            "amazon-corretto-{v}-jdk-amd64",
            "zulu-{v}-jdk",
            "zulu-{v}-jdk-amd64",
            "openjdk-{v}-jdk",
            "openjdk-{v}-jdk-amd64",
        ]
        .iter()
        .map(|dir| format!("/usr/lib/jvm/{}/lib/server/libjvm.so", dir.replace("{v}", v)))
        .collect(),
        "darwin" => {
            let mut paths = vec![format!(
                "/opt/homebrew/opt/openjdk@{v}/libexec/openjdk.jdk/Contents/Home/lib/server/libjvm.dylib"
            )];
            for vendor in ["jdk", "temurin", "amazon-corretto", "zulu", "openjdk"] {
                paths.push(format!(
                    "/Library/Java/JavaVirtualMachines/{vendor}-{v}.jdk/Contents/Home/lib/server/libjvm.dylib"
                ));
            }
            paths.push(format!(
                "/Users/runner/hostedtoolcache/Java_Temurin-Hotspot_jdk/{v}/arm64/Contents/Home/lib/server/libjvm.dylib"
            ));
            paths
        }
        "windows" => {
            let mut paths = Vec::new();
            for dir in [
                "Java\\jdk-{v}",
                "Eclipse Adoptium\\jdk-{v}",
                "Amazon Corretto\\jdk{v}",
                "Microsoft\\jdk-{v}",
                "Zulu\\zulu-{v}",
                "OpenJDK\\jdk-{v}",
            ] {
                let dir = dir.replace("{v}", v);
                for root in ["C:\\Program Files", "C:\\Program Files (x86)"] {
                    paths.push(format!("{root}\\{dir}\\bin\\server\\jvm.dll"));
                }
            }
            paths.push(format!(
                "C:\\hostedtoolcache\\windows\\Java_Temurin-Hotspot_jdk\\{v}\\x64\\bin\\server\\jvm.dll"
            ));
            paths
        }
        other => return Err(BridgeError::UnsupportedPlatform(other.to_string())),
    };
    Ok(paths.into_iter().map(PathBuf::from).collect())
}

/// `libjvm` locations relative to a JDK home
pub fn java_home_candidates(java_home: &Path) -> Vec<PathBuf> {
    vec![
        java_home.join("lib").join("server").join("libjvm.so"),
        java_home.join("lib").join("server").join("libjvm.dylib"),
        java_home.join("bin").join("server").join("jvm.dll"),
        java_home.join("jre").join("lib").join("server").join("libjvm.so"),
    ]
}

/// First existing `libjvm` for `version`: the platform table, then
/// `java_home` if given.
pub fn find_libjvm_in(platform: &str, version: &str, java_home: Option<&Path>) -> Result<PathBuf> {
    let table = candidate_paths(platform, version)?;
    let fallback = java_home.map(java_home_candidates).unwrap_or_default();

    for path in table.into_iter().chain(fallback) {
        if path.exists() {
            return Ok(path);
        }
        debug!("No libjvm at {}", path.display());
    }

    Err(BridgeError::LibraryNotFound {
        version: version.to_string(),
        platform: platform.to_string(),
    })
}

/// [`find_libjvm_in`] for this host, with `JAVA_HOME` from the environment
pub fn find_libjvm(version: &str) -> Result<PathBuf> {
    let java_home = env::var_os("JAVA_HOME").map(PathBuf::from);
    find_libjvm_in(platform_name(), version, java_home.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        assert_eq!(candidate_paths("linux", "17").unwrap().len(), 12);
        assert_eq!(candidate_paths("darwin", "17").unwrap().len(), 7);
        assert_eq!(candidate_paths("windows", "17").unwrap().len(), 13);
    }

    #[test]
    fn test_version_is_substituted() {
        let linux = candidate_paths("linux", "21").unwrap();
        assert_eq!(
            linux[0],
            PathBuf::from("/usr/lib/jvm/java-21-openjdk/lib/server/libjvm.so")
        );
        let windows = candidate_paths("windows", "11").unwrap();
        assert_eq!(
            windows[4],
            PathBuf::from("C:\\Program Files\\Amazon Corretto\\jdk11\\bin\\server\\jvm.dll")
        );
    }

    #[test]
    fn test_unsupported_platform() {
        assert!(matches!(
            candidate_paths("plan9", "17"),
            Err(BridgeError::UnsupportedPlatform(p)) if p == "plan9"
        ));
    }

    #[test]
    fn test_not_found_message() {
        let err = find_libjvm_in("linux", "999", None).unwrap_err();
        assert_eq!(err.to_string(), "could not find libjvm for Java 999 on linux");
    }

    #[test]
    fn test_java_home_fallback() {
        let home = tempfile::tempdir().unwrap();
        let server = home.path().join("lib").join("server");
        std::fs::create_dir_all(&server).unwrap();
        std::fs::write(server.join("libjvm.so"), b"").unwrap();

        let found = find_libjvm_in("linux", "999", Some(home.path())).unwrap();
        assert_eq!(found, server.join("libjvm.so"));
    }
}
