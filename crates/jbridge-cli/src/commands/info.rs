//! `jbridge info`: configuration and VM details.

use std::path::Path;

use jbridge::loader::probe;
use jbridge::Runtime;
use jbridge_config::{Config, MANIFEST_NAME};

pub fn print_config(config: &Config, start: &Path) {
    println!("jbridge v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Platform:     {} ({})", probe::platform_name(), std::env::consts::ARCH);
    println!("Java version: {}", config.java_version);

    match Config::find_manifest(start) {
        Some(path) => println!("Manifest:     {}", path.display()),
        None => println!("Manifest:     (no {} found, using defaults)", MANIFEST_NAME),
    }

    if config.classpath.is_empty() {
        println!("Classpath:    (empty)");
    } else {
        println!("Classpath:");
        for entry in &config.classpath {
            println!("  {}", entry);
        }
    }

    for (source, deps) in &config.deps {
        println!("Deps ({}):   {}", source, deps.len());
    }

    match probe::find_libjvm(&config.java_version) {
        Ok(path) => println!("libjvm:       {}", path.display()),
        Err(e) => println!("libjvm:       {}", e),
    }
}

pub fn print_runtime(rt: &Runtime) -> anyhow::Result<()> {
    let version = rt.version()?;
    println!("JNI version:  {}.{}", version >> 16, version & 0xffff);
    Ok(())
}
