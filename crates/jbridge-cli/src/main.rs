//! jbridge command-line tool
//!
//! Boots a JVM from the nearest `jbridge.toml` and lets you poke at it:
//! reflect a class, list a package, read a static field, or call a static
//! method.

mod commands;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jbridge::{bridge, logging, JvmLoader, Runtime};
use jbridge_config::Config;
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "jbridge")]
#[command(about = "Inspect and call into a Java virtual machine", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory to search for jbridge.toml (default: current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration, libjvm location and JNI version
    Info,

    /// Print the methods and fields of a class
    Inspect {
        /// Class name (e.g. java.lang.Math)
        class: String,
    },

    /// List classes found in a package
    Discover {
        /// Package name (e.g. java.util)
        package: String,
    },

    /// Read a static field
    Get {
        /// Class name
        class: String,
        /// Field name
        field: String,
    },

    /// Call a static method
    Call {
        /// Class name
        class: String,
        /// Method name
        method: String,
        /// Arguments: true/false, integers, floats, anything else is a string
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_with_level(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let start = match cli.config {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = Config::discover(&start);

    if let Commands::Info = cli.command {
        commands::info::print_config(&config, &start);
    }

    let rt = boot(config)?;
    let result = match cli.command {
        Commands::Info => commands::info::print_runtime(rt),
        Commands::Inspect { class } => commands::inspect::execute(rt, &class),
        Commands::Discover { package } => commands::discover::execute(rt, &package),
        Commands::Get { class, field } => commands::invoke::get(rt, &class, &field),
        Commands::Call {
            class,
            method,
            args,
        } => commands::invoke::call(rt, &class, &method, &args),
    };

    // Runtime.halt ends the process, so everything must be written first.
    std::io::stdout().flush()?;
    if let Err(e) = &result {
        eprintln!("error: {:#}", e);
        std::io::stderr().flush()?;
    }
    rt.graceful_shutdown();
    result
}

fn boot(config: Config) -> anyhow::Result<&'static Runtime> {
    let rt = JvmLoader::new(config).start()?;
    bridge::init_with(rt).map_err(|_| anyhow::anyhow!("a JVM is already running in this process"))
}
