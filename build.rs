// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: generation to work on
fn generation_arg() -> Arg {
    Arg::new("generation")
        .short('g')
        .long("generation")
        .value_name("GENERATION")
        .help("Generation to use, YYYY-MM-DD_HH-MM-SS (default: newest)")
}

/// Common argument: entity filter
fn entity_arg() -> Arg {
    Arg::new("entity")
        .short('e')
        .long("entity")
        .value_name("ENTITY")
        .action(ArgAction::Append)
        .help("Entity to process (repeatable; default: all)")
}

fn build_cli() -> Command {
    Command::new("ledgersync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keep a relational store in sync with timestamped accounting extracts")
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Config file (default: ./ledgersync.toml if present)"),
        )
        .arg(
            Arg::new("db_path")
                .short('d')
                .long("db-path")
                .value_name("PATH")
                .global(true)
                .help("Path to the target database"),
        )
        .arg(
            Arg::new("source_dir")
                .short('s')
                .long("source-dir")
                .value_name("DIR")
                .global(true)
                .help("Directory holding generation subdirectories"),
        )
        .arg(
            Arg::new("mappings")
                .short('m')
                .long("mappings")
                .value_name("PATH")
                .global(true)
                .help("Mapping registry file (default: builtin mappings)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Debug-level logging"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Only log warnings and errors"),
        )
        .subcommand(
            Command::new("init").about("Create the target database and any missing entity tables"),
        )
        .subcommand(
            Command::new("run")
                .about("Reconcile the target store with a generation")
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Stop after recommendations; write nothing"),
                )
                .arg(
                    Arg::new("policy")
                        .short('p')
                        .long("policy")
                        .value_parser(["source_wins", "target_wins", "manual"])
                        .help("Conflict policy"),
                )
                .arg(generation_arg())
                .arg(entity_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("PATH")
                        .help("Write the run report as JSON"),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Show what a run would change without writing")
                .arg(generation_arg())
                .arg(entity_arg())
                .arg(
                    Arg::new("keys")
                        .short('k')
                        .long("keys")
                        .action(ArgAction::SetTrue)
                        .help("List affected keys and differing columns"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Compare source and target record counts")
                .arg(generation_arg())
                .arg(entity_arg()),
        )
        .subcommand(Command::new("generations").about("List extract generations, newest first"))
        .subcommand(
            Command::new("mappings")
                .about("Inspect the mapping registry")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List registered entities"))
                .subcommand(
                    Command::new("show")
                        .about("Show the field map of one entity")
                        .arg(Arg::new("entity").required(true).help("Entity name")),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("ledgersync.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
