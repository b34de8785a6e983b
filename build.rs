// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: source cache directory override
fn source_cache_arg() -> Arg {
    Arg::new("source_cache")
        .long("source-cache")
        .value_name("DIR")
        .help("Source cache directory (default: ~/.mere/src)")
}

fn build_cli() -> Command {
    Command::new("mere")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reproducible source package build engine")
        .subcommand_required(false)
        .subcommand(
            Command::new("build")
                .about("Fetch sources and run the build, test and install stages")
                .arg(Arg::new("recipe").required(true).help("Path to the recipe file"))
                .arg(source_cache_arg())
                .arg(
                    Arg::new("store")
                        .long("store")
                        .value_name("DIR")
                        .help("Store directory to validate before building"),
                ),
        )
        .subcommand(
            Command::new("fetch")
                .about("Fetch and verify all sources without building")
                .arg(Arg::new("recipe").required(true).help("Path to the recipe file"))
                .arg(source_cache_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a recipe file and print a summary")
                .arg(Arg::new("recipe").required(true).help("Path to the recipe file")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "zsh", "fish", "powershell"])
                        .help("Shell type"),
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

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("mere.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
