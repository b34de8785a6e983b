// src/main.rs
//! mere - CLI entry point

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

mod commands;

// =============================================================================
// CLI Definitions
// =============================================================================

#[derive(Parser)]
#[command(name = "mere")]
#[command(version)]
#[command(about = "Reproducible source package build engine", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch sources and run the build, test and install stages
    Build {
        /// Path to the recipe file
        recipe: String,

        /// Source cache directory (default: ~/.mere/src)
        #[arg(long)]
        source_cache: Option<PathBuf>,

        /// Store directory to validate before building
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Fetch and verify all sources without building
    Fetch {
        /// Path to the recipe file
        recipe: String,

        /// Source cache directory (default: ~/.mere/src)
        #[arg(long)]
        source_cache: Option<PathBuf>,
    },

    /// Validate a recipe file and print a summary
    Validate {
        /// Path to the recipe file
        recipe: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Some(Commands::Build { recipe, source_cache, store }) => {
            commands::cmd_build(&recipe, source_cache, store)
        }

        Some(Commands::Fetch { recipe, source_cache }) => {
            commands::cmd_fetch(&recipe, source_cache)
        }

        Some(Commands::Validate { recipe }) => commands::cmd_validate(&recipe),

        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "mere", &mut io::stdout());
            Ok(())
        }

        None => {
            println!("mere v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'mere --help' for usage information");
            Ok(())
        }
    }
}
