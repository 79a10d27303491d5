use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// schemactl: Development tool for schema-migrate shape sets.
///
/// Inspect shape sets, check persisted documents, and print defaults from
/// the command line.
#[derive(Parser)]
#[command(name = "schemactl", version, about, long_about = None)]
struct Cli {
    /// Path to the shape set TOML file.
    #[arg(short, long, global = true, default_value = "schema-shapes.toml")]
    shapes: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the shape set's name, latest version and fields per version.
    Inspect,

    /// Validate a JSON document against the shape of its declared version.
    Check {
        /// Path to the JSON document.
        file: String,
    },

    /// Print the default record, validated against the latest shape.
    Default {
        /// Print compact JSON instead of indented JSON.
        #[arg(long)]
        compact: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = commands::load_shapes(&cli.shapes).and_then(|set| match cli.command {
        Commands::Inspect => commands::inspect(&set),
        Commands::Check { file } => commands::check(&set, &file),
        Commands::Default { compact } => commands::default(&set, compact),
    });

    match result {
        Ok(report) => print!("{report}"),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
