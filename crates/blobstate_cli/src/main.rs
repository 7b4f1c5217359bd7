//! BlobState CLI
//!
//! Command-line access to a resource store on disk.
//!
//! # Commands
//!
//! - `put` - Store a file (or stdin) under a resource path
//! - `get` - Write a resource's content to a file or stdout
//! - `list` - List resources matching a filter
//! - `delete` - Remove a resource

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// BlobState resource store tools.
#[derive(Parser)]
#[command(name = "blobstate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Namespace to operate in
    #[arg(global = true, short, long, default_value = blobstate_resources::DEFAULT_NAMESPACE)]
    namespace: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store content under a resource path, replacing what is there
    Put {
        /// Resource path, e.g. /blob/s/trusty/tahr.gz
        resource: String,

        /// File to read, or "-" for stdin
        file: PathBuf,

        /// Expected SHA-384 of the content (hex)
        #[arg(long)]
        sha384: Option<String>,
    },

    /// Write a resource's content out
    Get {
        /// Resource path
        resource: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List resources
    List {
        /// Resource type (blob, zip)
        #[arg(long = "type")]
        kind: Option<String>,

        /// Owning user
        #[arg(long)]
        user: Option<String>,

        /// Owning organization
        #[arg(long)]
        org: Option<String>,

        /// Release stream
        #[arg(long)]
        stream: Option<String>,

        /// Series
        #[arg(long)]
        series: Option<String>,

        /// Pathname
        #[arg(long)]
        name: Option<String>,

        /// Revision
        #[arg(long)]
        revision: Option<u32>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Delete a resource
    Delete {
        /// Resource path
        resource: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Put {
            resource,
            file,
            sha384,
        } => {
            let path = cli.path.ok_or("Data path required for put")?;
            let manager = commands::open_manager(&path, &cli.namespace)?;
            commands::put::run(&manager, &resource, &file, sha384.as_deref())?;
        }
        Commands::Get { resource, output } => {
            let path = cli.path.ok_or("Data path required for get")?;
            let manager = commands::open_manager(&path, &cli.namespace)?;
            commands::get::run(&manager, &resource, output.as_deref())?;
        }
        Commands::List {
            kind,
            user,
            org,
            stream,
            series,
            name,
            revision,
            format,
        } => {
            let path = cli.path.ok_or("Data path required for list")?;
            let manager = commands::open_manager(&path, &cli.namespace)?;
            let filter = commands::list::FilterArgs {
                kind,
                user,
                org,
                stream,
                series,
                name,
                revision,
            };
            commands::list::run(&manager, filter, &format)?;
        }
        Commands::Delete { resource } => {
            let path = cli.path.ok_or("Data path required for delete")?;
            let manager = commands::open_manager(&path, &cli.namespace)?;
            commands::delete::run(&manager, &resource)?;
        }
        Commands::Version => {
            println!("BlobState CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
