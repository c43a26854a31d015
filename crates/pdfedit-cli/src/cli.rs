use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extract PDF pages into editable JSON and rebuild documents from it.
#[derive(Debug, Parser)]
#[command(name = "pdfedit", about, version)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract a PDF into a JSON document record
    Extract {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the record to this file instead of stdout
        #[arg(short, long, value_name = "OUT.json")]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Skip raster image extraction
        #[arg(long)]
        no_images: bool,

        /// Refuse documents with more pages than this
        #[arg(long, value_name = "N")]
        max_pages: Option<usize>,
    },

    /// Rebuild a PDF from a JSON document record
    Reconstruct {
        /// Path to the JSON record
        #[arg(value_name = "RECORD.json")]
        record: PathBuf,

        /// Output PDF path
        #[arg(short, long, value_name = "OUT.pdf")]
        output: PathBuf,

        /// Write content streams uncompressed
        #[arg(long)]
        no_compress: bool,
    },

    /// Extract a PDF and immediately rebuild it
    Roundtrip {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output PDF path
        #[arg(short, long, value_name = "OUT.pdf")]
        output: PathBuf,
    },

    /// Show which base font a font name is drawn with
    ResolveFont {
        /// Font name as it appears in a record, e.g. 'ArialMT'
        #[arg(value_name = "NAME")]
        name: String,

        /// Use the bold variant
        #[arg(long)]
        bold: bool,

        /// Use the italic variant
        #[arg(long)]
        italic: bool,
    },
}
