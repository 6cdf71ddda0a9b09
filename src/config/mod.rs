pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::args::{CliConfig, Command};

#[cfg(feature = "cli")]
mod args {
    use clap::{Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "asset-relations")]
    #[command(about = "Builds asset relations from filenames and renders picture presentations")]
    pub struct CliConfig {
        /// Path to the TOML configuration file
        #[arg(short, long, global = true)]
        pub config: Option<PathBuf>,

        /// JSON repository snapshot (overrides repository.snapshot)
        #[arg(short, long, global = true)]
        pub repository: Option<PathBuf>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Log process CPU and memory usage")]
        pub monitor: bool,

        #[arg(long, global = true, help = "Emit logs as JSON lines")]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Show what a filename says about an asset, without touching the repository
        Parse {
            #[arg(required = true)]
            titles: Vec<String>,
        },

        /// Build relations for the given documents
        Classify {
            #[arg(required = true)]
            ids: Vec<String>,
        },

        /// Build relations for every Picture in the repository
        UpdateAll {
            /// Stop at the first failing document
            #[arg(long)]
            strict: bool,

            /// Continue after the stored cursor
            #[arg(long)]
            resume: bool,

            /// Forget the stored cursor before starting
            #[arg(long, conflicts_with = "resume")]
            reset_cursor: bool,
        },

        /// Render the given documents into a PDF
        Present {
            #[arg(required = true)]
            ids: Vec<String>,

            #[arg(long)]
            title: Option<String>,

            #[arg(long)]
            file_name: Option<String>,

            /// One of "3x3", "2x2", "landscape 6x3"
            #[arg(long, default_value = "2x2")]
            style: String,

            /// Directory the PDF is written to
            #[arg(short, long, default_value = ".")]
            output: PathBuf,

            /// Also write the zipped HTML mini-site here
            #[arg(long)]
            zip_output: Option<PathBuf>,
        },

        /// Zip a directory with paths relative to it
        Zip { source: PathBuf, destination: PathBuf },

        /// Create missing vocabulary entries for the asset fields of the given documents
        CheckAssetData {
            #[arg(required = true)]
            ids: Vec<String>,
        },
    }
}
