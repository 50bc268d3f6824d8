//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "policy-qa")]
#[command(about = "Question answering over insurance and policy documents")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: ./config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default: from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS
        #[arg(long)]
        cors: bool,
    },
    /// Answer questions about a document without starting the server
    Ask {
        /// URL of the document
        document: String,
        /// Questions to ask (answered concurrently)
        #[arg(required = true)]
        questions: Vec<String>,
        /// Print answers as a JSON response body
        #[arg(long)]
        json: bool,
    },
    /// Show current configuration (secrets masked)
    Config,
}
