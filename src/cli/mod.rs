//! CLI module for C3.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// C3 - Career Clarity Chatbot
///
/// An AI career counselor for Indian students, grounded in a small career knowledge base.
#[derive(Parser, Debug)]
#[command(name = "c3")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat HTTP server
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Embed the career dataset and rebuild the knowledge base
    Seed {
        /// Dataset file (overrides general.dataset_path)
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Start an interactive counseling session in the terminal
    Chat,

    /// Show the knowledge base context retrieved for a query
    Search {
        /// Search query
        query: String,

        /// Number of documents to retrieve (overrides rag.top_k)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Check that the vector store is reachable and how fast it answers
    Ping,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}
