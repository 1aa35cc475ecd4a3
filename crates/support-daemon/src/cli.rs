//! CLI argument parsing for the support daemon.
//!
//! CLI flags override every other config source.

use clap::{Parser, Subcommand};

/// Support Desk
///
/// FAQ-grounded customer support chatbot.
#[derive(Parser, Debug)]
#[command(name = "support-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/support-desk/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP chat server
    Serve {
        /// Override HTTP port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override bind address
        #[arg(long)]
        host: Option<String>,

        /// Override knowledge base path
        #[arg(long)]
        kb: Option<String>,
    },

    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,

        /// Session to answer within
        #[arg(short, long, default_value = "cli")]
        session: String,

        /// Override knowledge base path
        #[arg(long)]
        kb: Option<String>,
    },

    /// Interactive chat in the terminal
    Chat {
        /// Session to chat within
        #[arg(short, long, default_value = "cli")]
        session: String,

        /// Override knowledge base path
        #[arg(long)]
        kb: Option<String>,
    },

    /// Show the closest FAQ entries for a query (no LLM call)
    Search {
        /// Query text
        query: String,

        /// Number of entries to show
        #[arg(short, default_value = "3")]
        k: usize,

        /// Override knowledge base path
        #[arg(long)]
        kb: Option<String>,
    },
}
