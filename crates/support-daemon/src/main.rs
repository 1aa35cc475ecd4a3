//! Support Desk daemon
//!
//! FAQ-grounded customer support chatbot.
//!
//! # Usage
//!
//! ```bash
//! support-daemon serve [--port PORT] [--host HOST] [--kb PATH]
//! support-daemon ask "How do I reset my password?" [--session ID]
//! support-daemon chat [--session ID]
//! support-daemon search "password" [-k N]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/support-desk/config.toml)
//! 3. Environment variables (SUPPORT_*), after loading `.env`
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use support_daemon::{ask_question, run_chat, search_faq, start_server, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let log_level = cli.log_level.as_deref();

    match cli.command {
        Commands::Serve { port, host, kb } => {
            start_server(config, port, host.as_deref(), kb.as_deref(), log_level).await?;
        }
        Commands::Ask {
            question,
            session,
            kb,
        } => {
            ask_question(config, &question, &session, kb.as_deref(), log_level).await?;
        }
        Commands::Chat { session, kb } => {
            run_chat(config, &session, kb.as_deref(), log_level).await?;
        }
        Commands::Search { query, k, kb } => {
            search_faq(config, &query, k, kb.as_deref(), log_level).await?;
        }
    }

    Ok(())
}
