//! Support daemon library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (serve, ask, chat, search)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    ask_question, build_agent, build_index, build_llm, chat_loop, format_matches, is_exit_command,
    load_settings, run_chat, search_faq, start_server,
};
